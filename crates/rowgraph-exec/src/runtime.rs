//! Runtime: resolve sources, execute reachable graphs in dependency order,
//! and materialize the root output.
//!
//! Single-consumer edges stay lazy pull pipelines; a graph output or binding
//! with several consumers is materialized on first read and replayed, so
//! one-shot inputs are safe to share between the two sides of a join.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use rowgraph_core::key::KeyPolicy;
use rowgraph_core::{stream, EngineConfig, Error, Record, RecordIter, Result};
use rowgraph_operators::sort::SortOptions;
use rowgraph_operators::{fold, join, map, reduce, sort, JoinOptions, Strategy};

use crate::bindings::Bindings;
use crate::graph::{Graph, GraphId, OpSpec, Source};

/// Owns the configuration; each `run` is a fresh, fully parameterized
/// execution with no state carried across calls.
pub struct Engine {
    cfg: EngineConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Execute `graph` under `bindings` and materialize its output.
    pub fn run(&self, graph: &Graph, bindings: Bindings) -> Result<Vec<Record>> {
        stream::collect(self.run_stream(graph, bindings)?)
    }

    /// Execute `graph` under `bindings`, returning the root stream for the
    /// caller to drain. Dropping the stream tears down every buffer.
    pub fn run_stream(&self, graph: &Graph, bindings: Bindings) -> Result<RecordIter> {
        let order = topological_order(graph);
        validate(&order, &bindings)?;

        let graph_consumers = count_graph_consumers(&order);
        let mut state = RunState {
            cfg: &self.cfg,
            bindings,
            label_consumers: count_label_consumers(&order),
            label_cache: HashMap::new(),
            outputs: HashMap::new(),
        };

        let root_id = graph.id();
        let mut root_stream = None;
        for g in &order {
            let built = state.build(g)?;
            if g.id() == root_id {
                root_stream = Some(built);
                break;
            }
            let consumers = graph_consumers.get(&g.id()).copied().unwrap_or(0);
            if consumers > 1 {
                // Tee: materialize once, replay for every consumer.
                let rows: Vec<Record> = built.collect::<Result<_>>()?;
                state.outputs.insert(g.id(), Output::Cached(Rc::new(rows)));
            } else {
                state.outputs.insert(g.id(), Output::Live(built));
            }
            #[cfg(feature = "tracing")]
            tracing::trace!(graph = %g.display_name(), consumers, "graph stream built");
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(graph = %graph.display_name(), graphs = order.len(), "run assembled");

        root_stream.ok_or_else(|| Error::InvalidSpec("root graph missing from plan".to_string()))
    }
}

enum Output {
    Live(RecordIter),
    Cached(Rc<Vec<Record>>),
}

struct RunState<'a> {
    cfg: &'a EngineConfig,
    bindings: Bindings,
    label_consumers: HashMap<String, usize>,
    label_cache: HashMap<String, Rc<Vec<Record>>>,
    outputs: HashMap<GraphId, Output>,
}

impl RunState<'_> {
    fn key_policy(&self) -> KeyPolicy {
        if self.cfg.strict_missing_keys {
            KeyPolicy::Strict
        } else {
            KeyPolicy::NullForMissing
        }
    }

    fn join_options(&self) -> JoinOptions {
        JoinOptions {
            match_null_keys: self.cfg.match_null_join_keys,
            strict_missing_keys: self.cfg.strict_missing_keys,
        }
    }

    /// Wrap the resolved source with the graph's operator pipeline.
    fn build(&mut self, graph: &Graph) -> Result<RecordIter> {
        let node = graph.inner.borrow();
        let mut current = self.resolve_source(&node.source)?;
        for op in &node.ops {
            current = match op {
                OpSpec::Map(mapper) => map(current, mapper.clone()),
                OpSpec::Sort { key, order } => sort(
                    current,
                    key.clone(),
                    *order,
                    self.key_policy(),
                    SortOptions::from(self.cfg),
                ),
                OpSpec::Fold { folder, initial } => {
                    fold(current, folder.clone(), initial.clone())
                }
                OpSpec::Reduce { reducer, key } => {
                    reduce(current, reducer.clone(), key.clone(), self.key_policy())
                }
                OpSpec::Join {
                    right,
                    on,
                    strategy,
                } => {
                    let right_stream = self.take_graph_output(right)?;
                    join(current, right_stream, on.clone(), *strategy, self.join_options())
                }
            };
        }
        Ok(current)
    }

    fn resolve_source(&mut self, source: &Source) -> Result<RecordIter> {
        match source {
            Source::Binding(label) => {
                if let Some(rows) = self.label_cache.get(label) {
                    return Ok(shared_stream(Rc::clone(rows)));
                }
                let input = self
                    .bindings
                    .take(label)
                    .ok_or_else(|| Error::UnboundSource(label.clone()))?;
                if self.label_consumers.get(label).copied().unwrap_or(0) > 1 {
                    let rows: Vec<Record> = input.collect::<Result<_>>()?;
                    let rows = Rc::new(rows);
                    self.label_cache.insert(label.clone(), Rc::clone(&rows));
                    Ok(shared_stream(rows))
                } else {
                    Ok(input)
                }
            }
            Source::Parent(parent) => self.take_graph_output(parent),
        }
    }

    fn take_graph_output(&mut self, parent: &Graph) -> Result<RecordIter> {
        let id = parent.id();
        if let Some(Output::Cached(rows)) = self.outputs.get(&id) {
            return Ok(shared_stream(Rc::clone(rows)));
        }
        match self.outputs.remove(&id) {
            Some(Output::Live(stream)) => Ok(stream),
            _ => Err(Error::InvalidSpec(format!(
                "output of graph '{}' is not available",
                parent.display_name()
            ))),
        }
    }
}

/// Replay of a materialized table.
struct SharedRecords {
    rows: Rc<Vec<Record>>,
    idx: usize,
}

impl Iterator for SharedRecords {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.rows.get(self.idx)?.clone();
        self.idx += 1;
        Some(Ok(record))
    }
}

fn shared_stream(rows: Rc<Vec<Record>>) -> RecordIter {
    Box::new(SharedRecords { rows, idx: 0 })
}

/// Parents-before-children order over every graph reachable from the root.
///
/// Cycles are impossible: a graph only references graphs built before it.
fn topological_order(root: &Graph) -> Vec<Graph> {
    let mut order = Vec::new();
    let mut visited: HashSet<GraphId> = HashSet::new();
    let mut stack = vec![(root.clone(), false)];
    while let Some((graph, expanded)) = stack.pop() {
        if expanded {
            order.push(graph);
            continue;
        }
        if !visited.insert(graph.id()) {
            continue;
        }
        stack.push((graph.clone(), true));
        for parent in graph.parents() {
            if !visited.contains(&parent.id()) {
                stack.push((parent, false));
            }
        }
    }
    order
}

/// How many reachable graphs read each graph's output.
fn count_graph_consumers(order: &[Graph]) -> HashMap<GraphId, usize> {
    let mut counts = HashMap::new();
    for graph in order {
        for parent in graph.parents() {
            *counts.entry(parent.id()).or_insert(0) += 1;
        }
    }
    counts
}

/// How many reachable graphs read each source label.
fn count_label_consumers(order: &[Graph]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for graph in order {
        if let Source::Binding(label) = &graph.inner.borrow().source {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Reject bad pipelines before any binding is consumed.
fn validate(order: &[Graph], bindings: &Bindings) -> Result<()> {
    for graph in order {
        let node = graph.inner.borrow();
        if let Source::Binding(label) = &node.source {
            if !bindings.contains(label) {
                return Err(Error::UnboundSource(label.clone()));
            }
        }
        for op in &node.ops {
            match op {
                OpSpec::Sort { key, .. } | OpSpec::Reduce { key, .. } => {
                    key.validate(op.operator_name())?;
                }
                OpSpec::Join { on, strategy, .. } => match on {
                    Some((left, right)) => {
                        if left.is_empty() || right.is_empty() {
                            return Err(Error::InvalidSpec("join key field is empty".to_string()));
                        }
                    }
                    None if *strategy != Strategy::Cross => {
                        return Err(Error::InvalidSpec(format!(
                            "{strategy} join requires a key pair"
                        )));
                    }
                    None => {}
                },
                OpSpec::Map(_) | OpSpec::Fold { .. } => {}
            }
        }
    }
    Ok(())
}
