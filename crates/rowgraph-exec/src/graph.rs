//! Graph: a source plus an ordered list of operator specifications.
//!
//! Graphs are cheap clonable handles; `Join` and `from_graph` capture
//! already-built operands, so the reachable set is a DAG by construction.
//! Builder methods append to the operator list and return `&Self` for
//! chaining; nothing is validated or executed until `run`.

use std::cell::RefCell;
use std::rc::Rc;

use rowgraph_core::{EngineConfig, Key, Record, RecordIter, Result};
use rowgraph_operators::callbacks::{mapper_from_fn, reducer_from_fn, Folder, Mapper, Reducer};
use rowgraph_operators::reduce::GroupStream;
use rowgraph_operators::sort::SortOrder;
use rowgraph_operators::Strategy;

use crate::bindings::Bindings;
use crate::runtime::Engine;

#[derive(Clone)]
pub struct Graph {
    pub(crate) inner: Rc<RefCell<Node>>,
}

pub(crate) struct Node {
    pub(crate) source: Source,
    pub(crate) name: Option<String>,
    pub(crate) ops: Vec<OpSpec>,
}

pub(crate) enum Source {
    /// Reads the binding with this label at `run` time.
    Binding(String),
    /// Reads another graph's output (that graph runs first).
    Parent(Graph),
}

pub(crate) enum OpSpec {
    Map(Mapper),
    Sort { key: Key, order: SortOrder },
    Fold { folder: Folder, initial: Record },
    Reduce { reducer: Reducer, key: Key },
    Join {
        right: Graph,
        on: Option<(String, String)>,
        strategy: Strategy,
    },
}

impl OpSpec {
    pub(crate) fn operator_name(&self) -> &'static str {
        match self {
            OpSpec::Map(_) => "map",
            OpSpec::Sort { .. } => "sort",
            OpSpec::Fold { .. } => "fold",
            OpSpec::Reduce { .. } => "reduce",
            OpSpec::Join { .. } => "join",
        }
    }
}

/// Pointer identity of a graph handle, stable for the life of the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct GraphId(usize);

impl Graph {
    /// A graph reading the binding named `label`.
    pub fn from_source(label: impl Into<String>) -> Self {
        Self::with_input(Source::Binding(label.into()))
    }

    /// A graph reading another graph's output under the same bindings.
    pub fn from_graph(parent: &Graph) -> Self {
        Self::with_input(Source::Parent(parent.clone()))
    }

    fn with_input(source: Source) -> Self {
        Graph {
            inner: Rc::new(RefCell::new(Node {
                source,
                name: None,
                ops: Vec::new(),
            })),
        }
    }

    /// Display name used in trace output.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.inner.borrow_mut().name = Some(name.into());
        self
    }

    pub(crate) fn id(&self) -> GraphId {
        GraphId(Rc::as_ptr(&self.inner) as usize)
    }

    pub(crate) fn display_name(&self) -> String {
        let node = self.inner.borrow();
        node.name
            .clone()
            .unwrap_or_else(|| match &node.source {
                Source::Binding(label) => format!("<{label}>"),
                Source::Parent(_) => "<derived>".to_string(),
            })
    }

    /// Graphs this graph reads from, in declaration order.
    pub(crate) fn parents(&self) -> Vec<Graph> {
        let node = self.inner.borrow();
        let mut parents = Vec::new();
        if let Source::Parent(parent) = &node.source {
            parents.push(parent.clone());
        }
        for op in &node.ops {
            if let OpSpec::Join { right, .. } = op {
                parents.push(right.clone());
            }
        }
        parents
    }

    fn push(&self, op: OpSpec) -> &Self {
        self.inner.borrow_mut().ops.push(op);
        self
    }

    /// Append a mapper producing a vector per record.
    pub fn map<F>(&self, mapper: F) -> &Self
    where
        F: Fn(Record) -> Result<Vec<Record>> + 'static,
    {
        self.push(OpSpec::Map(mapper_from_fn(mapper)))
    }

    /// Append a mapper producing a lazy stream per record.
    pub fn map_stream(&self, mapper: Mapper) -> &Self {
        self.push(OpSpec::Map(mapper))
    }

    /// Append a stable ascending sort by the given key.
    pub fn sort(&self, key: impl Into<Key>) -> &Self {
        self.push(OpSpec::Sort {
            key: key.into(),
            order: SortOrder::Ascending,
        })
    }

    /// Append a stable descending sort by the given key.
    pub fn sort_desc(&self, key: impl Into<Key>) -> &Self {
        self.push(OpSpec::Sort {
            key: key.into(),
            order: SortOrder::Descending,
        })
    }

    /// Append a left fold; the output is the single terminal state record.
    pub fn fold<F>(&self, folder: F, initial: Record) -> &Self
    where
        F: Fn(Record, &Record) -> Result<Record> + 'static,
    {
        self.push(OpSpec::Fold {
            folder: Rc::new(folder),
            initial,
        })
    }

    /// Append a grouped reduce; the input must already be sorted by a key
    /// prefix matching `key`.
    pub fn reduce<F>(&self, reducer: F, key: impl Into<Key>) -> &Self
    where
        F: Fn(&mut GroupStream<'_>) -> Result<Vec<Record>> + 'static,
    {
        self.push(OpSpec::Reduce {
            reducer: reducer_from_fn(reducer),
            key: key.into(),
        })
    }

    /// Append a grouped reduce with a lazily produced output stream.
    pub fn reduce_stream(&self, reducer: Reducer, key: impl Into<Key>) -> &Self {
        self.push(OpSpec::Reduce {
            reducer,
            key: key.into(),
        })
    }

    /// Append a keyed join against another graph's output.
    pub fn join(&self, on: &Graph, key: impl Into<JoinKey>, strategy: Strategy) -> &Self {
        let key = key.into();
        self.push(OpSpec::Join {
            right: on.clone(),
            on: Some((key.left, key.right)),
            strategy,
        })
    }

    /// Append a Cartesian product against another graph's output.
    pub fn cross_join(&self, on: &Graph) -> &Self {
        self.push(OpSpec::Join {
            right: on.clone(),
            on: None,
            strategy: Strategy::Cross,
        })
    }

    /// Execute under the default configuration and materialize the output.
    pub fn run(&self, bindings: Bindings) -> Result<Vec<Record>> {
        Engine::new(EngineConfig::default()).run(self, bindings)
    }

    /// Execute and stream the output instead of materializing it.
    pub fn run_stream(&self, bindings: Bindings) -> Result<RecordIter> {
        Engine::new(EngineConfig::default()).run_stream(self, bindings)
    }
}

/// One key field per join side.
///
/// A single name applies to both sides (and therefore collides and gets the
/// `_left`/`_right` rename); a pair names each side separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKey {
    pub left: String,
    pub right: String,
}

impl From<&str> for JoinKey {
    fn from(field: &str) -> Self {
        JoinKey {
            left: field.to_string(),
            right: field.to_string(),
        }
    }
}

impl From<(&str, &str)> for JoinKey {
    fn from((left, right): (&str, &str)) -> Self {
        JoinKey {
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

impl From<(String, String)> for JoinKey {
    fn from((left, right): (String, String)) -> Self {
        JoinKey { left, right }
    }
}
