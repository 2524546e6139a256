//! Sort: stable total order by a composite key, with optional spill runs.
//!
//! The input is fully materialized (sorting needs it); when a spill
//! threshold is configured, full buffers are flushed as sorted runs on disk
//! and replayed through a k-way merge, so peak memory stays bounded by the
//! threshold.

mod run;

use std::path::PathBuf;

use rowgraph_core::key::KeyPolicy;
use rowgraph_core::{EngineConfig, Error, Key, Record, RecordIter, Result, Value, ValueKind};

use run::{Drained, RunBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone)]
pub struct SortOptions {
    /// Buffers above this many records spill to sorted runs; `None` sorts
    /// fully in memory.
    pub spill_threshold: Option<usize>,
    pub spill_dir: PathBuf,
}

impl Default for SortOptions {
    fn default() -> Self {
        SortOptions::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for SortOptions {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            spill_threshold: cfg.sort_spill_threshold,
            spill_dir: PathBuf::from(&cfg.spill_dir),
        }
    }
}

/// Stably sort `input` by the lexicographic tuple of key values.
///
/// Equal keys keep their input order; a mixed-tag comparison anywhere in the
/// input poisons the stream with `TypeMismatch` before any record is
/// emitted.
pub fn sort(
    input: RecordIter,
    key: Key,
    order: SortOrder,
    policy: KeyPolicy,
    options: SortOptions,
) -> RecordIter {
    Box::new(SortStream {
        pending: Some((input, RunBuffer::new(key, order, policy, options))),
        drained: None,
        done: false,
    })
}

struct SortStream {
    pending: Option<(RecordIter, RunBuffer)>,
    drained: Option<Drained>,
    done: bool,
}

impl Iterator for SortStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some((input, mut buffer)) = self.pending.take() {
            for item in input {
                let step = item.and_then(|record| buffer.push(record));
                if let Err(e) = step {
                    self.done = true;
                    return Some(Err(e));
                }
            }
            match buffer.finish() {
                Ok(drained) => self.drained = Some(drained),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        match self.drained.as_mut().and_then(Iterator::next) {
            Some(Ok(record)) => Some(Ok(record)),
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// Comparability bookkeeping: one tag class per key position, fixed by the
/// first value seen there. Validating up front keeps the actual comparator
/// total, which the standard sort requires.
pub(crate) struct KeyClasses {
    seen: Vec<Option<ValueKind>>,
}

impl KeyClasses {
    pub(crate) fn new(width: usize) -> Self {
        Self {
            seen: vec![None; width],
        }
    }

    pub(crate) fn check(&mut self, tuple: &[Value]) -> Result<()> {
        for (slot, value) in self.seen.iter_mut().zip(tuple) {
            let kind = value.kind();
            if matches!(kind, ValueKind::List | ValueKind::Map) {
                return Err(Error::TypeMismatch(format!(
                    "{kind} values cannot be used as keys"
                )));
            }
            match slot {
                None => *slot = Some(kind),
                Some(seen) if tag_class(*seen) == tag_class(kind) => {}
                Some(seen) => {
                    return Err(Error::TypeMismatch(format!(
                        "cannot compare {seen} with {kind}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(PartialEq)]
enum TagClass {
    Null,
    Bool,
    Number,
    Str,
}

fn tag_class(kind: ValueKind) -> TagClass {
    match kind {
        ValueKind::Null => TagClass::Null,
        ValueKind::Bool => TagClass::Bool,
        ValueKind::Int | ValueKind::Float => TagClass::Number,
        // List/Map rejected before classification.
        _ => TagClass::Str,
    }
}
