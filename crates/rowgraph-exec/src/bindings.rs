//! Bindings: named associations between source labels and concrete inputs.
//!
//! A binding is consumed at most once per run. When several reachable graphs
//! read the same label, the engine tees it: the first consumer materializes
//! the stream and later consumers replay the buffer, so one-shot iterators
//! are always acceptable.

use std::collections::HashMap;

use rowgraph_core::{Record, RecordIter, Result};

#[derive(Default)]
pub struct Bindings {
    sources: HashMap<String, RecordIter>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a label to an in-memory table.
    pub fn records(mut self, label: impl Into<String>, records: Vec<Record>) -> Self {
        self.sources
            .insert(label.into(), Box::new(records.into_iter().map(Ok)));
        self
    }

    /// Bind a label to a one-shot record iterator (a decoder, a generator).
    pub fn iter<I>(mut self, label: impl Into<String>, source: I) -> Self
    where
        I: Iterator<Item = Result<Record>> + 'static,
    {
        self.sources.insert(label.into(), Box::new(source));
        self
    }

    pub fn contains(&self, label: &str) -> bool {
        self.sources.contains_key(label)
    }

    pub(crate) fn take(&mut self, label: &str) -> Option<RecordIter> {
        self.sources.remove(label)
    }
}
