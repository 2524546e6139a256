//! Fold: strict left fold emitting exactly one record.

use rowgraph_core::{Error, Record, RecordIter, Result};

use crate::callbacks::Folder;

/// Fold `input` into a single terminal state record.
///
/// The folder runs exactly once per input record, in input order. Empty
/// input emits the initial state unchanged.
pub fn fold(input: RecordIter, folder: Folder, initial: Record) -> RecordIter {
    Box::new(FoldStream {
        pending: Some((input, folder, initial)),
    })
}

struct FoldStream {
    /// Consumed on the first pull; `None` afterwards.
    pending: Option<(RecordIter, Folder, Record)>,
}

impl Iterator for FoldStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let (input, folder, initial) = self.pending.take()?;
        let mut state = initial;
        for item in input {
            let record = match item {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };
            state = match folder(state, &record) {
                Ok(next) => next,
                Err(e) => return Some(Err(Error::callback("fold", record.render(), e))),
            };
        }
        Some(Ok(state))
    }
}
