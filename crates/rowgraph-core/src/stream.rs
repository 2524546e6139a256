//! Record streams: finite, single-pass, lazily produced.
//!
//! A stream is a boxed fallible iterator. End-of-stream and the first error
//! are both terminal: operators are fused and never yield an item after
//! either. Any operator needing multiple passes buffers explicitly.

use crate::error::Result;
use crate::record::Record;

pub type RecordIter = Box<dyn Iterator<Item = Result<Record>>>;

pub fn empty() -> RecordIter {
    Box::new(std::iter::empty())
}

pub fn once(record: Record) -> RecordIter {
    Box::new(std::iter::once(Ok(record)))
}

pub fn from_records(records: Vec<Record>) -> RecordIter {
    Box::new(records.into_iter().map(Ok))
}

/// Drain a stream into a vector, stopping at the first error.
pub fn collect(stream: RecordIter) -> Result<Vec<Record>> {
    stream.collect()
}
