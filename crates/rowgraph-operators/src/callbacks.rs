//! User callback shapes.
//!
//! Callbacks are shared handles (`Rc`) because a graph holding them is
//! cheaply clonable and the engine is single-threaded. The engine invokes
//! them synchronously; a callback that retains records must treat them as
//! immutable.

use std::rc::Rc;

use rowgraph_core::{Record, RecordIter, Result};

use crate::reduce::GroupStream;

/// One record in, a lazy sequence of zero or more records out.
pub type Mapper = Rc<dyn Fn(Record) -> RecordIter>;

/// `(state, record) -> state`, applied as a strict left fold.
pub type Folder = Rc<dyn Fn(Record, &Record) -> Result<Record>>;

/// One group sub-stream in, a lazy sequence of records out.
///
/// The sub-stream borrow ends when the callback returns, so the returned
/// iterator cannot keep reading the group; anything it needs later must be
/// buffered inside the callback.
pub type Reducer = Rc<dyn Fn(&mut GroupStream<'_>) -> RecordIter>;

/// Wrap a closure yielding a vector as a `Mapper`.
pub fn mapper_from_fn<F>(f: F) -> Mapper
where
    F: Fn(Record) -> Result<Vec<Record>> + 'static,
{
    Rc::new(move |record| -> RecordIter {
        match f(record) {
            Ok(records) => Box::new(records.into_iter().map(Ok)),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    })
}

/// Wrap a closure yielding a vector as a `Reducer`.
pub fn reducer_from_fn<F>(f: F) -> Reducer
where
    F: Fn(&mut GroupStream<'_>) -> Result<Vec<Record>> + 'static,
{
    Rc::new(move |group| -> RecordIter {
        match f(group) {
            Ok(records) => Box::new(records.into_iter().map(Ok)),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    })
}
