//! Reduce: grouped transformation over a key-sorted stream.
//!
//! Precondition: the input is sorted by the reduce key (a sort upstream with
//! a matching key prefix). The kernel does not enforce this; an unsorted
//! input yields well-typed but meaningless groups.
//!
//! Group boundaries are detected with one record of look-ahead, so the
//! engine holds at most one record beyond whatever the reducer retains.

use rowgraph_core::key::{key_tuples_equal, KeyPolicy};
use rowgraph_core::{Error, Key, Record, RecordIter, Result, Value};

use crate::callbacks::Reducer;

/// Invoke `reducer` once per maximal run of records sharing the composite
/// key, forwarding its outputs in order.
pub fn reduce(input: RecordIter, reducer: Reducer, key: Key, policy: KeyPolicy) -> RecordIter {
    Box::new(ReduceStream {
        input,
        reducer,
        key,
        policy,
        lookahead: None,
        out: None,
        done: false,
    })
}

struct ReduceStream {
    input: RecordIter,
    reducer: Reducer,
    key: Key,
    policy: KeyPolicy,
    /// First record of the next group, parked while the current one drains.
    lookahead: Option<Record>,
    out: Option<RecordIter>,
    done: bool,
}

impl Iterator for ReduceStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(out) = self.out.as_mut() {
                match out.next() {
                    Some(Ok(record)) => return Some(Ok(record)),
                    Some(Err(e)) => {
                        self.done = true;
                        return Some(Err(Error::callback("reduce", "group output", e)));
                    }
                    None => self.out = None,
                }
            }

            // Start the next group.
            let first = match self.lookahead.take() {
                Some(record) => record,
                None => match self.input.next() {
                    Some(Ok(record)) => record,
                    Some(Err(e)) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                    None => {
                        self.done = true;
                        return None;
                    }
                },
            };

            let tuple = match self.key.extract(&first, self.policy) {
                Ok(tuple) => tuple,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            let (out, boundary, error) = {
                let mut group = GroupStream {
                    first: Some(first),
                    input: &mut self.input,
                    key: &self.key,
                    policy: self.policy,
                    tuple,
                    boundary: None,
                    finished: false,
                    error: None,
                };
                let out = (self.reducer)(&mut group);
                // Skip whatever part of the group the reducer left behind.
                group.drain();
                (out, group.boundary.take(), group.error.take())
            };

            if let Some(e) = error {
                self.done = true;
                return Some(Err(e));
            }
            self.lookahead = boundary;
            self.out = Some(out);
        }
    }
}

/// Lazy sub-stream over one group, handed to the reducer.
///
/// The borrow on the parent stream ends when the reducer returns, so the
/// reducer cannot read the group afterwards without buffering it itself.
pub struct GroupStream<'a> {
    first: Option<Record>,
    input: &'a mut RecordIter,
    key: &'a Key,
    policy: KeyPolicy,
    tuple: Vec<Value>,
    boundary: Option<Record>,
    finished: bool,
    error: Option<Error>,
}

impl GroupStream<'_> {
    /// Composite key shared by every record of this group.
    pub fn key_tuple(&self) -> &[Value] {
        &self.tuple
    }

    fn drain(&mut self) {
        while self.next().is_some() {}
    }
}

impl Iterator for GroupStream<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(record) = self.first.take() {
            return Some(Ok(record));
        }
        match self.input.next() {
            Some(Ok(record)) => {
                let tuple = match self.key.extract(&record, self.policy) {
                    Ok(tuple) => tuple,
                    Err(e) => {
                        self.finished = true;
                        self.error = Some(e.clone());
                        return Some(Err(e));
                    }
                };
                match key_tuples_equal(&self.tuple, &tuple) {
                    Ok(true) => Some(Ok(record)),
                    Ok(false) => {
                        self.boundary = Some(record);
                        self.finished = true;
                        None
                    }
                    Err(e) => {
                        self.finished = true;
                        self.error = Some(e.clone());
                        Some(Err(e))
                    }
                }
            }
            Some(Err(e)) => {
                self.finished = true;
                self.error = Some(e.clone());
                Some(Err(e))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }
}
