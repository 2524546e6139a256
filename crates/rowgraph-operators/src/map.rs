//! Map: one-to-many, order-preserving record transformation.

use rowgraph_core::{Error, Record, RecordIter, Result};

use crate::callbacks::Mapper;

/// Apply `mapper` to every record of `input`, concatenating its outputs in
/// input order. Constant memory beyond whatever the mapper holds.
pub fn map(input: RecordIter, mapper: Mapper) -> RecordIter {
    Box::new(MapStream {
        input,
        mapper,
        current: None,
        pending: None,
        done: false,
    })
}

struct MapStream {
    input: RecordIter,
    mapper: Mapper,
    /// Copy of the record the mapper is currently expanding, for diagnostics.
    current: Option<Record>,
    pending: Option<RecordIter>,
    done: bool,
}

impl Iterator for MapStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(out) = self.pending.as_mut() {
                match out.next() {
                    Some(Ok(record)) => return Some(Ok(record)),
                    Some(Err(e)) => {
                        self.done = true;
                        let context = self
                            .current
                            .as_ref()
                            .map(Record::render)
                            .unwrap_or_else(|| "record".to_string());
                        return Some(Err(Error::callback("map", context, e)));
                    }
                    None => {
                        self.pending = None;
                        self.current = None;
                    }
                }
            }
            match self.input.next() {
                Some(Ok(record)) => {
                    // The mapper gets exclusive ownership of the record; the
                    // copy kept here only feeds error messages.
                    self.current = Some(record.clone());
                    self.pending = Some((self.mapper)(record));
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
