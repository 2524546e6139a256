//! Join: hash join of a streamed left side against a materialized right.
//!
//! The right stream is buffered in full and indexed by key value; the left
//! side then streams through, so output order is left-input order with ties
//! in right-input order. Unmatched right records (right/full strategies)
//! follow after the left side is exhausted, in right-input order.
//!
//! Field collisions between the two sides are emitted as `<name>_left` /
//! `<name>_right`; the join key fields are not exempt. The missing side of
//! an unmatched record is filled with nulls over that side's observed field
//! names.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use rowgraph_core::key::KeyValue;
use rowgraph_core::{Error, Record, RecordIter, Result, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl Strategy {
    fn keeps_unmatched_left(self) -> bool {
        matches!(self, Strategy::Left | Strategy::Full)
    }

    fn keeps_unmatched_right(self) -> bool {
        matches!(self, Strategy::Right | Strategy::Full)
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "inner" => Ok(Strategy::Inner),
            "left" => Ok(Strategy::Left),
            "right" => Ok(Strategy::Right),
            "full" => Ok(Strategy::Full),
            "cross" => Ok(Strategy::Cross),
            other => Err(Error::BadStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Inner => "inner",
            Strategy::Left => "left",
            Strategy::Right => "right",
            Strategy::Full => "full",
            Strategy::Cross => "cross",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JoinOptions {
    /// Strict-equality mode: null keys match each other. Off by default
    /// (SQL semantics: null matches nothing, including null).
    pub match_null_keys: bool,
    pub strict_missing_keys: bool,
}

/// Join two streams. `on` names one key field per side and is ignored (may
/// be `None`) for the cross strategy.
pub fn join(
    left: RecordIter,
    right: RecordIter,
    on: Option<(String, String)>,
    strategy: Strategy,
    options: JoinOptions,
) -> RecordIter {
    let on = match (strategy, on) {
        (Strategy::Cross, _) => None,
        (_, Some(pair)) => Some(pair),
        (_, None) => {
            return Box::new(std::iter::once(Err(Error::InvalidSpec(format!(
                "{strategy} join requires a key pair"
            )))));
        }
    };
    Box::new(JoinStream {
        left,
        right: Some(right),
        on,
        strategy,
        options,
        side: RightSide::default(),
        left_fields: BTreeSet::new(),
        queue: VecDeque::new(),
        leftover_cursor: 0,
        phase: Phase::Left,
    })
}

/// Materialized right side plus its hash index.
#[derive(Default)]
struct RightSide {
    rows: Vec<Record>,
    index: HashMap<KeyValue, Vec<usize>>,
    fields: BTreeSet<String>,
    matched: Vec<bool>,
}

enum Phase {
    Left,
    RightLeftovers,
    Done,
}

struct JoinStream {
    left: RecordIter,
    /// Taken on first pull to build the right side.
    right: Option<RecordIter>,
    on: Option<(String, String)>,
    strategy: Strategy,
    options: JoinOptions,
    side: RightSide,
    /// Union of left field names seen so far, for right-unmatched filling.
    left_fields: BTreeSet<String>,
    queue: VecDeque<Record>,
    leftover_cursor: usize,
    phase: Phase,
}

impl JoinStream {
    fn build_right(&mut self, right: RecordIter) -> Result<()> {
        for item in right {
            let record = item?;
            self.side.fields.extend(record.field_names().map(String::from));
            self.side.rows.push(record);
        }
        self.side.matched = vec![false; self.side.rows.len()];

        if let Some((_, right_key)) = &self.on {
            for (idx, record) in self.side.rows.iter().enumerate() {
                let value = match record.get(right_key) {
                    Some(value) => value.clone(),
                    None if self.options.strict_missing_keys => {
                        return Err(Error::MissingKey(right_key.clone()));
                    }
                    None => Value::Null,
                };
                if let Some(key) = self.key_of(&value)? {
                    self.side.index.entry(key).or_default().push(idx);
                }
            }
        }
        Ok(())
    }

    fn key_of(&self, value: &Value) -> Result<Option<KeyValue>> {
        if self.options.match_null_keys {
            KeyValue::from_value_matching_null(value).map(Some)
        } else {
            KeyValue::from_value(value)
        }
    }

    /// Expand one left record into output records on the queue.
    fn take_left(&mut self, record: Record) -> Result<()> {
        self.left_fields.extend(record.field_names().map(String::from));

        if self.strategy == Strategy::Cross {
            for right in &self.side.rows {
                self.queue.push_back(merge_pair(&record, right));
            }
            return Ok(());
        }

        let (left_key, _) = self.on.as_ref().map(|(l, r)| (l.clone(), r)).ok_or_else(|| {
            Error::InvalidSpec("keyed join is missing its key pair".to_string())
        })?;
        let value = match record.get(&left_key) {
            Some(value) => value.clone(),
            None if self.options.strict_missing_keys => {
                return Err(Error::MissingKey(left_key));
            }
            None => Value::Null,
        };

        let matches = self
            .key_of(&value)?
            .and_then(|key| self.side.index.get(&key))
            .cloned()
            .unwrap_or_default();

        if matches.is_empty() {
            if self.strategy.keeps_unmatched_left() {
                self.queue
                    .push_back(fill_missing_side(&record, &self.side.fields, Side::Left));
            }
            return Ok(());
        }
        for idx in matches {
            self.side.matched[idx] = true;
            self.queue.push_back(merge_pair(&record, &self.side.rows[idx]));
        }
        Ok(())
    }

    fn next_leftover(&mut self) -> Option<Record> {
        while self.leftover_cursor < self.side.rows.len() {
            let idx = self.leftover_cursor;
            self.leftover_cursor += 1;
            if !self.side.matched[idx] {
                let record = &self.side.rows[idx];
                return Some(fill_missing_side(record, &self.left_fields, Side::Right));
            }
        }
        None
    }
}

impl Iterator for JoinStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(right) = self.right.take() {
            if let Err(e) = self.build_right(right) {
                self.phase = Phase::Done;
                return Some(Err(e));
            }
        }
        loop {
            if let Some(record) = self.queue.pop_front() {
                return Some(Ok(record));
            }
            match self.phase {
                Phase::Left => match self.left.next() {
                    Some(Ok(record)) => {
                        if let Err(e) = self.take_left(record) {
                            self.phase = Phase::Done;
                            return Some(Err(e));
                        }
                    }
                    Some(Err(e)) => {
                        self.phase = Phase::Done;
                        return Some(Err(e));
                    }
                    None => {
                        self.phase = if self.strategy.keeps_unmatched_right() {
                            Phase::RightLeftovers
                        } else {
                            Phase::Done
                        };
                    }
                },
                Phase::RightLeftovers => match self.next_leftover() {
                    Some(record) => return Some(Ok(record)),
                    None => self.phase = Phase::Done,
                },
                Phase::Done => return None,
            }
        }
    }
}

enum Side {
    Left,
    Right,
}

/// Merge a matched pair; shared field names split into `_left`/`_right`.
fn merge_pair(left: &Record, right: &Record) -> Record {
    let mut out = Record::new();
    for (name, value) in left.iter() {
        if right.contains_field(name) {
            out.set(format!("{name}_left"), value.clone());
        } else {
            out.set(name, value.clone());
        }
    }
    for (name, value) in right.iter() {
        if left.contains_field(name) {
            out.set(format!("{name}_right"), value.clone());
        } else {
            out.set(name, value.clone());
        }
    }
    out
}

/// Emit an unmatched record: its own fields (renamed where they collide with
/// the other side's observed names) plus nulls for the other side.
fn fill_missing_side(record: &Record, other_fields: &BTreeSet<String>, side: Side) -> Record {
    let (own_suffix, other_suffix) = match side {
        Side::Left => ("_left", "_right"),
        Side::Right => ("_right", "_left"),
    };
    let mut out = Record::new();
    for (name, value) in record.iter() {
        if other_fields.contains(name) {
            out.set(format!("{name}{own_suffix}"), value.clone());
        } else {
            out.set(name, value.clone());
        }
    }
    for name in other_fields {
        if record.contains_field(name) {
            out.set(format!("{name}{other_suffix}"), Value::Null);
        } else {
            out.set(name.clone(), Value::Null);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowgraph_core::stream;

    fn rec(json: serde_json::Value) -> Record {
        Record::try_from(json).unwrap()
    }

    fn recs(json: serde_json::Value) -> Vec<Record> {
        match json {
            serde_json::Value::Array(items) => {
                items.into_iter().map(|v| Record::try_from(v).unwrap()).collect()
            }
            other => panic!("expected array fixture, got {other}"),
        }
    }

    fn run_join(
        left: Vec<Record>,
        right: Vec<Record>,
        on: Option<(&str, &str)>,
        strategy: Strategy,
    ) -> Result<Vec<Record>> {
        stream::collect(join(
            stream::from_records(left),
            stream::from_records(right),
            on.map(|(l, r)| (l.to_string(), r.to_string())),
            strategy,
            JoinOptions::default(),
        ))
    }

    #[test]
    fn inner_join_renames_colliding_keys() {
        let left = recs(serde_json::json!([
            {"id": 1, "mail": "a"},
            {"id": 2, "mail": "b"},
        ]));
        let right = recs(serde_json::json!([
            {"id": 1, "msg": "x"},
            {"id": 3, "msg": "y"},
        ]));
        let out = run_join(left, right, Some(("id", "id")), Strategy::Inner).unwrap();
        assert_eq!(
            out,
            recs(serde_json::json!([
                {"id_left": 1, "id_right": 1, "mail": "a", "msg": "x"},
            ]))
        );
    }

    #[test]
    fn distinct_key_names_are_kept() {
        let left = recs(serde_json::json!([{"id": 1, "mail": "a"}]));
        let right = recs(serde_json::json!([{"user_id": 1, "message": "hi"}]));
        let out = run_join(left, right, Some(("id", "user_id")), Strategy::Inner).unwrap();
        assert_eq!(
            out,
            recs(serde_json::json!([
                {"id": 1, "mail": "a", "user_id": 1, "message": "hi"},
            ]))
        );
    }

    #[test]
    fn left_join_fills_the_right_side_with_nulls() {
        let left = recs(serde_json::json!([
            {"id": 1, "mail": "a"},
            {"id": 2, "mail": "b"},
        ]));
        let right = recs(serde_json::json!([{"id": 1, "msg": "x"}]));
        let out = run_join(left, right, Some(("id", "id")), Strategy::Left).unwrap();
        assert_eq!(
            out,
            recs(serde_json::json!([
                {"id_left": 1, "id_right": 1, "mail": "a", "msg": "x"},
                {"id_left": 2, "id_right": null, "mail": "b", "msg": null},
            ]))
        );
    }

    #[test]
    fn cross_join_is_left_major() {
        let left = recs(serde_json::json!([{"a": 1}, {"a": 2}]));
        let right = recs(serde_json::json!([{"b": 10}, {"b": 20}]));
        let out = run_join(left, right, None, Strategy::Cross).unwrap();
        assert_eq!(
            out,
            recs(serde_json::json!([
                {"a": 1, "b": 10},
                {"a": 1, "b": 20},
                {"a": 2, "b": 10},
                {"a": 2, "b": 20},
            ]))
        );
    }

    #[test]
    fn null_keys_match_nothing_by_default() {
        let left = recs(serde_json::json!([{"id": null, "mail": "a"}]));
        let right = recs(serde_json::json!([{"id": null, "msg": "x"}]));

        let inner = run_join(left.clone(), right.clone(), Some(("id", "id")), Strategy::Inner)
            .unwrap();
        assert!(inner.is_empty());

        // Strict-equality mode restores the match.
        let out = stream::collect(join(
            stream::from_records(left),
            stream::from_records(right),
            Some(("id".to_string(), "id".to_string())),
            Strategy::Inner,
            JoinOptions {
                match_null_keys: true,
                ..JoinOptions::default()
            },
        ))
        .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn unknown_strategy_name_is_rejected() {
        let err = "semi".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, Error::BadStrategy(name) if name == "semi"));
        assert_eq!("full".parse::<Strategy>().unwrap(), Strategy::Full);
    }

    #[test]
    fn keyed_join_without_keys_is_invalid() {
        let mut out = join(
            stream::empty(),
            stream::empty(),
            None,
            Strategy::Inner,
            JoinOptions::default(),
        );
        assert!(matches!(out.next(), Some(Err(Error::InvalidSpec(_)))));
    }

    #[test]
    fn right_leftovers_follow_in_right_order() {
        let left = recs(serde_json::json!([{"id": 2, "mail": "b"}]));
        let right = recs(serde_json::json!([
            {"id": 5, "msg": "x"},
            {"id": 2, "msg": "y"},
            {"id": 7, "msg": "z"},
        ]));
        let out = run_join(left, right, Some(("id", "id")), Strategy::Full).unwrap();
        assert_eq!(
            out,
            recs(serde_json::json!([
                {"id_left": 2, "id_right": 2, "mail": "b", "msg": "y"},
                {"id_left": null, "id_right": 5, "mail": null, "msg": "x"},
                {"id_left": null, "id_right": 7, "mail": null, "msg": "z"},
            ]))
        );
    }
}
