#![forbid(unsafe_code)]
//! rowgraph-io: line-delimited JSON record streams.
//!
//! Decoding and encoding live outside the engine proper: the engine consumes
//! any iterator of records and emits any iterator of records. This crate is
//! the standard collaborator for the "one self-delimiting serialized mapping
//! per line" format.

pub mod jsonl;

pub use jsonl::{JsonlReader, JsonlWriter};
