#![forbid(unsafe_code)]
//! rowgraph-exec: graph construction and the execution driver.
//!
//! A `Graph` accumulates an operator pipeline against a named source (or
//! another graph); `Engine::run` resolves sources from the caller's
//! `Bindings`, executes every reachable graph in topological order and
//! materializes the root output. Each run is a fresh execution.

pub mod bindings;
pub mod graph;
pub mod runtime;

pub use bindings::Bindings;
pub use graph::{Graph, JoinKey};
pub use runtime::Engine;
