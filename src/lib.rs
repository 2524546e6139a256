#![forbid(unsafe_code)]
//! rowgraph: declarative data-flow graphs over streams of dynamic records.
//!
//! Facade over the workspace crates plus a handful of example pipelines.
//! Typical use:
//!
//! ```no_run
//! use rowgraph::{Bindings, Graph};
//!
//! let g = Graph::from_source("rows");
//! g.sort("value");
//! let out = g.run(Bindings::new().records("rows", vec![])).unwrap();
//! assert!(out.is_empty());
//! ```

pub mod algorithms;

pub use rowgraph_core::{
    cmp_values, EngineConfig, Error, Key, Record, RecordIter, Result, Value, ValueKind,
};
pub use rowgraph_exec::{Bindings, Engine, Graph, JoinKey};
pub use rowgraph_io::{JsonlReader, JsonlWriter};
pub use rowgraph_operators::{GroupStream, Strategy};
