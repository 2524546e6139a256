#![forbid(unsafe_code)]
//! rowgraph-core: record values, streams, keys, errors, configuration.
//!
//! Pure data layer shared by every other crate. No I/O here; the io crate
//! decodes/encodes records, the operators crate transforms streams of them.

pub mod config;
pub mod error;
pub mod key;
pub mod record;
pub mod stream;
pub mod value;

pub mod prelude;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use key::{Key, KeyPolicy, KeyValue};
pub use record::Record;
pub use stream::RecordIter;
pub use value::{cmp_values, Value, ValueKind};
