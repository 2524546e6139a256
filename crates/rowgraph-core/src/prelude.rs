//! Convenient re-exports for downstream crates.

pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::key::{Key, KeyPolicy, KeyValue};
pub use crate::record::Record;
pub use crate::stream::RecordIter;
pub use crate::value::{cmp_values, Value, ValueKind};
