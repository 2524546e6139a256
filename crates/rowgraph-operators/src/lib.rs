#![forbid(unsafe_code)]
//! rowgraph-operators: the five stream transformation kernels.
//!
//! Each kernel is a pure function taking one or two input streams plus
//! parameters and returning an output stream. Kernels are synchronous and
//! pull-driven: `next()` on the output may consume many upstream records
//! (sort and the right side of join consume their whole upstream before the
//! first output). Buffers are owned by the returned stream and released on
//! drop, so dropping an output mid-run tears everything down.
//!
//! Error semantics are uniform: the first `Err` an operator yields poisons
//! the stream and nothing follows it.

pub mod callbacks;
pub mod fold;
pub mod join;
pub mod map;
pub mod reduce;
pub mod sort;

pub use callbacks::{Folder, Mapper, Reducer};
pub use fold::fold;
pub use join::{join, JoinOptions, Strategy};
pub use map::map;
pub use reduce::{reduce, GroupStream};
pub use sort::{sort, SortOptions, SortOrder};
