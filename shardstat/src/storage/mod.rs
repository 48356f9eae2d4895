//! Index storage backends.
//!
//! - [`MemoryIndexStore`] keeps shards in memory; tests and benchmarks use it.
//! - [`LocalIndexStore`] reads JSON shard files from a directory tree.

pub mod local;
pub mod memory;

pub use local::LocalIndexStore;
pub use memory::{MemoryIndexStore, MemoryShard, SeriesRecord};
