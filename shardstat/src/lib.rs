//! # shardstat
//!
//! Read-only series and chunk distribution statistics for time-series index
//! shards.
//!
//! shardstat walks the index shards of a table, tenant by tenant, and
//! reports how many series and chunk references a label filter selects,
//! the average and maximum chunks per series, and how many hot series
//! crossed a chunk-count threshold. Use it to spot skew in an index shard
//! before it becomes a query-path problem.
//!
//! ## Key Properties
//!
//! - Never mutates the index
//! - Storage is a capability surface ([`IndexStore`], [`IndexShard`]); the
//!   analyzer never downcasts to a concrete format
//! - Single-threaded and sequential; the first error aborts the run
//! - Result buffers are reused across shards
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shardstat::{AnalysisConfig, storage::LocalIndexStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = LocalIndexStore::new("/tmp/loki-index-analysis");
//! let config = AnalysisConfig::new("index_19453")
//!     .with_tenants(["29"])
//!     .with_label_filters(["cluster=dev-us-east-0"]);
//!
//! let summary = shardstat::analyze(&store, &config)?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: Tenant walk, shard analysis, and the [`analyze`] entry point
//! - [`config`]: Run configuration
//! - [`index`]: Storage capability traits and record types
//! - [`matcher`]: Label matchers and the `key=value` filter builder
//! - [`labels`]: Label sets and fingerprints
//! - [`stats`]: Run-level counters
//! - [`report`]: The final summary
//! - [`storage`]: In-memory and local-directory backends
//! - [`window`]: Time windows and timestamp parsing
//! - [`error`]: Error types

pub mod analyzer;
pub mod config;
pub mod error;
pub mod index;
pub mod labels;
pub mod matcher;
pub mod report;
pub mod stats;
pub mod storage;
pub mod window;

// Re-export primary API types at crate root for convenience.
pub use analyzer::{Analyzer, analyze};
pub use config::AnalysisConfig;
pub use error::{AnalyzerError, Result};
pub use index::{ChunkMeta, ChunkRef, IndexShard, IndexStore, Series, ShardScope};
pub use labels::{Fingerprint, Labels};
pub use matcher::{LabelMatcher, MatchType};
pub use report::Summary;
pub use stats::{ChunkExtremes, RunStatistics};
pub use window::TimeRange;
