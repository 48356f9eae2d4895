//! Error types for the shardstat index analyzer.
//!
//! Every failure is fatal for a run: there is no retry and no partial report.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for all shardstat operations.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// A label filter entry could not be turned into a matcher.
    #[error("label filter error: {0}")]
    Filter(#[from] FilterError),

    /// The run configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The index storage failed while enumerating or reading shards.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors raised while building label matchers from `key=value` entries.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    /// The entry has no `=` separator.
    #[error("label filter '{entry}' is missing the '=' separator")]
    MissingSeparator {
        /// The raw entry.
        entry: String,
    },

    /// The entry has more than one `=` separator.
    #[error("label filter '{entry}' has {count} '=' separators, expected exactly one")]
    MultipleSeparators {
        /// The raw entry.
        entry: String,
        /// How many separators were found.
        count: usize,
    },

    /// The entry has an empty label name.
    #[error("label filter '{entry}' has an empty label name")]
    EmptyName {
        /// The raw entry.
        entry: String,
    },
}

/// Errors raised while loading or validating an [`AnalysisConfig`](crate::AnalysisConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A timestamp did not match `YYYY-MM-DD HH:MM:SS`.
    #[error("invalid timestamp '{input}': {source}")]
    InvalidTimestamp {
        /// The text that failed to parse.
        input: String,
        /// The underlying parse error.
        #[source]
        source: time::error::Parse,
    },

    /// The analysis window ends before it starts.
    #[error("invalid window: from {from} is after to {to}")]
    InvalidWindow {
        /// Window start in milliseconds.
        from: i64,
        /// Window end in milliseconds.
        to: i64,
    },

    /// No table name was given.
    #[error("table name must not be empty")]
    EmptyTable,

    /// The config file could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        /// The config file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for an analysis config.
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        /// The config file path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by an index storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The table does not exist in the index directory.
    #[error("table '{table}' not found at '{}'", path.display())]
    TableNotFound {
        /// The requested table.
        table: String,
        /// Where the table was expected.
        path: PathBuf,
    },

    /// A directory listing failed.
    #[error("failed to list '{}': {source}", path.display())]
    Listing {
        /// The directory being listed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A shard file could not be opened or mapped.
    #[error("failed to open shard '{}': {source}", path.display())]
    ShardOpen {
        /// The shard file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A shard file could not be decoded.
    #[error("failed to decode shard '{}': {source}", path.display())]
    ShardParse {
        /// The shard file path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A shard decoded but its content is inconsistent.
    #[error("shard '{}' is corrupted: {reason}", path.display())]
    CorruptedShard {
        /// The shard file path.
        path: PathBuf,
        /// Description of the corruption.
        reason: String,
    },

    /// A series, chunk-ref or scan lookup failed inside a shard.
    #[error("lookup failed for tenant '{tenant}': {reason}")]
    Lookup {
        /// The tenant being analyzed.
        tenant: String,
        /// Description of the failure.
        reason: String,
    },
}

/// Type alias for `Result<T, AnalyzerError>`.
pub type Result<T> = std::result::Result<T, AnalyzerError>;
