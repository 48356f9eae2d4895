//! Run configuration.
//!
//! An [`AnalysisConfig`] is built once at startup (from a JSON file, flags,
//! or both) and passed by reference into the analyzer. The library never
//! reads the environment itself.
//!
//! # File format
//!
//! ```json
//! {
//!   "table": "index_19453",
//!   "tenants": ["29", "fake"],
//!   "window": { "from": 1680739200000, "to": 1680825599000 },
//!   "label_filters": ["cluster=dev-us-east-0", "namespace=loki"],
//!   "hot_series_threshold": 1000
//! }
//! ```
//!
//! Every field except `table` is optional. An empty `tenants` list means
//! "discover tenants from storage"; a missing window means the full range.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::matcher::{self, LabelMatcher};
use crate::stats::DEFAULT_HOT_SERIES_THRESHOLD;
use crate::window::TimeRange;

/// Everything the analyzer needs to know about a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Index table to analyze.
    pub table: String,

    /// Tenants to analyze, in report order. Empty means discover from storage.
    #[serde(default)]
    pub tenants: Vec<String>,

    /// Time window applied to the filtered lookups.
    #[serde(default)]
    pub window: TimeRange,

    /// Raw `key=value` label filters.
    #[serde(default)]
    pub label_filters: Vec<String>,

    /// Chunk count a series must exceed to count as hot.
    #[serde(default = "default_hot_series_threshold")]
    pub hot_series_threshold: usize,
}

fn default_hot_series_threshold() -> usize {
    DEFAULT_HOT_SERIES_THRESHOLD
}

impl AnalysisConfig {
    /// Creates a config for `table` with every other field at its default.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            tenants: Vec::new(),
            window: TimeRange::full(),
            label_filters: Vec::new(),
            hot_series_threshold: DEFAULT_HOT_SERIES_THRESHOLD,
        }
    }

    /// Loads a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or if
    /// the loaded config fails [`AnalysisConfig::validate`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the tenants to analyze.
    pub fn with_tenants<I, S>(mut self, tenants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tenants = tenants.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the analysis window.
    pub fn with_window(mut self, window: TimeRange) -> Self {
        self.window = window;
        self
    }

    /// Sets the raw label filters.
    pub fn with_label_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_filters = filters.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the hot-series threshold.
    pub fn with_hot_series_threshold(mut self, threshold: usize) -> Self {
        self.hot_series_threshold = threshold;
        self
    }

    /// Validates the config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty table name or an inverted
    /// window, and [`FilterError`](crate::error::FilterError) for a
    /// malformed label filter.
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(ConfigError::EmptyTable.into());
        }
        self.window.validate()?;
        self.matchers()?;
        Ok(())
    }

    /// Builds the label matchers for this run.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`](crate::error::FilterError) for the first
    /// malformed filter entry.
    pub fn matchers(&self) -> Result<Vec<LabelMatcher>> {
        Ok(matcher::parse_filters(&self.label_filters)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;

    #[test]
    fn test_load_minimal_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, r#"{ "table": "index_19453" }"#).unwrap();

        let config = AnalysisConfig::load(&path).unwrap();
        assert_eq!(config, AnalysisConfig::new("index_19453"));
        assert!(config.window.is_full());
        assert_eq!(config.hot_series_threshold, 1000);
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(
            &path,
            r#"{
                "table": "index_19453",
                "tenants": ["b", "a"],
                "window": { "from": 10, "to": 20 },
                "label_filters": ["job=api"],
                "hot_series_threshold": 50
            }"#,
        )
        .unwrap();

        let config = AnalysisConfig::load(&path).unwrap();
        assert_eq!(config.tenants, vec!["b", "a"]);
        assert_eq!(config.window, TimeRange { from: 10, to: 20 });
        assert_eq!(config.matchers().unwrap(), vec![LabelMatcher::equal("job", "api")]);
        assert_eq!(config.hot_series_threshold, 50);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = AnalysisConfig::load(dir.path().join("missing.json"));
        assert!(matches!(
            missing,
            Err(AnalyzerError::Config(ConfigError::Read { .. }))
        ));

        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AnalysisConfig::load(&path),
            Err(AnalyzerError::Config(ConfigError::Parse { .. }))
        ));

        fs::write(&path, r#"{ "table": "t", "label_filters": ["nope"] }"#).unwrap();
        assert!(matches!(
            AnalysisConfig::load(&path),
            Err(AnalyzerError::Filter(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(AnalysisConfig::new("index_1").validate().is_ok());
        assert!(matches!(
            AnalysisConfig::new("  ").validate(),
            Err(AnalyzerError::Config(ConfigError::EmptyTable))
        ));

        let inverted = AnalysisConfig::new("index_1").with_window(TimeRange { from: 5, to: 1 });
        assert!(matches!(
            inverted.validate(),
            Err(AnalyzerError::Config(ConfigError::InvalidWindow { from: 5, to: 1 }))
        ));
    }
}
