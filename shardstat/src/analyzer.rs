//! Per-tenant index walk and per-shard analysis.
//!
//! # Flow
//!
//! 1. Label matchers are built once from the config; a malformed filter
//!    fails the run before storage is touched.
//! 2. Tenants are walked in order. For each tenant the store enumerates its
//!    shards; multi-tenant shards are skipped.
//! 3. Each single-tenant shard gets three sequential lookups: filtered
//!    series, filtered chunk refs, and an unfiltered full-range scan feeding
//!    [`ChunkExtremes`].
//! 4. The shard's counts are committed to [`RunStatistics`] only after all
//!    three succeed. The first error aborts the whole run.
//!
//! Everything runs on the calling thread, one shard at a time.

use std::ops::ControlFlow;
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::index::{ChunkRef, IndexShard, IndexStore, Series};
use crate::matcher::LabelMatcher;
use crate::report::Summary;
use crate::stats::{RunStatistics, ShardStatistics};
use crate::window::TimeRange;

/// Walks tenants and shards, accumulating [`RunStatistics`].
///
/// The series and chunk-ref buffers are reused across shards and cleared
/// before each one, so memory stays bounded by the largest shard.
#[derive(Debug)]
pub struct Analyzer<'a> {
    config: &'a AnalysisConfig,
    matchers: Vec<LabelMatcher>,
    stats: RunStatistics,
    series_buf: Vec<Series>,
    chunk_buf: Vec<ChunkRef>,
}

impl<'a> Analyzer<'a> {
    /// Creates an analyzer, building the run's label matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or a label filter is malformed.
    pub fn new(config: &'a AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let matchers = config.matchers()?;

        Ok(Self {
            config,
            matchers,
            stats: RunStatistics::new(config.hot_series_threshold),
            series_buf: Vec::new(),
            chunk_buf: Vec::new(),
        })
    }

    /// Statistics accumulated so far.
    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    /// Builds the report from the statistics accumulated so far.
    pub fn summary(&self) -> Summary {
        self.stats.summary()
    }

    /// Analyzes the configured tenants, or every tenant the store lists when
    /// none are configured, and returns the report.
    ///
    /// # Errors
    ///
    /// Returns the first storage or lookup error. No report is produced then.
    pub fn run<S: IndexStore + ?Sized>(mut self, store: &S) -> Result<Summary> {
        let config = self.config;
        let tenants = if config.tenants.is_empty() {
            let discovered = store.list_tenants(&config.table)?;
            info!(table = %config.table, count = discovered.len(), "resolved tenants from storage");
            discovered
        } else {
            config.tenants.clone()
        };

        self.analyze_tenants(store, &tenants)?;
        Ok(self.summary())
    }

    /// Analyzes `tenants` in order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error; later tenants are not visited.
    pub fn analyze_tenants<S, T>(&mut self, store: &S, tenants: &[T]) -> Result<()>
    where
        S: IndexStore + ?Sized,
        T: AsRef<str>,
    {
        for tenant in tenants {
            self.analyze_tenant(store, tenant.as_ref())?;
        }
        Ok(())
    }

    /// Analyzes every single-tenant shard the store enumerates for `tenant`.
    ///
    /// # Errors
    ///
    /// Returns the enumeration error or the first shard error.
    pub fn analyze_tenant<S: IndexStore + ?Sized>(&mut self, store: &S, tenant: &str) -> Result<()> {
        let config = self.config;
        info!(
            tenant,
            table = %config.table,
            window = %config.window,
            matchers = %format_matchers(&self.matchers),
            "analyzing tenant"
        );

        store.for_each_shard(&config.table, tenant, &mut |scope, shard| {
            if scope.is_multi_tenant() {
                debug!(tenant, "skipping multi-tenant shard");
                self.stats.record_skipped();
                return Ok(());
            }
            self.analyze_shard(shard, tenant)
        })
    }

    /// Runs the three lookups on one shard and commits its counts.
    ///
    /// # Errors
    ///
    /// Returns the first lookup error. The shard then contributes nothing.
    pub fn analyze_shard(&mut self, shard: &dyn IndexShard, tenant: &str) -> Result<()> {
        let started = Instant::now();
        let window = self.config.window;

        self.series_buf.clear();
        self.chunk_buf.clear();

        shard.series(tenant, window, &mut self.series_buf, &self.matchers)?;
        for series in &self.series_buf {
            debug!(tenant, fingerprint = %series.fingerprint, labels = %series.labels, "matched series");
        }

        shard.chunk_refs(tenant, window, &mut self.chunk_buf, &self.matchers)?;
        for chunk in &self.chunk_buf {
            debug!(
                tenant = %chunk.tenant,
                fingerprint = %chunk.fingerprint,
                start = chunk.start,
                end = chunk.end,
                "matched chunk ref"
            );
        }

        let mut extremes = self.stats.extremes();
        shard.for_each_series(
            tenant,
            &[LabelMatcher::match_all()],
            TimeRange::full(),
            &mut |_, _, chunks| {
                extremes.observe(chunks.len());
                ControlFlow::Continue(())
            },
        )?;

        self.stats.commit(ShardStatistics {
            series: self.series_buf.len(),
            chunks: self.chunk_buf.len(),
            extremes,
        });

        trace!(
            tenant,
            series = self.series_buf.len(),
            chunks = self.chunk_buf.len(),
            elapsed = ?started.elapsed(),
            "shard analyzed"
        );
        Ok(())
    }
}

/// Builds the matchers for `config`, walks the store, and returns the report.
///
/// # Errors
///
/// Returns a filter or config error before touching storage, otherwise the
/// first storage or lookup error.
///
/// # Examples
///
/// ```rust
/// use shardstat::storage::{MemoryIndexStore, MemoryShard};
/// use shardstat::{AnalysisConfig, ChunkMeta, Labels, ShardScope};
///
/// # fn main() -> shardstat::Result<()> {
/// let mut shard = MemoryShard::new();
/// shard.push("tenant-a", Labels::new([("job", "api")]), vec![ChunkMeta::new(0, 10)]);
///
/// let mut store = MemoryIndexStore::new();
/// store.add_shard("index_1", "tenant-a", ShardScope::SingleTenant, shard);
///
/// let summary = shardstat::analyze(&store, &AnalysisConfig::new("index_1"))?;
/// assert_eq!(summary.total_series, 1);
/// assert_eq!(summary.total_chunks, 1);
/// # Ok(())
/// # }
/// ```
pub fn analyze<S: IndexStore + ?Sized>(store: &S, config: &AnalysisConfig) -> Result<Summary> {
    Analyzer::new(config)?.run(store)
}

fn format_matchers(matchers: &[LabelMatcher]) -> String {
    let parts: Vec<String> = matchers.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}
