//! Run-level counters.
//!
//! [`RunStatistics`] is the only state that outlives a shard. The analyzer
//! stages each shard's contribution in a [`ShardStatistics`] and commits it
//! only once every lookup on that shard has succeeded.

use crate::report::Summary;

/// Default chunk count above which a series counts as hot.
pub const DEFAULT_HOT_SERIES_THRESHOLD: usize = 1000;

/// Running maximum of chunks per series, plus the hot-series counter gated on it.
///
/// The counter only moves when a series raises the running maximum *and*
/// its chunk count is above the threshold. A series above the threshold
/// that does not beat the current maximum is not counted, so the result
/// depends on visit order.
///
/// ```rust
/// use shardstat::ChunkExtremes;
///
/// let mut extremes = ChunkExtremes::new(1000);
/// for count in [5, 1500, 1200, 2000, 1800] {
///     extremes.observe(count);
/// }
/// assert_eq!(extremes.max_chunks_per_series(), 2000);
/// assert_eq!(extremes.series_over_threshold(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkExtremes {
    threshold: usize,
    max_chunks_per_series: usize,
    series_over_threshold: usize,
}

impl ChunkExtremes {
    /// Creates an empty tracker with the given hot-series threshold.
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            max_chunks_per_series: 0,
            series_over_threshold: 0,
        }
    }

    /// Feeds one series' chunk count.
    pub fn observe(&mut self, chunk_count: usize) {
        if chunk_count > self.max_chunks_per_series {
            self.max_chunks_per_series = chunk_count;
            if chunk_count > self.threshold {
                self.series_over_threshold += 1;
            }
        }
    }

    /// Hot-series threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Largest chunk count seen so far.
    pub fn max_chunks_per_series(&self) -> usize {
        self.max_chunks_per_series
    }

    /// Number of maximum raises that landed above the threshold.
    pub fn series_over_threshold(&self) -> usize {
        self.series_over_threshold
    }
}

impl Default for ChunkExtremes {
    fn default() -> Self {
        Self::new(DEFAULT_HOT_SERIES_THRESHOLD)
    }
}

/// One shard's contribution, staged until the shard completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardStatistics {
    /// Series returned by the filtered series lookup.
    pub series: usize,
    /// Chunk refs returned by the filtered chunk lookup.
    pub chunks: usize,
    /// Run-level extremes after scanning this shard.
    pub extremes: ChunkExtremes,
}

/// Accumulator for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    total_series: usize,
    total_chunks: usize,
    extremes: ChunkExtremes,
    shards_analyzed: usize,
    shards_skipped: usize,
}

impl RunStatistics {
    /// Creates empty statistics with the given hot-series threshold.
    pub fn new(hot_series_threshold: usize) -> Self {
        Self {
            extremes: ChunkExtremes::new(hot_series_threshold),
            ..Self::default()
        }
    }

    /// Applies a completed shard's contribution.
    pub fn commit(&mut self, shard: ShardStatistics) {
        self.total_series += shard.series;
        self.total_chunks += shard.chunks;
        self.extremes = shard.extremes;
        self.shards_analyzed += 1;
    }

    /// Records a shard that was passed over without analysis.
    pub fn record_skipped(&mut self) {
        self.shards_skipped += 1;
    }

    /// Snapshot of the running extremes, used as the starting point of a shard scan.
    pub fn extremes(&self) -> ChunkExtremes {
        self.extremes
    }

    /// Series matched across all committed shards.
    pub fn total_series(&self) -> usize {
        self.total_series
    }

    /// Chunk refs matched across all committed shards.
    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    /// Largest chunk count of any scanned series.
    pub fn max_chunks_per_series(&self) -> usize {
        self.extremes.max_chunks_per_series()
    }

    /// Hot-series counter (see [`ChunkExtremes`]).
    pub fn series_over_threshold(&self) -> usize {
        self.extremes.series_over_threshold()
    }

    /// Shards that were analyzed and committed.
    pub fn shards_analyzed(&self) -> usize {
        self.shards_analyzed
    }

    /// Multi-tenant shards that were skipped.
    pub fn shards_skipped(&self) -> usize {
        self.shards_skipped
    }

    /// `total_chunks / total_series` as a float.
    ///
    /// Not guarded: with no series this is NaN (or infinity when chunks
    /// were matched without series).
    #[allow(clippy::cast_precision_loss)] // Display-only ratio
    pub fn average_chunks_per_series(&self) -> f64 {
        self.total_chunks as f64 / self.total_series as f64
    }

    /// Builds the final report.
    pub fn summary(&self) -> Summary {
        Summary {
            total_series: self.total_series,
            total_chunks: self.total_chunks,
            average_chunks_per_series: self.average_chunks_per_series(),
            max_chunks_per_series: self.max_chunks_per_series(),
            series_over_threshold: self.series_over_threshold(),
            hot_series_threshold: self.extremes.threshold(),
            shards_analyzed: self.shards_analyzed,
            shards_skipped: self.shards_skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_counts_only_on_new_maximum() {
        let mut extremes = ChunkExtremes::default();
        for count in [5, 1500, 1200, 2000, 1800] {
            extremes.observe(count);
        }
        assert_eq!(extremes.max_chunks_per_series(), 2000);
        assert_eq!(extremes.series_over_threshold(), 2);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut extremes = ChunkExtremes::new(1000);
        extremes.observe(1000);
        assert_eq!(extremes.max_chunks_per_series(), 1000);
        assert_eq!(extremes.series_over_threshold(), 0);

        // Equal counts do not raise the maximum.
        extremes.observe(1001);
        extremes.observe(1001);
        assert_eq!(extremes.series_over_threshold(), 1);
    }

    #[test]
    fn test_custom_threshold() {
        let mut extremes = ChunkExtremes::new(10);
        for count in [3, 11, 12, 4] {
            extremes.observe(count);
        }
        assert_eq!(extremes.threshold(), 10);
        assert_eq!(extremes.series_over_threshold(), 2);
    }

    #[test]
    fn test_commit_accumulates() {
        let mut stats = RunStatistics::new(1000);

        let mut extremes = stats.extremes();
        extremes.observe(10);
        extremes.observe(2000);
        stats.commit(ShardStatistics {
            series: 3,
            chunks: 5,
            extremes,
        });

        let mut extremes = stats.extremes();
        extremes.observe(2000);
        extremes.observe(3000);
        stats.commit(ShardStatistics {
            series: 2,
            chunks: 4,
            extremes,
        });
        stats.record_skipped();

        assert_eq!(stats.total_series(), 5);
        assert_eq!(stats.total_chunks(), 9);
        assert_eq!(stats.max_chunks_per_series(), 3000);
        assert_eq!(stats.series_over_threshold(), 2);
        assert_eq!(stats.shards_analyzed(), 2);
        assert_eq!(stats.shards_skipped(), 1);
        assert!((stats.average_chunks_per_series() - 1.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_average_is_not_finite() {
        let stats = RunStatistics::default();
        assert!(!stats.average_chunks_per_series().is_finite());
        assert!(stats.summary().to_string().contains("NaN"));
    }
}
