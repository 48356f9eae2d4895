//! Final run report.

use std::fmt;

use serde::Serialize;

/// Summary printed once every tenant has been analyzed.
///
/// A non-finite average serializes to JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Series matched by the label filter.
    pub total_series: usize,
    /// Chunk refs matched by the label filter.
    pub total_chunks: usize,
    /// `total_chunks / total_series`.
    pub average_chunks_per_series: f64,
    /// Largest chunk count of any series in the analyzed shards.
    pub max_chunks_per_series: usize,
    /// Hot-series counter, gated on new maxima.
    pub series_over_threshold: usize,
    /// Chunk count a series must exceed to count as hot.
    pub hot_series_threshold: usize,
    /// Single-tenant shards analyzed.
    pub shards_analyzed: usize,
    /// Multi-tenant shards skipped.
    pub shards_skipped: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "analyzed {} series and {} chunks for an average of {:.6} chunks per series. \
             max chunks/series was {}. number of series with over {} chunks: {}",
            self.total_series,
            self.total_chunks,
            self.average_chunks_per_series,
            self.max_chunks_per_series,
            self.hot_series_threshold,
            self.series_over_threshold,
        )?;
        write!(
            f,
            "shards analyzed: {}, multi-tenant shards skipped: {}",
            self.shards_analyzed, self.shards_skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(total_series: usize, total_chunks: usize) -> Summary {
        #[allow(clippy::cast_precision_loss)]
        let average = total_chunks as f64 / total_series as f64;
        Summary {
            total_series,
            total_chunks,
            average_chunks_per_series: average,
            max_chunks_per_series: 3000,
            series_over_threshold: 2,
            hot_series_threshold: 1000,
            shards_analyzed: 2,
            shards_skipped: 0,
        }
    }

    #[test]
    fn test_text_report() {
        let text = summary(5, 9).to_string();
        assert_eq!(
            text,
            "analyzed 5 series and 9 chunks for an average of 1.800000 chunks per series. \
             max chunks/series was 3000. number of series with over 1000 chunks: 2\n\
             shards analyzed: 2, multi-tenant shards skipped: 0"
        );
    }

    #[test]
    fn test_non_finite_average() {
        let nan = summary(0, 0);
        assert!(nan.to_string().contains("average of NaN"));

        let inf = summary(0, 4);
        assert!(inf.to_string().contains("average of inf"));

        let json = serde_json::to_value(&nan).unwrap();
        assert!(json["average_chunks_per_series"].is_null());
        assert_eq!(json["total_series"], 0);
    }
}
