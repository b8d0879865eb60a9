//! Observability infrastructure for the notifier and the push controller
//!
//! Lock-free counters only; every record method returns `MetricsResult<()>`
//! so limits can be added later without changing call sites. Today they
//! always succeed.

pub mod metrics;

/// Metrics error type
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Empty data set - cannot calculate aggregate metric
    #[error("Empty data: cannot calculate {metric}")]
    EmptyData {
        /// Metric name that failed (e.g., "average")
        metric: &'static str,
    },
}

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Log and drop a failed metric update.
pub(crate) fn log_metric(result: MetricsResult<()>, metric: &'static str) {
    if let Err(err) = result {
        tracing::warn!(metric = metric, error = ?err, "Failed to record metric");
    }
}
