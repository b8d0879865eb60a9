//! Configuration poll metrics
//!
//! ## Design
//! - **SeqCst ordering** for the counters used in derived metrics
//!   (`avg_poll_time_ms`)
//! - **Relaxed** for independent counters
//! - **Microsecond storage** for latencies

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::observability::{MetricsError, MetricsResult};

/// Metrics for the configuration notifier
#[derive(Debug, Default)]
pub struct PollMetrics {
    total_poll_time_micros: AtomicU64,
    last_poll_time_micros: AtomicU64,
    polls: AtomicUsize,
    configs_delivered: AtomicUsize,
    unchanged: AtomicUsize,
    errors: AtomicUsize,
    interval_changes: AtomicUsize,
}

impl PollMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed round-trip, successful or not.
    pub fn record_poll(&self, duration: Duration) -> MetricsResult<()> {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        // SeqCst for consistency with avg_poll_time_ms
        self.total_poll_time_micros.fetch_add(micros, Ordering::SeqCst);
        self.polls.fetch_add(1, Ordering::SeqCst);

        // Relaxed OK: not used in derived metrics
        self.last_poll_time_micros.store(micros, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_config_delivered(&self) -> MetricsResult<()> {
        self.configs_delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_unchanged(&self) -> MetricsResult<()> {
        self.unchanged.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_error(&self) -> MetricsResult<()> {
        self.errors.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_interval_change(&self) -> MetricsResult<()> {
        self.interval_changes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Average round-trip in milliseconds
    ///
    /// # Errors
    /// `MetricsError::EmptyData` before the first poll.
    pub fn avg_poll_time_ms(&self) -> MetricsResult<f64> {
        let total = self.total_poll_time_micros.load(Ordering::SeqCst);
        let count = self.polls.load(Ordering::SeqCst);
        if count == 0 {
            return Err(MetricsError::EmptyData { metric: "average poll time" });
        }
        #[allow(clippy::cast_precision_loss)]
        Ok((total as f64 / count as f64) / 1_000.0)
    }

    pub fn last_poll_time_ms(&self) -> u64 {
        self.last_poll_time_micros.load(Ordering::Relaxed) / 1_000
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn configs_delivered(&self) -> usize {
        self.configs_delivered.load(Ordering::Relaxed)
    }

    pub fn unchanged_count(&self) -> usize {
        self.unchanged.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn interval_changes(&self) -> usize {
        self.interval_changes.load(Ordering::Relaxed)
    }
}
