//! Push controller metrics

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::observability::MetricsResult;

/// Counters for the collection loop
#[derive(Debug, Default)]
pub struct ControllerMetrics {
    ticks: AtomicUsize,
    exports: AtomicUsize,
    export_errors: AtomicUsize,
    collection_errors: AtomicUsize,
    timeouts: AtomicUsize,
    reconfigurations: AtomicUsize,
    instruments_collected: AtomicUsize,
}

impl ControllerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self) -> MetricsResult<()> {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_export(&self, instruments: usize) -> MetricsResult<()> {
        self.exports.fetch_add(1, Ordering::Relaxed);
        self.instruments_collected.fetch_add(instruments, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_export_error(&self) -> MetricsResult<()> {
        self.export_errors.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_collection_error(&self) -> MetricsResult<()> {
        self.collection_errors.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_timeout(&self) -> MetricsResult<()> {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_reconfiguration(&self) -> MetricsResult<()> {
        self.reconfigurations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn exports(&self) -> usize {
        self.exports.load(Ordering::Relaxed)
    }

    pub fn export_errors(&self) -> usize {
        self.export_errors.load(Ordering::Relaxed)
    }

    pub fn collection_errors(&self) -> usize {
        self.collection_errors.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> usize {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub fn reconfigurations(&self) -> usize {
        self.reconfigurations.load(Ordering::Relaxed)
    }

    pub fn instruments_collected(&self) -> usize {
        self.instruments_collected.load(Ordering::Relaxed)
    }
}
