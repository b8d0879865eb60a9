//! Test doubles for the collection and transport ports
//!
//! Enabled with the `test-utils` feature. Every double is cheap to clone
//! and shares its recorded state between clones.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dynmetric_domain::{ConfigRequest, ConfigResponse, DynMetricError, Resource, Result};
use parking_lot::Mutex;

use crate::collection::ports::{Accumulator, CheckpointSet, Exporter, Processor, Record};
use crate::config_ports::{ConfigTransport, TransportConnector};
use crate::schedule::resolver::CollectionRule;

// ============================================================================
// Accumulator
// ============================================================================

#[derive(Debug, Default)]
struct AccumulatorState {
    instruments: Mutex<Vec<Record>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
    in_flight: AtomicBool,
    overlaps: AtomicUsize,
}

/// Accumulator over a fixed instrument list
///
/// Counts calls and records any call made while another is still running.
#[derive(Debug, Clone, Default)]
pub struct MockAccumulator {
    state: Arc<AccumulatorState>,
}

impl MockAccumulator {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let acc = Self::default();
        for name in names {
            acc.add_instrument(name, 1.0);
        }
        acc
    }

    pub fn add_instrument(&self, name: impl Into<String>, value: f64) {
        self.state.instruments.lock().push(Record::new(name, value));
    }

    /// Sleep for `delay` inside every collect call.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Number of collect calls that started while another was in progress.
    pub fn overlapping_calls(&self) -> usize {
        self.state.overlaps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Accumulator for MockAccumulator {
    async fn collect(&self, rule: &CollectionRule<'_>, processor: &mut dyn Processor) -> usize {
        if self.state.in_flight.swap(true, Ordering::SeqCst) {
            self.state.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        self.state.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.state.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let instruments = self.state.instruments.lock().clone();
        let mut collected = 0;
        for record in instruments {
            if rule.is_due(&record.name) && processor.process(record).is_ok() {
                collected += 1;
            }
        }

        self.state.in_flight.store(false, Ordering::SeqCst);
        collected
    }
}

// ============================================================================
// Exporter
// ============================================================================

#[derive(Debug, Default)]
struct ExporterState {
    exports: Mutex<Vec<CheckpointSet>>,
    resources: Mutex<Vec<Resource>>,
    failures: Mutex<VecDeque<DynMetricError>>,
    delay: Mutex<Option<Duration>>,
}

/// Exporter that remembers every checkpoint set it was handed
#[derive(Debug, Clone, Default)]
pub struct RecordingExporter {
    state: Arc<ExporterState>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next export return `err` instead of recording.
    pub fn fail_next(&self, err: DynMetricError) {
        self.state.failures.lock().push_back(err);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = Some(delay);
    }

    pub fn exports(&self) -> Vec<CheckpointSet> {
        self.state.exports.lock().clone()
    }

    pub fn export_count(&self) -> usize {
        self.state.exports.lock().len()
    }

    /// Drain recorded exports.
    pub fn take_exports(&self) -> Vec<CheckpointSet> {
        std::mem::take(&mut *self.state.exports.lock())
    }

    pub fn last_resource(&self) -> Option<Resource> {
        self.state.resources.lock().last().cloned()
    }
}

#[async_trait]
impl Exporter for RecordingExporter {
    async fn export(&self, resource: &Resource, checkpoint_set: &CheckpointSet) -> Result<()> {
        let delay = *self.state.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.state.failures.lock().pop_front();
        if let Some(err) = failure {
            return Err(err);
        }

        self.state.resources.lock().push(resource.clone());
        self.state.exports.lock().push(checkpoint_set.clone());
        Ok(())
    }
}

// ============================================================================
// Configuration transport
// ============================================================================

#[derive(Debug, Default)]
struct TransportState {
    script: Mutex<VecDeque<Result<ConfigResponse>>>,
    repeat: Mutex<Option<Result<ConfigResponse>>>,
    requests: Mutex<Vec<ConfigRequest>>,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

/// Scripted configuration transport
///
/// Each fetch pops the next scripted outcome. Once the script runs dry the
/// last outcome is repeated, which models a server whose configuration no
/// longer changes. With nothing ever scripted a fetch fails.
#[derive(Debug, Clone, Default)]
pub struct MockConfigTransport {
    state: Arc<TransportState>,
}

impl MockConfigTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: ConfigResponse) {
        self.state.script.lock().push_back(Ok(response));
    }

    pub fn push_error(&self, err: DynMetricError) {
        self.state.script.lock().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<ConfigRequest> {
        self.state.requests.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state.requests.lock().len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.state.close_calls.load(Ordering::SeqCst)
    }

    /// Accept fetches again after a close. The script and request log carry
    /// over, as they would for a new connection to the same server.
    pub fn reopen(&self) {
        self.state.closed.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConfigTransport for MockConfigTransport {
    async fn fetch(&self, request: ConfigRequest) -> Result<ConfigResponse> {
        if self.is_closed() {
            return Err(DynMetricError::Transport("transport closed".to_string()));
        }
        self.state.requests.lock().push(request);

        let next = self.state.script.lock().pop_front();
        match next {
            Some(outcome) => {
                *self.state.repeat.lock() = Some(outcome.clone());
                outcome
            }
            None => self.state.repeat.lock().clone().unwrap_or_else(|| {
                Err(DynMetricError::Transport("no scripted response".to_string()))
            }),
        }
    }

    async fn close(&self) -> Result<()> {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        self.state.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector handing out one shared [`MockConfigTransport`]
///
/// Every successful connect reopens the transport, so a controller can be
/// stopped and started again against the same script.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    transport: MockConfigTransport,
    failure: Arc<Mutex<Option<DynMetricError>>>,
    hosts: Arc<Mutex<Vec<String>>>,
}

impl MockConnector {
    pub fn new(transport: MockConfigTransport) -> Self {
        Self { transport, ..Self::default() }
    }

    /// Connector whose every connect attempt fails with `err`.
    pub fn failing(err: DynMetricError) -> Self {
        let connector = Self::default();
        *connector.failure.lock() = Some(err);
        connector
    }

    pub fn transport(&self) -> &MockConfigTransport {
        &self.transport
    }

    pub fn hosts(&self) -> Vec<String> {
        self.hosts.lock().clone()
    }
}

#[async_trait]
impl TransportConnector for MockConnector {
    async fn connect(&self, host: &str) -> Result<Arc<dyn ConfigTransport>> {
        self.hosts.lock().push(host.to_owned());
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        self.transport.reopen();
        Ok(Arc::new(self.transport.clone()))
    }
}
