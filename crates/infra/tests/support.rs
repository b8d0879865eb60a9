//! Shared harness for push controller integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use dynmetric_common::RecordingErrorHandler;
use dynmetric_core::testing::{MockAccumulator, MockConfigTransport, MockConnector, RecordingExporter};
use dynmetric_core::BasicProcessor;
use dynmetric_domain::{ConfigResponse, Pattern, Resource, Schedule};
use dynmetric_infra::{PushController, PushControllerOptions};

/// A controller wired to in-memory collaborators.
pub struct Harness {
    pub controller: PushController,
    pub accumulator: MockAccumulator,
    pub exporter: RecordingExporter,
    pub transport: MockConfigTransport,
    pub errors: Arc<RecordingErrorHandler>,
}

impl Harness {
    pub fn new(instruments: &[&str], poll_interval: Duration) -> Self {
        let accumulator = MockAccumulator::new(instruments.iter().copied());
        let exporter = RecordingExporter::new();
        let transport = MockConfigTransport::new();
        let errors = Arc::new(RecordingErrorHandler::new());

        let options = PushControllerOptions::new("mock://config")
            .with_resource(Resource::new([("service.name", "scenario")]))
            .with_connector(Arc::new(MockConnector::new(transport.clone())))
            .with_error_handler(errors.clone())
            .with_poll_interval(poll_interval);

        let controller = PushController::new(
            Arc::new(accumulator.clone()),
            BasicProcessor::new(),
            Arc::new(exporter.clone()),
            options,
        );

        Self { controller, accumulator, exporter, transport, errors }
    }

    /// Names exported by every recorded export, in order.
    pub fn exported_names(&self) -> Vec<Vec<String>> {
        self.exporter
            .exports()
            .iter()
            .map(|set| set.names().into_iter().map(str::to_owned).collect())
            .collect()
    }
}

pub fn schedule(prefix: &str, period_sec: i32) -> Schedule {
    Schedule::new(vec![Pattern::starts_with(prefix)], period_sec)
}

pub fn config(fingerprint: &str, schedules: Vec<Schedule>) -> ConfigResponse {
    ConfigResponse::new(fingerprint, schedules)
}

/// Advance paused time to `secs` after `origin`.
pub async fn advance_to(origin: tokio::time::Instant, secs: f64) {
    tokio::time::sleep_until(origin + Duration::from_secs_f64(secs)).await;
}
