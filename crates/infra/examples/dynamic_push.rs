//! Example: pushing metrics on remotely managed schedules
//!
//! Loads settings from the environment or a `dynmetric.{json,toml}` file,
//! starts a push controller against the configured service and logs every
//! export until Ctrl-C.
//!
//! ```bash
//! DYNMETRIC_CONFIG_HOST=http://localhost:7070 \
//! DYNMETRIC_RESOURCE=service.name=demo \
//! RUST_LOG=info,dynmetric_infra=debug \
//! cargo run -p dynmetric-infra --example dynamic_push
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dynmetric_core::{
    Accumulator, BasicProcessor, CheckpointSet, CollectionRule, Exporter, Processor, Record,
};
use dynmetric_domain::{Resource, Result};
use dynmetric_infra::{config, PushController, PushControllerOptions};
use tracing_subscriber::EnvFilter;

/// Three instruments with made-up readings.
#[derive(Debug, Default)]
struct DemoAccumulator {
    requests: AtomicU64,
}

#[async_trait]
impl Accumulator for DemoAccumulator {
    async fn collect(&self, rule: &CollectionRule<'_>, processor: &mut dyn Processor) -> usize {
        let requests = self.requests.fetch_add(17, Ordering::Relaxed) as f64;
        let readings = [
            Record::new("http.server.requests", requests),
            Record::new("http.server.latency", 12.5),
            Record::new("runtime.heap.bytes", 48_000_000.0),
        ];

        let mut collected = 0;
        for record in readings {
            if rule.is_due(&record.name) && processor.process(record).is_ok() {
                collected += 1;
            }
        }
        collected
    }
}

/// Stand-in for a real exporter.
#[derive(Debug)]
struct LoggingExporter;

#[async_trait]
impl Exporter for LoggingExporter {
    async fn export(&self, resource: &Resource, checkpoint_set: &CheckpointSet) -> Result<()> {
        tracing::info!(
            service = resource.get("service.name").unwrap_or("unknown"),
            instruments = ?checkpoint_set.names(),
            "export"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load()?;
    let controller = PushController::new(
        Arc::new(DemoAccumulator::default()),
        BasicProcessor::new(),
        Arc::new(LoggingExporter),
        PushControllerOptions::from_settings(&settings),
    );

    controller.start().await?;
    tracing::info!(host = %settings.config_host, "waiting for Ctrl-C");
    tokio::signal::ctrl_c().await?;

    controller.stop().await?;
    tracing::info!(metrics = ?controller.metrics(), "stopped");
    Ok(())
}
