//! Single round-trip configuration reader

use std::sync::Arc;

use dynmetric_common::Clock;
use dynmetric_core::ConfigTransport;
use dynmetric_domain::constants::TIMESTAMP_METADATA_KEY;
use dynmetric_domain::{ConfigRequest, DynMetricError, Fingerprint, MetricConfig, Resource, Result};
use tracing::{debug, instrument};

/// Fetches the service's current configuration and reports it only when
/// its fingerprint changed.
///
/// The stored fingerprint advances only after a response validated, so a
/// failed or invalid fetch makes the next successful one count as new.
pub struct ConfigReader {
    transport: Arc<dyn ConfigTransport>,
    resource: Resource,
    clock: Arc<dyn Clock>,
    last_fingerprint: Fingerprint,
    accepted_any: bool,
    stopped: bool,
}

impl ConfigReader {
    pub fn new(transport: Arc<dyn ConfigTransport>, resource: Resource, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            resource,
            clock,
            last_fingerprint: Fingerprint::default(),
            accepted_any: false,
            stopped: false,
        }
    }

    /// Fetch once.
    ///
    /// Returns `Ok(None)` when the service reports the configuration already
    /// held: the same fingerprint, or an empty one. The first valid response
    /// is always accepted.
    ///
    /// # Errors
    /// - `DynMetricError::Transport` when the round-trip fails
    /// - `DynMetricError::InvalidSchedule` / `InvalidConfig` when the response
    ///   does not validate
    #[instrument(skip(self), fields(last_fingerprint = ?self.last_fingerprint))]
    pub async fn read_config(&mut self) -> Result<Option<MetricConfig>> {
        if self.stopped {
            return Err(DynMetricError::Transport("reader stopped".to_string()));
        }

        let request = ConfigRequest::new(self.last_fingerprint.clone(), self.resource.clone())
            .with_metadata(TIMESTAMP_METADATA_KEY, self.clock.timestamp_nanos());

        let response = self.transport.fetch(request).await?;

        let unchanged = self.accepted_any
            && (response.fingerprint.is_empty() || response.fingerprint == self.last_fingerprint);
        if unchanged {
            debug!("configuration unchanged");
            return Ok(None);
        }

        let config = MetricConfig::from(response);
        config.validate()?;

        self.last_fingerprint = config.fingerprint.clone();
        self.accepted_any = true;
        debug!(fingerprint = ?config.fingerprint, schedules = config.schedules.len(), "new configuration");
        Ok(Some(config))
    }

    /// Release the transport. Idempotent.
    pub async fn stop(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.transport.close().await
    }

    pub fn last_fingerprint(&self) -> &Fingerprint {
        &self.last_fingerprint
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl std::fmt::Debug for ConfigReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigReader")
            .field("resource", &self.resource)
            .field("last_fingerprint", &self.last_fingerprint)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}
