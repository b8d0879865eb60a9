//! Push controller options

use std::sync::Arc;
use std::time::Duration;

use dynmetric_common::{Clock, ErrorHandler, SystemClock};
use dynmetric_core::TransportConnector;
use dynmetric_domain::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT_SECS};
use dynmetric_domain::{Resource, Settings};

use crate::config_service::HttpTransportConnector;

/// Construction options for [`PushController`](super::PushController)
#[derive(Clone)]
pub struct PushControllerOptions {
    /// Attached to every configuration request and every export
    pub resource: Resource,
    /// Per-tick deadline; defaults to the tick period, then 10 seconds
    pub timeout: Option<Duration>,
    pub config_host: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub clock: Arc<dyn Clock>,
    /// Falls back to the process-wide handler when unset
    pub error_handler: Option<Arc<dyn ErrorHandler>>,
    /// Falls back to [`HttpTransportConnector`] when unset
    pub connector: Option<Arc<dyn TransportConnector>>,
}

impl PushControllerOptions {
    pub fn new(config_host: impl Into<String>) -> Self {
        Self {
            resource: Resource::empty(),
            timeout: None,
            config_host: config_host.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            clock: Arc::new(SystemClock),
            error_handler: None,
            connector: None,
        }
    }

    /// Options derived from loaded [`Settings`].
    pub fn from_settings(settings: &Settings) -> Self {
        let mut options = Self::new(settings.config_host.clone())
            .with_resource(settings.resource())
            .with_poll_interval(settings.poll_interval())
            .with_request_timeout(settings.request_timeout());
        options.timeout = settings.timeout();
        options
    }

    #[must_use]
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = resource;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn TransportConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub(crate) fn connector_or_default(&self) -> Arc<dyn TransportConnector> {
        self.connector.clone().unwrap_or_else(|| {
            Arc::new(HttpTransportConnector::new().with_request_timeout(self.request_timeout))
        })
    }
}

impl std::fmt::Debug for PushControllerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushControllerOptions")
            .field("resource", &self.resource)
            .field("timeout", &self.timeout)
            .field("config_host", &self.config_host)
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout", &self.request_timeout)
            .field("clock", &self.clock)
            .field("error_handler", &self.error_handler.is_some())
            .field("connector", &self.connector.is_some())
            .finish()
    }
}
