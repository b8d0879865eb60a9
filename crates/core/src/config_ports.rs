//! Configuration transport ports
//!
//! The notifier talks to the configuration service only through these
//! traits; the HTTP implementation lives in `dynmetric-infra`.

use std::sync::Arc;

use async_trait::async_trait;
use dynmetric_domain::{ConfigRequest, ConfigResponse, Result};

/// One connection to the configuration service
#[async_trait]
pub trait ConfigTransport: Send + Sync {
    /// Deliver `request` and return the raw, unvalidated response.
    ///
    /// # Errors
    /// `DynMetricError::Transport` on any delivery or decoding failure, and
    /// for every call made after [`close`](Self::close).
    async fn fetch(&self, request: ConfigRequest) -> Result<ConfigResponse>;

    /// Release the connection. Closing twice is a no-op.
    async fn close(&self) -> Result<()>;
}

/// Creates transports for a configuration host
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(&self, host: &str) -> Result<Arc<dyn ConfigTransport>>;
}
