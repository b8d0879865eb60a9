//! HTTP/JSON configuration transport
//!
//! POSTs the request body to `{host}/v1/metrics/config`; request metadata
//! travels as HTTP headers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dynmetric_core::{ConfigTransport, TransportConnector};
use dynmetric_domain::constants::{CONFIG_ENDPOINT_PATH, DEFAULT_REQUEST_TIMEOUT_SECS};
use dynmetric_domain::{ConfigRequest, ConfigResponse, DynMetricError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::errors::InfraError;
use crate::http::ConfigHttpClient;

/// Configuration transport over HTTP
///
/// Closing shuts the client down, so a poll stuck in retry backoff ends
/// with a transport error instead of outliving the notifier.
#[derive(Debug)]
pub struct HttpConfigTransport {
    client: ConfigHttpClient,
    endpoint: Url,
}

impl HttpConfigTransport {
    /// # Errors
    /// `DynMetricError::Config` if `host` is not an absolute URL.
    pub fn new(host: &str) -> Result<Self> {
        Self::with_client(host, ConfigHttpClient::new()?)
    }

    pub fn with_client(host: &str, client: ConfigHttpClient) -> Result<Self> {
        Ok(Self { client, endpoint: endpoint_for(host)? })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_shut_down()
    }
}

fn endpoint_for(host: &str) -> Result<Url> {
    let raw = format!("{}{CONFIG_ENDPOINT_PATH}", host.trim().trim_end_matches('/'));
    let url = Url::parse(&raw).map_err(InfraError::from)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(DynMetricError::Config(format!(
            "unsupported configuration host scheme: {}",
            url.scheme()
        )));
    }
    Ok(url)
}

fn metadata_headers(request: &ConfigRequest) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (key, value) in &request.metadata {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            DynMetricError::Transport(format!("invalid metadata key '{key}': {e}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            DynMetricError::Transport(format!("invalid metadata value for '{key}': {e}"))
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl ConfigTransport for HttpConfigTransport {
    async fn fetch(&self, request: ConfigRequest) -> Result<ConfigResponse> {
        let headers = metadata_headers(&request)?;
        let body = serde_json::to_vec(&request).map_err(InfraError::from)?;

        let bytes = self.client.post_json(&self.endpoint, headers, body).await?;
        let decoded: ConfigResponse = serde_json::from_slice(&bytes).map_err(InfraError::from)?;
        Ok(decoded)
    }

    async fn close(&self) -> Result<()> {
        if !self.client.is_shut_down() {
            self.client.shutdown();
            tracing::debug!(endpoint = %self.endpoint, "configuration transport closed");
        }
        Ok(())
    }
}

/// Builds [`HttpConfigTransport`]s
///
/// Every `connect` creates a fresh client, so a controller restarted after
/// `stop` polls again.
#[derive(Debug, Clone)]
pub struct HttpTransportConnector {
    request_timeout: Duration,
    max_attempts: usize,
}

impl Default for HttpTransportConnector {
    fn default() -> Self {
        Self { request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS), max_attempts: 2 }
    }
}

impl HttpTransportConnector {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }
}

#[async_trait]
impl TransportConnector for HttpTransportConnector {
    async fn connect(&self, host: &str) -> Result<Arc<dyn ConfigTransport>> {
        let client = ConfigHttpClient::builder()
            .timeout(self.request_timeout)
            .max_attempts(self.max_attempts)
            .user_agent(concat!("dynmetric/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let transport = HttpConfigTransport::with_client(host, client)?;
        tracing::info!(endpoint = %transport.endpoint(), "connected to configuration service");
        Ok(Arc::new(transport))
    }
}
