use std::time::Duration;

use dynmetric_domain::DynMetricError;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::errors::InfraError;

/// JSON-over-POST client for the configuration service
///
/// One poll is one [`post_json`](Self::post_json) call. Connection failures,
/// timeouts, `429` and `5xx` are retried within the call with exponential
/// backoff; the notifier's next poll is the outer retry. Once
/// [`shutdown`](Self::shutdown) is called no attempt starts and a pending
/// backoff ends immediately.
#[derive(Debug, Clone)]
pub struct ConfigHttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
    shutdown: CancellationToken,
}

impl ConfigHttpClient {
    pub fn builder() -> ConfigHttpClientBuilder {
        ConfigHttpClientBuilder::default()
    }

    pub fn new() -> Result<Self, DynMetricError> {
        Self::builder().build()
    }

    /// POST `body` to `url` and return the body of the first 2xx response.
    ///
    /// # Errors
    /// `DynMetricError::Transport` for network failures, non-2xx statuses
    /// after the last attempt, and calls made after shutdown.
    pub async fn post_json(
        &self,
        url: &Url,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, DynMetricError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            if self.is_shut_down() {
                return Err(closed());
            }

            let request = self
                .client
                .post(url.clone())
                .headers(headers.clone())
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());

            let sent = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return Err(closed()),
                sent = request.send() => sent,
            };

            let failure = match sent {
                Ok(response) if response.status().is_success() => {
                    let bytes = response.bytes().await.map_err(InfraError::from)?;
                    return Ok(bytes.to_vec());
                }
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %url, %status, "configuration service rejected poll");
                    if !retryable_status(status) || attempt == attempts {
                        return Err(DynMetricError::Transport(format!(
                            "configuration service returned {status}"
                        )));
                    }
                    status.to_string()
                }
                Err(err) => {
                    debug!(attempt, %url, error = %err, "configuration poll failed");
                    if !retryable_error(&err) || attempt == attempts {
                        return Err(InfraError::from(err).into());
                    }
                    err.to_string()
                }
            };

            let delay = self.backoff_delay(attempt);
            debug!(attempt, delay_ms = delay.as_millis() as u64, %failure, "retrying poll");
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return Err(closed()),
                () = tokio::time::sleep(delay) => {}
            }
        }

        Err(DynMetricError::Internal("configuration poll made no attempt".into()))
    }

    /// Refuse further attempts and interrupt any backoff in progress.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn backoff_delay(&self, failed_attempts: usize) -> Duration {
        let shift = u32::try_from(failed_attempts.saturating_sub(1).min(8)).unwrap_or(8);
        self.base_backoff.saturating_mul(1u32 << shift)
    }
}

fn closed() -> DynMetricError {
    DynMetricError::Transport("transport closed".to_string())
}

fn retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

#[derive(Debug)]
pub struct ConfigHttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for ConfigHttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 2,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
        }
    }
}

impl ConfigHttpClientBuilder {
    /// Per-attempt request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attempts per poll, first try included.
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<ConfigHttpClient, DynMetricError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder.build().map_err(InfraError::from)?;

        Ok(ConfigHttpClient {
            client,
            max_attempts: self.max_attempts,
            base_backoff: self.base_backoff,
            shutdown: CancellationToken::new(),
        })
    }
}
