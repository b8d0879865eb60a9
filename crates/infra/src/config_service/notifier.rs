//! Configuration notifier
//!
//! Long-lived poller around [`ConfigReader`]. Fetches once immediately, then
//! on every tick of its poll interval, and publishes the outcome on a
//! [`MonitorSender`]. The service may change the poll interval through
//! `suggestedWaitTimeSec`; zero keeps the current interval.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dynmetric_domain::Resource;
//! use dynmetric_infra::config_service::{ConfigNotifier, HttpTransportConnector, MonitorChannel};
//!
//! # async fn example() {
//! let notifier = ConfigNotifier::new(
//!     "http://config.internal:7070",
//!     Resource::new([("service.name", "checkout")]),
//!     Arc::new(HttpTransportConnector::new()),
//! );
//! let (tx, mut rx) = MonitorChannel::new().split();
//! let task = tokio::spawn(async move { notifier.monitor_changes(tx).await });
//!
//! if let Some(config) = rx.data.recv().await {
//!     println!("{} schedules", config.schedules.len());
//! }
//! rx.close_quit();
//! task.await.ok();
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use dynmetric_common::{Clock, SystemClock};
use dynmetric_core::TransportConnector;
use dynmetric_domain::constants::DEFAULT_POLL_INTERVAL;
use dynmetric_domain::{Resource, Result};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::monitor::MonitorSender;
use super::reader::ConfigReader;
use crate::observability::log_metric;
use crate::observability::metrics::PollMetrics;

/// Polls the configuration service and publishes changes
#[derive(Clone)]
pub struct ConfigNotifier {
    host: String,
    resource: Resource,
    connector: Arc<dyn TransportConnector>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    metrics: Arc<PollMetrics>,
}

impl ConfigNotifier {
    pub fn new(
        host: impl Into<String>,
        resource: Resource,
        connector: Arc<dyn TransportConnector>,
    ) -> Self {
        Self {
            host: host.into(),
            resource,
            connector,
            clock: Arc::new(SystemClock),
            poll_interval: DEFAULT_POLL_INTERVAL,
            metrics: Arc::new(PollMetrics::new()),
        }
    }

    /// Override the interval used until the service suggests one.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.poll_interval = interval;
        }
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn metrics(&self) -> Arc<PollMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Create a reader over a fresh transport.
    ///
    /// # Errors
    /// Whatever the connector fails with, typically `DynMetricError::Config`
    /// for a malformed host.
    pub async fn connect(&self) -> Result<ConfigReader> {
        let transport = self.connector.connect(&self.host).await?;
        Ok(ConfigReader::new(transport, self.resource.clone(), Arc::clone(&self.clock)))
    }

    /// Run until `mch` observes quit.
    ///
    /// A reader that cannot be created is reported on `err` once and the
    /// notifier returns.
    pub async fn monitor_changes(&self, mch: MonitorSender) {
        match self.connect().await {
            Ok(reader) => self.run_with(reader, mch).await,
            Err(err) => {
                warn!(host = %self.host, error = %err, "failed to create configuration reader");
                log_metric(self.metrics.record_error(), "notifier.connect.error");
                mch.publish_error(err).await;
            }
        }
    }

    /// Poll loop over an already connected reader.
    pub async fn run_with(&self, mut reader: ConfigReader, mch: MonitorSender) {
        info!(host = %self.host, interval_secs = self.poll_interval.as_secs(), "configuration notifier started");

        let mut interval = self.poll_interval;
        let mut ticker = poll_ticker(interval);

        if self.poll_once(&mut reader, &mch, &mut interval, &mut ticker).await {
            loop {
                tokio::select! {
                    biased;
                    () = mch.quit() => break,
                    _ = ticker.tick() => {
                        if !self.poll_once(&mut reader, &mch, &mut interval, &mut ticker).await {
                            break;
                        }
                    }
                }
            }
        }

        if let Err(err) = reader.stop().await {
            warn!(error = %err, "failed to stop configuration reader");
        }
        info!(host = %self.host, "configuration notifier stopped");
    }

    /// One fetch and publish. Returns `false` once quit was observed.
    async fn poll_once(
        &self,
        reader: &mut ConfigReader,
        mch: &MonitorSender,
        interval: &mut Duration,
        ticker: &mut Interval,
    ) -> bool {
        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            () = mch.quit() => return false,
            outcome = reader.read_config() => outcome,
        };
        log_metric(self.metrics.record_poll(started.elapsed()), "notifier.poll");

        match outcome {
            Err(err) => {
                warn!(error = %err, "configuration poll failed");
                log_metric(self.metrics.record_error(), "notifier.poll.error");
                mch.publish_error(err).await
            }
            Ok(None) => {
                debug!("configuration unchanged");
                log_metric(self.metrics.record_unchanged(), "notifier.poll.unchanged");
                true
            }
            Ok(Some(config)) => {
                if let Some(suggested) = config.suggested_wait() {
                    if suggested != *interval {
                        info!(
                            from_secs = interval.as_secs(),
                            to_secs = suggested.as_secs(),
                            "poll interval changed by service"
                        );
                        *interval = suggested;
                        *ticker = poll_ticker(suggested);
                        log_metric(self.metrics.record_interval_change(), "notifier.interval");
                    }
                }
                log_metric(self.metrics.record_config_delivered(), "notifier.poll.delivered");
                mch.publish_config(config).await
            }
        }
    }
}

impl std::fmt::Debug for ConfigNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigNotifier")
            .field("host", &self.host)
            .field("resource", &self.resource)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

/// Ticker whose first tick is one full period away.
fn poll_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
