//! Monitor channel between the notifier and its subscriber
//!
//! `data` carries accepted configurations, `err` carries transport and
//! validation failures, and `quit` is cancelled by the subscriber to stop the
//! notifier. Nothing is published once `quit` is observed.

use dynmetric_domain::constants::MONITOR_CHANNEL_CAPACITY;
use dynmetric_domain::{DynMetricError, MetricConfig};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// The three channels, before being split between the two ends
#[derive(Debug)]
pub struct MonitorChannel {
    sender: MonitorSender,
    receiver: MonitorReceiver,
}

impl MonitorChannel {
    pub fn new() -> Self {
        Self::with_capacity(MONITOR_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (data_tx, data_rx) = mpsc::channel(capacity.max(1));
        let (err_tx, err_rx) = mpsc::channel(capacity.max(1));
        let quit = CancellationToken::new();
        Self {
            sender: MonitorSender { data: data_tx, err: err_tx, quit: quit.clone() },
            receiver: MonitorReceiver { data: data_rx, err: err_rx, quit },
        }
    }

    /// Notifier end and subscriber end.
    pub fn split(self) -> (MonitorSender, MonitorReceiver) {
        (self.sender, self.receiver)
    }
}

impl Default for MonitorChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifier end
#[derive(Debug, Clone)]
pub struct MonitorSender {
    data: mpsc::Sender<MetricConfig>,
    err: mpsc::Sender<DynMetricError>,
    quit: CancellationToken,
}

impl MonitorSender {
    /// Publish on `data`. Returns `false` if quit was observed or the
    /// subscriber is gone.
    pub async fn publish_config(&self, config: MetricConfig) -> bool {
        self.publish(&self.data, config).await
    }

    /// Publish on `err`. Same return contract as
    /// [`publish_config`](Self::publish_config).
    pub async fn publish_error(&self, err: DynMetricError) -> bool {
        self.publish(&self.err, err).await
    }

    pub fn is_quit(&self) -> bool {
        self.quit.is_cancelled()
    }

    /// Resolves once the subscriber closed `quit`.
    pub async fn quit(&self) {
        self.quit.cancelled().await;
    }

    async fn publish<T>(&self, tx: &mpsc::Sender<T>, value: T) -> bool {
        if self.quit.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            () = self.quit.cancelled() => false,
            sent = tx.send(value) => sent.is_ok(),
        }
    }
}

/// Subscriber end
#[derive(Debug)]
pub struct MonitorReceiver {
    pub data: mpsc::Receiver<MetricConfig>,
    pub err: mpsc::Receiver<DynMetricError>,
    quit: CancellationToken,
}

impl MonitorReceiver {
    /// Close `quit`. Idempotent.
    pub fn close_quit(&self) {
        self.quit.cancel();
    }

    /// Token that closes `quit` when cancelled.
    pub fn quit_token(&self) -> CancellationToken {
        self.quit.clone()
    }
}
