//! Domain constants
//!
//! Centralized location for the timing constants shared by the notifier and
//! the push controller.

use std::time::Duration;

// Notifier polling
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30 * 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Push controller
pub const FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);
pub const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Percentage of a period a tick may arrive early and still collect.
pub const DUE_TOLERANCE_PERCENT: u32 = 10;

// Transport
pub const TIMESTAMP_METADATA_KEY: &str = "timestamp";
pub const CONFIG_ENDPOINT_PATH: &str = "/v1/metrics/config";
pub const MONITOR_CHANNEL_CAPACITY: usize = 16;
