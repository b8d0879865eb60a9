//! Clock abstraction
//!
//! The push controller reads "now" through a [`Clock`] so tests can pin the
//! instant handed to the schedule resolver independently of the runtime.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;

/// Source of monotonic and wall-clock time
pub trait Clock: Send + Sync + std::fmt::Debug + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Wall-clock time as an RFC 3339 UTC string with nanosecond precision
    fn timestamp_nanos(&self) -> String {
        format_timestamp_nanos(self.system_time())
    }
}

/// Formats `time` as `2024-01-01T00:00:00.000000000Z`.
pub fn format_timestamp_nanos(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Real system clock implementation for production use
///
/// With the `runtime` feature the monotonic reading follows tokio's clock,
/// so paused-time tests observe the same instants as the runtime's timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(feature = "runtime")]
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    #[cfg(not(feature = "runtime"))]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

/// Mock clock for deterministic testing
///
/// Starts at the instant it was created (or the one given) and only moves
/// when [`MockClock::advance`] is called. Clones share the same offset.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::with_current_time(Instant::now())
    }

    pub fn with_current_time(start: Instant) -> Self {
        Self { start, elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Time elapsed since the clock's start
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }

    pub fn start(&self) -> Instant {
        self.start
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        UNIX_EPOCH + self.elapsed()
    }
}
