//! Cross-cutting runtime helpers shared across dynmetric crates.
//!
//! # Feature Tiers
//!
//! - `foundation`: clock abstraction and timestamp formatting
//! - `runtime`: tokio-aware system clock and the process-wide error sink
//! - `test-utils`: everything downstream test suites rely on (currently the
//!   runtime tier, which carries `RecordingErrorHandler` and `MockClock`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod time;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod observability;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use observability::errors::{
    handle, set_error_handler, ErrorHandler, LoggingErrorHandler, RecordingErrorHandler,
};
#[cfg(feature = "foundation")]
pub use time::{Clock, MockClock, SystemClock};
