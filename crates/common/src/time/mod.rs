//! Time utilities and abstractions
//!
//! - **Clock abstractions**: real and mock time for testing
//! - **Timestamp formatting**: nanosecond RFC 3339 strings for transport
//!   metadata

pub mod clock;

pub use clock::{format_timestamp_nanos, Clock, MockClock, SystemClock};
