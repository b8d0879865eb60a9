//! Metrics collection modules
//!
//! Thread-safe counters for the configuration poller and the push
//! controller.

pub mod controller;
pub mod poll;

// Re-export metric types for convenience
pub use controller::ControllerMetrics;
pub use poll::PollMetrics;
