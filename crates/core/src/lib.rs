//! # Dynmetric Core
//!
//! Pure scheduling logic and the ports the runtime drives.
//!
//! This crate contains:
//! - Pattern matching of metric names
//! - The schedule resolver deciding which instruments are due on a tick
//! - Port interfaces (traits) for accumulators, processors, exporters and
//!   the configuration transport
//!
//! ## Architecture Principles
//! - Only depends on `dynmetric-domain`
//! - No HTTP or task spawning
//! - All external collaborators via traits

pub mod collection;
pub mod schedule;

// Infrastructure ports
pub mod config_ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use collection::ports::{Accumulator, CheckpointSet, Exporter, Processor, Record};
pub use collection::processor::{shared_processor, BasicProcessor, SharedProcessor};
pub use config_ports::{ConfigTransport, TransportConnector};
pub use schedule::patterns;
pub use schedule::resolver::{CollectionRule, ScheduleResolver};
