//! Configuration data model
//!
//! Types exchanged with the remote configuration service and consumed by the
//! schedule resolver.

pub mod metric_config;
pub mod pattern;
pub mod resource;
pub mod schedule;
pub mod wire;

pub use metric_config::{Fingerprint, MetricConfig};
pub use pattern::Pattern;
pub use resource::{KeyValue, Resource};
pub use schedule::Schedule;
pub use wire::{ConfigRequest, ConfigResponse};
