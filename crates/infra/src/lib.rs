//! # Dynmetric Infrastructure
//!
//! Runtime implementations around the core scheduling logic.
//!
//! This crate contains:
//! - The HTTP/JSON configuration transport and the configuration reader
//! - The configuration notifier and its monitor channel
//! - The push controller driving collection and export
//! - Settings loading from the environment or a file
//! - Counters for polls and ticks
//!
//! ## Architecture
//! - Implements the transport port defined in `dynmetric-core`
//! - Depends on `dynmetric-common`, `dynmetric-domain` and `dynmetric-core`
//! - Contains all "impure" code (HTTP, task spawning, filesystem)

pub mod config;
pub mod config_service;
pub mod controller;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use config_service::{
    ConfigNotifier, ConfigReader, HttpConfigTransport, HttpTransportConnector, MonitorChannel,
    MonitorReceiver, MonitorSender,
};
pub use controller::{ControllerError, PushController, PushControllerOptions};
pub use errors::InfraError;
pub use http::{ConfigHttpClient, ConfigHttpClientBuilder};
