//! # Dynmetric Domain
//!
//! Data model for dynamically scheduled metric collection.
//!
//! This crate contains:
//! - Schedule and pattern types delivered by the configuration service
//! - Request/response shapes of the configuration transport
//! - Domain error types and Result definitions
//! - Settings structures and constants
//!
//! ## Architecture
//! - No dependencies on other dynmetric crates
//! - No async runtime

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
