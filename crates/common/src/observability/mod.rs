//! Observability primitives shared across crates
//!
//! - Process-wide error sink (errors/)

pub mod errors;

pub use errors::{handle, set_error_handler, ErrorHandler, LoggingErrorHandler};
