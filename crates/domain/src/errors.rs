//! Error types used throughout the dynamic metric configuration stack

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for dynmetric
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DynMetricError {
    /// The configuration service could not be reached or its response could
    /// not be decoded.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A configuration response failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A schedule carried a negative collection period.
    #[error("Invalid schedule: period_sec must be >= 0, got {period_sec}")]
    InvalidSchedule { period_sec: i32 },

    #[error("Export error: {0}")]
    Export(String),

    #[error("Collection error: {0}")]
    Collection(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Local settings are missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A programming error; never a runtime condition.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of [`DynMetricError`] used for routing and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Transport,
    InvalidConfig,
    Export,
    Collection,
    Invariant,
    Configuration,
}

impl DynMetricError {
    /// Get the category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::Timeout(_) => ErrorCategory::Transport,
            Self::InvalidConfig(_) | Self::InvalidSchedule { .. } => ErrorCategory::InvalidConfig,
            Self::Export(_) => ErrorCategory::Export,
            Self::Collection(_) => ErrorCategory::Collection,
            Self::InvariantViolation(_) | Self::Internal(_) => ErrorCategory::Invariant,
            Self::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether the next poll or tick may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    /// Stable label suitable for metrics and structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::InvalidConfig(_) => "invalid_config",
            Self::InvalidSchedule { .. } => "invalid_schedule",
            Self::Export(_) => "export",
            Self::Collection(_) => "collection",
            Self::Timeout(_) => "timeout",
            Self::Config(_) => "config",
            Self::InvariantViolation(_) => "invariant_violation",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for dynmetric operations
pub type Result<T> = std::result::Result<T, DynMetricError>;
