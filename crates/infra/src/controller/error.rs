//! Controller lifecycle errors

use std::time::Duration;

use dynmetric_domain::DynMetricError;
use thiserror::Error;

use crate::errors::InfraError;

/// Errors returned by [`PushController::start`](super::PushController::start)
/// and [`PushController::stop`](super::PushController::stop)
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The configuration transport could not be created
    #[error("configuration transport unavailable: {0}")]
    TransportUnavailable(#[source] DynMetricError),

    /// A background task panicked or was cancelled
    #[error("Task join failed: {0}")]
    JoinFailed(String),

    /// A background task did not finish in time during stop
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<ControllerError> for InfraError {
    fn from(err: ControllerError) -> Self {
        let domain = match err {
            ControllerError::TransportUnavailable(source) => source,
            ControllerError::Timeout(duration) => DynMetricError::Timeout(duration),
            ControllerError::JoinFailed(_) => DynMetricError::Internal(err.to_string()),
        };
        InfraError(domain)
    }
}

impl From<ControllerError> for DynMetricError {
    fn from(err: ControllerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for controller lifecycle operations
pub type ControllerResult<T> = Result<T, ControllerError>;
