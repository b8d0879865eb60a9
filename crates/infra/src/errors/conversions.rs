//! Conversions from external infrastructure errors into domain errors.

use dynmetric_domain::DynMetricError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DynMetricError);

impl From<InfraError> for DynMetricError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DynMetricError> for InfraError {
    fn from(value: DynMetricError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoDynMetricError {
    fn into_dynmetric(self) -> DynMetricError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DynMetricError */
/* -------------------------------------------------------------------------- */

impl IntoDynMetricError for HttpError {
    fn into_dynmetric(self) -> DynMetricError {
        if self.is_timeout() {
            return DynMetricError::Transport("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return DynMetricError::Transport("HTTP connection failure".into());
        }

        if self.is_builder() {
            return DynMetricError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            return DynMetricError::Transport(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        DynMetricError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_dynmetric())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → DynMetricError */
/* -------------------------------------------------------------------------- */

impl IntoDynMetricError for serde_json::Error {
    fn into_dynmetric(self) -> DynMetricError {
        DynMetricError::Transport(format!("undecodable configuration response: {self}"))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(value.into_dynmetric())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError / toml::de::Error → DynMetricError */
/* -------------------------------------------------------------------------- */

impl IntoDynMetricError for url::ParseError {
    fn into_dynmetric(self) -> DynMetricError {
        DynMetricError::Config(format!("invalid configuration host: {self}"))
    }
}

impl From<url::ParseError> for InfraError {
    fn from(value: url::ParseError) -> Self {
        InfraError(value.into_dynmetric())
    }
}

impl IntoDynMetricError for toml::de::Error {
    fn into_dynmetric(self) -> DynMetricError {
        DynMetricError::Config(format!("Invalid TOML format: {self}"))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(value.into_dynmetric())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
