//! Settings structures
//!
//! Loaded by `dynmetric_infra::config::loader` from the environment or from
//! a JSON/TOML file.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::errors::{DynMetricError, Result};
use crate::types::Resource;

/// Settings for a push controller and its configuration notifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the configuration service.
    pub config_host: String,
    /// Per-tick collection deadline. Defaults to the tick period.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub resource: BTreeMap<String, String>,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Settings {
    pub fn new(config_host: impl Into<String>) -> Self {
        Self {
            config_host: config_host.into(),
            timeout_secs: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            resource: BTreeMap::new(),
        }
    }

    /// # Errors
    /// Returns `DynMetricError::Config` for an empty host or a zero poll
    /// interval.
    pub fn validate(&self) -> Result<()> {
        if self.config_host.trim().is_empty() {
            return Err(DynMetricError::Config("config_host must not be empty".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(DynMetricError::Config("poll_interval_secs must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resource(&self) -> Resource {
        Resource::from(&self.resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let settings: Settings =
            serde_json::from_str(r#"{"config_host":"http://localhost:7070"}"#).unwrap();
        assert_eq!(settings.poll_interval(), Duration::from_secs(1800));
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.timeout(), None);
        assert!(settings.resource().is_empty());
    }

    #[test]
    fn test_toml_with_resource_table() {
        let settings: Settings = toml::from_str(
            r#"
            config_host = "http://cfg:7070"
            timeout_secs = 5

            [resource]
            "service.name" = "checkout"
            "#,
        )
        .unwrap();
        assert_eq!(settings.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(settings.resource().get("service.name"), Some("checkout"));
    }

    #[test]
    fn test_validate() {
        assert!(Settings::new("http://cfg").validate().is_ok());
        assert!(matches!(Settings::new("  ").validate(), Err(DynMetricError::Config(_))));

        let mut settings = Settings::new("http://cfg");
        settings.poll_interval_secs = 0;
        assert!(matches!(settings.validate(), Err(DynMetricError::Config(_))));
    }
}
