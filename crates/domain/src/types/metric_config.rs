//! Validated metric configuration

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::schedule::Schedule;
use crate::errors::{DynMetricError, Result};

/// Opaque configuration identifier. Compared bytewise; base64 on the wire.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        STANDARD
            .decode(encoded)
            .map(Self)
            .map_err(|e| DynMetricError::Transport(format!("invalid fingerprint encoding: {e}")))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_base64())
    }
}

impl From<&[u8]> for Fingerprint {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD.decode(encoded).map(Self).map_err(serde::de::Error::custom)
    }
}

/// A configuration accepted from the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricConfig {
    #[serde(default)]
    pub fingerprint: Fingerprint,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub suggested_wait_time_sec: i32,
}

impl MetricConfig {
    pub fn new(fingerprint: impl Into<Fingerprint>, schedules: Vec<Schedule>) -> Self {
        Self { fingerprint: fingerprint.into(), schedules, suggested_wait_time_sec: 0 }
    }

    #[must_use]
    pub fn with_suggested_wait(mut self, secs: i32) -> Self {
        self.suggested_wait_time_sec = secs;
        self
    }

    /// Valid iff every schedule is valid and the suggested wait is not
    /// negative.
    pub fn validate(&self) -> Result<()> {
        for schedule in &self.schedules {
            schedule.validate()?;
        }
        if self.suggested_wait_time_sec < 0 {
            return Err(DynMetricError::InvalidConfig(format!(
                "suggestedWaitTimeSec must be >= 0, got {}",
                self.suggested_wait_time_sec
            )));
        }
        Ok(())
    }

    /// Poll interval suggested by the service; `None` keeps the current one.
    pub fn suggested_wait(&self) -> Option<std::time::Duration> {
        u64::try_from(self.suggested_wait_time_sec)
            .ok()
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs)
    }
}
