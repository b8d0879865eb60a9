//! Configuration transport request and response

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::metric_config::{Fingerprint, MetricConfig};
use super::resource::Resource;
use super::schedule::Schedule;

/// Request sent on every poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRequest {
    pub last_known_fingerprint: Fingerprint,
    pub resource: Resource,
    /// Transport metadata (HTTP headers for the HTTP transport).
    #[serde(skip)]
    pub metadata: BTreeMap<String, String>,
}

impl ConfigRequest {
    pub fn new(last_known_fingerprint: Fingerprint, resource: Resource) -> Self {
        Self { last_known_fingerprint, resource, metadata: BTreeMap::new() }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Raw, unvalidated response from the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    #[serde(default)]
    pub fingerprint: Fingerprint,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub suggested_wait_time_sec: i32,
}

impl ConfigResponse {
    pub fn new(fingerprint: impl Into<Fingerprint>, schedules: Vec<Schedule>) -> Self {
        Self { fingerprint: fingerprint.into(), schedules, suggested_wait_time_sec: 0 }
    }

    #[must_use]
    pub fn with_suggested_wait(mut self, secs: i32) -> Self {
        self.suggested_wait_time_sec = secs;
        self
    }
}

impl From<ConfigResponse> for MetricConfig {
    fn from(resp: ConfigResponse) -> Self {
        Self {
            fingerprint: resp.fingerprint,
            schedules: resp.schedules,
            suggested_wait_time_sec: resp.suggested_wait_time_sec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::pattern::Pattern;

    #[test]
    fn test_request_body_shape() {
        let req = ConfigRequest::new(Fingerprint::from("fp"), Resource::new([("host", "a")]))
            .with_metadata("timestamp", "2024-01-01T00:00:00.000000000Z");
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["lastKnownFingerprint"], "ZnA=");
        assert_eq!(json["resource"]["attributes"][0]["key"], "host");
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_decode_full_response() {
        let body = r#"{
            "fingerprint": "djI=",
            "schedules": [
                {"inclusionPatterns": [{"startsWith": "one"}], "periodSec": 21},
                {"inclusionPatterns": [{"equals": "two"}], "exclusionPatterns": [{"future": "x"}]}
            ],
            "suggestedWaitTimeSec": 120
        }"#;
        let resp: ConfigResponse = serde_json::from_str(body).unwrap();

        assert_eq!(resp.fingerprint, Fingerprint::from("v2"));
        assert_eq!(resp.schedules.len(), 2);
        assert_eq!(resp.schedules[0].inclusion_patterns, vec![Pattern::starts_with("one")]);
        assert_eq!(resp.schedules[1].period_sec, 0);
        assert_eq!(resp.schedules[1].exclusion_patterns, vec![Pattern::Unknown]);
        assert_eq!(resp.suggested_wait_time_sec, 120);
    }

    #[test]
    fn test_empty_body_defaults() {
        let resp: ConfigResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp, ConfigResponse::default());
    }
}
