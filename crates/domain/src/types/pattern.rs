//! Metric name patterns

use serde::{Deserialize, Serialize};

/// A single inclusion or exclusion rule over metric names.
///
/// On the wire a pattern is an object carrying exactly one of `equals` or
/// `startsWith`. Objects carrying neither decode as [`Pattern::Unknown`] so
/// that newer pattern kinds are ignored instead of rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPattern", into = "RawPattern")]
pub enum Pattern {
    /// Matches a name byte-for-byte.
    Equals(String),
    /// Matches names with the given prefix; `"*"` matches everything.
    StartsWith(String),
    /// A pattern kind this build does not understand. Never matches.
    Unknown,
}

/// Prefix that matches every metric name.
pub const UNIVERSAL_PREFIX: &str = "*";

impl Pattern {
    pub fn equals(value: impl Into<String>) -> Self {
        Self::Equals(value.into())
    }

    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Self::StartsWith(prefix.into())
    }

    /// The `startsWith: "*"` pattern.
    pub fn any() -> Self {
        Self::StartsWith(UNIVERSAL_PREFIX.to_owned())
    }

    pub fn is_universal(&self) -> bool {
        matches!(self, Self::StartsWith(p) if p == UNIVERSAL_PREFIX)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    equals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    starts_with: Option<String>,
}

impl From<RawPattern> for Pattern {
    fn from(raw: RawPattern) -> Self {
        match (raw.equals, raw.starts_with) {
            (Some(value), _) => Self::Equals(value),
            (None, Some(prefix)) => Self::StartsWith(prefix),
            (None, None) => Self::Unknown,
        }
    }
}

impl From<Pattern> for RawPattern {
    fn from(pattern: Pattern) -> Self {
        match pattern {
            Pattern::Equals(value) => Self { equals: Some(value), ..Self::default() },
            Pattern::StartsWith(prefix) => Self { starts_with: Some(prefix), ..Self::default() },
            Pattern::Unknown => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_kinds() {
        let p: Pattern = serde_json::from_str(r#"{"equals":"foo.sum"}"#).unwrap();
        assert_eq!(p, Pattern::equals("foo.sum"));

        let p: Pattern = serde_json::from_str(r#"{"startsWith":"*"}"#).unwrap();
        assert!(p.is_universal());
    }

    #[test]
    fn test_unrecognized_kind_decodes_as_unknown() {
        let p: Pattern = serde_json::from_str(r#"{"regex":"^foo"}"#).unwrap();
        assert_eq!(p, Pattern::Unknown);
    }

    #[test]
    fn test_encode_uses_single_key() {
        let json = serde_json::to_string(&Pattern::starts_with("one")).unwrap();
        assert_eq!(json, r#"{"startsWith":"one"}"#);
        assert_eq!(serde_json::to_string(&Pattern::Unknown).unwrap(), "{}");
    }
}
