//! Metric name pattern matching
//!
//! ```
//! use dynmetric_core::patterns::matches;
//! use dynmetric_domain::Pattern;
//!
//! let patterns = vec![Pattern::starts_with("http."), Pattern::equals("rpc.latency")];
//! assert!(matches("http.requests", &patterns));
//! assert!(matches("rpc.latency", &patterns));
//! assert!(!matches("rpc.latency.p99", &patterns));
//! ```

use dynmetric_domain::types::pattern::UNIVERSAL_PREFIX;
use dynmetric_domain::Pattern;

/// True iff some pattern in `patterns` selects `name`.
///
/// An empty list selects nothing. [`Pattern::Unknown`] never matches.
pub fn matches(name: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| matches_pattern(name, pattern))
}

pub fn matches_pattern(name: &str, pattern: &Pattern) -> bool {
    match pattern {
        Pattern::Equals(value) => name == value,
        Pattern::StartsWith(prefix) => prefix == UNIVERSAL_PREFIX || name.starts_with(prefix.as_str()),
        Pattern::Unknown => false,
    }
}

/// Inclusion matches and exclusion does not.
pub fn selects(name: &str, inclusions: &[Pattern], exclusions: &[Pattern]) -> bool {
    matches(name, inclusions) && !matches(name, exclusions)
}
