//! Collection schedules

use serde::{Deserialize, Serialize};

use super::pattern::Pattern;
use crate::errors::{DynMetricError, Result};

/// Maps the metric names selected by its patterns to a collection period.
///
/// `period_sec == 0` means names selected only by this schedule are never
/// collected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub inclusion_patterns: Vec<Pattern>,
    #[serde(default)]
    pub exclusion_patterns: Vec<Pattern>,
    #[serde(default)]
    pub period_sec: i32,
}

impl Schedule {
    pub fn new(inclusion_patterns: Vec<Pattern>, period_sec: i32) -> Self {
        Self { inclusion_patterns, exclusion_patterns: Vec::new(), period_sec }
    }

    #[must_use]
    pub fn with_exclusions(mut self, exclusion_patterns: Vec<Pattern>) -> Self {
        self.exclusion_patterns = exclusion_patterns;
        self
    }

    /// Rejects negative periods.
    pub fn validate(&self) -> Result<()> {
        if self.period_sec < 0 {
            return Err(DynMetricError::InvalidSchedule { period_sec: self.period_sec });
        }
        Ok(())
    }

    /// Period in whole seconds, or `None` when this schedule never collects.
    pub fn positive_period_secs(&self) -> Option<u64> {
        u64::try_from(self.period_sec).ok().filter(|secs| *secs > 0)
    }
}
