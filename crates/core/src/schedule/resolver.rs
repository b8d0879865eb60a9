//! Schedule resolver
//!
//! Holds the active schedule set and answers two questions:
//! - how often the controller should tick (the gcd of all positive periods)
//! - whether a given instrument is due on the current tick
//!
//! Every instrument's effective period is the smallest positive period among
//! the schedules that select it; `0` when no schedule with a positive period
//! does. Lookups are memoised until the schedule set is replaced.
//!
//! An instrument is due at `now` when its period `p` is positive and
//! `now >= last_collected + p - p / 10`. The 10% slack absorbs ticks that
//! fire slightly early. Applying a schedule set restarts every instrument's
//! clock at the start instant, so instruments whose period changed line up
//! on the same start-aligned ticks.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use dynmetric_domain::constants::DUE_TOLERANCE_PERCENT;
use dynmetric_domain::{DynMetricError, Result, Schedule};
use parking_lot::Mutex;

use super::patterns::selects;

#[derive(Debug, Default)]
struct ResolverState {
    /// `None` until the first schedule set has been applied.
    schedules: Option<Vec<Schedule>>,
    periods: HashMap<String, Duration>,
    last_collected: HashMap<String, Instant>,
    start: Option<Instant>,
    tick_period: Duration,
}

impl ResolverState {
    fn period_for(&mut self, name: &str) -> Duration {
        if let Some(period) = self.periods.get(name) {
            return *period;
        }

        let period = self
            .schedules
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|s| selects(name, &s.inclusion_patterns, &s.exclusion_patterns))
            .filter_map(Schedule::positive_period_secs)
            .min()
            .map_or(Duration::ZERO, Duration::from_secs);

        self.periods.insert(name.to_owned(), period);
        period
    }
}

/// Per-instrument period resolution and due decisions
///
/// All state sits behind one mutex; [`apply_schedules`](Self::apply_schedules)
/// and every [`CollectionRule::is_due`] call are serialised against each
/// other.
#[derive(Debug, Default)]
pub struct ScheduleResolver {
    state: Mutex<ResolverState>,
}

impl ScheduleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the instant from which never-collected instruments count.
    ///
    /// Instruments first seen later start their "last collected" clock here,
    /// so they become due one period after start rather than immediately.
    pub fn mark_start(&self, now: Instant) {
        let mut state = self.state.lock();
        state.start = Some(now);
        state.last_collected.clear();
    }

    pub fn start(&self) -> Option<Instant> {
        self.state.lock().start
    }

    /// Replace the schedule set and return the new tick period.
    ///
    /// Returns `Duration::ZERO` when no schedule has a positive period.
    /// Both the period memo and the last-collected instants are dropped.
    ///
    /// # Errors
    /// `DynMetricError::InvalidSchedule` if any period is negative. The
    /// current schedule set is left untouched in that case.
    pub fn apply_schedules(&self, schedules: Vec<Schedule>) -> Result<Duration> {
        for schedule in &schedules {
            schedule.validate()?;
        }

        let tick_period = tick_period_for(&schedules);

        let mut state = self.state.lock();
        state.schedules = Some(schedules);
        state.periods = HashMap::new();
        state.last_collected = HashMap::new();
        state.tick_period = tick_period;
        drop(state);

        tracing::debug!(tick_period_secs = tick_period.as_secs(), "schedules applied");
        Ok(tick_period)
    }

    /// Build the due predicate for one collection sweep at `now`.
    ///
    /// # Errors
    /// `DynMetricError::InvariantViolation` if no schedule set was ever
    /// applied.
    pub fn build_rule(&self, now: Instant) -> Result<CollectionRule<'_>> {
        if self.state.lock().schedules.is_none() {
            return Err(DynMetricError::InvariantViolation(
                "collection rule requested before any schedules were applied".to_string(),
            ));
        }
        Ok(CollectionRule { resolver: self, now, marked: Mutex::new(Vec::new()) })
    }

    /// Effective period of `name` under the current schedules.
    pub fn period_for(&self, name: &str) -> Duration {
        self.state.lock().period_for(name)
    }

    pub fn tick_period(&self) -> Duration {
        self.state.lock().tick_period
    }

    pub fn has_schedules(&self) -> bool {
        self.state.lock().schedules.is_some()
    }

    /// Returns the previous last-collected instant when `name` is due.
    fn mark_if_due(&self, name: &str, now: Instant) -> Option<Instant> {
        let mut state = self.state.lock();
        let period = state.period_for(name);
        if period.is_zero() {
            return None;
        }

        let start = state.start.unwrap_or(now);
        let last = *state.last_collected.entry(name.to_owned()).or_insert(start);
        let threshold = period - period * DUE_TOLERANCE_PERCENT / 100;

        if now.saturating_duration_since(last) >= threshold {
            state.last_collected.insert(name.to_owned(), now);
            Some(last)
        } else {
            None
        }
    }

    fn restore(&self, marked: Vec<(String, Instant)>) {
        let mut state = self.state.lock();
        for (name, last) in marked {
            // a newer schedule set already reset this instrument
            if let Some(entry) = state.last_collected.get_mut(&name) {
                *entry = last;
            }
        }
    }
}

/// Due predicate for a single collection sweep
///
/// Calling [`is_due`](Self::is_due) for a due instrument marks it collected,
/// so a second call for the same name in the same sweep returns `false`.
/// [`revert`](Self::revert) undoes those marks for a sweep that was
/// abandoned before export.
#[derive(Debug)]
pub struct CollectionRule<'a> {
    resolver: &'a ScheduleResolver,
    now: Instant,
    marked: Mutex<Vec<(String, Instant)>>,
}

impl CollectionRule<'_> {
    pub fn is_due(&self, name: &str) -> bool {
        match self.resolver.mark_if_due(name, self.now) {
            Some(previous) => {
                self.marked.lock().push((name.to_owned(), previous));
                true
            }
            None => false,
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Restore the last-collected instants this sweep overwrote.
    pub fn revert(self) {
        let marked = self.marked.into_inner();
        if !marked.is_empty() {
            tracing::debug!(instruments = marked.len(), "collection round reverted");
            self.resolver.restore(marked);
        }
    }
}

/// Greatest common divisor of all positive periods, or zero.
pub fn tick_period_for(schedules: &[Schedule]) -> Duration {
    let secs = schedules.iter().filter_map(Schedule::positive_period_secs).fold(0, gcd);
    Duration::from_secs(secs)
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
