//! Timer integration
//!
//! The engine never owns an event loop. Stateful operators arm one-shot
//! timers through [`TimerService`]; when the host loop fires one, it calls
//! [`Program::on_timer`](crate::Program::on_timer) and re-evaluates the
//! chain if asked to.

use chrono::{DateTime, Local};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::program::ChainToken;

/// Identity of the single timer slot a node may occupy
///
/// Scheduling for a key that already has a pending timer replaces it, so a
/// node can never have two timers in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerKey {
    /// Owning program
    pub chain: ChainToken,
    /// Node position within the program
    pub node: u32,
}

/// One-shot timer scheduling provided by the host event loop
pub trait TimerService {
    /// Invoke the chain's timer handling once after `delay_seconds`,
    /// replacing any timer already pending for `key`
    fn schedule_once(&mut self, key: TimerKey, delay_seconds: f64);

    /// Drop a pending timer; no-op if nothing is pending for `key`
    fn cancel(&mut self, key: TimerKey);
}

/// Wall-clock source for the time-of-day operators
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// System wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Fixed clock for tests and replay
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Deterministic single-threaded timer queue
///
/// Serves both as the scheduler of a cooperative host loop and as a test
/// double: the host advances the internal clock by however long it slept
/// and fires whatever came due, earliest deadline first.
#[derive(Debug, Default)]
pub struct TimerQueue {
    /// Monotonic seconds, advanced by the host
    now: f64,
    deadlines: FxHashMap<TimerKey, f64>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Whether a timer is pending for `key`
    pub fn pending(&self, key: TimerKey) -> bool {
        self.deadlines.contains_key(&key)
    }

    /// Seconds until the earliest deadline, if any timer is pending
    pub fn next_due(&self) -> Option<f64> {
        self.deadlines
            .values()
            .map(|deadline| (deadline - self.now).max(0.0))
            .min_by(f64::total_cmp)
    }

    /// Advance the internal clock by `dt` seconds and drain the timers that
    /// came due, earliest deadline first
    pub fn advance(&mut self, dt: f64) -> Vec<TimerKey> {
        self.now += dt;
        let mut due: Vec<(f64, TimerKey)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= self.now)
            .map(|(key, deadline)| (*deadline, *key))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (_, key) in &due {
            self.deadlines.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }
}

impl TimerService for TimerQueue {
    fn schedule_once(&mut self, key: TimerKey, delay_seconds: f64) {
        debug!(?key, delay_seconds, "schedule timer");
        self.deadlines.insert(key, self.now + delay_seconds);
    }

    fn cancel(&mut self, key: TimerKey) {
        self.deadlines.remove(&key);
    }
}
