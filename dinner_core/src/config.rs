//! Immutable run configuration.

use crate::announce::Verbosity;
use crate::error::ConfigError;
use crate::fork::ForkKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and size parameters fixed before any philosopher sits down.
///
/// Built once, validated, then shared read-only with the coordinator and
/// every philosopher for the lifetime of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DinnerConfig {
    /// Number of seats (and forks) at the table
    pub philosophers: usize,

    /// Upper bound (exclusive) of a random think period
    pub max_think: Duration,

    /// Fixed duration of a meal
    pub eat: Duration,

    /// Starvation deadline, measured from entry into the hungry state
    pub max_hungry: Duration,

    /// Pause between a failed acquisition attempt and the next one
    pub backoff: Duration,

    /// Wall-clock bound for the whole run
    pub run_deadline: Duration,

    /// Meals after which a philosopher leaves the table (None = never)
    pub appetite: Option<u32>,

    /// Whether per-state dwell announcements are emitted
    pub verbosity: Verbosity,

    /// Fork representation
    pub fork_kind: ForkKind,
}

impl Default for DinnerConfig {
    fn default() -> Self {
        Self {
            philosophers: 20,
            max_think: Duration::from_secs(30),
            eat: Duration::from_secs(10),
            max_hungry: Duration::from_secs(40),
            backoff: Duration::from_millis(200),
            run_deadline: Duration::from_secs(120),
            appetite: None,
            verbosity: Verbosity::Quiet,
            fork_kind: ForkKind::Channel,
        }
    }
}

impl DinnerConfig {
    /// How long a philosopher holding its left fork waits for the right one.
    ///
    /// Twice the backoff. `validate` keeps it strictly below a non-zero
    /// `max_hungry` so a failed attempt can be retried.
    pub fn acquire_window(&self) -> Duration {
        self.backoff.saturating_mul(2)
    }

    /// Checks the configuration.
    ///
    /// `max_think`, `eat` and `max_hungry` may be zero: a zero hunger
    /// budget means every philosopher starves on its first hungry turn.
    /// Otherwise the acquire window must be shorter than `max_hungry`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.philosophers == 0 {
            return Err(ConfigError::NoPhilosophers(self.philosophers));
        }
        if self.backoff.is_zero() {
            return Err(ConfigError::ZeroBackoff);
        }
        if self.run_deadline.is_zero() {
            return Err(ConfigError::ZeroRunDeadline);
        }
        if !self.max_hungry.is_zero() && self.acquire_window() >= self.max_hungry {
            return Err(ConfigError::AcquireWindowTooLong {
                window: self.acquire_window(),
                max_hungry: self.max_hungry,
            });
        }
        if self.appetite == Some(0) {
            return Err(ConfigError::ZeroAppetite);
        }
        Ok(())
    }

    /// Sets the philosopher count.
    pub fn with_philosophers(mut self, n: usize) -> Self {
        self.philosophers = n;
        self
    }

    /// Sets the fork representation.
    pub fn with_fork_kind(mut self, kind: ForkKind) -> Self {
        self.fork_kind = kind;
        self
    }

    /// Sets the verbosity.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}
