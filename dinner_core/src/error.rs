//! Error types for the dinner core.

use std::time::Duration;
use thiserror::Error;

/// Configuration rejected before any philosopher sits down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A table needs at least one seat
    #[error("Philosopher count must be at least 1, got {0}")]
    NoPhilosophers(usize),

    /// Retry backoff must be positive or a failed attempt would spin
    #[error("Retry backoff must be greater than zero")]
    ZeroBackoff,

    /// The run needs a deadline
    #[error("Run deadline must be greater than zero")]
    ZeroRunDeadline,

    /// A failed right-fork wait must leave hunger budget for a retry
    #[error("Acquire window {window:?} must be shorter than the hunger budget {max_hungry:?}")]
    AcquireWindowTooLong { window: Duration, max_hungry: Duration },

    /// An appetite of zero meals would leave before sitting down
    #[error("Appetite must be at least one meal when set")]
    ZeroAppetite,

    /// The name supply does not match the seat count
    #[error("Expected {expected} names, got {actual}")]
    NameCountMismatch { expected: usize, actual: usize },

    /// Names identify philosophers and must be unique
    #[error("Duplicate philosopher name: {0}")]
    DuplicateName(String),

    /// Names must be displayable
    #[error("Philosopher at seat {0} has an empty name")]
    EmptyName(usize),
}

/// Errors that can occur in the dinner core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Configuration was rejected
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A token was handed back to a fork that did not mint it
    #[error("Fork {fork} received a token minted by fork {token}")]
    ForeignToken { fork: usize, token: usize },

    /// A release would have put a second token on the table
    #[error("Fork {0} is already on the table")]
    ForkOverflow(usize),
}
