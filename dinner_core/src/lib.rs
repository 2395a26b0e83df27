//! Dinner Core - the dining philosophers resource-contention simulation.
//!
//! N philosophers sit around a table with one fork between each pair of
//! neighbours. Each cycles through thinking, hunger and eating; eating
//! needs both adjacent forks. The core provides:
//! 1. **Forks**: single-owner tokens, as an exchange channel or an atomic flag
//! 2. **Philosophers**: the state machine and the acquire-left /
//!    bounded-wait-right / release-and-backoff protocol that keeps the ring
//!    free of deadlock while still allowing starvation
//! 3. **Announcements**: the event stream drained by one reporter
//! 4. **Coordinator**: ring wiring, launch, departure counting and the run deadline
//!
//! # Usage
//!
//! ```ignore
//! use dinner_core::{announce, Coordinator, DinnerConfig};
//! use dinner_env::TokioContext;
//!
//! let config = DinnerConfig::default().with_philosophers(5);
//! let (announcer, stream) = announce::channel(config.verbosity);
//! tokio::spawn(stream.drain_into(Vec::new()));
//!
//! let coordinator = Coordinator::new(TokioContext::shared(), config, names)?;
//! let summary = coordinator.run(announcer).await;
//! println!("{}", summary);
//! ```

pub mod announce;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fork;
pub mod philosopher;

mod atomic_fork;
mod channel_fork;

// Re-export key types for convenience
pub use announce::{Announcement, AnnouncementSink, AnnouncementStream, Announcer, Verbosity};
pub use atomic_fork::AtomicFork;
pub use channel_fork::ChannelFork;
pub use config::DinnerConfig;
pub use coordinator::{Coordinator, RunOutcome, RunSummary};
pub use error::{ConfigError, CoreError};
pub use fork::{ring_seats, Fork, ForkId, ForkKind, ForkReport, ForkToken, HoldGauge};
pub use philosopher::{Departure, Philosopher, PhilosopherState, TableHandles};
