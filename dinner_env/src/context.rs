//! Core environment context trait for dinner participants.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" so that philosophers and the
/// coordinator never touch the clock, the scheduler or an RNG directly.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, thread RNG
/// - **Simulation**: `SeededContext` (in `dinner_sim`) - same timers, `ChaCha8Rng(seed)`
///
/// # Time
///
/// Both implementations read the tokio clock, so a runtime started with a
/// paused clock drives every sleep and timeout deterministically.
#[async_trait]
pub trait DinnerContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Used for dwell-time measurements and run wall time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Spawns a detached background task.
    ///
    /// The task is never awaited by the caller; it runs to completion
    /// or is dropped with the runtime.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Draws a duration uniformly from `[0, max)`.
    ///
    /// Returns `Duration::ZERO` when `max` is zero.
    fn random_duration(&self, max: Duration) -> Duration;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// Unseeded contexts return 0.
    fn seed(&self) -> u64;
}
