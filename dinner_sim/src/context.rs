//! Seeded context implementing DinnerContext for reproducible runs.

use async_trait::async_trait;
use dinner_env::DinnerContext;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

/// Simulation context backed by a seeded RNG.
///
/// This implements `DinnerContext` using:
/// - The tokio clock, so a paused runtime makes runs time-deterministic
/// - A seeded ChaCha8 RNG for think durations
///
/// Interleaving between philosophers still depends on the scheduler, so
/// a seed pins the random draws, not the outcome.
pub struct SeededContext {
    /// Master seed for this run
    seed: u64,

    /// Start time for monotonic duration calculations
    start: Instant,

    /// Deterministic RNG shared by every philosopher
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SeededContext {
    /// Creates a new SeededContext with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start: Instant::now(),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }
}

impl Clone for SeededContext {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            start: self.start,
            rng: Arc::clone(&self.rng),
        }
    }
}

#[async_trait]
impl DinnerContext for SeededContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn spawn<F>(&self, name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let span = tracing::debug_span!("task", name = %name, seed = self.seed);
        tokio::spawn(future.instrument(span));
    }

    fn random_duration(&self, max: Duration) -> Duration {
        // Saturates past ~584 years
        let nanos = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
        if nanos == 0 {
            return Duration::ZERO;
        }
        // A poisoned lock only means another draw panicked; the RNG state is still usable
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Duration::from_nanos(rng.gen_range(0..nanos))
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
