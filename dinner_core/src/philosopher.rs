//! Philosopher - the per-seat state machine and fork acquisition protocol.
//!
//! # Lifecycle
//!
//! ```text
//!            ┌──────────── both forks ────────────┐
//!            │                                    ▼
//!   start ─► HUNGRY ── starvation deadline ─► DEAD ◄── appetite reached
//!            ▲                                    ▲           │
//!            │                                    │           │
//!         THINKING ◄──── forks released ───── EATING ─────────┘
//! ```
//!
//! # Acquisition protocol
//!
//! While hungry, and until the starvation deadline fires:
//! 1. take the left fork;
//! 2. wait at most `acquire_window()` for the right fork;
//! 3. on timeout put the left fork back, pause for `backoff`, start over.
//!
//! No philosopher ever waits on one fork while holding the other for
//! longer than the window, so the ring cannot deadlock. Starvation is
//! still possible and is an expected outcome.

use crate::announce::Announcer;
use crate::config::DinnerConfig;
use crate::fork::{Fork, ForkToken};

use dinner_env::DinnerContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Lifecycle state of a philosopher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhilosopherState {
    Thinking,
    Hungry,
    Eating,
    /// Terminal
    Dead,
}

impl PhilosopherState {
    /// Returns the state name used in announcements.
    pub fn name(&self) -> &'static str {
        match self {
            PhilosopherState::Thinking => "thinking",
            PhilosopherState::Hungry => "hungry",
            PhilosopherState::Eating => "eating",
            PhilosopherState::Dead => "dead",
        }
    }
}

impl std::fmt::Display for PhilosopherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Termination signal, sent exactly once when a philosopher leaves.
///
/// It does not say why the philosopher left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    pub seat: usize,
    pub name: String,
    pub meals: u32,
}

/// Handles every philosopher at a table shares.
pub struct TableHandles<C: DinnerContext> {
    pub ctx: Arc<C>,
    pub config: Arc<DinnerConfig>,
    pub announcer: Announcer,
    pub departures: mpsc::UnboundedSender<Departure>,
}

impl<C: DinnerContext> Clone for TableHandles<C> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            config: Arc::clone(&self.config),
            announcer: self.announcer.clone(),
            departures: self.departures.clone(),
        }
    }
}

/// A philosopher seated between two forks.
///
/// Owns its state exclusively; neighbours only ever meet it through the
/// forks they share.
pub struct Philosopher<C: DinnerContext, F: Fork> {
    seat: usize,
    name: String,
    state: PhilosopherState,
    left: Arc<F>,
    right: Arc<F>,
    table: TableHandles<C>,

    /// Tokens held while eating
    plate: Option<(ForkToken, ForkToken)>,

    meals: u32,
}

impl<C: DinnerContext, F: Fork> Philosopher<C, F> {
    /// Seats a philosopher. It starts hungry.
    pub fn new(seat: usize, name: String, left: Arc<F>, right: Arc<F>, table: TableHandles<C>) -> Self {
        Self {
            seat,
            name,
            state: PhilosopherState::Hungry,
            left,
            right,
            table,
            plate: None,
            meals: 0,
        }
    }

    /// Returns the philosopher's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the seat index.
    pub fn seat(&self) -> usize {
        self.seat
    }

    /// Returns the current state.
    pub fn state(&self) -> PhilosopherState {
        self.state
    }

    /// Returns the number of meals eaten so far.
    pub fn meals(&self) -> u32 {
        self.meals
    }

    /// Runs the state machine until the philosopher dies, then reports the departure.
    pub async fn live(mut self) {
        let born = self.table.ctx.now();

        while self.state != PhilosopherState::Dead {
            let entered = self.table.ctx.now();
            let exited = self.state;

            self.state = match self.state {
                PhilosopherState::Thinking => self.think().await,
                PhilosopherState::Hungry => self.hunger().await,
                PhilosopherState::Eating => self.eat().await,
                PhilosopherState::Dead => PhilosopherState::Dead,
            };

            self.track(exited, entered);
        }

        self.depart(born);
    }

    async fn think(&mut self) -> PhilosopherState {
        let ctx = &self.table.ctx;
        let pause = ctx.random_duration(self.table.config.max_think);
        ctx.sleep(pause).await;
        PhilosopherState::Hungry
    }

    async fn hunger(&mut self) -> PhilosopherState {
        match self.acquire_pair().await {
            Some(pair) => {
                self.plate = Some(pair);
                PhilosopherState::Eating
            }
            None => {
                info!(philosopher = %self.name, seat = self.seat, meals = self.meals, "Starved");
                PhilosopherState::Dead
            }
        }
    }

    async fn eat(&mut self) -> PhilosopherState {
        let Some((left, right)) = self.plate.take() else {
            error!(philosopher = %self.name, "Sat down to eat without forks");
            return PhilosopherState::Hungry;
        };

        self.table.ctx.sleep(self.table.config.eat).await;

        // Both forks are back on the table before the next state begins
        self.put_back(&self.left, left);
        self.put_back(&self.right, right);
        self.meals += 1;

        match self.table.config.appetite {
            Some(appetite) if self.meals >= appetite => PhilosopherState::Dead,
            _ => PhilosopherState::Thinking,
        }
    }

    /// Acquires both forks, or gives up when the starvation deadline fires.
    ///
    /// Returns `None` on starvation; in that case no fork is held.
    async fn acquire_pair(&mut self) -> Option<(ForkToken, ForkToken)> {
        let config = Arc::clone(&self.table.config);
        let ctx = Arc::clone(&self.table.ctx);

        if config.max_hungry.is_zero() {
            return None;
        }

        let starvation = ctx.sleep(config.max_hungry);
        tokio::pin!(starvation);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let left = tokio::select! {
                biased;
                _ = &mut starvation => return None,
                token = self.left.acquire() => token,
            };

            tokio::select! {
                biased;
                _ = &mut starvation => {
                    self.put_back(&self.left, left);
                    return None;
                }
                right = self.right.acquire() => {
                    debug!(philosopher = %self.name, attempts, "Acquired both forks");
                    return Some((left, right));
                }
                _ = ctx.sleep(config.acquire_window()) => {
                    self.put_back(&self.left, left);
                    debug!(
                        philosopher = %self.name,
                        attempts,
                        right = %self.right.id(),
                        "Right fork busy, released left"
                    );
                }
            }

            tokio::select! {
                biased;
                _ = &mut starvation => return None,
                _ = ctx.sleep(config.backoff) => {}
            }
        }
    }

    fn put_back(&self, fork: &F, token: ForkToken) {
        if let Err(e) = fork.release(token) {
            error!(philosopher = %self.name, fork = %fork.id(), "Failed to release fork: {}", e);
        }
    }

    fn track(&self, exited: PhilosopherState, since: Duration) {
        let dwell = self.table.ctx.now().saturating_sub(since);

        debug!(
            philosopher = %self.name,
            from = exited.name(),
            to = self.state.name(),
            dwell_ms = dwell.as_millis() as u64,
            "State change"
        );

        self.table.announcer.detail(
            &self.name,
            format!(
                "I've finished {} in {:.2}s. I'm now {}.",
                exited,
                dwell.as_secs_f64(),
                self.state
            ),
        );
    }

    fn depart(self, born: Duration) {
        let life = self.table.ctx.now().saturating_sub(born);

        self.table.announcer.say(
            &self.name,
            format!(
                "I've finished my life in {:.2}s after {} meals. I'm now {}.",
                life.as_secs_f64(),
                self.meals,
                self.state
            ),
        );

        let departure = Departure {
            seat: self.seat,
            name: self.name,
            meals: self.meals,
        };
        // The coordinator may have stopped listening after the run deadline
        let _ = self.table.departures.send(departure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announce::{self, Announcement, AnnouncementStream, Verbosity};
    use crate::fork::{ring_seats, ForkId};
    use crate::{AtomicFork, ChannelFork};
    use dinner_env::TokioContext;

    fn table(config: DinnerConfig) -> (TableHandles<TokioContext>, AnnouncementStream, mpsc::UnboundedReceiver<Departure>) {
        let (announcer, stream) = announce::channel(config.verbosity);
        let (tx, rx) = mpsc::unbounded_channel();
        let handles = TableHandles {
            ctx: TokioContext::shared(),
            config: Arc::new(config),
            announcer,
            departures: tx,
        };
        (handles, stream, rx)
    }

    fn quick_config() -> DinnerConfig {
        DinnerConfig {
            philosophers: 2,
            max_think: Duration::from_millis(50),
            eat: Duration::from_millis(20),
            max_hungry: Duration::from_secs(10),
            backoff: Duration::from_millis(100),
            run_deadline: Duration::from_secs(60),
            appetite: None,
            verbosity: Verbosity::Verbose,
            ..Default::default()
        }
    }

    fn pair<F: Fork>() -> (Arc<F>, Arc<F>) {
        (Arc::new(F::laid(ForkId(0))), Arc::new(F::laid(ForkId(1))))
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_hunger_dies_without_eating() {
        let config = DinnerConfig {
            max_hungry: Duration::ZERO,
            ..quick_config()
        };
        let (handles, _stream, mut departures) = table(config);
        let (left, right) = pair::<ChannelFork>();

        let philosopher = Philosopher::new(0, "plato".into(), left.clone(), right.clone(), handles);
        philosopher.live().await;

        let departure = departures.recv().await.unwrap();
        assert_eq!(departure, Departure { seat: 0, name: "plato".into(), meals: 0 });
        assert_eq!(left.gauge().acquisitions(), 0);
        assert_eq!(right.gauge().acquisitions(), 0);
        assert!(departures.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_free_forks_are_the_ring_neighbours() {
        let (handles, _stream, _departures) = table(quick_config());
        let forks: Vec<Arc<ChannelFork>> = (0..2).map(|i| Arc::new(ChannelFork::laid(ForkId(i)))).collect();

        for seat in 0..2 {
            let (l, r) = ring_seats(seat, 2);
            let mut philosopher = Philosopher::new(
                seat,
                format!("seat-{}", seat),
                Arc::clone(&forks[l.0]),
                Arc::clone(&forks[r.0]),
                handles.clone(),
            );

            let (left, right) = philosopher.acquire_pair().await.unwrap();
            assert_eq!((left.fork(), right.fork()), (l, r));
            assert_ne!(left.fork(), right.fork());

            forks[l.0].release(left).unwrap();
            forks[r.0].release(right).unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_right_fork_releases_left_then_retries() {
        let (handles, _stream, _departures) = table(quick_config());
        let (left, right) = pair::<ChannelFork>();

        // A neighbour is eating with our right fork
        let neighbours_fork = right.acquire().await;

        let mut philosopher = Philosopher::new(0, "hume".into(), left.clone(), right.clone(), handles);
        let attempt = tokio::spawn(async move { philosopher.acquire_pair().await });

        // Window is 200ms, backoff 100ms: at 250ms the left fork is back on the table
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(left.is_free());
        assert!(!attempt.is_finished());

        right.release(neighbours_fork).unwrap();
        let (l, r) = attempt.await.unwrap().unwrap();

        assert_eq!((l.fork(), r.fork()), (ForkId(0), ForkId(1)));
        assert!(left.gauge().acquisitions() >= 2);
        assert_eq!(left.gauge().peak_holders(), 1);
        assert_eq!(right.gauge().peak_holders(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_starving_philosopher_holds_nothing() {
        let config = DinnerConfig {
            max_hungry: Duration::from_secs(1),
            ..quick_config()
        };
        let (handles, _stream, mut departures) = table(config);
        let (left, right) = pair::<AtomicFork>();
        let _neighbours_fork = right.acquire().await;

        Philosopher::new(0, "kant".into(), left.clone(), right.clone(), handles)
            .live()
            .await;

        assert_eq!(departures.recv().await.unwrap().meals, 0);
        assert!(left.is_free());
        assert_eq!(left.gauge().holders(), 0);
        assert!(left.gauge().acquisitions() > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lone_philosopher_starves_without_deadlock() {
        let config = DinnerConfig {
            philosophers: 1,
            max_hungry: Duration::from_secs(2),
            ..quick_config()
        };
        let (handles, _stream, mut departures) = table(config);
        let fork = Arc::new(ChannelFork::laid(ForkId(0)));

        Philosopher::new(0, "diogenes".into(), fork.clone(), fork.clone(), handles)
            .live()
            .await;

        assert_eq!(departures.recv().await.unwrap().meals, 0);
        assert!(fork.is_free());
        assert_eq!(fork.gauge().peak_holders(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_appetite_ends_life_after_meals() {
        let config = DinnerConfig {
            appetite: Some(2),
            ..quick_config()
        };
        let (handles, stream, mut departures) = table(config);
        let (left, right) = pair::<ChannelFork>();

        Philosopher::new(0, "epicurus".into(), left.clone(), right.clone(), handles)
            .live()
            .await;

        assert_eq!(departures.recv().await.unwrap().meals, 2);
        assert!(left.is_free() && right.is_free());

        let records: Vec<Announcement> = stream.drain_into(Vec::new()).await;
        let meals = records
            .iter()
            .filter(|a| a.message.ends_with("I'm now eating."))
            .count();
        assert_eq!(meals, 2);

        let last = records.last().unwrap();
        assert!(last.message.starts_with("I've finished my life"));
        assert!(last.message.ends_with("I'm now dead."));
    }
}
