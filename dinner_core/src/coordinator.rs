//! Coordinator - sets the table, launches philosophers, waits for the end.

use crate::announce::Announcer;
use crate::atomic_fork::AtomicFork;
use crate::channel_fork::ChannelFork;
use crate::config::DinnerConfig;
use crate::error::{ConfigError, CoreError};
use crate::fork::{ring_seats, Fork, ForkId, ForkKind, ForkReport};
use crate::philosopher::{Departure, Philosopher, TableHandles};

use dinner_env::DinnerContext;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every philosopher left the table before the deadline
    AllDeparted,

    /// The run deadline fired first; the rest were abandoned
    DeadlineReached,
}

/// Results from a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of seats
    pub total: usize,

    /// Departures in the order they were received
    pub departed: Vec<Departure>,

    /// Names still at the table when the run ended
    pub survivors: Vec<String>,

    pub outcome: RunOutcome,

    /// Run wall time
    pub elapsed: Duration,

    /// Fork snapshots taken when the run ended
    pub forks: Vec<ForkReport>,
}

impl RunSummary {
    /// Number of philosophers that died.
    pub fn deaths(&self) -> usize {
        self.departed.len()
    }

    /// True if every philosopher left before the deadline.
    pub fn is_complete(&self) -> bool {
        self.outcome == RunOutcome::AllDeparted
    }

    /// Highest holder count seen on any fork (1 unless the single-owner invariant broke).
    pub fn peak_fork_holders(&self) -> usize {
        self.forks.iter().map(|f| f.peak_holders).max().unwrap_or(0)
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.outcome {
            RunOutcome::AllDeparted => write!(
                f,
                "{}/{} philosophers died in {:.2}s",
                self.deaths(),
                self.total,
                self.elapsed.as_secs_f64()
            ),
            RunOutcome::DeadlineReached => write!(
                f,
                "Deadline reached after {:.2}s: {}/{} philosophers died",
                self.elapsed.as_secs_f64(),
                self.deaths(),
                self.total
            ),
        }
    }
}

/// Runs one dinner.
///
/// Builds a ring of N forks and N philosophers where fork `i` lies between
/// seat `i` and seat `i + 1`, launches every philosopher as its own task
/// and counts departures until all have left or the run deadline fires.
pub struct Coordinator<C: DinnerContext> {
    ctx: Arc<C>,
    config: Arc<DinnerConfig>,
    names: Vec<String>,
}

impl<C: DinnerContext> Coordinator<C> {
    /// Creates a coordinator, rejecting bad configuration before anyone sits down.
    ///
    /// # Errors
    /// * `CoreError::Config` - invalid configuration, or a name supply that
    ///   does not provide one unique, non-empty name per seat
    pub fn new(ctx: Arc<C>, config: DinnerConfig, names: Vec<String>) -> Result<Self, CoreError> {
        config.validate()?;

        if names.len() != config.philosophers {
            return Err(ConfigError::NameCountMismatch {
                expected: config.philosophers,
                actual: names.len(),
            }
            .into());
        }

        let mut seen = HashSet::with_capacity(names.len());
        for (seat, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyName(seat).into());
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateName(name.clone()).into());
            }
        }

        Ok(Self {
            ctx,
            config: Arc::new(config),
            names,
        })
    }

    /// Returns the run configuration.
    pub fn config(&self) -> &DinnerConfig {
        &self.config
    }

    /// Runs the dinner and returns the summary.
    ///
    /// Never fails: starvation is an outcome and the deadline produces a
    /// partial summary. Philosophers still seated at the deadline keep
    /// running detached; nobody waits for them.
    pub async fn run(self, announcer: Announcer) -> RunSummary {
        match self.config.fork_kind {
            ForkKind::Channel => self.run_with::<ChannelFork>(announcer).await,
            ForkKind::Atomic => self.run_with::<AtomicFork>(announcer).await,
        }
    }

    async fn run_with<F: Fork>(self, announcer: Announcer) -> RunSummary {
        let ctx = Arc::clone(&self.ctx);
        let started = ctx.now();
        let deadline = ctx.sleep(self.config.run_deadline);
        tokio::pin!(deadline);

        let n = self.names.len();
        info!(
            philosophers = n,
            forks = %self.config.fork_kind,
            seed = ctx.seed(),
            "Seating {:?}",
            self.names
        );

        // Every fork starts on the table
        let forks: Vec<Arc<F>> = (0..n).map(|i| Arc::new(F::laid(ForkId(i)))).collect();

        let (departures_tx, mut departures) = mpsc::unbounded_channel();
        let table = TableHandles {
            ctx: Arc::clone(&ctx),
            config: Arc::clone(&self.config),
            announcer: announcer.clone(),
            departures: departures_tx,
        };

        for (seat, name) in self.names.iter().enumerate() {
            let (left, right) = ring_seats(seat, n);
            let philosopher = Philosopher::new(
                seat,
                name.clone(),
                Arc::clone(&forks[left.0]),
                Arc::clone(&forks[right.0]),
                table.clone(),
            );
            ctx.spawn(name, philosopher.live());
        }
        drop(table);

        let mut departed: Vec<Departure> = Vec::with_capacity(n);
        let outcome = loop {
            if departed.len() == n {
                break RunOutcome::AllDeparted;
            }

            tokio::select! {
                biased;
                departure = departures.recv() => match departure {
                    Some(departure) => {
                        debug!(
                            philosopher = %departure.name,
                            meals = departure.meals,
                            count = departed.len() + 1,
                            "Departure"
                        );
                        departed.push(departure);
                    }
                    None => {
                        // Philosopher tasks vanished without reporting; the deadline still bounds the run
                        warn!(reported = departed.len(), total = n, "Departure channel closed early");
                        (&mut deadline).await;
                        break RunOutcome::DeadlineReached;
                    }
                },
                _ = &mut deadline => break RunOutcome::DeadlineReached,
            }
        };

        let elapsed = ctx.now().saturating_sub(started);
        let gone: HashSet<usize> = departed.iter().map(|d| d.seat).collect();
        let survivors = self
            .names
            .iter()
            .enumerate()
            .filter(|(seat, _)| !gone.contains(seat))
            .map(|(_, name)| name.clone())
            .collect();

        let summary = RunSummary {
            total: n,
            departed,
            survivors,
            outcome,
            elapsed,
            forks: forks.iter().map(|f| f.report()).collect(),
        };

        match summary.outcome {
            RunOutcome::AllDeparted => info!("{}", summary),
            RunOutcome::DeadlineReached => warn!("{}", summary),
        }
        announcer.say("Main", format!("Execution of main took {:?}", elapsed));

        summary
    }
}
