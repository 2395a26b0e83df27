//! Scenario runner - seats a table, runs it, checks the outcome.

use crate::context::SeededContext;
use crate::names::NameGenerator;
use crate::scenarios::ScenarioId;
use crate::sink::TracingSink;

use dinner_core::{
    announce, AnnouncementSink, Coordinator, CoreError, DinnerConfig, ForkKind, RunOutcome, RunSummary,
    Verbosity,
};
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether the run matched the scenario's expected outcome
    pub passed: bool,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Coordinator summary
    pub summary: RunSummary,
}

/// Runs dinners with a seeded context and generated names.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Fork representation override
    fork_kind: Option<ForkKind>,

    verbosity: Verbosity,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            fork_kind: None,
            verbosity: Verbosity::Quiet,
        }
    }

    /// Forces a fork representation for every run.
    pub fn with_fork_kind(mut self, kind: ForkKind) -> Self {
        self.fork_kind = Some(kind);
        self
    }

    /// Sets the announcement verbosity.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Returns the seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs a scenario and checks its expected outcome.
    pub async fn run(&self, scenario: ScenarioId) -> Result<ScenarioResult, CoreError> {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        info!("  {}", scenario.description());

        let summary = self.run_config(scenario.config()).await?;
        let failure_reason = Self::check(scenario, &summary);

        Ok(ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failure_reason.is_none(),
            failure_reason,
            summary,
        })
    }

    /// Runs an arbitrary configuration.
    ///
    /// The runner's verbosity and fork override are applied on top of `config`.
    ///
    /// # Errors
    /// * `CoreError::Config` - the configuration was rejected before start
    pub async fn run_config(&self, config: DinnerConfig) -> Result<RunSummary, CoreError> {
        let (summary, sink) = self.run_config_into(config, TracingSink::new()).await?;
        debug!(announcements = sink.delivered(), "Reporter finished");
        Ok(summary)
    }

    /// Runs an arbitrary configuration, reporting announcements into `sink`.
    ///
    /// Every announcement emitted before the coordinator returns, the
    /// closing "Main" record included, has been delivered when this
    /// returns. The sink is handed back with the summary.
    ///
    /// # Errors
    /// * `CoreError::Config` - the configuration was rejected before start
    pub async fn run_config_into<S: AnnouncementSink>(
        &self,
        config: DinnerConfig,
        sink: S,
    ) -> Result<(RunSummary, S), CoreError> {
        let mut config = config.with_verbosity(self.verbosity);
        if let Some(kind) = self.fork_kind {
            config = config.with_fork_kind(kind);
        }

        // Derive separate seeds for different subsystems
        let context_seed = self.seed;
        let names_seed = self.seed.wrapping_mul(0x9e3779b97f4a7c15);

        let ctx = SeededContext::shared(context_seed);
        let names = NameGenerator::new(names_seed).unique(config.philosophers);

        let (announcer, stream) = announce::channel(config.verbosity);
        let coordinator = Coordinator::new(ctx, config, names)?;

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let run = async move {
            let summary = coordinator.run(announcer).await;
            // Survivors still hold announcers after a deadline
            let _ = stop_tx.send(());
            summary
        };
        let report = stream.drain_until(sink, async move {
            let _ = stop_rx.await;
        });

        Ok(tokio::join!(run, report))
    }

    fn check(scenario: ScenarioId, summary: &RunSummary) -> Option<String> {
        if summary.peak_fork_holders() > 1 {
            return Some(format!(
                "A fork had {} simultaneous holders",
                summary.peak_fork_holders()
            ));
        }

        match scenario {
            // No deadlock is the only promise: the run ended one way or the other
            ScenarioId::Classic => None,
            ScenarioId::Famine => {
                if !summary.is_complete() || summary.deaths() != summary.total {
                    Some(format!("Expected every philosopher to starve: {}", summary))
                } else if summary.departed.iter().any(|d| d.meals > 0) {
                    Some("A philosopher ate with no hunger budget".to_string())
                } else {
                    None
                }
            }
            ScenarioId::Banquet => {
                if summary.outcome != RunOutcome::AllDeparted {
                    Some(format!("Banquet did not finish before the deadline: {}", summary))
                } else if summary.forks.iter().any(|f| !f.free) {
                    Some("A fork was not back on the table".to_string())
                } else {
                    None
                }
            }
            ScenarioId::Curfew => {
                if summary.outcome != RunOutcome::DeadlineReached || summary.deaths() >= summary.total {
                    Some(format!("Expected a partial summary: {}", summary))
                } else {
                    None
                }
            }
            ScenarioId::Hermit => {
                let starved = summary.departed.first().map(|d| d.meals == 0).unwrap_or(false);
                if !summary.is_complete() || !starved {
                    Some(format!("Expected the hermit to starve: {}", summary))
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_scenarios_pass_with_both_fork_kinds() {
        for kind in [ForkKind::Channel, ForkKind::Atomic] {
            let runner = ScenarioRunner::new(42).with_fork_kind(kind);

            for scenario in [ScenarioId::Famine, ScenarioId::Banquet, ScenarioId::Curfew, ScenarioId::Hermit] {
                let result = runner.run(scenario).await.unwrap();
                assert!(
                    result.passed,
                    "{} with {} forks: {:?}",
                    scenario,
                    kind,
                    result.failure_reason
                );
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_classic_never_deadlocks() {
        let runner = ScenarioRunner::new(7).with_verbosity(Verbosity::Verbose);
        let result = runner.run(ScenarioId::Classic).await.unwrap();

        assert!(result.passed);
        assert_eq!(result.summary.total, 20);
        assert!(result.summary.elapsed <= Duration::from_millis(120_100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_rejected_before_start() {
        let runner = ScenarioRunner::new(1);
        let config = DinnerConfig {
            backoff: Duration::ZERO,
            ..Default::default()
        };

        let err = runner.run_config(config).await.unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_announcement_reported_before_return() {
        let runner = ScenarioRunner::new(5);
        let (summary, records) = runner
            .run_config_into(ScenarioId::Banquet.config(), Vec::new())
            .await
            .unwrap();

        assert_eq!(summary.outcome, RunOutcome::AllDeparted);
        let last = records.last().unwrap();
        assert_eq!(last.from, "Main");
        assert!(last.message.starts_with("Execution of main took"));

        let lives = records.iter().filter(|a| a.message.contains("my life")).count();
        assert_eq!(lives, summary.total);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_run_still_reports_main() {
        let runner = ScenarioRunner::new(5);
        let (summary, records) = runner
            .run_config_into(ScenarioId::Curfew.config(), Vec::new())
            .await
            .unwrap();

        assert_eq!(summary.outcome, RunOutcome::DeadlineReached);
        assert!(records.iter().any(|a| a.from == "Main"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generated_names_reach_summary() {
        let runner = ScenarioRunner::new(99);
        let result = runner.run(ScenarioId::Famine).await.unwrap();

        let mut names: Vec<String> = result.summary.departed.iter().map(|d| d.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
        assert!(names.iter().all(|n| n.contains('_')));
    }
}
