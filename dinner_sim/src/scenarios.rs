//! Named dinner presets with known expected outcomes.

use dinner_core::DinnerConfig;
use std::time::Duration;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Upstream defaults: 20 philosophers for two minutes
    Classic,

    /// Zero hunger budget: everyone starves on the first hungry turn
    Famine,

    /// Instant meals and no thinking, three meals each: everyone leaves before the deadline
    Banquet,

    /// Run deadline shorter than the hunger budget: partial summary
    Curfew,

    /// A single seat whose two sides are the same fork
    Hermit,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Classic,
            ScenarioId::Famine,
            ScenarioId::Banquet,
            ScenarioId::Curfew,
            ScenarioId::Hermit,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Classic => "classic",
            ScenarioId::Famine => "famine",
            ScenarioId::Banquet => "banquet",
            ScenarioId::Curfew => "curfew",
            ScenarioId::Hermit => "hermit",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Classic => "20 philosophers, think 30s, eat 10s, starve after 40s, 2 minute run",
            ScenarioId::Famine => "5 philosophers with no hunger budget, all die without eating",
            ScenarioId::Banquet => "5 philosophers, instant meals, 3 meals each, all leave within 10s",
            ScenarioId::Curfew => "2 philosophers, 1s run against a 5s hunger budget, partial summary",
            ScenarioId::Hermit => "1 philosopher alone with one fork, starves without deadlocking",
        }
    }

    /// Returns the run configuration for this scenario.
    pub fn config(&self) -> DinnerConfig {
        match self {
            ScenarioId::Classic => DinnerConfig::default(),
            ScenarioId::Famine => DinnerConfig {
                philosophers: 5,
                max_think: Duration::from_secs(1),
                eat: Duration::from_secs(1),
                max_hungry: Duration::ZERO,
                run_deadline: Duration::from_secs(10),
                ..Default::default()
            },
            ScenarioId::Banquet => DinnerConfig {
                philosophers: 5,
                max_think: Duration::ZERO,
                eat: Duration::ZERO,
                max_hungry: Duration::from_secs(1),
                backoff: Duration::from_millis(50),
                run_deadline: Duration::from_secs(10),
                appetite: Some(3),
                ..Default::default()
            },
            ScenarioId::Curfew => DinnerConfig {
                philosophers: 2,
                max_think: Duration::from_millis(300),
                eat: Duration::from_millis(300),
                max_hungry: Duration::from_secs(5),
                backoff: Duration::from_millis(50),
                run_deadline: Duration::from_secs(1),
                ..Default::default()
            },
            ScenarioId::Hermit => DinnerConfig {
                philosophers: 1,
                max_think: Duration::from_millis(100),
                eat: Duration::from_millis(100),
                max_hungry: Duration::from_secs(2),
                backoff: Duration::from_millis(100),
                run_deadline: Duration::from_secs(10),
                ..Default::default()
            },
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" | "default" => Ok(ScenarioId::Classic),
            "famine" | "zero_hunger" => Ok(ScenarioId::Famine),
            "banquet" => Ok(ScenarioId::Banquet),
            "curfew" | "deadline" => Ok(ScenarioId::Curfew),
            "hermit" | "alone" => Ok(ScenarioId::Hermit),
            "all" => Err("Use ScenarioId::all() for every scenario".to_string()),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
