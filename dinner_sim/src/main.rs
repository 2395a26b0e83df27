//! Dining Philosophers Simulator CLI
//!
//! Run a dinner from command-line timings, or one of the named scenarios.

use clap::Parser;
use dinner_core::{DinnerConfig, ForkKind, RunSummary, Verbosity};
use dinner_sim::scenarios::ScenarioId;
use dinner_sim::{ScenarioResult, ScenarioRunner};
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Parses a non-negative number of seconds.
fn parse_secs(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{}: {}", s, e))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{}: {}", s, e))
}

/// Philosophers Dinner experimentation
#[derive(Parser, Debug)]
#[command(name = "dinner-sim", version)]
#[command(about = "Use flags to control the testing environment", long_about = None)]
struct Args {
    /// Time to run the experiment, in seconds
    #[arg(short, long, default_value = "120", value_parser = parse_secs)]
    time: Duration,

    /// How many philosophers to simulate
    #[arg(short = 'n', long, default_value = "20")]
    philo_number: usize,

    /// Maximum length of a thinking period, in seconds
    #[arg(short = 's', long, default_value = "30", value_parser = parse_secs)]
    max_think_time: Duration,

    /// Time a philosopher can stay hungry before dying, in seconds
    #[arg(short = 'd', long, default_value = "40", value_parser = parse_secs)]
    max_hungry_time: Duration,

    /// Time it takes to eat, in seconds
    #[arg(short, long, default_value = "10", value_parser = parse_secs)]
    eat_time: Duration,

    /// Waiting time between two attempts to get a fork, in seconds
    #[arg(long, default_value = "0.2", value_parser = parse_secs)]
    tempo: Duration,

    /// Meals after which a philosopher leaves the table (unlimited if unset)
    #[arg(long)]
    appetite: Option<u32>,

    /// Fork representation (channel, atomic)
    #[arg(long, default_value = "channel")]
    forks: ForkKind,

    /// Scenario to run instead of the timing flags (classic, famine, banquet, curfew, hermit, all)
    #[arg(short = 'S', long)]
    scenario: Option<String>,

    /// Master seed (0 = random from time)
    #[arg(long, default_value = "0")]
    seed: u64,

    /// More output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,
}

impl Args {
    fn config(&self) -> DinnerConfig {
        DinnerConfig {
            philosophers: self.philo_number,
            max_think: self.max_think_time,
            eat: self.eat_time,
            max_hungry: self.max_hungry_time,
            backoff: self.tempo,
            run_deadline: self.time,
            appetite: self.appetite,
            verbosity: Verbosity::from_flag(self.verbose),
            fork_kind: self.forks,
        }
    }
}

fn summary_json(summary: &RunSummary) -> serde_json::Value {
    serde_json::json!({
        "total": summary.total,
        "deaths": summary.deaths(),
        "outcome": summary.outcome,
        "elapsed_secs": summary.elapsed.as_secs_f64(),
        "departed": summary.departed,
        "survivors": summary.survivors,
        "peak_fork_holders": summary.peak_fork_holders(),
    })
}

fn result_json(result: &ScenarioResult) -> serde_json::Value {
    serde_json::json!({
        "scenario": result.scenario.name(),
        "seed": result.seed,
        "passed": result.passed,
        "failure_reason": result.failure_reason,
        "summary": summary_json(&result.summary),
    })
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: failed to render JSON: {}", e),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging; RUST_LOG overrides the verbosity flag
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    // Determine seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    let runner = ScenarioRunner::new(seed)
        .with_fork_kind(args.forks)
        .with_verbosity(Verbosity::from_flag(args.verbose));

    let Some(scenario) = &args.scenario else {
        match runner.run_config(args.config()).await {
            Ok(summary) => {
                if args.json {
                    print_json(&summary_json(&summary));
                } else {
                    info!("Summary: {}", summary);
                    if !summary.survivors.is_empty() {
                        info!("Still seated: {}", summary.survivors.join(", "));
                    }
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    };

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if scenario == "all" {
        ScenarioId::all()
    } else {
        vec![scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available scenarios: classic, famine, banquet, curfew, hermit, all");
            std::process::exit(1);
        })]
    };

    let mut results: Vec<ScenarioResult> = Vec::new();
    for scenario in scenarios {
        match runner.run(scenario).await {
            Ok(result) => {
                if !args.json {
                    if result.passed {
                        info!("✓ {} (seed={}) PASSED: {}", scenario.name(), seed, result.summary);
                    } else {
                        error!(
                            "✗ {} (seed={}) FAILED: {}",
                            scenario.name(),
                            seed,
                            result.failure_reason.as_deref().unwrap_or("unknown")
                        );
                    }
                }
                results.push(result);
            }
            Err(e) => {
                eprintln!("Error: {}: {}", scenario.name(), e);
                std::process::exit(1);
            }
        }
    }

    let failed = results.iter().filter(|r| !r.passed).count();
    if args.json {
        print_json(&serde_json::json!({
            "total": results.len(),
            "passed": results.len() - failed,
            "failed": failed,
            "results": results.iter().map(result_json).collect::<Vec<_>>(),
        }));
    } else if failed == 0 {
        info!("All {} scenario runs passed", results.len());
    } else {
        error!("{}/{} scenario runs failed", failed, results.len());
    }

    // Exit with proper code for CI
    if failed > 0 {
        std::process::exit(1);
    }
}
