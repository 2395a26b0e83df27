//! Dinner Simulation Harness
//!
//! Runs the dining philosophers from `dinner_core` as a process:
//! - **Seeded context**: think durations drawn from one 64-bit seed
//! - **Names**: unique docker-style names for every seat
//! - **Reporter**: announcements rendered through `tracing`
//! - **Scenarios**: presets with a known expected outcome, checked after the run
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ScenarioRunner                        │
//! │                                                              │
//! │   SeededContext      NameGenerator        TracingSink        │
//! │        │                   │                   ▲             │
//! │        ▼                   ▼                   │             │
//! │  ┌──────────────────────────────────┐   announcements        │
//! │  │           Coordinator            │──────────┘             │
//! │  │  fork 0 · philosopher 0 · fork 1 │                        │
//! │  │  ... ring of N ...               │◄── departures          │
//! │  └──────────────────────────────────┘                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use dinner_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42);
//! let result = runner.run(ScenarioId::Banquet).await?;
//! assert!(result.passed);
//! ```

mod context;
mod names;
mod runner;
mod sink;
pub mod scenarios;

pub use context::SeededContext;
pub use names::NameGenerator;
pub use runner::{ScenarioResult, ScenarioRunner};
pub use sink::TracingSink;
