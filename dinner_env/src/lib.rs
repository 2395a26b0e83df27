//! Dinner Environment Abstraction Layer
//!
//! This crate provides the abstraction that lets the dining philosophers
//! run against real timers in production and against a seeded RNG (and a
//! paused tokio clock) in simulation and tests.
//!
//! # Core Concept
//!
//! Every source of non-determinism a philosopher touches goes through the
//! context:
//! - Time (`now()`, `sleep()`)
//! - Scheduling (`spawn()`)
//! - Randomness (`random_duration()`)
//!
//! # Example
//!
//! ```ignore
//! use dinner_env::DinnerContext;
//!
//! async fn wait_for_fork<Ctx: DinnerContext>(ctx: &Ctx, fork: &ChannelFork) {
//!     tokio::select! {
//!         token = fork.acquire() => eat(token),
//!         _ = ctx.sleep(Duration::from_millis(400)) => give_up(),
//!     }
//! }
//! ```

mod context;
mod tokio_impl;

pub use context::DinnerContext;
pub use tokio_impl::TokioContext;
