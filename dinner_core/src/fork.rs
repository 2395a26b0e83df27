//! Forks: the shared, exclusive-use resources between neighbouring seats.
//!
//! A fork is held by at most one philosopher at a time. Holding is proven
//! by a move-only [`ForkToken`]: acquiring a fork yields its token, and
//! releasing consumes it. Two interchangeable representations exist:
//!
//! - [`ChannelFork`](crate::ChannelFork): the token rests in a single-slot
//!   channel while the fork is on the table.
//! - [`AtomicFork`](crate::AtomicFork): a compare-exchange flag with a wake-up
//!   notification for the waiting neighbour.
//!
//! Both carry a [`HoldGauge`] so runs can check the single-owner invariant.

use crate::error::CoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Ring position of a fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForkId(pub usize);

impl std::fmt::Display for ForkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fork#{}", self.0)
    }
}

/// Proof that the bearer holds one fork.
///
/// Only forks mint tokens, and a token cannot be cloned, so a fork's
/// token is either on the table or in exactly one philosopher's hands.
#[derive(Debug, PartialEq, Eq)]
pub struct ForkToken {
    fork: ForkId,
}

impl ForkToken {
    pub(crate) fn mint(fork: ForkId) -> Self {
        Self { fork }
    }

    /// Returns the fork this token belongs to.
    pub fn fork(&self) -> ForkId {
        self.fork
    }
}

/// Instrumentation counting concurrent holders of one fork.
#[derive(Debug, Default)]
pub struct HoldGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    acquisitions: AtomicU64,
}

impl HoldGauge {
    /// Creates an empty gauge.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_acquire(&self) {
        let holders = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(holders, Ordering::SeqCst);
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_release(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    /// Holders right now (0 or 1).
    pub fn holders(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous holders ever observed.
    pub fn peak_holders(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Total successful acquisitions.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }
}

/// Per-fork snapshot included in a run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkReport {
    pub id: ForkId,
    pub acquisitions: u64,
    pub peak_holders: usize,
    pub free: bool,
}

/// A shared fork between two neighbouring seats.
///
/// `acquire` must be cancel-safe: philosophers race it against timers in
/// `tokio::select!`, and a dropped acquisition must not lose the token.
#[async_trait]
pub trait Fork: Send + Sync + 'static {
    /// Creates a fork lying free on the table.
    fn laid(id: ForkId) -> Self
    where
        Self: Sized;

    /// Returns this fork's ring position.
    fn id(&self) -> ForkId;

    /// Waits until the fork is free and takes it.
    async fn acquire(&self) -> ForkToken;

    /// Puts the fork back on the table.
    ///
    /// # Errors
    /// * `CoreError::ForeignToken` - the token belongs to another fork
    /// * `CoreError::ForkOverflow` - the fork is already on the table
    fn release(&self, token: ForkToken) -> Result<(), CoreError>;

    /// Returns true if the fork is on the table.
    fn is_free(&self) -> bool;

    /// Returns the holder instrumentation.
    fn gauge(&self) -> &HoldGauge;

    /// Rejects tokens minted by a different fork.
    fn check_token(&self, token: &ForkToken) -> Result<(), CoreError> {
        if token.fork() != self.id() {
            return Err(CoreError::ForeignToken {
                fork: self.id().0,
                token: token.fork().0,
            });
        }
        Ok(())
    }

    /// Snapshots the fork for reporting.
    fn report(&self) -> ForkReport {
        let gauge = self.gauge();
        ForkReport {
            id: self.id(),
            acquisitions: gauge.acquisitions(),
            peak_holders: gauge.peak_holders(),
            free: self.is_free(),
        }
    }
}

/// Selects the fork representation used for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForkKind {
    /// Single-slot exchange channel
    #[default]
    Channel,

    /// Compare-exchange flag
    Atomic,
}

impl ForkKind {
    /// Returns the representation name.
    pub fn name(&self) -> &'static str {
        match self {
            ForkKind::Channel => "channel",
            ForkKind::Atomic => "atomic",
        }
    }
}

impl std::fmt::Display for ForkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ForkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "channel" | "chan" => Ok(ForkKind::Channel),
            "atomic" | "flag" => Ok(ForkKind::Atomic),
            _ => Err(format!("Unknown fork kind: {}", s)),
        }
    }
}

/// Returns the (left, right) forks of `seat` at a table of `n`.
///
/// Fork `i` is shared by seat `i` (as its left) and seat `i + 1` (as its
/// right), wrapping around. With a single seat both sides are fork 0.
pub fn ring_seats(seat: usize, n: usize) -> (ForkId, ForkId) {
    debug_assert!(n > 0 && seat < n);
    (ForkId(seat), ForkId((seat + n - 1) % n))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    /// Contract every fork representation must satisfy.
    pub(crate) async fn exercise_fork<F: Fork>() {
        let fork = F::laid(ForkId(3));
        assert_eq!(fork.id(), ForkId(3));
        assert!(fork.is_free());

        let token = fork.acquire().await;
        assert_eq!(token.fork(), ForkId(3));
        assert!(!fork.is_free());
        assert_eq!(fork.gauge().holders(), 1);

        // A second acquisition must wait while the token is out
        let blocked = tokio::time::timeout(Duration::from_millis(50), fork.acquire()).await;
        assert!(blocked.is_err());

        fork.release(token).unwrap();
        assert!(fork.is_free());
        assert_eq!(fork.gauge().holders(), 0);

        // The cancelled acquisition above must not have swallowed the token
        let again = fork.acquire().await;
        fork.release(again).unwrap();

        let report = fork.report();
        assert_eq!(report.acquisitions, 2);
        assert_eq!(report.peak_holders, 1);
        assert!(report.free);
    }

    /// Foreign tokens are refused and leave the fork untouched.
    pub(crate) async fn exercise_foreign_token<F: Fork>() {
        let a = F::laid(ForkId(0));
        let b = F::laid(ForkId(1));

        let token = a.acquire().await;
        let err = b.release(token).unwrap_err();
        assert_eq!(err, CoreError::ForeignToken { fork: 1, token: 0 });
        assert!(b.is_free());
        assert_eq!(b.gauge().holders(), 0);
    }

    #[test]
    fn test_single_seat_wraps_to_itself() {
        assert_eq!(ring_seats(0, 1), (ForkId(0), ForkId(0)));
    }

    #[test]
    fn test_first_seat_wraps_to_last_fork() {
        assert_eq!(ring_seats(0, 5), (ForkId(0), ForkId(4)));
        assert_eq!(ring_seats(3, 5), (ForkId(3), ForkId(2)));
    }

    #[test]
    fn test_fork_kind_parse() {
        assert_eq!("channel".parse::<ForkKind>(), Ok(ForkKind::Channel));
        assert_eq!("ATOMIC".parse::<ForkKind>(), Ok(ForkKind::Atomic));
        assert!("spoon".parse::<ForkKind>().is_err());
    }

    proptest! {
        #[test]
        fn prop_every_fork_shared_by_two_neighbours(n in 2usize..64) {
            let mut lefts = vec![0usize; n];
            let mut rights = vec![0usize; n];

            for seat in 0..n {
                let (left, right) = ring_seats(seat, n);
                prop_assert_ne!(left, right);
                lefts[left.0] += 1;
                rights[right.0] += 1;

                // The right fork of a seat is the left fork of the previous seat
                let previous = (seat + n - 1) % n;
                prop_assert_eq!(right, ring_seats(previous, n).0);
            }

            prop_assert!(lefts.iter().all(|&c| c == 1));
            prop_assert!(rights.iter().all(|&c| c == 1));
        }
    }
}
