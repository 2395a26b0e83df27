//! Fork as a compare-exchange flag.

use crate::error::CoreError;
use crate::fork::{Fork, ForkId, ForkToken, HoldGauge};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// A fork claimed by flipping a flag from free to taken.
///
/// A release wakes one waiting neighbour. `Notify` stores the wake-up if
/// nobody is waiting yet, so a release that lands between a failed claim
/// and the wait is not lost.
pub struct AtomicFork {
    id: ForkId,
    taken: AtomicBool,
    returned: Notify,
    gauge: HoldGauge,
}

impl AtomicFork {
    fn try_claim(&self) -> Option<ForkToken> {
        self.taken
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| {
                self.gauge.on_acquire();
                ForkToken::mint(self.id)
            })
    }
}

#[async_trait]
impl Fork for AtomicFork {
    fn laid(id: ForkId) -> Self {
        Self {
            id,
            taken: AtomicBool::new(false),
            returned: Notify::new(),
            gauge: HoldGauge::new(),
        }
    }

    fn id(&self) -> ForkId {
        self.id
    }

    async fn acquire(&self) -> ForkToken {
        loop {
            if let Some(token) = self.try_claim() {
                return token;
            }
            self.returned.notified().await;
        }
    }

    fn release(&self, token: ForkToken) -> Result<(), CoreError> {
        self.check_token(&token)?;
        // Only the token bearer can reach this point, so nobody else flips the flag meanwhile
        if !self.taken.load(Ordering::Acquire) {
            return Err(CoreError::ForkOverflow(self.id.0));
        }

        self.gauge.on_release();
        self.taken.store(false, Ordering::Release);
        self.returned.notify_one();
        Ok(())
    }

    fn is_free(&self) -> bool {
        !self.taken.load(Ordering::Acquire)
    }

    fn gauge(&self) -> &HoldGauge {
        &self.gauge
    }
}
