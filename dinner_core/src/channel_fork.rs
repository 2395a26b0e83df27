//! Fork as a single-slot exchange channel.
//!
//! While the fork is free its token rests in the channel. Acquiring is
//! receiving the token, releasing is sending it back. The channel has
//! room for exactly one token, so the table can never hold two.

use crate::error::CoreError;
use crate::fork::{Fork, ForkId, ForkToken, HoldGauge};
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

/// A fork whose token travels over a single-slot channel.
///
/// Both neighbours share the receiving half. tokio's mpsc is
/// single-consumer, so the receiver sits behind an async mutex that is
/// held only while waiting for the token.
pub struct ChannelFork {
    id: ForkId,

    /// Returns the token to the table
    tx: mpsc::Sender<ForkToken>,

    /// Takes the token from the table
    rx: Mutex<mpsc::Receiver<ForkToken>>,

    gauge: HoldGauge,
}

#[async_trait]
impl Fork for ChannelFork {
    fn laid(id: ForkId) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // A fresh channel has its one slot open
        let _ = tx.try_send(ForkToken::mint(id));

        Self {
            id,
            tx,
            rx: Mutex::new(rx),
            gauge: HoldGauge::new(),
        }
    }

    fn id(&self) -> ForkId {
        self.id
    }

    async fn acquire(&self) -> ForkToken {
        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Some(token) => {
                self.gauge.on_acquire();
                token
            }
            // `self.tx` keeps the channel open for as long as the fork exists
            None => std::future::pending().await,
        }
    }

    fn release(&self, token: ForkToken) -> Result<(), CoreError> {
        self.check_token(&token)?;
        if self.is_free() {
            return Err(CoreError::ForkOverflow(self.id.0));
        }

        self.gauge.on_release();
        self.tx
            .try_send(token)
            .map_err(|_| CoreError::ForkOverflow(self.id.0))
    }

    fn is_free(&self) -> bool {
        // The only slot is taken by the token lying on the table
        self.tx.capacity() == 0
    }

    fn gauge(&self) -> &HoldGauge {
        &self.gauge
    }
}
