//! Token relay between stream clients
//!
//! Every connected client holds a [`Subscription`] on one broadcast channel.
//! A token published by a client reaches every other client; the sender
//! never gets its own token back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use jukebox_common::Token;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

/// Connection-unique client number
pub type ClientId = u64;

/// One token on its way through the hub
#[derive(Debug, Clone)]
pub struct Relayed {
    pub from: ClientId,
    pub token: Token,
}

#[derive(Debug, Clone)]
pub struct Hub {
    tx: broadcast::Sender<Relayed>,
    next_id: Arc<AtomicU64>,
}

impl Hub {
    /// `capacity` bounds how far a slow client may fall behind before it
    /// starts missing tokens
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn join(&self) -> Subscription {
        Subscription {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            rx: self.tx.subscribe(),
        }
    }

    /// Relay `token` from `from`; returns how many subscriptions saw it
    pub fn publish(&self, from: ClientId, token: Token) -> usize {
        self.tx.send(Relayed { from, token }).unwrap_or(0)
    }

    /// Connected clients
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A client's view of the hub
#[derive(Debug)]
pub struct Subscription {
    id: ClientId,
    rx: broadcast::Receiver<Relayed>,
}

impl Subscription {
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Wait for tokens from other clients.
    ///
    /// Returns everything already waiting as one batch, in publish order.
    /// `None` once the hub is gone.
    pub async fn next_batch(&mut self) -> Option<Vec<Token>> {
        loop {
            let first = match self.rx.recv().await {
                Ok(relayed) => relayed,
                Err(RecvError::Lagged(missed)) => {
                    warn!("Client {} missed {} token(s)", self.id, missed);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            };

            let mut batch = Vec::new();
            self.keep(first, &mut batch);
            loop {
                match self.rx.try_recv() {
                    Ok(relayed) => self.keep(relayed, &mut batch),
                    Err(TryRecvError::Lagged(missed)) => {
                        warn!("Client {} missed {} token(s)", self.id, missed);
                    }
                    Err(_) => break,
                }
            }

            if !batch.is_empty() {
                return Some(batch);
            }
        }
    }

    fn keep(&self, relayed: Relayed, batch: &mut Vec<Token>) {
        if relayed.from != self.id {
            batch.push(relayed.token);
        }
    }
}
