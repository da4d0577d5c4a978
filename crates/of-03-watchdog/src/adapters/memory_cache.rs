//! In-process deadline cache with key-expiration notifications.
//!
//! Each armed key gets a generation number and a timer task. The timer only
//! fires the expiration if the key still holds its generation: an explicit
//! delete (payment landed) or a re-arm (new window) removes or replaces the
//! generation first, and the removal is atomic on the map entry. A deleted
//! key therefore never produces a notification, which is exactly the
//! stale-timeout guarantee the payment path relies on.

use crate::ports::{ExpirationFeed, ExpirationSource, FeedError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EXPIRED_CHANNEL_CAPACITY: usize = 1024;

pub struct InMemoryDeadlineCache {
    entries: Arc<DashMap<String, u64>>,
    generation: AtomicU64,
    expired_tx: broadcast::Sender<String>,
}

impl InMemoryDeadlineCache {
    #[must_use]
    pub fn new() -> Self {
        let (expired_tx, _) = broadcast::channel(EXPIRED_CHANNEL_CAPACITY);
        Self {
            entries: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
            expired_tx,
        }
    }

    /// Arms `key` with the given TTL, replacing any live timer for it.
    pub fn set(&self, key: &str, ttl: Duration) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(key.to_string(), generation);

        let entries = Arc::clone(&self.entries);
        let expired_tx = self.expired_tx.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            // Fires only if the key still carries our generation. A delete
            // or re-arm in the meantime wins the race unconditionally.
            if entries.remove_if(&key, |_, g| *g == generation).is_some() {
                debug!(key = %key, "Deadline key expired");
                let _ = expired_tx.send(key);
            }
        });
    }

    /// Deletes `key`, disarming its timer. Returns whether the key was live.
    ///
    /// After this returns true, no expiration notification for this arming
    /// of the key will ever fire.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Whether `key` is currently armed.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl Default for InMemoryDeadlineCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExpirationSource for InMemoryDeadlineCache {
    async fn connect(&self) -> Result<Box<dyn ExpirationFeed>, FeedError> {
        Ok(Box::new(BroadcastFeed {
            receiver: self.expired_tx.subscribe(),
        }))
    }
}

struct BroadcastFeed {
    receiver: broadcast::Receiver<String>,
}

#[async_trait]
impl ExpirationFeed for BroadcastFeed {
    async fn next_expired(&mut self) -> Result<String, FeedError> {
        loop {
            match self.receiver.recv().await {
                Ok(key) => return Ok(key),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Notifications in the gap are lost, matching the
                    // documented at-most-once window.
                    warn!(missed = missed, "Expiration feed lagged, notifications dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(FeedError::Disconnected),
            }
        }
    }
}
