//! Deadline store backed by the in-process cache the watchdog drains.

use crate::ports::DeadlineStore;
use async_trait::async_trait;
use of_03_watchdog::InMemoryDeadlineCache;
use shared_types::DeadlineKey;
use std::sync::Arc;
use std::time::Duration;

pub struct CacheDeadlineStore {
    cache: Arc<InMemoryDeadlineCache>,
}

impl CacheDeadlineStore {
    pub fn new(cache: Arc<InMemoryDeadlineCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl DeadlineStore for CacheDeadlineStore {
    async fn arm(&self, key: &DeadlineKey, ttl: Duration) {
        self.cache.set(&key.to_string(), ttl);
    }

    async fn disarm(&self, key: &DeadlineKey) -> bool {
        self.cache.delete(&key.to_string())
    }
}
