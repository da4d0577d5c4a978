//! Outbound ports.

use async_trait::async_trait;
use shared_types::DeadlineKey;
use std::time::Duration;

/// The cache keys whose TTL represents open payment windows.
#[async_trait]
pub trait DeadlineStore: Send + Sync {
    /// Arms the key; its expiration after `ttl` is the timeout signal.
    async fn arm(&self, key: &DeadlineKey, ttl: Duration);

    /// Deletes the key, guaranteeing its expiration will never fire.
    /// Returns false when the key was already gone (expired or never set).
    async fn disarm(&self, key: &DeadlineKey) -> bool;
}
