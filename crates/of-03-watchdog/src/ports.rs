//! Outbound ports toward the cache's expiration channel.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The connection to the cache dropped; the caller should reconnect.
    #[error("expiration feed disconnected")]
    Disconnected,
}

/// Connection factory for the reserved expired-keys channel.
#[async_trait]
pub trait ExpirationSource: Send + Sync {
    /// Opens a fresh subscription. Called on startup and after every
    /// disconnect.
    async fn connect(&self) -> Result<Box<dyn ExpirationFeed>, FeedError>;
}

/// One live subscription to the expiration channel.
///
/// The payload is the expired key string only; the value is already gone by
/// the time the notification fires.
#[async_trait]
pub trait ExpirationFeed: Send {
    /// Next expired key, or an error when the connection is lost.
    async fn next_expired(&mut self) -> Result<String, FeedError>;
}
