//! # OF-03: Expiry Watchdog
//!
//! Turns cache key expirations into `order.timeout` events.
//!
//! A payment window is represented by one cache key per order
//! (`order:<id>:paymentPending`) whose TTL is the window. When the key
//! expires, the watchdog publishes an [`shared_types::OrderTimeoutPayload`]
//! event; when payment lands first, the producing side deletes the key so
//! the expiration can never fire.
//!
//! ## Delivery semantics
//!
//! At-most-once. The underlying primitive fires exactly once per key on the
//! transition to expired, but expirations happening while the watchdog is
//! disconnected from the cache are lost, not replayed. Consumers must treat
//! a missing timeout as possible and reconcile by other means if they need
//! stronger guarantees.

#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod backoff;
pub mod ports;
pub mod watchdog;

pub use adapters::memory_cache::InMemoryDeadlineCache;
pub use backoff::Backoff;
pub use ports::{ExpirationFeed, ExpirationSource, FeedError};
pub use watchdog::ExpiryWatchdog;
