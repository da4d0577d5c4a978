//! # Shared Bus - Message Bus for Inter-Service Communication
//!
//! Implements the choreography pattern the OrderFlow services are built on.
//!
//! ## Architecture Rules
//!
//! - All inter-service communication goes through the bus ONLY; direct calls
//!   between services are forbidden.
//! - All messages are wrapped in an `Envelope<T>` (see `shared-types`).
//! - Request/reply flows are emulated on top of fire-and-forget publish via
//!   the [`rpc::RequestClient`], which correlates exactly one reply per call
//!   and normalizes every failure into the shared [`Fault`] contract.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Service A   │    publish()       │  Service B   │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │ Message Bus  │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! [`Fault`]: shared_types::Fault

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod correlation;
pub mod message;
pub mod pending;
pub mod publisher;
pub mod rpc;
pub mod subscriber;

// Re-export main types
pub use correlation::CorrelationId;
pub use message::{BusMessage, TopicFilter};
pub use pending::{PendingReplyStore, PendingStats};
pub use publisher::{InMemoryMessageBus, MessagePublisher};
pub use rpc::{reply_fault, reply_ok, RequestClient};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum messages to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
