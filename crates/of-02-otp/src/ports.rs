//! Outbound ports.

use async_trait::async_trait;

/// One-way delivery of a code to the user (SMS gateway or similar).
///
/// Returns whether the side channel accepted the code. The store does not
/// care what happens after acceptance.
#[async_trait]
pub trait CodeDelivery: Send + Sync {
    async fn deliver(&self, destination: &str, code: &str) -> bool;
}
