//! The drain loop: expiration feed in, `order.timeout` events out.

use crate::backoff::Backoff;
use crate::ports::{ExpirationSource, FeedError};
use shared_bus::{BusMessage, InMemoryMessageBus, MessagePublisher};
use shared_types::{topics, DeadlineKey, Envelope, OrderTimeoutPayload};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct ExpiryWatchdog {
    source: Arc<dyn ExpirationSource>,
    bus: Arc<InMemoryMessageBus>,
}

impl ExpiryWatchdog {
    pub fn new(source: Arc<dyn ExpirationSource>, bus: Arc<InMemoryMessageBus>) -> Self {
        Self { source, bus }
    }

    /// Drains the expiration feed forever.
    ///
    /// A lost connection is logged and retried with bounded backoff,
    /// indefinitely. Expirations firing while disconnected are lost; the
    /// loop never crashes the process over them.
    pub async fn run(self) {
        let mut backoff = Backoff::new();
        loop {
            let mut feed = match self.source.connect().await {
                Ok(feed) => {
                    info!("Subscribed to the expiration channel");
                    backoff.reset();
                    feed
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(error = %e, delay_ms = delay.as_millis() as u64, "Expiration channel unavailable, retrying");
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            loop {
                match feed.next_expired().await {
                    Ok(key) => self.handle_expired(&key).await,
                    Err(FeedError::Disconnected) => {
                        warn!("Expiration feed lost, reconnecting");
                        break;
                    }
                }
            }
        }
    }

    async fn handle_expired(&self, key: &str) {
        // The channel carries every expired key; only deadline keys matter.
        let Some(deadline) = DeadlineKey::parse(key) else {
            debug!(key = key, "Ignoring unrelated expired key");
            return;
        };

        let payload = OrderTimeoutPayload {
            order_id: deadline.order_id().clone(),
        };
        let value = match serde_json::to_value(&payload) {
            Ok(value) => value,
            Err(e) => {
                error!(key = key, error = %e, "Failed to encode timeout event");
                return;
            }
        };

        info!(order_id = %payload.order_id, "Payment window elapsed, publishing timeout");
        self.bus
            .publish(BusMessage::new(topics::ORDER_TIMEOUT, Envelope::event(value)))
            .await;
    }
}
