//! # Request-Reply Adapter
//!
//! Emulates "send and await one typed reply" on top of the fire-and-forget
//! bus. Each calling process owns one reply topic; the correlation token
//! disambiguates concurrent calls on it.
//!
//! ## Error contract
//!
//! Every failure surfaces as a [`Fault`]:
//!
//! - the remote encodes `{status, message}` in a non-ok reply →
//!   [`Fault::Remote`], passed through unchanged;
//! - the remote sends anything else that is not the expected result shape →
//!   [`Fault::Internal`] (unstructured remote internals never leak);
//! - no reply within the deadline → [`Fault::Timeout`], and the correlation
//!   entry is released so the table cannot grow without bound.
//!
//! ## Delivery semantics
//!
//! Exactly one publish per `call`; retries are the caller's responsibility.
//! A reply arriving after the caller observed its timeout is discarded.

use crate::correlation::CorrelationId;
use crate::message::{BusMessage, TopicFilter};
use crate::pending::{cleanup_task, PendingReplyStore};
use crate::publisher::{InMemoryMessageBus, MessagePublisher};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{Envelope, Fault, ReplyBody, WireFault};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// How often the backstop sweep scans the correlation table for entries
/// whose waiter vanished without cancelling.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Client side of the request-reply adapter.
///
/// Safe for arbitrary concurrent use; every in-flight call occupies exactly
/// one slot in the shared correlation table.
pub struct RequestClient {
    bus: Arc<InMemoryMessageBus>,
    reply_topic: String,
    pending: Arc<PendingReplyStore>,
    default_timeout: Duration,
}

impl RequestClient {
    /// Creates a client with a process-unique reply topic and spawns its
    /// reply listener and expiry sweeper.
    pub fn new(bus: Arc<InMemoryMessageBus>, service: &str, default_timeout: Duration) -> Self {
        let reply_topic = format!("reply.{}.{}", service, Uuid::new_v4());
        let pending = Arc::new(PendingReplyStore::new(default_timeout));

        let subscription = bus.subscribe(TopicFilter::topic(reply_topic.clone()));
        tokio::spawn(reply_listener(subscription, Arc::clone(&pending)));

        // Backstop for callers that vanish (dropped or aborted futures) before
        // their deadline runs the cancel path.
        tokio::spawn(cleanup_task(Arc::clone(&pending), SWEEP_INTERVAL));

        Self {
            bus,
            reply_topic,
            pending,
            default_timeout,
        }
    }

    /// The reply topic this client listens on.
    #[must_use]
    pub fn reply_topic(&self) -> &str {
        &self.reply_topic
    }

    /// Access to the correlation table (statistics, tests).
    pub fn pending(&self) -> &Arc<PendingReplyStore> {
        &self.pending
    }

    /// Sends `payload` to `topic` and awaits exactly one typed reply.
    pub async fn call<Req, Resp>(
        &self,
        topic: &str,
        payload: &Req,
        timeout: Duration,
    ) -> Result<Resp, Fault>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        self.call_inner(topic, payload, timeout, None).await
    }

    /// Like [`call`](Self::call) but attaches a raw bearer credential to the
    /// envelope's `auth` header, propagating the caller's identity to the
    /// remote handler.
    pub async fn call_with_auth<Req, Resp>(
        &self,
        topic: &str,
        payload: &Req,
        timeout: Duration,
        bearer: &str,
    ) -> Result<Resp, Fault>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        self.call_inner(topic, payload, timeout, Some(bearer)).await
    }

    /// The default per-call deadline.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    async fn call_inner<Req, Resp>(
        &self,
        topic: &str,
        payload: &Req,
        timeout: Duration,
        bearer: Option<&str>,
    ) -> Result<Resp, Fault>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let value = serde_json::to_value(payload).map_err(|e| {
            error!(topic = topic, error = %e, "Failed to serialize request payload");
            Fault::Internal
        })?;

        let (correlation_id, rx) = self.pending.register(topic, Some(timeout));

        let mut envelope = Envelope::request(correlation_id.into(), &self.reply_topic, value);
        if let Some(bearer) = bearer {
            envelope = envelope.with_auth(bearer);
        }

        // Exactly one publish per call; idempotence is the caller's problem.
        self.bus.publish(BusMessage::new(topic, envelope)).await;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => decode_reply(reply),
            Ok(Err(_recv)) => {
                // Sender dropped without a reply: the sweeper evicted the
                // entry. Same outcome as a timeout for the caller.
                warn!(
                    correlation_id = %correlation_id,
                    topic = topic,
                    "Pending call evicted before a reply arrived"
                );
                Err(Fault::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
            Err(_elapsed) => {
                // Release the slot; a racing reply finds nothing and is
                // discarded by the listener.
                self.pending.cancel(&correlation_id);
                debug!(
                    correlation_id = %correlation_id,
                    topic = topic,
                    timeout_ms = timeout.as_millis() as u64,
                    "Call timed out"
                );
                Err(Fault::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}

/// Decodes a reply body into the typed result or a fault.
fn decode_reply<Resp: DeserializeOwned>(reply: ReplyBody) -> Result<Resp, Fault> {
    if reply.ok {
        serde_json::from_value(reply.body).map_err(|e| {
            warn!(error = %e, "Reply body did not match the expected shape");
            Fault::Internal
        })
    } else {
        match serde_json::from_value::<WireFault>(reply.body) {
            Ok(wire) => Err(wire.into()),
            Err(_) => Err(Fault::Internal),
        }
    }
}

/// Drains the reply topic and completes pending calls.
async fn reply_listener(mut subscription: crate::subscriber::Subscription, pending: Arc<PendingReplyStore>) {
    while let Some(message) = subscription.recv().await {
        let correlation_id = CorrelationId::from_uuid(message.envelope.correlation_id);
        let reply: ReplyBody = match serde_json::from_value(message.envelope.payload) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "Discarding malformed reply envelope"
                );
                continue;
            }
        };

        // A false return is a late or unknown reply; it is dropped here and
        // never handed to a second waiter.
        pending.complete(correlation_id, reply);
    }
    debug!("Reply listener stopped (bus closed)");
}

/// Publishes a successful reply for `request` onto its `reply_to` topic.
pub async fn reply_ok<T: Serialize>(
    bus: &dyn MessagePublisher,
    request: &Envelope<serde_json::Value>,
    body: &T,
) {
    let payload = match serde_json::to_value(body) {
        Ok(value) => ReplyBody::success(value),
        Err(e) => {
            error!(error = %e, "Failed to serialize reply body");
            ReplyBody::failure(serde_json::to_value(Fault::Internal.to_wire()).unwrap_or_default())
        }
    };
    publish_reply(bus, request, payload).await;
}

/// Publishes a fault reply for `request` onto its `reply_to` topic.
pub async fn reply_fault(
    bus: &dyn MessagePublisher,
    request: &Envelope<serde_json::Value>,
    fault: &Fault,
) {
    let wire = fault.to_wire();
    let payload = ReplyBody::failure(serde_json::to_value(&wire).unwrap_or_default());
    publish_reply(bus, request, payload).await;
}

async fn publish_reply(
    bus: &dyn MessagePublisher,
    request: &Envelope<serde_json::Value>,
    payload: ReplyBody,
) {
    let Some(reply_to) = request.reply_to.as_ref() else {
        warn!(
            correlation_id = %request.correlation_id,
            "Request envelope has no reply route; reply dropped"
        );
        return;
    };

    let value = match serde_json::to_value(&payload) {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, "Failed to serialize reply payload");
            return;
        }
    };

    let envelope = Envelope::reply(request.correlation_id, value);
    bus.publish(BusMessage::new(reply_to.topic.clone(), envelope))
        .await;
}
