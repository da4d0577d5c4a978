//! # Message Envelope
//!
//! The universal wrapper for all bus traffic crossing a service boundary.
//!
//! ## Properties
//!
//! - **Versioning**: every envelope carries a `version` field checked by
//!   deserializers before processing.
//! - **Correlation**: request/reply flows use `correlation_id` and `reply_to`.
//! - **Identity Propagation**: the raw bearer credential travels in the `auth`
//!   header until the identity extractor replaces it with a verified `user`
//!   claim. Handlers MUST read `user` and MUST NOT re-parse `auth`.
//!
//! Envelopes are created by the producing service, optionally mutated in place
//! by middleware, and consumed by exactly one handler. They are never persisted.

use crate::identity::UserClaims;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// The topic for routing responses in request/reply flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTo {
    /// The topic name to publish the reply to. One reply topic per calling
    /// process; the correlation id disambiguates concurrent calls.
    pub topic: String,
}

/// The universal message envelope for all bus communication.
///
/// # Trust Boundary Rules
///
/// - Every envelope crossing a trust boundary carries a raw bearer credential
///   in `auth` until the identity extractor has run.
/// - After extraction, `user` is the SOLE source of truth for the caller's
///   identity. Any caller-supplied `user` value is overwritten.
/// - Request envelopes expecting a response MUST set `reply_to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Protocol version for forward compatibility.
    pub version: u16,

    /// Unique identifier correlating a request with its eventual reply.
    /// For requests: a freshly generated token, unique per in-flight call.
    /// For replies: the token from the original request.
    pub correlation_id: Uuid,

    /// Routing information for the reply. Present on request envelopes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyTo>,

    /// Unix timestamp (seconds since epoch) when the envelope was created.
    pub timestamp: u64,

    /// Raw bearer credential (`Bearer <token>`), set by the producing edge.
    /// Cleared of meaning once `user` has been populated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,

    /// Verified identity claim. Written ONLY by the identity extractor;
    /// handlers read this slot and nothing else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserClaims>,

    /// The actual message payload.
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Creates a fire-and-forget event envelope (no reply expected, no
    /// credential — internal events originate inside the trust boundary).
    pub fn event(payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            correlation_id: Uuid::now_v7(),
            reply_to: None,
            timestamp: current_timestamp(),
            auth: None,
            user: None,
            payload,
        }
    }

    /// Creates a request envelope with the given correlation token and reply
    /// topic.
    pub fn request(correlation_id: Uuid, reply_topic: impl Into<String>, payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            correlation_id,
            reply_to: Some(ReplyTo {
                topic: reply_topic.into(),
            }),
            timestamp: current_timestamp(),
            auth: None,
            user: None,
            payload,
        }
    }

    /// Creates a reply envelope bound to the originating request's token.
    pub fn reply(correlation_id: Uuid, payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            correlation_id,
            reply_to: None,
            timestamp: current_timestamp(),
            auth: None,
            user: None,
            payload,
        }
    }

    /// Attaches a raw bearer credential to the `auth` header.
    #[must_use]
    pub fn with_auth(mut self, credential: impl Into<String>) -> Self {
        self.auth = Some(credential.into());
        self
    }

    /// Maps the payload, keeping every header intact.
    pub fn map_payload<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            version: self.version,
            correlation_id: self.correlation_id,
            reply_to: self.reply_to,
            timestamp: self.timestamp,
            auth: self.auth,
            user: self.user,
            payload: f(self.payload),
        }
    }
}

/// Current Unix timestamp in seconds.
///
/// Returns 0 if the system clock is before `UNIX_EPOCH`, which no sane
/// system reports.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
