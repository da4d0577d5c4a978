//! # Fault Taxonomy
//!
//! The single error contract visible above the transport layer. The
//! request-reply adapter and the identity extractor convert every lower-level
//! failure into one of these kinds at the boundary; callers never see raw
//! transport errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when a remote failure is collapsed to [`Fault::Internal`].
pub const INTERNAL_FAULT_MESSAGE: &str = "internal error";

/// Faults crossing component boundaries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Fault {
    /// Missing, malformed, or expired credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A downstream service explicitly reported a structured error.
    /// Status and message are passed through unchanged, never reinterpreted.
    #[error("remote fault {status}: {message}")]
    Remote { status: u16, message: String },

    /// Anything else from a downstream, collapsed so unstructured remote
    /// internals never leak to callers.
    #[error("{INTERNAL_FAULT_MESSAGE}")]
    Internal,

    /// No reply arrived within the caller's deadline.
    #[error("no reply within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// One-time code mismatch, expiry, or lockout. Deliberately reason-less:
    /// callers cannot distinguish which of the three occurred.
    #[error("verification failed")]
    VerificationFailed,
}

impl Fault {
    /// HTTP status an edge layer maps this fault to.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Remote { status, .. } => *status,
            Self::Internal => 500,
            Self::Timeout { .. } => 504,
            Self::VerificationFailed => 400,
        }
    }

    /// Wire representation (`{status, message}`) for reply envelopes.
    ///
    /// A relayed remote fault keeps its original message so a fault crossing
    /// several hops arrives verbatim.
    #[must_use]
    pub fn to_wire(&self) -> WireFault {
        let message = match self {
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        };
        WireFault {
            status: self.http_status(),
            message,
        }
    }
}

/// The structured fault shape a remote encodes in its reply body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFault {
    pub status: u16,
    pub message: String,
}

impl From<WireFault> for Fault {
    /// A structured remote fault is re-raised verbatim.
    fn from(wire: WireFault) -> Self {
        Fault::Remote {
            status: wire.status,
            message: wire.message,
        }
    }
}
