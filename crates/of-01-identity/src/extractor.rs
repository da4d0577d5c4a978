//! Envelope authentication middleware.
//!
//! Runs in front of every command handler. Reads the raw bearer credential
//! from the envelope's `auth` header, falling back to an inlined `auth` field
//! in the payload for producers that never moved it to a header. On success
//! the verified claim is written to the envelope's `user` slot, overwriting
//! anything the caller put there.
//!
//! Verification is pure computation; no I/O happens here, so the extractor is
//! safe to call from any number of concurrent handler tasks.

use crate::token::{AuthError, TokenVerifier};
use serde_json::Value;
use shared_types::{Envelope, Fault, UserClaims};
use tracing::{debug, warn};

pub struct IdentityExtractor {
    verifier: TokenVerifier,
}

impl IdentityExtractor {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// Verifies the envelope's credential and attaches the identity claim.
    ///
    /// Any caller-supplied `user` value, on the envelope or inlined in the
    /// payload, is overwritten or removed. A forged identity never survives
    /// this call.
    pub fn authenticate(&self, envelope: &mut Envelope<Value>) -> Result<UserClaims, Fault> {
        let credential = extract_credential(envelope).ok_or_else(|| {
            debug!(correlation_id = %envelope.correlation_id, "Envelope carries no credential");
            Fault::from(AuthError::MissingCredential)
        })?;

        let claims = self.verifier.verify_bearer(&credential).map_err(|e| {
            warn!(
                correlation_id = %envelope.correlation_id,
                error = %e,
                "Credential rejected"
            );
            Fault::from(e)
        })?;

        let user = UserClaims::from(claims);

        // The header slot becomes the sole source of identity. Strip the
        // inlined copies so no handler can read an unverified value.
        if let Value::Object(map) = &mut envelope.payload {
            map.remove("auth");
            map.remove("user");
        }
        envelope.user = Some(user.clone());

        Ok(user)
    }
}

/// The `auth` header wins; an inlined `auth` payload field is the fallback.
fn extract_credential(envelope: &Envelope<Value>) -> Option<String> {
    if let Some(auth) = &envelope.auth {
        return Some(auth.clone());
    }
    envelope
        .payload
        .get("auth")
        .and_then(Value::as_str)
        .map(str::to_string)
}
