//! Code issuance and verification as a service surface.
//!
//! Wraps the store's booleans in the fault taxonomy: a failed verification is
//! always [`Fault::VerificationFailed`] with no reason attached.

use crate::ports::CodeDelivery;
use crate::store::OtpStore;
use shared_types::Fault;
use std::sync::Arc;
use tracing::{info, warn};

pub struct OtpService {
    store: Arc<OtpStore>,
    delivery: Arc<dyn CodeDelivery>,
}

impl OtpService {
    pub fn new(store: Arc<OtpStore>, delivery: Arc<dyn CodeDelivery>) -> Self {
        Self { store, delivery }
    }

    /// Issues a code for `destination` and hands it to the delivery channel.
    ///
    /// The code never appears in the return value or the logs; the side
    /// channel is the only way it reaches the user.
    pub async fn request_code(&self, destination: &str) -> Result<(), Fault> {
        let code = self.store.issue(destination);
        if self.delivery.deliver(destination, &code).await {
            info!(destination = destination, "Verification code dispatched");
            Ok(())
        } else {
            warn!(destination = destination, "Code delivery channel refused");
            Err(Fault::Internal)
        }
    }

    /// Verifies a user-supplied code.
    pub fn verify(&self, destination: &str, code: &str) -> Result<(), Fault> {
        if self.store.verify(destination, code) {
            Ok(())
        } else {
            Err(Fault::VerificationFailed)
        }
    }

    pub fn store(&self) -> &Arc<OtpStore> {
        &self.store
    }
}
