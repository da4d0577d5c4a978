//! Runtime-level port implementations.

use async_trait::async_trait;
use of_02_otp::CodeDelivery;
use tracing::info;

/// Stand-in for the SMS gateway: acknowledges every delivery and logs that
/// a code went out, without the code itself.
pub struct LoggingCodeDelivery;

#[async_trait]
impl CodeDelivery for LoggingCodeDelivery {
    async fn deliver(&self, destination: &str, _code: &str) -> bool {
        info!(destination = destination, "Verification code handed to delivery channel");
        true
    }
}
