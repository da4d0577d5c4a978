//! # IPC Message Payloads
//!
//! Defines all cross-service payloads and the topics they travel on.
//!
//! ## Design Rules
//!
//! - All payloads are wrapped in `Envelope<T>`.
//! - Payloads MUST NOT carry identity fields; the envelope's verified `user`
//!   slot is authoritative.
//! - Request/reply pairs use the envelope's `correlation_id`.

use crate::entities::{OrderId, OrderState};
use serde::{Deserialize, Serialize};

/// Well-known bus topics.
pub mod topics {
    /// Command: submit a new order (request/reply).
    pub const ORDER_SUBMIT: &str = "order.submit";
    /// Command: confirm payment with a one-time code (request/reply).
    pub const ORDER_CONFIRM_PAYMENT: &str = "order.confirm_payment";
    /// Command: cancel an unpaid order (request/reply).
    pub const ORDER_CANCEL: &str = "order.cancel";
    /// Event: a payment window elapsed (produced by the expiry watchdog).
    pub const ORDER_TIMEOUT: &str = "order.timeout";
    /// Event: an order transitioned between lifecycle states.
    pub const ORDER_STATE_CHANGED: &str = "order.state_changed";
    /// Command: issue and deliver a one-time code (request/reply).
    pub const OTP_REQUEST: &str = "auth.request_code";
}

/// Reply body for request/reply flows.
///
/// `ok == true`: `body` is the typed result. `ok == false`: `body` is the
/// remote's structured fault shape (`{status, message}`); anything that does
/// not parse as that shape collapses to an internal fault on the caller side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyBody {
    pub ok: bool,
    pub body: serde_json::Value,
}

impl ReplyBody {
    pub fn success(body: serde_json::Value) -> Self {
        Self { ok: true, body }
    }

    pub fn failure(body: serde_json::Value) -> Self {
        Self { ok: false, body }
    }
}

/// Request to create an order and open its payment window.
/// Sender: edge | Receiver: lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOrderPayload {
    /// The order identifier, assigned upstream by the cart flow.
    pub order_id: OrderId,
    /// Total amount in minor units.
    pub amount: u64,
}

/// Request to confirm payment of an awaiting order with a one-time code.
/// Sender: edge | Receiver: lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmPaymentPayload {
    pub order_id: OrderId,
    /// Destination the code was delivered to (OTP store key).
    pub destination: String,
    /// The 6-digit code the user entered.
    pub code: String,
}

/// Request to cancel an order before payment.
/// Sender: edge | Receiver: lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderPayload {
    pub order_id: OrderId,
}

/// Request to issue and deliver a fresh one-time code.
/// Sender: edge | Receiver: lifecycle (OTP service)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCodePayload {
    pub destination: String,
}

/// Acknowledgement reply for commands without a richer result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckPayload {
    pub order_id: OrderId,
    pub state: OrderState,
}

/// Event: a payment window elapsed without confirmation.
/// Sender: expiry watchdog | Receiver: lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTimeoutPayload {
    pub order_id: OrderId,
}

/// Event: an order moved between lifecycle states.
/// Sender: lifecycle | Receivers: notification and any interested service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStateChangedPayload {
    pub order_id: OrderId,
    /// Total amount in minor units, for rendering without a store lookup.
    pub amount: u64,
    pub from: OrderState,
    pub to: OrderState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_body_round_trip() {
        let reply = ReplyBody::success(serde_json::json!({"order_id": "ORD1"}));
        let json = serde_json::to_string(&reply).unwrap();
        let parsed: ReplyBody = serde_json::from_str(&json).unwrap();
        assert!(parsed.ok);
        assert_eq!(parsed.body["order_id"], "ORD1");
    }

    #[test]
    fn timeout_payload_carries_order_id() {
        let payload = OrderTimeoutPayload {
            order_id: OrderId::from("ORD42"),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["order_id"], "ORD42");
    }
}
