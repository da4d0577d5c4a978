//! Order domain entities shared across services.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an order. Opaque string assigned by the order service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle states of an order.
///
/// Transitions are driven by the choreography layer; the timeout transition
/// is fed by the expiry watchdog, the paid transition by payment confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Order exists but payment has not been requested.
    Created,
    /// Payment window is open; a deadline key is live in the cache.
    AwaitingPayment,
    /// Payment confirmed before the deadline.
    Paid,
    /// Payment window elapsed without confirmation.
    TimedOut,
    /// Explicitly cancelled by the owner before payment.
    Cancelled,
}

impl OrderState {
    /// True once no further transitions are possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::TimedOut | Self::Cancelled)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Paid => "paid",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Cache key whose expiration drives the payment timeout of one order.
///
/// The key carries no value semantics beyond its own existence and TTL: it is
/// created when an order enters `awaiting_payment`, deleted explicitly when
/// payment succeeds, and its natural expiry is the timeout signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineKey(OrderId);

impl DeadlineKey {
    const PREFIX: &'static str = "order:";
    const SUFFIX: &'static str = ":paymentPending";

    pub fn for_order(order_id: OrderId) -> Self {
        Self(order_id)
    }

    pub fn order_id(&self) -> &OrderId {
        &self.0
    }

    /// Parses `order:<id>:paymentPending`; any other shape is not a deadline
    /// key and yields `None`.
    pub fn parse(key: &str) -> Option<Self> {
        let rest = key.strip_prefix(Self::PREFIX)?;
        let id = rest.strip_suffix(Self::SUFFIX)?;
        if id.is_empty() || id.contains(':') {
            return None;
        }
        Some(Self(OrderId::new(id)))
    }
}

impl fmt::Display for DeadlineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", Self::PREFIX, self.0, Self::SUFFIX)
    }
}
