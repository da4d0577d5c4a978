//! The lifecycle state machine, as a pure function.

use shared_types::OrderState;
use thiserror::Error;

/// Events that drive state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    /// The order was accepted and its payment window opened.
    PaymentRequested,
    /// Payment was confirmed with a valid one-time code before the deadline.
    PaymentConfirmed,
    /// The payment window elapsed without confirmation.
    PaymentWindowElapsed,
    /// The owner withdrew the order before paying.
    CancelRequested,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no transition from {from} on {event:?}")]
pub struct TransitionError {
    pub from: OrderState,
    pub event: OrderEvent,
}

/// Applies `event` to `state`.
///
/// Rejects everything not in the transition table; callers decide which
/// rejections are idempotent no-ops and which are faults.
pub fn apply(state: OrderState, event: OrderEvent) -> Result<OrderState, TransitionError> {
    use OrderEvent::*;
    use OrderState::*;

    match (state, event) {
        (Created, PaymentRequested) => Ok(AwaitingPayment),
        (AwaitingPayment, PaymentConfirmed) => Ok(Paid),
        (AwaitingPayment, PaymentWindowElapsed) => Ok(TimedOut),
        (Created | AwaitingPayment, CancelRequested) => Ok(Cancelled),
        (from, event) => Err(TransitionError { from, event }),
    }
}
