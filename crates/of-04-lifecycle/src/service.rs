//! Command handling and transition dispatch.
//!
//! Every mutation of an order happens under its map entry, with the
//! transition table re-checked there, so a command racing a timeout event
//! resolves to exactly one winner. The payment path deletes the deadline key
//! *before* committing the `paid` transition: a deleted key never fires, so
//! no stale timeout can chase a successful payment.

use crate::domain::order::OrderRecord;
use crate::domain::transitions::{self, OrderEvent};
use crate::ports::DeadlineStore;
use dashmap::DashMap;
use of_02_otp::OtpService;
use shared_bus::{BusMessage, InMemoryMessageBus, MessagePublisher};
use shared_types::{
    topics, AckPayload, CancelOrderPayload, ConfirmPaymentPayload, DeadlineKey, Envelope, Fault,
    OrderId, OrderState, OrderStateChangedPayload, OrderTimeoutPayload, RequestCodePayload,
    SubmitOrderPayload, UserClaims,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

pub struct LifecycleService {
    orders: DashMap<OrderId, OrderRecord>,
    bus: Arc<InMemoryMessageBus>,
    deadlines: Arc<dyn DeadlineStore>,
    otp: OtpService,
    payment_window: Duration,
}

impl LifecycleService {
    pub fn new(
        bus: Arc<InMemoryMessageBus>,
        deadlines: Arc<dyn DeadlineStore>,
        otp: OtpService,
        payment_window: Duration,
    ) -> Self {
        Self {
            orders: DashMap::new(),
            bus,
            deadlines,
            otp,
            payment_window,
        }
    }

    /// Accepts a new order and opens its payment window.
    pub async fn submit_order(
        &self,
        user: &UserClaims,
        payload: SubmitOrderPayload,
    ) -> Result<AckPayload, Fault> {
        let order_id = payload.order_id.clone();
        match self.orders.entry(order_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(Fault::Remote {
                    status: 409,
                    message: format!("order {order_id} already exists"),
                });
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(OrderRecord::new(order_id.clone(), user.clone(), payload.amount));
            }
        }

        let (from, to) = self.transition(&order_id, OrderEvent::PaymentRequested)?;
        self.deadlines
            .arm(&DeadlineKey::for_order(order_id.clone()), self.payment_window)
            .await;
        info!(order_id = %order_id, window_secs = self.payment_window.as_secs(), "Order accepted, payment window open");
        self.publish_state_change(&order_id, from, to).await;

        Ok(AckPayload {
            order_id,
            state: to,
        })
    }

    /// Issues and delivers a one-time code for later payment confirmation.
    pub async fn request_code(&self, payload: RequestCodePayload) -> Result<(), Fault> {
        self.otp.request_code(&payload.destination).await
    }

    /// Confirms payment with a one-time code.
    pub async fn confirm_payment(
        &self,
        user: &UserClaims,
        payload: ConfirmPaymentPayload,
    ) -> Result<AckPayload, Fault> {
        let order_id = payload.order_id.clone();
        self.check_owner(&order_id, user)?;

        self.otp.verify(&payload.destination, &payload.code)?;

        // Delete the deadline key before committing the transition. A false
        // return means the window already elapsed and the timeout event is
        // either published or imminent.
        let key = DeadlineKey::for_order(order_id.clone());
        if !self.deadlines.disarm(&key).await {
            debug!(order_id = %order_id, "Payment arrived after the window elapsed");
            return Err(Fault::Remote {
                status: 410,
                message: "payment window elapsed".into(),
            });
        }

        let (from, to) = self.transition(&order_id, OrderEvent::PaymentConfirmed)?;
        info!(order_id = %order_id, "Payment confirmed");
        self.publish_state_change(&order_id, from, to).await;

        Ok(AckPayload {
            order_id,
            state: to,
        })
    }

    /// Cancels an unpaid order.
    ///
    /// Cancelling an already-cancelled order is a no-op acknowledgement.
    pub async fn cancel_order(
        &self,
        user: &UserClaims,
        payload: CancelOrderPayload,
    ) -> Result<AckPayload, Fault> {
        let order_id = payload.order_id.clone();
        self.check_owner(&order_id, user)?;

        if self.state_of(&order_id) == Some(OrderState::Cancelled) {
            return Ok(AckPayload {
                order_id,
                state: OrderState::Cancelled,
            });
        }

        // Disarm first so no timeout fires for an order its owner withdrew.
        let key = DeadlineKey::for_order(order_id.clone());
        self.deadlines.disarm(&key).await;

        let (from, to) = self.transition(&order_id, OrderEvent::CancelRequested)?;
        info!(order_id = %order_id, "Order cancelled");
        self.publish_state_change(&order_id, from, to).await;

        Ok(AckPayload {
            order_id,
            state: to,
        })
    }

    /// Applies an `order.timeout` event.
    ///
    /// Idempotent: unknown orders and orders that already left
    /// `awaiting_payment` are ignored without error.
    pub async fn handle_timeout(&self, payload: OrderTimeoutPayload) {
        let order_id = payload.order_id;
        match self.transition(&order_id, OrderEvent::PaymentWindowElapsed) {
            Ok((from, to)) => {
                info!(order_id = %order_id, "Payment window elapsed, order timed out");
                self.publish_state_change(&order_id, from, to).await;
            }
            Err(_) => {
                debug!(order_id = %order_id, "Stale or duplicate timeout ignored");
            }
        }
    }

    /// Current state of an order, if tracked.
    #[must_use]
    pub fn state_of(&self, order_id: &OrderId) -> Option<OrderState> {
        self.orders.get(order_id).map(|r| r.state)
    }

    fn check_owner(&self, order_id: &OrderId, user: &UserClaims) -> Result<(), Fault> {
        let record = self.orders.get(order_id).ok_or_else(|| Fault::Remote {
            status: 404,
            message: format!("order {order_id} not found"),
        })?;
        if record.owner.id != user.id {
            return Err(Fault::Remote {
                status: 403,
                message: "not the order owner".into(),
            });
        }
        Ok(())
    }

    /// Applies `event` under the order's map entry.
    fn transition(
        &self,
        order_id: &OrderId,
        event: OrderEvent,
    ) -> Result<(OrderState, OrderState), Fault> {
        let mut record = self.orders.get_mut(order_id).ok_or_else(|| Fault::Remote {
            status: 404,
            message: format!("order {order_id} not found"),
        })?;

        let from = record.state;
        let to = transitions::apply(from, event).map_err(|e| Fault::Remote {
            status: 409,
            message: e.to_string(),
        })?;
        record.state = to;
        Ok((from, to))
    }

    async fn publish_state_change(&self, order_id: &OrderId, from: OrderState, to: OrderState) {
        // The transition just committed under this entry, so the record is
        // still tracked.
        let Some(amount) = self.orders.get(order_id).map(|r| r.amount) else {
            return;
        };
        let payload = OrderStateChangedPayload {
            order_id: order_id.clone(),
            amount,
            from,
            to,
        };
        match serde_json::to_value(&payload) {
            Ok(value) => {
                self.bus
                    .publish(BusMessage::new(
                        topics::ORDER_STATE_CHANGED,
                        Envelope::event(value),
                    ))
                    .await;
            }
            Err(e) => error!(order_id = %order_id, error = %e, "Failed to encode state change event"),
        }
    }
}
