//! # End-to-End Choreography
//!
//! The complete order lifecycle over one in-process bus:
//!
//! ```text
//! [Edge] ──order.submit──→ [Lifecycle] ──arm key──→ [Deadline Cache]
//!   │                          │                          │
//!   │  auth.request_code       │  order.state_changed     │ TTL expiry
//!   │  order.confirm_payment   ▼                          ▼
//!   └────────────────────→ [Event Bus] ←──order.timeout──[Watchdog]
//! ```
//!
//! Commands carry bearer credentials and run through the identity extractor;
//! the timeout event is internal and carries none.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{customer, Harness};
    use shared_types::{
        topics, AckPayload, CancelOrderPayload, ConfirmPaymentPayload, Fault, OrderId, OrderState,
        OrderStateChangedPayload, RequestCodePayload, SubmitOrderPayload,
    };
    use std::time::Duration;

    const DEST: &str = "555-0100";

    /// Lets spawned handler tasks drain their queues.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    async fn submit(harness: &Harness, user_id: &str, order: &str) -> Result<AckPayload, Fault> {
        harness
            .client
            .call_with_auth(
                topics::ORDER_SUBMIT,
                &SubmitOrderPayload {
                    order_id: OrderId::from(order),
                    amount: 2500,
                },
                Duration::from_secs(5),
                &harness.bearer_for(&customer(user_id)),
            )
            .await
    }

    async fn request_code(harness: &Harness, user_id: &str) {
        let _: serde_json::Value = harness
            .client
            .call_with_auth(
                topics::OTP_REQUEST,
                &RequestCodePayload {
                    destination: DEST.into(),
                },
                Duration::from_secs(5),
                &harness.bearer_for(&customer(user_id)),
            )
            .await
            .unwrap();
    }

    async fn confirm(
        harness: &Harness,
        user_id: &str,
        order: &str,
        code: &str,
    ) -> Result<AckPayload, Fault> {
        harness
            .client
            .call_with_auth(
                topics::ORDER_CONFIRM_PAYMENT,
                &ConfirmPaymentPayload {
                    order_id: OrderId::from(order),
                    destination: DEST.into(),
                    code: code.into(),
                },
                Duration::from_secs(5),
                &harness.bearer_for(&customer(user_id)),
            )
            .await
    }

    fn state_change(message: &shared_bus::BusMessage) -> OrderStateChangedPayload {
        serde_json::from_value(message.envelope.payload.clone()).unwrap()
    }

    #[tokio::test]
    async fn happy_path_submit_code_confirm() {
        let harness = Harness::start(Duration::from_secs(900)).await;
        let mut states = harness.state_events();

        let ack = submit(&harness, "u-1", "ORD1").await.unwrap();
        assert_eq!(ack.state, OrderState::AwaitingPayment);
        assert!(harness.cache.exists("order:ORD1:paymentPending"));

        request_code(&harness, "u-1").await;
        let code = harness.codes.last_for(DEST).unwrap();

        let ack = confirm(&harness, "u-1", "ORD1", &code).await.unwrap();
        assert_eq!(ack.state, OrderState::Paid);
        assert!(!harness.cache.exists("order:ORD1:paymentPending"));

        // Two transitions were announced, in order, each carrying the amount.
        let first = state_change(&states.recv().await.unwrap());
        assert_eq!(
            (first.from, first.to),
            (OrderState::Created, OrderState::AwaitingPayment)
        );
        assert_eq!(first.amount, 2500);
        let second = state_change(&states.recv().await.unwrap());
        assert_eq!(
            (second.from, second.to),
            (OrderState::AwaitingPayment, OrderState::Paid)
        );
        assert_eq!(second.amount, 2500);
    }

    #[tokio::test(start_paused = true)]
    async fn unpaid_order_times_out_exactly_once() {
        let harness = Harness::start(Duration::from_secs(1)).await;
        let mut timeouts = harness.timeout_events();

        submit(&harness, "u-1", "ORD1").await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        let message = timeouts.recv().await.unwrap();
        assert_eq!(message.topic, topics::ORDER_TIMEOUT);
        settle().await;

        assert_eq!(
            harness.service.state_of(&OrderId::from("ORD1")),
            Some(OrderState::TimedOut)
        );
        // The primitive fires once per key; no second event ever arrives.
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert!(timeouts.try_recv().unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn payment_before_expiry_prevents_any_timeout() {
        let harness = Harness::start(Duration::from_secs(1)).await;
        let mut timeouts = harness.timeout_events();

        submit(&harness, "u-1", "ORD1").await.unwrap();
        request_code(&harness, "u-1").await;
        let code = harness.codes.last_for(DEST).unwrap();

        // Pay halfway through the window.
        tokio::time::advance(Duration::from_millis(500)).await;
        let ack = confirm(&harness, "u-1", "ORD1", &code).await.unwrap();
        assert_eq!(ack.state, OrderState::Paid);

        // Long after the original deadline, no stale timeout has fired.
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert!(timeouts.try_recv().unwrap().is_none());
        assert_eq!(
            harness.service.state_of(&OrderId::from("ORD1")),
            Some(OrderState::Paid)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_disarms_the_deadline() {
        let harness = Harness::start(Duration::from_secs(1)).await;
        let mut timeouts = harness.timeout_events();

        submit(&harness, "u-1", "ORD1").await.unwrap();
        let ack: AckPayload = harness
            .client
            .call_with_auth(
                topics::ORDER_CANCEL,
                &CancelOrderPayload {
                    order_id: OrderId::from("ORD1"),
                },
                Duration::from_secs(5),
                &harness.bearer_for(&customer("u-1")),
            )
            .await
            .unwrap();
        assert_eq!(ack.state, OrderState::Cancelled);

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert!(timeouts.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn lockout_keeps_the_order_unpaid() {
        let harness = Harness::start(Duration::from_secs(900)).await;

        submit(&harness, "u-1", "ORD1").await.unwrap();
        request_code(&harness, "u-1").await;
        let code = harness.codes.last_for(DEST).unwrap();

        for _ in 0..3 {
            let err = confirm(&harness, "u-1", "ORD1", "000000").await.unwrap_err();
            assert_eq!(err.http_status(), 400);
        }
        // The correct code is dead after the lockout.
        let err = confirm(&harness, "u-1", "ORD1", &code).await.unwrap_err();
        assert_eq!(err.http_status(), 400);

        assert_eq!(
            harness.service.state_of(&OrderId::from("ORD1")),
            Some(OrderState::AwaitingPayment)
        );
        assert!(harness.cache.exists("order:ORD1:paymentPending"));
    }

    #[tokio::test]
    async fn code_cannot_be_used_twice() {
        let harness = Harness::start(Duration::from_secs(900)).await;

        submit(&harness, "u-1", "ORD1").await.unwrap();
        submit(&harness, "u-1", "ORD2").await.unwrap();
        request_code(&harness, "u-1").await;
        let code = harness.codes.last_for(DEST).unwrap();

        confirm(&harness, "u-1", "ORD1", &code).await.unwrap();
        // The same code cannot pay a second order.
        let err = confirm(&harness, "u-1", "ORD2", &code).await.unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn only_the_owner_may_act_on_an_order() {
        let harness = Harness::start(Duration::from_secs(900)).await;

        submit(&harness, "u-1", "ORD1").await.unwrap();
        request_code(&harness, "u-2").await;
        let code = harness.codes.last_for(DEST).unwrap();

        let err = confirm(&harness, "u-2", "ORD1", &code).await.unwrap_err();
        assert_eq!(err.http_status(), 403);
    }

    #[tokio::test]
    async fn commands_without_credentials_are_rejected() {
        let harness = Harness::start(Duration::from_secs(900)).await;

        let result: Result<AckPayload, Fault> = harness
            .client
            .call(
                topics::ORDER_SUBMIT,
                &SubmitOrderPayload {
                    order_id: OrderId::from("ORD1"),
                    amount: 1,
                },
                Duration::from_secs(5),
            )
            .await;
        assert_eq!(result.unwrap_err().http_status(), 401);
        assert_eq!(harness.service.state_of(&OrderId::from("ORD1")), None);
    }
}
