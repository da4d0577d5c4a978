//! # Deadline Properties
//!
//! The timing contracts: `call()` resolves within its deadline and releases
//! its correlation slot, late replies are discarded, and a deadline key
//! deleted before its TTL never produces a timeout event while an untouched
//! key produces exactly one.

#[cfg(test)]
mod tests {
    use crate::integration::harness::Harness;
    use shared_bus::{BusMessage, InMemoryMessageBus, MessagePublisher, RequestClient, TopicFilter};
    use shared_types::{topics, AckPayload, Envelope, Fault, OrderId, ReplyBody, SubmitOrderPayload};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn call_without_a_reply_times_out_and_releases_its_slot() {
        // A bus with no lifecycle server behind it: nothing will ever reply.
        let bus = Arc::new(InMemoryMessageBus::new());
        let client = RequestClient::new(Arc::clone(&bus), "edge", Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        let result: Result<AckPayload, Fault> = client
            .call(
                topics::ORDER_SUBMIT,
                &SubmitOrderPayload {
                    order_id: OrderId::from("ORD1"),
                    amount: 1,
                },
                Duration::from_millis(50),
            )
            .await;

        assert!(matches!(result, Err(Fault::Timeout { timeout_ms: 50 })));
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_millis(100));
        // The correlation table holds nothing afterwards.
        assert_eq!(client.pending().pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn late_reply_is_discarded_not_delivered() {
        let bus = Arc::new(InMemoryMessageBus::new());

        // A responder that answers 200ms after the request arrives.
        {
            let bus = Arc::clone(&bus);
            let mut sub = bus.subscribe(TopicFilter::topic("slow.echo"));
            tokio::spawn(async move {
                while let Some(message) = sub.recv().await {
                    let bus = Arc::clone(&bus);
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        let reply_to = message.envelope.reply_to.clone().unwrap();
                        let body = ReplyBody::success(serde_json::json!({"late": true}));
                        let envelope = Envelope::reply(
                            message.envelope.correlation_id,
                            serde_json::to_value(&body).unwrap(),
                        );
                        bus.publish(BusMessage::new(reply_to.topic, envelope)).await;
                    });
                }
            });
        }
        tokio::task::yield_now().await;

        let client = RequestClient::new(Arc::clone(&bus), "edge", Duration::from_secs(5));
        let result: Result<serde_json::Value, Fault> = client
            .call("slow.echo", &serde_json::json!({}), Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(Fault::Timeout { .. })));

        // Let the late reply arrive and be dropped by the listener.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(client.pending().pending_count(), 0);
        let stats = client.pending().stats();
        assert_eq!(stats.total_completed.load(Ordering::Relaxed), 0);
        assert_eq!(stats.total_cancelled.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_calls_each_occupy_one_slot() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let client = Arc::new(RequestClient::new(
            Arc::clone(&bus),
            "edge",
            Duration::from_secs(5),
        ));

        let mut handles = Vec::new();
        for n in 0..8u32 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                let _: Result<serde_json::Value, Fault> = client
                    .call(
                        "void",
                        &serde_json::json!({ "n": n }),
                        Duration::from_millis(50),
                    )
                    .await;
            }));
        }
        tokio::task::yield_now().await;
        assert_eq!(client.pending().pending_count(), 8);

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(client.pending().pending_count(), 0);
        assert_eq!(
            client
                .pending()
                .stats()
                .total_registered
                .load(Ordering::Relaxed),
            8
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_deleted_halfway_never_times_out() {
        let harness = Harness::start(Duration::from_secs(1)).await;
        let mut timeouts = harness.timeout_events();

        harness.cache.set("order:ORD1:paymentPending", Duration::from_secs(1));
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(harness.cache.delete("order:ORD1:paymentPending"));

        tokio::time::advance(Duration::from_secs(30)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(timeouts.try_recv().unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn untouched_deadline_times_out_exactly_once() {
        let harness = Harness::start(Duration::from_secs(1)).await;
        let mut timeouts = harness.timeout_events();

        harness.cache.set("order:ORD1:paymentPending", Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(30)).await;

        let message = timeouts.recv().await.unwrap();
        assert_eq!(message.topic, topics::ORDER_TIMEOUT);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(timeouts.try_recv().unwrap().is_none());
    }
}
