//! Bus-facing command and event handlers.
//!
//! Commands run through the identity extractor before any domain code sees
//! them; `order.timeout` originates inside the trust boundary and carries no
//! credential. Each inbound message is handled on its own task, so a slow
//! delivery channel never stalls the subscription.

use crate::service::LifecycleService;
use of_01_identity::IdentityExtractor;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_bus::{reply_fault, reply_ok, InMemoryMessageBus, TopicFilter};
use shared_types::{
    topics, CancelOrderPayload, ConfirmPaymentPayload, Envelope, Fault, OrderTimeoutPayload,
    RequestCodePayload, SubmitOrderPayload,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct LifecycleServer {
    service: Arc<LifecycleService>,
    extractor: Arc<IdentityExtractor>,
    bus: Arc<InMemoryMessageBus>,
}

impl LifecycleServer {
    pub fn new(
        service: Arc<LifecycleService>,
        extractor: Arc<IdentityExtractor>,
        bus: Arc<InMemoryMessageBus>,
    ) -> Self {
        Self {
            service,
            extractor,
            bus,
        }
    }

    /// Consumes commands and events until the bus closes.
    pub async fn run(self) {
        let mut subscription = self.bus.subscribe(TopicFilter::topics([
            topics::ORDER_SUBMIT,
            topics::ORDER_CONFIRM_PAYMENT,
            topics::ORDER_CANCEL,
            topics::OTP_REQUEST,
            topics::ORDER_TIMEOUT,
        ]));
        info!("Lifecycle service listening");

        let server = Arc::new(self);
        while let Some(message) = subscription.recv().await {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                server.dispatch(&message.topic, message.envelope).await;
            });
        }
        info!("Lifecycle service stopped (bus closed)");
    }

    async fn dispatch(&self, topic: &str, mut envelope: Envelope<Value>) {
        if topic == topics::ORDER_TIMEOUT {
            match serde_json::from_value::<OrderTimeoutPayload>(envelope.payload) {
                Ok(payload) => self.service.handle_timeout(payload).await,
                Err(e) => warn!(error = %e, "Malformed timeout event dropped"),
            }
            return;
        }

        let user = match self.extractor.authenticate(&mut envelope) {
            Ok(user) => user,
            Err(fault) => {
                reply_fault(self.bus.as_ref(), &envelope, &fault).await;
                return;
            }
        };

        let result = match topic {
            topics::ORDER_SUBMIT => match parse::<SubmitOrderPayload>(&envelope) {
                Ok(payload) => self
                    .service
                    .submit_order(&user, payload)
                    .await
                    .and_then(encode),
                Err(fault) => Err(fault),
            },
            topics::ORDER_CONFIRM_PAYMENT => match parse::<ConfirmPaymentPayload>(&envelope) {
                Ok(payload) => self
                    .service
                    .confirm_payment(&user, payload)
                    .await
                    .and_then(encode),
                Err(fault) => Err(fault),
            },
            topics::ORDER_CANCEL => match parse::<CancelOrderPayload>(&envelope) {
                Ok(payload) => self
                    .service
                    .cancel_order(&user, payload)
                    .await
                    .and_then(encode),
                Err(fault) => Err(fault),
            },
            topics::OTP_REQUEST => match parse::<RequestCodePayload>(&envelope) {
                Ok(payload) => self
                    .service
                    .request_code(payload)
                    .await
                    .map(|()| Value::Object(serde_json::Map::new())),
                Err(fault) => Err(fault),
            },
            other => {
                warn!(topic = other, "Message on unexpected topic dropped");
                return;
            }
        };

        match result {
            Ok(body) => reply_ok(self.bus.as_ref(), &envelope, &body).await,
            Err(fault) => reply_fault(self.bus.as_ref(), &envelope, &fault).await,
        }
    }
}

fn parse<T: DeserializeOwned>(envelope: &Envelope<Value>) -> Result<T, Fault> {
    serde_json::from_value(envelope.payload.clone()).map_err(|e| {
        warn!(correlation_id = %envelope.correlation_id, error = %e, "Malformed command payload");
        Fault::Remote {
            status: 400,
            message: "malformed payload".into(),
        }
    })
}

fn encode<T: serde::Serialize>(body: T) -> Result<Value, Fault> {
    serde_json::to_value(body).map_err(|_| Fault::Internal)
}
