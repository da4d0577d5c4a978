//! Shared fixture: a full service wiring over one in-process bus.

use async_trait::async_trait;
use of_01_identity::{IdentityExtractor, TokenIssuer, TokenVerifier};
use of_02_otp::{CodeDelivery, OtpService, OtpStore, SystemClock};
use of_03_watchdog::{ExpirationSource, ExpiryWatchdog, InMemoryDeadlineCache};
use of_04_lifecycle::{CacheDeadlineStore, LifecycleServer, LifecycleService};
use shared_bus::{InMemoryMessageBus, RequestClient, TopicFilter};
use shared_types::{topics, UserClaims};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_SECRET: &[u8] = b"integration-test-secret";

/// Captures every code handed to the delivery channel.
pub struct CapturedCodes {
    codes: Mutex<Vec<(String, String)>>,
}

impl CapturedCodes {
    pub fn last_for(&self, destination: &str) -> Option<String> {
        self.codes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(d, _)| d == destination)
            .map(|(_, c)| c.clone())
    }
}

#[async_trait]
impl CodeDelivery for CapturedCodes {
    async fn deliver(&self, destination: &str, code: &str) -> bool {
        self.codes
            .lock()
            .unwrap()
            .push((destination.to_string(), code.to_string()));
        true
    }
}

/// The full wiring: lifecycle server, expiry watchdog, and a request client
/// playing the edge.
pub struct Harness {
    pub bus: Arc<InMemoryMessageBus>,
    pub cache: Arc<InMemoryDeadlineCache>,
    pub client: RequestClient,
    pub codes: Arc<CapturedCodes>,
    pub service: Arc<LifecycleService>,
}

impl Harness {
    /// Builds the wiring with the given payment window and spawns both
    /// background loops.
    pub async fn start(payment_window: Duration) -> Self {
        let bus = Arc::new(InMemoryMessageBus::new());
        let cache = Arc::new(InMemoryDeadlineCache::new());
        let codes = Arc::new(CapturedCodes {
            codes: Mutex::new(Vec::new()),
        });

        let watchdog = ExpiryWatchdog::new(
            Arc::clone(&cache) as Arc<dyn ExpirationSource>,
            Arc::clone(&bus),
        );
        tokio::spawn(watchdog.run());

        let otp = OtpService::new(
            Arc::new(OtpStore::new(Arc::new(SystemClock))),
            Arc::clone(&codes) as Arc<dyn CodeDelivery>,
        );
        let service = Arc::new(LifecycleService::new(
            Arc::clone(&bus),
            Arc::new(CacheDeadlineStore::new(Arc::clone(&cache))),
            otp,
            payment_window,
        ));
        let server = LifecycleServer::new(
            Arc::clone(&service),
            Arc::new(IdentityExtractor::new(TokenVerifier::new(TEST_SECRET))),
            Arc::clone(&bus),
        );
        tokio::spawn(server.run());

        // Let both loops reach their subscription points.
        tokio::task::yield_now().await;

        let client = RequestClient::new(Arc::clone(&bus), "edge", Duration::from_secs(5));

        Self {
            bus,
            cache,
            client,
            codes,
            service,
        }
    }

    pub fn bearer_for(&self, user: &UserClaims) -> String {
        TokenIssuer::new(TEST_SECRET, 3600)
            .issue_bearer(user)
            .unwrap()
    }

    pub fn state_events(&self) -> shared_bus::Subscription {
        self.bus
            .subscribe(TopicFilter::topic(topics::ORDER_STATE_CHANGED))
    }

    pub fn timeout_events(&self) -> shared_bus::Subscription {
        self.bus.subscribe(TopicFilter::topic(topics::ORDER_TIMEOUT))
    }
}

pub fn customer(id: &str) -> UserClaims {
    UserClaims {
        id: id.to_string(),
        username: format!("user-{id}"),
        role: "customer".to_string(),
    }
}
