//! Pending reply store - the correlation table behind the request-reply
//! adapter.
//!
//! Maps correlation tokens to waiting callers. One entry per in-flight call:
//! inserted atomically on send, removed atomically on reply or timeout. The
//! second of two racing removals is a no-op. Entries are never persisted:
//! calls in flight when the process dies are lost and surface as timeouts on
//! the caller side of a restarted peer.

use crate::correlation::CorrelationId;
use dashmap::DashMap;
use shared_types::ReplyBody;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A pending call waiting for its reply.
struct PendingReply {
    /// Channel to deliver the reply body.
    sender: oneshot::Sender<ReplyBody>,
    /// When the call was issued.
    created_at: Instant,
    /// Request topic (for logging).
    topic: String,
    /// Deadline for this call.
    timeout: Duration,
}

/// Statistics for the pending reply store.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total calls registered.
    pub total_registered: AtomicU64,
    /// Total calls completed by a reply.
    pub total_completed: AtomicU64,
    /// Total calls expired by the sweeper.
    pub total_timeouts: AtomicU64,
    /// Total calls cancelled (timeout observed by the caller, or waiter
    /// dropped).
    pub total_cancelled: AtomicU64,
}

/// Correlation table for async-to-sync bridging.
///
/// Flow:
/// 1. `RequestClient` calls `register()` to get a token and a oneshot receiver
/// 2. The request envelope is published carrying the token
/// 3. The reply listener receives the reply and calls `complete()`
/// 4. The caller awaits the receiver or times out and calls `cancel()`
pub struct PendingReplyStore {
    /// Map of correlation token to pending call.
    pending: DashMap<CorrelationId, PendingReply>,
    /// Default deadline.
    default_timeout: Duration,
    /// Statistics.
    stats: Arc<PendingStats>,
}

impl PendingReplyStore {
    /// Create a new pending reply store.
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            default_timeout,
            stats: Arc::new(PendingStats::default()),
        }
    }

    /// Register a pending call and get a receiver for the reply.
    ///
    /// Returns the fresh correlation token and the receiver.
    pub fn register(
        &self,
        topic: &str,
        timeout: Option<Duration>,
    ) -> (CorrelationId, oneshot::Receiver<ReplyBody>) {
        let correlation_id = CorrelationId::new();
        let (tx, rx) = oneshot::channel();

        let entry = PendingReply {
            sender: tx,
            created_at: Instant::now(),
            topic: topic.to_string(),
            timeout: timeout.unwrap_or(self.default_timeout),
        };

        self.pending.insert(correlation_id, entry);
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %correlation_id,
            topic = topic,
            "Registered pending call"
        );

        (correlation_id, rx)
    }

    /// Complete a pending call with its reply.
    ///
    /// Returns true if the call was found and the waiter was still listening.
    /// A late reply (token already removed by timeout) returns false and the
    /// body is discarded - never delivered to a second waiter.
    pub fn complete(&self, correlation_id: CorrelationId, reply: ReplyBody) -> bool {
        if let Some((_, pending)) = self.pending.remove(&correlation_id) {
            let elapsed = pending.created_at.elapsed();

            match pending.sender.send(reply) {
                Ok(()) => {
                    self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        correlation_id = %correlation_id,
                        topic = pending.topic,
                        elapsed_ms = elapsed.as_millis(),
                        "Completed pending call"
                    );
                    true
                }
                Err(_) => {
                    // Receiver was dropped (caller gave up)
                    self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        correlation_id = %correlation_id,
                        topic = pending.topic,
                        "Pending call receiver dropped"
                    );
                    false
                }
            }
        } else {
            debug!(
                correlation_id = %correlation_id,
                "Reply for unknown or timed-out correlation token discarded"
            );
            false
        }
    }

    /// Cancel a pending call (the caller observed a timeout).
    ///
    /// Returns false if the entry is already gone - cancelling twice, or
    /// cancelling after a racing `complete()`, is a no-op.
    pub fn cancel(&self, correlation_id: &CorrelationId) -> bool {
        if self.pending.remove(correlation_id).is_some() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Remove entries whose deadline has passed (backstop sweep).
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.pending.retain(|id, entry| {
            let elapsed = now.duration_since(entry.created_at);
            if elapsed > entry.timeout {
                warn!(
                    correlation_id = %id,
                    topic = entry.topic,
                    elapsed_ms = elapsed.as_millis(),
                    timeout_ms = entry.timeout.as_millis(),
                    "Removing expired pending call"
                );
                self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
                removed += 1;
                false // Remove
            } else {
                true // Keep
            }
        });

        removed
    }

    /// Number of currently pending calls.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if a correlation token is pending.
    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    /// Get statistics.
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

/// Background task to sweep expired entries.
pub async fn cleanup_task(store: Arc<PendingReplyStore>, interval: Duration) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cleanup_interval.tick().await;
        let removed = store.remove_expired();
        if removed > 0 {
            debug!(removed = removed, "Cleaned up expired pending calls");
        }
    }
}
