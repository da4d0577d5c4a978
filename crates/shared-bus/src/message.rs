//! Bus message and subscription filter.
//!
//! The bus routes on string topics so that per-process reply channels can be
//! created dynamically; payloads travel as JSON values inside the envelope.

use serde::{Deserialize, Serialize};
use shared_types::Envelope;

/// A message traveling on the bus: a topic plus an enveloped JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    /// The logical channel this message is published to.
    pub topic: String,
    /// The enveloped payload. Typed payloads are decoded by the consumer.
    pub envelope: Envelope<serde_json::Value>,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, envelope: Envelope<serde_json::Value>) -> Self {
        Self {
            topic: topic.into(),
            envelope,
        }
    }
}

/// Filter for subscribing to specific topics.
#[derive(Debug, Clone, Default)]
pub struct TopicFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<String>,
}

impl TopicFilter {
    /// Create a filter that accepts every message.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a filter for a single topic.
    #[must_use]
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topics: vec![topic.into()],
        }
    }

    /// Check if a message matches this filter.
    #[must_use]
    pub fn matches(&self, message: &BusMessage) -> bool {
        self.topics.is_empty() || self.topics.iter().any(|t| t == &message.topic)
    }
}
