//! Named channels with subscriber and publisher sets

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    agent::SharedAgent,
    error::{MeshError, MeshResult},
    message::Message,
};

/// A named channel
///
/// Subscribers are notified on every publish. Publishers are tracked only for
/// topology reporting and are never consulted during delivery. Membership in
/// both sets is keyed by agent name, so repeated registration is a no-op.
pub struct Topic {
    name: String,
    subscribers: DashMap<String, SharedAgent>,
    publishers: DashMap<String, SharedAgent>,
    last_value: RwLock<Option<Message>>,
}

impl Topic {
    /// Create an unregistered topic. Use `TopicRegistry::get_or_create` to
    /// obtain the shared instance for a name.
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: DashMap::new(),
            publishers: DashMap::new(),
            last_value: RwLock::new(None),
        }
    }

    /// Topic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add `agent` to the subscriber set
    pub fn subscribe(&self, agent: SharedAgent) {
        let key = agent.name().to_string();
        self.subscribers.entry(key).or_insert(agent);
    }

    /// Remove the agent named `agent_name` from the subscriber set
    pub fn unsubscribe(&self, agent_name: &str) {
        self.subscribers.remove(agent_name);
    }

    /// Declare `agent` as a producer on this topic
    pub fn add_publisher(&self, agent: SharedAgent) {
        let key = agent.name().to_string();
        self.publishers.entry(key).or_insert(agent);
    }

    /// Drop the agent named `agent_name` from the publisher set
    pub fn remove_publisher(&self, agent_name: &str) {
        self.publishers.remove(agent_name);
    }

    /// Snapshot of the current subscribers
    pub fn subscribers(&self) -> Vec<SharedAgent> {
        self.subscribers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Snapshot of the declared publishers
    pub fn publishers(&self) -> Vec<SharedAgent> {
        self.publishers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn publisher_count(&self) -> usize {
        self.publishers.len()
    }

    /// Record `message` as the last value and deliver it to every subscriber
    ///
    /// Delivery runs on the caller's task, once per subscriber, in no
    /// particular order. For mailbox-wrapped agents delivery only enqueues and
    /// may wait for mailbox capacity.
    ///
    /// # Errors
    ///
    /// Every subscriber is attempted even if an earlier one fails; the first
    /// failure is returned.
    pub async fn publish(&self, message: Message) -> MeshResult<()> {
        *self.last_value.write().await = Some(message.clone());

        // Collect first so no shard lock is held across an await
        let subscribers = self.subscribers();
        debug!(
            topic = %self.name,
            value = %message,
            subscribers = subscribers.len(),
            "Publishing message"
        );

        let mut first_error: Option<MeshError> = None;
        for agent in subscribers {
            if let Err(e) = agent.receive(&self.name, &message).await {
                warn!(topic = %self.name, agent = %agent.name(), error = %e, "Delivery failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Most recently published message
    pub async fn last_value(&self) -> Option<Message> {
        self.last_value.read().await.clone()
    }

    /// Text of the most recently published message
    pub async fn last_text(&self) -> Option<String> {
        self.last_value
            .read()
            .await
            .as_ref()
            .map(|m| m.as_text().to_string())
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic")
            .field("name", &self.name)
            .field("subscribers", &self.subscribers.len())
            .field("publishers", &self.publishers.len())
            .finish()
    }
}
