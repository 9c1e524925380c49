//! Concurrency-safe topic registry
//!
//! Maps topic names to shared [`Topic`] instances, creating them lazily on
//! first reference. Components receive the registry as an `Arc` instead of
//! reaching for ambient global state; [`TopicRegistry::global`] exists for
//! binaries that want one process-wide instance.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

use crate::{error::MeshResult, message::Message, topic::Topic};

static GLOBAL: Lazy<Arc<TopicRegistry>> = Lazy::new(|| Arc::new(TopicRegistry::new()));

/// Name → topic map shared by every agent of a graph
#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: DashMap<String, Arc<Topic>>,
}

impl TopicRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry instance
    pub fn global() -> Arc<TopicRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Get the topic named `name`, creating it if it does not exist
    ///
    /// Concurrent callers racing on the same new name all receive the same
    /// instance; the insert happens under the map's entry lock.
    pub fn get_or_create(&self, name: &str) -> Arc<Topic> {
        if let Some(topic) = self.topics.get(name) {
            return Arc::clone(topic.value());
        }

        let topic = self
            .topics
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(topic = %name, "Creating topic");
                Arc::new(Topic::new(name))
            });
        Arc::clone(topic.value())
    }

    /// Look up an existing topic without creating it
    pub fn get(&self, name: &str) -> Option<Arc<Topic>> {
        self.topics.get(name).map(|t| Arc::clone(t.value()))
    }

    /// Whether a topic named `name` exists
    pub fn exists(&self, name: &str) -> bool {
        self.topics.contains_key(name)
    }

    /// Point-in-time snapshot of all topics, ordered by name
    pub fn list_all(&self) -> Vec<Arc<Topic>> {
        let mut topics: Vec<Arc<Topic>> = self
            .topics
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        topics.sort_by(|a, b| a.name().cmp(b.name()));
        topics
    }

    /// Drop every topic
    ///
    /// Used between successive graph loads so stale subscribers of a previous
    /// graph never see messages of the next one. Topic handles still held
    /// elsewhere stay valid but are no longer reachable by name.
    pub fn clear(&self) {
        let count = self.topics.len();
        self.topics.clear();
        debug!(count, "Cleared topic registry");
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Publish `value` on the topic named `topic`, creating the topic if needed
    ///
    /// This is the entry point for external input; both text and numbers are
    /// accepted through `Into<Message>`.
    pub async fn publish(&self, topic: &str, value: impl Into<Message>) -> MeshResult<()> {
        self.get_or_create(topic).publish(value.into()).await
    }
}
