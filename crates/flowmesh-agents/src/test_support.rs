//! Helpers shared by the agent tests

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use flowmesh_core::{Agent, MeshResult, Message, SharedAgent, TopicRegistry, split_names};

pub fn names(list: &str) -> Vec<String> {
    split_names(list)
}

/// Subscriber recording every value published on one topic
pub struct Collector {
    inputs: Vec<String>,
    seen: Mutex<Vec<Message>>,
}

impl Collector {
    pub fn on(registry: &TopicRegistry, topic: &str) -> Arc<Self> {
        let collector = Arc::new(Self {
            inputs: vec![topic.to_string()],
            seen: Mutex::new(Vec::new()),
        });
        registry
            .get_or_create(topic)
            .subscribe(collector.clone() as SharedAgent);
        collector
    }

    pub async fn values(&self) -> Vec<f64> {
        self.seen.lock().await.iter().map(Message::as_number).collect()
    }
}

#[async_trait]
impl Agent for Collector {
    fn name(&self) -> &str {
        "Collector"
    }

    fn subscriptions(&self) -> &[String] {
        &self.inputs
    }

    fn publications(&self) -> &[String] {
        &[]
    }

    async fn receive(&self, _topic: &str, message: &Message) -> MeshResult<()> {
        self.seen.lock().await.push(message.clone());
        Ok(())
    }

    async fn reset(&self) {}
}
