//! Core Agent trait for dataflow computation units

use async_trait::async_trait;
use std::sync::Arc;

use crate::{error::MeshResult, message::Message, registry::TopicRegistry};

/// Shared handle to an agent, as stored in topic subscriber sets
pub type SharedAgent = Arc<dyn Agent>;

/// A named unit of computation wired between topics
///
/// Agents declare the topics they read (`subscriptions`) and the topics they
/// write (`publications`). Declaring does not register anything; the graph
/// loader (or [`attach`]) registers the agent with the named topics once it
/// is ready to receive messages.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use flowmesh_core::{Agent, Message, MeshResult};
///
/// struct Printer {
///     inputs: Vec<String>,
/// }
///
/// #[async_trait]
/// impl Agent for Printer {
///     fn name(&self) -> &str {
///         "Printer"
///     }
///
///     fn subscriptions(&self) -> &[String] {
///         &self.inputs
///     }
///
///     fn publications(&self) -> &[String] {
///         &[]
///     }
///
///     async fn receive(&self, topic: &str, message: &Message) -> MeshResult<()> {
///         println!("{topic}: {message}");
///         Ok(())
///     }
///
///     async fn reset(&self) {}
/// }
/// ```
#[async_trait]
pub trait Agent: Send + Sync {
    /// Process-unique name of this agent
    fn name(&self) -> &str;

    /// Topics this agent must be subscribed to
    fn subscriptions(&self) -> &[String];

    /// Topics this agent publishes results on
    fn publications(&self) -> &[String];

    /// Deliver a message published on `topic`
    ///
    /// # Errors
    ///
    /// Returns `MeshError::IllegalState` when the computation violates its
    /// contract, or `MeshError::MailboxClosed` when the agent no longer
    /// accepts messages.
    async fn receive(&self, topic: &str, message: &Message) -> MeshResult<()>;

    /// Clear computation state; topic registrations are kept
    async fn reset(&self);

    /// Release worker resources; topic registrations are kept
    async fn close(&self) -> MeshResult<()> {
        Ok(())
    }
}

/// Register `agent` as subscriber of its input topics and as publisher of
/// its output topics, creating the topics on demand.
pub fn attach(registry: &TopicRegistry, agent: &SharedAgent) {
    for name in agent.subscriptions() {
        registry.get_or_create(name).subscribe(Arc::clone(agent));
    }
    for name in agent.publications() {
        registry.get_or_create(name).add_publisher(Arc::clone(agent));
    }
}

/// Reverse of [`attach`]
pub fn detach(registry: &TopicRegistry, agent: &SharedAgent) {
    for name in agent.subscriptions() {
        if let Some(topic) = registry.get(name) {
            topic.unsubscribe(agent.name());
        }
    }
    for name in agent.publications() {
        if let Some(topic) = registry.get(name) {
            topic.remove_publisher(agent.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        inputs: Vec<String>,
        outputs: Vec<String>,
    }

    #[async_trait]
    impl Agent for Probe {
        fn name(&self) -> &str {
            "Probe"
        }

        fn subscriptions(&self) -> &[String] {
            &self.inputs
        }

        fn publications(&self) -> &[String] {
            &self.outputs
        }

        async fn receive(&self, _topic: &str, _message: &Message) -> MeshResult<()> {
            Ok(())
        }

        async fn reset(&self) {}
    }

    fn probe() -> SharedAgent {
        Arc::new(Probe {
            inputs: vec!["A".into(), "B".into()],
            outputs: vec!["OUT".into()],
        })
    }

    #[test]
    fn test_attach_registers_both_directions() {
        let registry = TopicRegistry::new();
        let agent = probe();

        attach(&registry, &agent);

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get_or_create("A").subscriber_count(), 1);
        assert_eq!(registry.get_or_create("B").subscriber_count(), 1);
        assert_eq!(registry.get_or_create("OUT").publisher_count(), 1);
        assert_eq!(registry.get_or_create("OUT").subscriber_count(), 0);
    }

    #[test]
    fn test_attach_twice_is_idempotent() {
        let registry = TopicRegistry::new();
        let agent = probe();

        attach(&registry, &agent);
        attach(&registry, &agent);

        assert_eq!(registry.get_or_create("A").subscriber_count(), 1);
        assert_eq!(registry.get_or_create("OUT").publisher_count(), 1);
    }

    #[test]
    fn test_detach_keeps_topics() {
        let registry = TopicRegistry::new();
        let agent = probe();

        attach(&registry, &agent);
        detach(&registry, &agent);

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get_or_create("A").subscriber_count(), 0);
        assert_eq!(registry.get_or_create("OUT").publisher_count(), 0);
    }

    #[tokio::test]
    async fn test_default_close_is_ok() {
        assert!(probe().close().await.is_ok());
    }
}
