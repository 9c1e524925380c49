//! Graph lifecycle
//!
//! [`FlowEngine`] owns one registry and at most one installed graph. It is the
//! surface the HTTP adapter and the CLI drive: install a configuration,
//! publish values, list topics and export the topology.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    config::{GraphConfig, parse_records},
    error::MeshResult,
    factory::AgentFactory,
    message::Message,
    registry::TopicRegistry,
    settings::GraphSettings,
    topology::{Topology, TopologySnapshot},
};

/// Status line of one topic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicStatus {
    pub name: String,
    /// Text of the last published value
    pub value: Option<String>,
    pub subscribers: usize,
    pub publishers: usize,
}

/// Summary of an installed graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphInfo {
    pub name: String,
    pub agents: Vec<String>,
}

/// Owner of the registry and the running graph
pub struct FlowEngine {
    registry: Arc<TopicRegistry>,
    factory: AgentFactory,
    settings: GraphSettings,
    graph: Mutex<Option<GraphConfig>>,
}

impl FlowEngine {
    /// Engine with a private registry
    pub fn new(factory: AgentFactory, settings: GraphSettings) -> Self {
        Self::with_registry(factory, settings, Arc::new(TopicRegistry::new()))
    }

    /// Engine over an existing registry
    pub fn with_registry(
        factory: AgentFactory,
        settings: GraphSettings,
        registry: Arc<TopicRegistry>,
    ) -> Self {
        Self {
            registry,
            factory,
            settings,
            graph: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    pub fn factory(&self) -> &AgentFactory {
        &self.factory
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Replace the running graph with the configuration in `text`
    ///
    /// The new graph is parsed and constructed first. Only then is the
    /// registry cleared, the old graph closed and the new graph wired, so a
    /// rejected configuration leaves the running graph in place. While the
    /// old graph drains, its agents publish into fresh topics nobody
    /// subscribes to instead of each other's mailboxes.
    ///
    /// Returns the number of installed agents.
    pub async fn install(&self, name: &str, text: &str) -> MeshResult<usize> {
        let records = parse_records(text)?;
        let next = GraphConfig::prepare(
            name,
            &records,
            &self.factory,
            Arc::clone(&self.registry),
            &self.settings,
        )?;

        let mut slot = self.graph.lock().await;
        self.registry.clear();
        if let Some(mut previous) = slot.take() {
            if let Err(e) = previous.close().await {
                warn!(graph = %previous.name(), error = %e, "Previous graph closed with error");
            }
        }
        // Drop topics recreated by the old graph while it drained
        self.registry.clear();

        next.wire();
        let count = next.len();
        *slot = Some(next);

        Ok(count)
    }

    /// Install the configuration file at `path`
    pub async fn install_file(&self, path: impl AsRef<std::path::Path>) -> MeshResult<usize> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        self.install(&path.display().to_string(), &text).await
    }

    /// Whether a graph is installed
    pub async fn is_loaded(&self) -> bool {
        self.graph.lock().await.is_some()
    }

    /// Name and agent names of the installed graph
    pub async fn graph_info(&self) -> Option<GraphInfo> {
        let graph = self.graph.lock().await;
        graph.as_ref().map(|g| GraphInfo {
            name: g.name().to_string(),
            agents: g
                .agents()
                .iter()
                .map(|a| a.inner().name().to_string())
                .collect(),
        })
    }

    /// Publish external input on `topic`
    pub async fn publish(&self, topic: &str, value: impl Into<Message>) -> MeshResult<()> {
        self.registry.publish(topic, value).await
    }

    /// Status of every topic, ordered by name
    pub async fn topics(&self) -> Vec<TopicStatus> {
        let mut statuses = Vec::new();
        for topic in self.registry.list_all() {
            statuses.push(TopicStatus {
                name: topic.name().to_string(),
                value: topic.last_text().await,
                subscribers: topic.subscriber_count(),
                publishers: topic.publisher_count(),
            });
        }
        statuses
    }

    /// Topology of the installed graph, `None` before any install
    pub async fn snapshot(&self) -> Option<TopologySnapshot> {
        if !self.is_loaded().await {
            return None;
        }
        Some(Topology::from_registry(&self.registry).await.snapshot())
    }

    /// Close the installed graph and clear the registry
    pub async fn shutdown(&self) -> MeshResult<()> {
        let mut slot = self.graph.lock().await;
        self.registry.clear();
        let result = match slot.take() {
            Some(mut graph) => graph.close().await,
            None => Ok(()),
        };
        self.registry.clear();
        info!("Engine shut down");
        result
    }
}

impl std::fmt::Debug for FlowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowEngine")
            .field("registry", &self.registry)
            .field("factory", &self.factory)
            .field("settings", &self.settings)
            .finish()
    }
}
