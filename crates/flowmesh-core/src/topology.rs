//! Topology snapshot and cycle detection
//!
//! A [`Topology`] is an arena of nodes addressed by index, rebuilt from the
//! registry on every request. Topic `X` becomes node `TX`, agent `Y` becomes
//! node `AY`; every subscription adds a topic→agent edge and every declared
//! publication an agent→topic edge.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{message::Message, registry::TopicRegistry};

/// Id prefix of topic nodes
pub const TOPIC_PREFIX: &str = "T";
/// Id prefix of agent nodes
pub const AGENT_PREFIX: &str = "A";

/// Kind tag of a topology node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A topic that feeds at least one agent, or has no producer
    Topic,
    /// An agent
    Agent,
    /// A topic that is produced into but consumed by nobody
    Result,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub value: Option<Message>,
}

/// Directed graph of topics and agents
#[derive(Debug, Default)]
pub struct Topology {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<(usize, usize)>,
    adjacency: Vec<Vec<usize>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    OnPath,
    Done,
}

impl Topology {
    /// Create an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the topology of everything currently registered in `registry`
    pub async fn from_registry(registry: &TopicRegistry) -> Self {
        let mut topology = Self::new();

        for topic in registry.list_all() {
            let kind = if topic.publisher_count() > 0 && topic.subscriber_count() == 0 {
                NodeKind::Result
            } else {
                NodeKind::Topic
            };
            let topic_node = topology.add_node(&format!("{TOPIC_PREFIX}{}", topic.name()), kind);
            topology.nodes[topic_node].value = topic.last_value().await;

            for agent in topic.subscribers() {
                let agent_node =
                    topology.add_node(&format!("{AGENT_PREFIX}{}", agent.name()), NodeKind::Agent);
                topology.add_edge(topic_node, agent_node);
            }
            for agent in topic.publishers() {
                let agent_node =
                    topology.add_node(&format!("{AGENT_PREFIX}{}", agent.name()), NodeKind::Agent);
                topology.add_edge(agent_node, topic_node);
            }
        }

        topology
    }

    /// Index of the node `id`, creating it with `kind` if it is new
    ///
    /// An existing node keeps its original kind.
    pub fn add_node(&mut self, id: &str, kind: NodeKind) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(Node {
            id: id.to_string(),
            kind,
            value: None,
        });
        self.adjacency.push(Vec::new());
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Add a directed edge between two indices returned by `add_node`
    pub(crate) fn add_edge(&mut self, source: usize, target: usize) {
        self.adjacency[source].push(target);
        self.edges.push((source, target));
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether any directed cycle exists (self-edges included)
    ///
    /// Depth-first search with an explicit stack of `(node, next edge)`
    /// frames, so path length is bounded by the heap rather than the thread
    /// stack.
    pub fn has_cycles(&self) -> bool {
        let mut state = vec![Visit::Unvisited; self.nodes.len()];
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for start in 0..self.nodes.len() {
            if state[start] != Visit::Unvisited {
                continue;
            }
            state[start] = Visit::OnPath;
            stack.push((start, 0));

            while let Some(frame) = stack.last_mut() {
                let (node, edge) = *frame;
                let Some(&next) = self.adjacency[node].get(edge) else {
                    state[node] = Visit::Done;
                    stack.pop();
                    continue;
                };
                frame.1 += 1;

                let visit = state[next];
                if visit == Visit::OnPath {
                    return true;
                }
                if visit == Visit::Unvisited {
                    state[next] = Visit::OnPath;
                    stack.push((next, 0));
                }
            }
        }
        false
    }

    /// Serializable node/edge view
    pub fn snapshot(&self) -> TopologySnapshot {
        let nodes = self
            .nodes
            .iter()
            .map(|node| NodeView {
                id: node.id.clone(),
                label: display_label(&node.id),
                kind: node.kind,
                value: node.value.as_ref().map(json_value),
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .map(|&(source, target)| EdgeView {
                source: self.nodes[source].id.clone(),
                target: self.nodes[target].id.clone(),
            })
            .collect();

        TopologySnapshot {
            nodes,
            edges,
            has_cycles: self.has_cycles(),
        }
    }
}

/// Node id without its kind prefix and without the word `Agent`
fn display_label(id: &str) -> String {
    let bare = id
        .strip_prefix(TOPIC_PREFIX)
        .or_else(|| id.strip_prefix(AGENT_PREFIX))
        .unwrap_or(id);
    bare.replace("Agent", "")
}

fn json_value(message: &Message) -> serde_json::Value {
    match serde_json::Number::from_f64(message.as_number()) {
        Some(n) => serde_json::Value::Number(n),
        None => serde_json::Value::String(message.as_text().to_string()),
    }
}

/// Point-in-time topology, ready for JSON serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub has_cycles: bool,
}

impl TopologySnapshot {
    pub fn node(&self, id: &str) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub source: String,
    pub target: String,
}
