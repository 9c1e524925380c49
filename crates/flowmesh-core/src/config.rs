//! Declarative graph configuration
//!
//! The text format is line oriented, three lines per agent:
//!
//! ```text
//! PlusAgent
//! A,B
//! SUM
//! ```
//!
//! The first line names the agent kind, the second lists input topics and the
//! third output topics, both comma separated. Loading is all or nothing: every
//! agent is constructed before any of them is wired into the registry.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    agent::{self, Agent, SharedAgent},
    error::{MeshError, MeshResult},
    factory::AgentFactory,
    mailbox::ParallelAgent,
    registry::TopicRegistry,
    settings::GraphSettings,
};

/// Lines per agent record
pub const LINES_PER_RECORD: usize = 3;

/// One agent declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRecord {
    pub kind: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl AgentRecord {
    pub fn new(kind: impl Into<String>, inputs: &str, outputs: &str) -> Self {
        Self {
            kind: kind.into().trim().to_string(),
            inputs: split_names(inputs),
            outputs: split_names(outputs),
        }
    }
}

/// Split a comma-separated name list, trimming names and dropping blanks
pub fn split_names(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse configuration text into agent records
///
/// Every line counts, blank ones included, except trailing blank lines that
/// would otherwise leave an incomplete record.
///
/// # Errors
///
/// `MeshError::InvalidConfig` when the line count is not a multiple of three
/// or a record has an empty kind line.
pub fn parse_records(text: &str) -> MeshResult<Vec<AgentRecord>> {
    let mut lines: Vec<&str> = text.lines().map(str::trim).collect();
    while lines.len() % LINES_PER_RECORD != 0 && lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    if lines.len() % LINES_PER_RECORD != 0 {
        return Err(MeshError::InvalidConfig(format!(
            "expected a multiple of {LINES_PER_RECORD} lines, found {}",
            lines.len()
        )));
    }

    lines
        .chunks(LINES_PER_RECORD)
        .enumerate()
        .map(|(idx, chunk)| {
            if chunk[0].is_empty() {
                return Err(MeshError::InvalidConfig(format!(
                    "record {} has an empty agent kind (line {})",
                    idx + 1,
                    idx * LINES_PER_RECORD + 1
                )));
            }
            Ok(AgentRecord::new(chunk[0], chunk[1], chunk[2]))
        })
        .collect()
}

/// A loaded graph: the live wrapped agents of one configuration
pub struct GraphConfig {
    name: String,
    registry: Arc<TopicRegistry>,
    agents: Vec<Arc<ParallelAgent>>,
}

impl GraphConfig {
    /// Construct, wrap and wire every record
    ///
    /// Equivalent to [`GraphConfig::prepare`] followed by
    /// [`GraphConfig::wire`]; a failed load leaves the registry untouched.
    ///
    /// # Errors
    ///
    /// Any configuration error from the factory, or `MeshError::Runtime` when
    /// called outside a Tokio runtime.
    pub fn load(
        name: impl Into<String>,
        records: &[AgentRecord],
        factory: &AgentFactory,
        registry: Arc<TopicRegistry>,
        settings: &GraphSettings,
    ) -> MeshResult<Self> {
        let graph = Self::prepare(name, records, factory, registry, settings)?;
        graph.wire();
        Ok(graph)
    }

    /// Construct and wrap every record without touching the registry
    ///
    /// Every agent is constructed before any mailbox is started, so the first
    /// failing record aborts the whole graph.
    pub fn prepare(
        name: impl Into<String>,
        records: &[AgentRecord],
        factory: &AgentFactory,
        registry: Arc<TopicRegistry>,
        settings: &GraphSettings,
    ) -> MeshResult<Self> {
        let name = name.into();
        settings.validate()?;

        let built: Vec<SharedAgent> = records
            .iter()
            .map(|record| {
                factory.build(&record.kind, &registry, &record.inputs, &record.outputs)
            })
            .collect::<MeshResult<_>>()?;

        let mut agents = Vec::with_capacity(built.len());
        for inner in built {
            let wrapper = ParallelAgent::new(inner, settings.mailbox_capacity)?
                .with_drain_timeout(settings.drain_timeout);
            agents.push(Arc::new(wrapper));
        }

        Ok(Self {
            name,
            registry,
            agents,
        })
    }

    /// Register every wrapper with its topics
    pub fn wire(&self) {
        for wrapper in &self.agents {
            let shared: SharedAgent = wrapper.clone();
            agent::attach(&self.registry, &shared);
            debug!(
                graph = %self.name,
                agent = %shared.name(),
                inputs = ?shared.subscriptions(),
                outputs = ?shared.publications(),
                "Wired agent"
            );
        }

        info!(
            graph = %self.name,
            agents = self.agents.len(),
            topics = self.registry.len(),
            "Graph loaded"
        );
    }

    /// Parse `text` and load it
    pub fn from_text(
        name: impl Into<String>,
        text: &str,
        factory: &AgentFactory,
        registry: Arc<TopicRegistry>,
        settings: &GraphSettings,
    ) -> MeshResult<Self> {
        let records = parse_records(text)?;
        Self::load(name, &records, factory, registry, settings)
    }

    /// Read, parse and load the configuration file at `path`
    pub async fn from_file(
        path: impl AsRef<Path>,
        factory: &AgentFactory,
        registry: Arc<TopicRegistry>,
        settings: &GraphSettings,
    ) -> MeshResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_text(path.display().to_string(), &text, factory, registry, settings)
    }

    /// Source label of this configuration
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    /// Live wrapped agents in record order
    pub fn agents(&self) -> &[Arc<ParallelAgent>] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Reset the computation state of every agent
    pub async fn reset(&self) {
        for agent in &self.agents {
            agent.reset().await;
        }
    }

    /// Close every wrapper and forget them
    ///
    /// Topic registrations stay in place; clearing the registry is up to the
    /// caller. Every wrapper is closed even if one fails; the first failure
    /// is returned.
    pub async fn close(&mut self) -> MeshResult<()> {
        let mut first_error = None;
        for agent in self.agents.drain(..) {
            if let Err(e) = agent.close().await {
                first_error.get_or_insert(e);
            }
        }
        info!(graph = %self.name, "Graph closed");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("name", &self.name)
            .field("agents", &self.agents.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use async_trait::async_trait;
    use std::io::Write;
    use tokio::sync::Mutex;

    /// Records every delivery
    struct Tap {
        name: String,
        inputs: Vec<String>,
        outputs: Vec<String>,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Agent for Tap {
        fn name(&self) -> &str {
            &self.name
        }

        fn subscriptions(&self) -> &[String] {
            &self.inputs
        }

        fn publications(&self) -> &[String] {
            &self.outputs
        }

        async fn receive(&self, _topic: &str, message: &Message) -> MeshResult<()> {
            self.seen.lock().await.push(message.as_text().to_string());
            Ok(())
        }

        async fn reset(&self) {}
    }

    fn factory(seen: Arc<Mutex<Vec<String>>>) -> AgentFactory {
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        AgentFactory::new().with_builder("TapAgent", move |_, inputs, outputs| {
            if inputs.is_empty() {
                return Err(MeshError::AgentConstruction {
                    kind: "TapAgent".into(),
                    reason: "requires at least 1 subscription".into(),
                });
            }
            let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(Arc::new(Tap {
                name: format!("TapAgent{n}"),
                inputs: inputs.to_vec(),
                outputs: outputs.to_vec(),
                seen: Arc::clone(&seen),
            }) as SharedAgent)
        })
    }

    #[test]
    fn test_parse_records() {
        let records = parse_records("PlusAgent\nA, B\nSUM\nIncAgent\nSUM\n\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], AgentRecord::new("PlusAgent", "A,B", "SUM"));
        assert_eq!(records[1].inputs, vec!["SUM"]);
        assert!(records[1].outputs.is_empty());
    }

    #[test]
    fn test_parse_ignores_surplus_trailing_blank_lines() {
        let records = parse_records("IncAgent\nA\nB\n\n\n").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_parse_rejects_bad_line_count() {
        let err = parse_records("PlusAgent\nA,B").unwrap_err();
        assert!(matches!(err, MeshError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_rejects_empty_kind() {
        let err = parse_records("\nA\nB").unwrap_err();
        assert!(err.to_string().contains("empty agent kind"));
    }

    #[test]
    fn test_split_names_drops_blanks() {
        assert_eq!(split_names(" A , ,B,"), vec!["A", "B"]);
        assert!(split_names("").is_empty());
    }

    #[tokio::test]
    async fn test_load_wires_wrappers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(TopicRegistry::new());
        let text = "TapAgent\nIN\nOUT\nTapAgent\nIN\n\n";

        let mut graph = GraphConfig::from_text(
            "inline",
            text,
            &factory(Arc::clone(&seen)),
            Arc::clone(&registry),
            &GraphSettings::default(),
        )
        .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.name(), "inline");
        assert_eq!(registry.get("IN").unwrap().subscriber_count(), 2);
        assert_eq!(registry.get("OUT").unwrap().publisher_count(), 1);

        registry.publish("IN", "x").await.unwrap();
        graph.close().await.unwrap();

        assert_eq!(*seen.lock().await, vec!["x", "x"]);
        assert!(graph.is_empty());
        assert!(registry.exists("IN"), "close keeps the registry");
    }

    #[tokio::test]
    async fn test_failed_load_installs_nothing() {
        let registry = Arc::new(TopicRegistry::new());
        let text = "TapAgent\nIN\nOUT\nTapAgent\n\nOUT2\n";

        let err = GraphConfig::from_text(
            "broken",
            text,
            &factory(Arc::new(Mutex::new(Vec::new()))),
            Arc::clone(&registry),
            &GraphSettings::default(),
        )
        .unwrap_err();

        assert!(err.is_configuration());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_kind_aborts_load() {
        let registry = Arc::new(TopicRegistry::new());
        let err = GraphConfig::from_text(
            "unknown",
            "NopeAgent\nA\nB",
            &factory(Arc::new(Mutex::new(Vec::new()))),
            Arc::clone(&registry),
            &GraphSettings::default(),
        )
        .unwrap_err();

        assert!(matches!(err, MeshError::UnknownAgentKind(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "TapAgent\nA\nB\n").unwrap();

        let registry = Arc::new(TopicRegistry::new());
        let mut graph = GraphConfig::from_file(
            file.path(),
            &factory(Arc::new(Mutex::new(Vec::new()))),
            registry,
            &GraphSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.name(), file.path().display().to_string());
        graph.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GraphConfig::from_file(
            dir.path().join("missing.conf"),
            &factory(Arc::new(Mutex::new(Vec::new()))),
            Arc::new(TopicRegistry::new()),
            &GraphSettings::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MeshError::Io(_)));
    }
}
