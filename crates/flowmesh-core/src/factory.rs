//! Agent factory
//!
//! Maps agent-kind identifiers from configuration text to builders that
//! construct the agent from its input and output topic names. Builders are
//! registered up front; nothing is discovered at runtime.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    agent::SharedAgent,
    error::{MeshError, MeshResult},
    registry::TopicRegistry,
};

/// Builds one kind of agent
pub trait AgentBuilder: Send + Sync {
    /// Kind identifier this builder answers to
    fn kind(&self) -> &str;

    /// Construct an agent publishing through `registry`
    ///
    /// Construction validates the wiring but must not register the agent
    /// with any topic.
    fn build(
        &self,
        registry: &Arc<TopicRegistry>,
        inputs: &[String],
        outputs: &[String],
    ) -> MeshResult<SharedAgent>;
}

type BuildFn =
    dyn Fn(&Arc<TopicRegistry>, &[String], &[String]) -> MeshResult<SharedAgent> + Send + Sync;

/// Builder backed by a closure
pub struct FnBuilder {
    kind: String,
    build: Box<BuildFn>,
}

impl FnBuilder {
    pub fn new<F>(kind: impl Into<String>, build: F) -> Self
    where
        F: Fn(&Arc<TopicRegistry>, &[String], &[String]) -> MeshResult<SharedAgent>
            + Send
            + Sync
            + 'static,
    {
        Self {
            kind: kind.into(),
            build: Box::new(build),
        }
    }
}

impl AgentBuilder for FnBuilder {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn build(
        &self,
        registry: &Arc<TopicRegistry>,
        inputs: &[String],
        outputs: &[String],
    ) -> MeshResult<SharedAgent> {
        (self.build)(registry, inputs, outputs)
    }
}

/// Registry of agent builders keyed by kind
#[derive(Default)]
pub struct AgentFactory {
    builders: HashMap<String, Box<dyn AgentBuilder>>,
}

impl AgentFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `builder`, replacing any builder of the same kind
    pub fn register_builder(&mut self, builder: Box<dyn AgentBuilder>) {
        self.builders.insert(builder.kind().to_string(), builder);
    }

    /// Register a closure as the builder for `kind`
    pub fn register<F>(&mut self, kind: impl Into<String>, build: F)
    where
        F: Fn(&Arc<TopicRegistry>, &[String], &[String]) -> MeshResult<SharedAgent>
            + Send
            + Sync
            + 'static,
    {
        self.register_builder(Box::new(FnBuilder::new(kind, build)));
    }

    /// Builder-style variant of [`AgentFactory::register`]
    pub fn with_builder<F>(mut self, kind: impl Into<String>, build: F) -> Self
    where
        F: Fn(&Arc<TopicRegistry>, &[String], &[String]) -> MeshResult<SharedAgent>
            + Send
            + Sync
            + 'static,
    {
        self.register(kind, build);
        self
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.builders.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Whether `kind` resolves to a builder
    pub fn supports(&self, kind: &str) -> bool {
        self.resolve(kind).is_some()
    }

    /// Construct an agent of `kind`
    ///
    /// A package-qualified identifier such as `configs.PlusAgent` resolves to
    /// `PlusAgent` when no builder matches the full identifier.
    ///
    /// # Errors
    ///
    /// `MeshError::UnknownAgentKind` if no builder matches, or whatever the
    /// builder reports when the wiring is invalid.
    pub fn build(
        &self,
        kind: &str,
        registry: &Arc<TopicRegistry>,
        inputs: &[String],
        outputs: &[String],
    ) -> MeshResult<SharedAgent> {
        let builder = self
            .resolve(kind)
            .ok_or_else(|| MeshError::UnknownAgentKind(kind.to_string()))?;
        builder.build(registry, inputs, outputs)
    }

    fn resolve(&self, kind: &str) -> Option<&dyn AgentBuilder> {
        let kind = kind.trim();
        self.builders
            .get(kind)
            .or_else(|| {
                kind.rsplit_once('.')
                    .and_then(|(_, short)| self.builders.get(short))
            })
            .map(|b| b.as_ref())
    }
}

impl std::fmt::Debug for AgentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentFactory")
            .field("kinds", &self.kinds())
            .finish()
    }
}
