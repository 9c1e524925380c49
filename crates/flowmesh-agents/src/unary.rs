//! Single-input agents
//!
//! A unary agent recomputes and publishes on every message from its first
//! input topic. Non-numeric input counts as zero.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use flowmesh_core::{Agent, MeshError, MeshResult, Message, TopicRegistry};

use crate::naming::next_name;

/// Kind name of the increment agent
pub const INC_KIND: &str = "IncAgent";
/// Kind name of the decrement agent
pub const DEC_KIND: &str = "DecAgent";

type UnaryOp = fn(f64) -> f64;

/// Agent applying a fixed function to each value of one input topic
pub struct UnaryAgent {
    name: String,
    registry: Arc<TopicRegistry>,
    inputs: Vec<String>,
    outputs: Vec<String>,
    operand: Mutex<f64>,
    op: UnaryOp,
}

impl UnaryAgent {
    /// Build a `kind` agent over the first of `inputs` and the first of
    /// `outputs`; further names are ignored.
    ///
    /// # Errors
    ///
    /// `MeshError::AgentConstruction` when `inputs` is empty.
    pub fn new(
        kind: &str,
        registry: Arc<TopicRegistry>,
        inputs: &[String],
        outputs: &[String],
        op: UnaryOp,
    ) -> MeshResult<Self> {
        let Some(input) = inputs.first() else {
            return Err(MeshError::AgentConstruction {
                kind: kind.to_string(),
                reason: "requires at least 1 subscription".to_string(),
            });
        };

        Ok(Self {
            name: next_name(kind),
            registry,
            inputs: vec![input.clone()],
            outputs: outputs.first().cloned().into_iter().collect(),
            operand: Mutex::new(0.0),
            op,
        })
    }

    /// `x + 1`
    pub fn increment(
        registry: Arc<TopicRegistry>,
        inputs: &[String],
        outputs: &[String],
    ) -> MeshResult<Self> {
        Self::new(INC_KIND, registry, inputs, outputs, |x| x + 1.0)
    }

    /// `x - 1`
    pub fn decrement(
        registry: Arc<TopicRegistry>,
        inputs: &[String],
        outputs: &[String],
    ) -> MeshResult<Self> {
        Self::new(DEC_KIND, registry, inputs, outputs, |x| x - 1.0)
    }

    /// Last operand seen (zero after reset)
    pub async fn operand(&self) -> f64 {
        *self.operand.lock().await
    }
}

#[async_trait]
impl Agent for UnaryAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn subscriptions(&self) -> &[String] {
        &self.inputs
    }

    fn publications(&self) -> &[String] {
        &self.outputs
    }

    async fn receive(&self, topic: &str, message: &Message) -> MeshResult<()> {
        if self.inputs.first().map(String::as_str) != Some(topic) {
            return Ok(());
        }

        let value = if message.is_numeric() {
            message.as_number()
        } else {
            0.0
        };
        *self.operand.lock().await = value;
        let result = (self.op)(value);

        if let Some(output) = self.outputs.first() {
            debug!(agent = %self.name, input = value, result, "Publishing result");
            // Downstream delivery failures are logged by the topic
            let _ = self.registry.publish(output, result).await;
        }
        Ok(())
    }

    async fn reset(&self) {
        *self.operand.lock().await = 0.0;
    }
}

impl std::fmt::Debug for UnaryAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnaryAgent")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}
