//! Two-input agents
//!
//! A binary agent collects one operand from each of its two input topics and
//! computes once both are present. Each computation consumes both operands,
//! so a new round starts from nothing. Non-numeric input is ignored.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use flowmesh_core::{Agent, MeshError, MeshResult, Message, TopicRegistry};

use crate::naming::next_name;

/// Kind name of the sum agent
pub const PLUS_KIND: &str = "PlusAgent";
/// Kind name of the product agent
pub const MUL_KIND: &str = "MulAgent";
/// Kind name of the quotient agent
pub const DIV_KIND: &str = "DivAgent";

/// Operator returning either a result or the reason it cannot produce one
pub type CheckedOp = Box<dyn Fn(f64, f64) -> Result<f64, String> + Send + Sync>;

/// Where an agent stands in its current round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// No operand present
    Idle,
    /// One of two operands present
    PartiallyFilled,
    /// Both operands present
    Ready,
}

#[derive(Debug, Default)]
struct Slots {
    first: Option<f64>,
    second: Option<f64>,
}

impl Slots {
    fn state(&self) -> RoundState {
        match (self.first, self.second) {
            (None, None) => RoundState::Idle,
            (Some(_), Some(_)) => RoundState::Ready,
            _ => RoundState::PartiallyFilled,
        }
    }
}

/// Agent combining values of two input topics with a binary operator
pub struct BinOpAgent {
    name: String,
    registry: Arc<TopicRegistry>,
    inputs: Vec<String>,
    outputs: Vec<String>,
    slots: Mutex<Slots>,
    op: CheckedOp,
}

impl BinOpAgent {
    /// Named agent reading `first` and `second`, publishing `op(first, second)`
    /// on `output`.
    ///
    /// When `first` and `second` name the same topic, consecutive values from
    /// it fill the first then the second operand.
    pub fn new<F>(
        name: impl Into<String>,
        registry: Arc<TopicRegistry>,
        first: &str,
        second: &str,
        output: Option<&str>,
        op: F,
    ) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Self::checked(name, registry, first, second, output, move |a, b| Ok(op(a, b)))
    }

    /// Like [`BinOpAgent::new`] with an operator that may reject its operands
    pub fn checked<F>(
        name: impl Into<String>,
        registry: Arc<TopicRegistry>,
        first: &str,
        second: &str,
        output: Option<&str>,
        op: F,
    ) -> Self
    where
        F: Fn(f64, f64) -> Result<f64, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            registry,
            inputs: vec![first.to_string(), second.to_string()],
            outputs: output.map(str::to_string).into_iter().collect(),
            slots: Mutex::new(Slots::default()),
            op: Box::new(op),
        }
    }

    /// Build a `kind` agent from configuration names: the first two inputs
    /// and the first output are used.
    ///
    /// # Errors
    ///
    /// `MeshError::AgentConstruction` with fewer than two inputs.
    pub fn from_names<F>(
        kind: &str,
        registry: Arc<TopicRegistry>,
        inputs: &[String],
        outputs: &[String],
        op: F,
    ) -> MeshResult<Self>
    where
        F: Fn(f64, f64) -> Result<f64, String> + Send + Sync + 'static,
    {
        let [first, second, ..] = inputs else {
            return Err(MeshError::AgentConstruction {
                kind: kind.to_string(),
                reason: "requires at least 2 subscriptions".to_string(),
            });
        };

        Ok(Self::checked(
            next_name(kind),
            registry,
            first,
            second,
            outputs.first().map(String::as_str),
            op,
        ))
    }

    /// `a + b`
    pub fn plus(
        registry: Arc<TopicRegistry>,
        inputs: &[String],
        outputs: &[String],
    ) -> MeshResult<Self> {
        Self::from_names(PLUS_KIND, registry, inputs, outputs, |a, b| Ok(a + b))
    }

    /// `a * b`
    pub fn mul(
        registry: Arc<TopicRegistry>,
        inputs: &[String],
        outputs: &[String],
    ) -> MeshResult<Self> {
        Self::from_names(MUL_KIND, registry, inputs, outputs, |a, b| Ok(a * b))
    }

    /// `a / b`, refusing any round where either operand is zero
    pub fn div(
        registry: Arc<TopicRegistry>,
        inputs: &[String],
        outputs: &[String],
    ) -> MeshResult<Self> {
        Self::from_names(DIV_KIND, registry, inputs, outputs, |a, b| {
            if a == 0.0 || b == 0.0 {
                Err(format!("cannot divide {a} by {b}: zero operand"))
            } else {
                Ok(a / b)
            }
        })
    }

    pub async fn state(&self) -> RoundState {
        self.slots.lock().await.state()
    }
}

#[async_trait]
impl Agent for BinOpAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn subscriptions(&self) -> &[String] {
        &self.inputs
    }

    fn publications(&self) -> &[String] {
        &self.outputs
    }

    /// # Errors
    ///
    /// `MeshError::IllegalState` when the operator rejects a completed round.
    /// The round is consumed either way.
    async fn receive(&self, topic: &str, message: &Message) -> MeshResult<()> {
        if !message.is_numeric() {
            return Ok(());
        }
        let value = message.as_number();

        let operands = {
            let mut slots = self.slots.lock().await;
            if topic == self.inputs[0] && (topic != self.inputs[1] || slots.first.is_none()) {
                slots.first = Some(value);
            } else if topic == self.inputs[1] {
                slots.second = Some(value);
            } else {
                return Ok(());
            }

            match (slots.first, slots.second) {
                (Some(a), Some(b)) => {
                    *slots = Slots::default();
                    (a, b)
                }
                _ => return Ok(()),
            }
        };

        let (a, b) = operands;
        let result = (self.op)(a, b).map_err(|reason| MeshError::IllegalState {
            agent: self.name.clone(),
            reason,
        })?;

        if let Some(output) = self.outputs.first() {
            debug!(agent = %self.name, a, b, result, "Publishing result");
            // Downstream delivery failures are logged by the topic
            let _ = self.registry.publish(output, result).await;
        }
        Ok(())
    }

    async fn reset(&self) {
        *self.slots.lock().await = Slots::default();
    }
}

impl std::fmt::Debug for BinOpAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinOpAgent")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}
