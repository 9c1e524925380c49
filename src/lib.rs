//! # Flowmesh
//!
//! Publish/subscribe dataflow graphs assembled at runtime from a declarative
//! configuration. Values published to a topic reach every subscribed agent
//! through that agent's bounded mailbox; agents compute and publish onward.
//!
//! ```rust,no_run
//! use flowmesh::{FlowEngine, GraphSettings, builtin_factory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = FlowEngine::new(builtin_factory(), GraphSettings::from_env()?);
//!     engine.install("inline", "PlusAgent\nA,B\nSUM\n").await?;
//!
//!     engine.publish("A", 3.0).await?;
//!     engine.publish("B", 4.0).await?;
//!
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub use flowmesh_agents::{
    BinOpAgent, DEC_KIND, DIV_KIND, INC_KIND, MUL_KIND, PLUS_KIND, RoundState, UnaryAgent,
    builtin_factory, register_builtins,
};
pub use flowmesh_core::*;

#[cfg(feature = "http")]
pub use flowmesh_http as http;
