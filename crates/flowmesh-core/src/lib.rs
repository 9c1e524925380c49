//! # Flowmesh Core
//!
//! Publish/subscribe dataflow engine: agents wired between named topics,
//! each agent fed through its own bounded mailbox.
//!
//! ## Features
//!
//! - **Topics**: lazily created, concurrency-safe name → topic registry
//! - **Mailboxes**: one worker per agent, FIFO delivery with backpressure
//! - **Dynamic assembly**: graphs built from a line-oriented configuration
//!   through a kind → builder factory
//! - **Topology**: node/edge snapshots with cycle detection
//!
//! ## Example
//!
//! ```rust,no_run
//! use flowmesh_core::{AgentFactory, FlowEngine, GraphSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Register builders for the kinds your configurations use
//!     let factory = AgentFactory::new();
//!     let engine = FlowEngine::new(factory, GraphSettings::default());
//!
//!     engine.install("inline", "PlusAgent\nA,B\nSUM\n").await?;
//!     engine.publish("A", 3.0).await?;
//!     engine.publish("B", 4.0).await?;
//!
//!     if let Some(snapshot) = engine.snapshot().await {
//!         println!("{}", serde_json::to_string_pretty(&snapshot)?);
//!     }
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod mailbox;
pub mod message;
pub mod registry;
pub mod settings;
pub mod topic;
pub mod topology;

pub use agent::{Agent, SharedAgent, attach, detach};
pub use config::{AgentRecord, GraphConfig, LINES_PER_RECORD, parse_records, split_names};
pub use engine::{FlowEngine, GraphInfo, TopicStatus};
pub use error::{MeshError, MeshResult};
pub use factory::{AgentBuilder, AgentFactory, FnBuilder};
pub use mailbox::{DEFAULT_DRAIN_TIMEOUT, DEFAULT_MAILBOX_CAPACITY, MailboxStats, ParallelAgent};
pub use message::Message;
pub use registry::TopicRegistry;
pub use settings::{DRAIN_TIMEOUT_ENV, GraphSettings, MAILBOX_CAPACITY_ENV};
pub use topic::Topic;
pub use topology::{EdgeView, NodeKind, NodeView, Topology, TopologySnapshot};
