//! Error types for graph and delivery operations

use thiserror::Error;

/// Result type for mesh operations
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur while assembling or running a dataflow graph
#[derive(Error, Debug)]
pub enum MeshError {
    /// Configuration text or records are malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No builder is registered for the requested agent kind
    #[error("Unknown agent kind: {0}")]
    UnknownAgentKind(String),

    /// An agent rejected its input/output wiring at construction time
    #[error("Cannot construct {kind}: {reason}")]
    AgentConstruction { kind: String, reason: String },

    /// A computation hit a contract violation (e.g. division by zero)
    #[error("Illegal state in agent {agent}: {reason}")]
    IllegalState { agent: String, reason: String },

    /// The agent's mailbox no longer accepts messages
    #[error("Mailbox closed for agent {agent}")]
    MailboxClosed { agent: String },

    /// Async runtime unavailable or a worker task failed to join
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Reading a configuration source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshError {
    /// Whether this error belongs to the configuration family, i.e. a load
    /// was rejected and nothing was installed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MeshError::InvalidConfig(_)
                | MeshError::UnknownAgentKind(_)
                | MeshError::AgentConstruction { .. }
        )
    }
}
