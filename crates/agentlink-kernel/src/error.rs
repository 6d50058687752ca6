//! Orchestrator error types.

use agentlink_wire::TransportError;
use thiserror::Error;

/// Why an outbound request was rejected.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The correlated result failed signature verification.
    #[error("invalid signature")]
    InvalidSignature,

    /// No correlated result arrived within the deadline.
    #[error("request {task_id} timed out after {timeout_ms} ms")]
    Timeout { task_id: String, timeout_ms: u64 },

    /// The transport could not deliver the request.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The agent was stopped while the request was outstanding.
    #[error("agent stopped")]
    Stopped,

    /// A message could not be encoded or signed.
    #[error("encoding failed: {0}")]
    Encoding(#[from] agentlink_types::Error),

    /// An envelope with this task id is already awaiting its result.
    #[error("task {0} is already pending")]
    DuplicateTask(String),

    /// The agent has not been started.
    #[error("agent not started")]
    NotStarted,
}

/// Alias for orchestrator results.
pub type AgentResult<T> = Result<T, AgentError>;
