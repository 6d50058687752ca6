//! Signed task request and task result envelopes.
//!
//! Both structures are signed by their sender over the canonical encoding of
//! every field except `signature`. Verification recomputes that encoding from the
//! fields as they are now, so mutating anything after signing (including the
//! signature itself) makes verification fail.
//!
//! Envelopes carry no expiry, and verification says nothing about whether the
//! recipient actually offers the capability; both are the orchestrator's concern.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::encode_unsigned;
use crate::error::Result;
use crate::identity::{self, Keypair};

/// A signed request to run `capability` on `to` with `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEnvelope {
    /// Sender-generated id, unique while the request is pending.
    pub task_id: String,
    /// Sender public key (hex).
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Capability name to invoke.
    pub capability: String,
    /// Arbitrary structured input.
    pub payload: Value,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    /// Sender signature (hex).
    pub signature: String,
}

/// Outcome carried by a [`TaskResult`].
///
/// Serialized inline: `"result": <value>` on success, `"error": "<description>"`
/// on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskOutcome {
    Result(Value),
    Error(String),
}

/// A signed response to a [`TaskEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    /// Matches the originating envelope's `task_id`.
    pub task_id: String,
    /// Responder public key (hex).
    pub from: String,
    /// Returned value or error description.
    #[serde(flatten)]
    pub outcome: TaskOutcome,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    /// Responder signature (hex).
    pub signature: String,
}

impl TaskResult {
    /// The returned value, if the task succeeded.
    pub fn value(&self) -> Option<&Value> {
        match &self.outcome {
            TaskOutcome::Result(value) => Some(value),
            TaskOutcome::Error(_) => None,
        }
    }

    /// The error description, if the task failed.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            TaskOutcome::Result(_) => None,
            TaskOutcome::Error(message) => Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Error(_))
    }
}

/// Build and sign a task request with a fresh task id.
pub fn create_task_envelope(
    sender: &Keypair,
    to: &str,
    capability: &str,
    payload: Value,
) -> Result<TaskEnvelope> {
    let mut envelope = TaskEnvelope {
        task_id: uuid::Uuid::new_v4().to_string(),
        from: sender.public_key_hex(),
        to: to.to_string(),
        capability: capability.to_string(),
        payload,
        timestamp: crate::now_ms(),
        signature: String::new(),
    };
    envelope.signature = sender.sign(&encode_unsigned(&envelope)?).to_hex();
    Ok(envelope)
}

/// Check the envelope's signature against its `from` key.
pub fn verify_task_envelope(envelope: &TaskEnvelope) -> bool {
    match encode_unsigned(envelope) {
        Ok(message) => identity::verify_hex(&envelope.signature, &message, &envelope.from),
        Err(_) => false,
    }
}

/// Build and sign a result for `task_id`.
pub fn create_task_result(
    responder: &Keypair,
    task_id: &str,
    outcome: TaskOutcome,
) -> Result<TaskResult> {
    let mut result = TaskResult {
        task_id: task_id.to_string(),
        from: responder.public_key_hex(),
        outcome,
        timestamp: crate::now_ms(),
        signature: String::new(),
    };
    result.signature = responder.sign(&encode_unsigned(&result)?).to_hex();
    Ok(result)
}

/// Check the result's signature against its `from` key.
pub fn verify_task_result(result: &TaskResult) -> bool {
    match encode_unsigned(result) {
        Ok(message) => identity::verify_hex(&result.signature, &message, &result.from),
        Err(_) => false,
    }
}
