//! Core types for AgentLink: the trust and messaging layer between agents.
//!
//! This crate holds everything that is a pure function of keys, bytes and the
//! clock: ed25519 identities, the canonical encoding every signature is computed
//! over, owner-issued delegation certificates, and the signed task envelopes.
//! It performs no I/O.

pub mod canonical;
pub mod capability;
pub mod delegation;
pub mod envelope;
pub mod error;
pub mod identity;

pub use capability::CapabilityDefinition;
pub use delegation::{DelegationCertificate, DelegationError};
pub use envelope::{TaskEnvelope, TaskOutcome, TaskResult};
pub use error::{Error, Result};
pub use identity::{Keypair, Signature};

/// Current time as Unix epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
