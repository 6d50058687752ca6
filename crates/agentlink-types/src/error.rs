//! Shared error types for the AgentLink core.

use thiserror::Error;

/// Errors produced while building or encoding protocol structures.
///
/// Verification never returns these: a structure that fails to verify simply
/// yields `false`.
#[derive(Error, Debug)]
pub enum Error {
    /// The value cannot be represented in canonical form.
    #[error("Canonical encoding error: {0}")]
    Canonical(String),

    /// A hex string could not be decoded.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Key material has the wrong length or is not a valid curve point.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Certificate parameters are not acceptable (e.g. zero ttl).
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    /// A serialization/deserialization error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias for Result with the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
