//! Wire message types.
//!
//! Two layers live here:
//!
//! - [`WireMessage`]: the agent-level tagged union (task / result / certificate)
//!   handed to `Transport::send` as canonical JSON bytes. Every transport carries
//!   it opaquely.
//! - [`PeerFrame`]: the TCP transport's own framing. Each frame is JSON prefixed
//!   with a 4-byte big-endian length header.

use agentlink_types::canonical;
use agentlink_types::{DelegationCertificate, TaskEnvelope, TaskResult};
use serde::{Deserialize, Serialize};

/// Agent-level message, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WireMessage {
    /// A signed task request.
    Task { envelope: TaskEnvelope },
    /// A signed task result.
    Result { result: TaskResult },
    /// A delegation certificate offered for fleet recognition.
    Certificate { cert: DelegationCertificate },
}

impl WireMessage {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Task { .. } => "task",
            Self::Result { .. } => "result",
            Self::Certificate { .. } => "certificate",
        }
    }

    /// Canonical bytes for `Transport::send`.
    pub fn to_bytes(&self) -> agentlink_types::Result<Vec<u8>> {
        canonical::encode_serialize(self)
    }

    /// Parse inbound bytes. Anything that is not one of the three shapes is an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// TCP transport frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerFrame {
    /// First frame on every connection: identify and authenticate.
    Handshake(HandshakeInfo),
    /// Reply to a valid handshake.
    HandshakeAck(HandshakeInfo),
    /// Opaque agent payload (hex-encoded [`WireMessage`] bytes).
    Deliver { payload: String },
    /// The sender's capability list changed.
    Advertise { capabilities: Vec<String> },
    /// The sender is going away.
    ShuttingDown,
    /// Protocol-level rejection.
    Error { code: i32, message: String },
}

/// Identity block exchanged in both directions of the handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeInfo {
    /// Node id (the agent's public key hex).
    pub node_id: String,
    /// Address the node accepts connections on.
    pub listen_addr: String,
    /// Protocol version.
    pub protocol_version: u32,
    /// Capabilities the node currently advertises.
    pub capabilities: Vec<String>,
    /// Random nonce for HMAC authentication.
    pub nonce: String,
    /// HMAC-SHA256(shared_secret, nonce + node_id).
    pub auth_hmac: String,
}

/// Current TCP protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Encode a frame to bytes (4-byte big-endian length + JSON).
pub fn encode_frame(frame: &PeerFrame) -> Result<Vec<u8>, serde_json::Error> {
    let json = serde_json::to_vec(frame)?;
    let len = json.len() as u32;
    let mut bytes = Vec::with_capacity(4 + json.len());
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(&json);
    Ok(bytes)
}

/// Decode the length prefix from a 4-byte header.
pub fn decode_length(header: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*header)
}

/// Parse a JSON body into a frame.
pub fn decode_frame(body: &[u8]) -> Result<PeerFrame, serde_json::Error> {
    serde_json::from_slice(body)
}
