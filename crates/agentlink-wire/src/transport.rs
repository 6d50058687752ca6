//! The transport capability the orchestrator depends on.
//!
//! Implementations move opaque byte strings between peer addresses and report
//! who sent each inbound message. They know nothing about envelopes or
//! signatures; the orchestrator must behave identically over any of them.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors from the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Peer unreachable: {0}")]
    Unreachable(String),
    #[error("Transport stopped")]
    Stopped,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: u32, max: u32 },
    #[error("Protocol version mismatch: local={local}, remote={remote}")]
    VersionMismatch { local: u32, remote: u32 },
}

/// The single inbound entry point a transport delivers to.
#[async_trait]
pub trait InboundHandler: Send + Sync + 'static {
    /// Handle one inbound message from the peer at address `from`.
    async fn handle_message(&self, from: &str, bytes: Vec<u8>);
}

/// Peer-to-peer byte transport.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Begin accepting messages / join the network.
    async fn start(&self) -> Result<(), TransportError>;

    /// Release resources. Every later `send` fails.
    async fn stop(&self) -> Result<(), TransportError>;

    /// Best-effort delivery of `bytes` to `peer`.
    async fn send(&self, peer: &str, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Install the inbound handler, replacing any previous one.
    fn set_handler(&self, handler: Arc<dyn InboundHandler>);

    /// Announce the capability names this node serves.
    async fn advertise(&self, capabilities: Vec<String>) -> Result<(), TransportError>;

    /// Addresses of peers advertising `capability`.
    async fn discover(&self, capability: &str) -> Result<Vec<String>, TransportError>;

    /// This transport's own address.
    fn peer_address(&self) -> String;
}
