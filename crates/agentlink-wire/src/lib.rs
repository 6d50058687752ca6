//! AgentLink wire layer: message framing and pluggable transports.
//!
//! The orchestrator only ever sees the [`Transport`] trait. Two implementations
//! live here:
//!
//! - **MemoryTransport**: in-process bus whose peers find each other through an
//!   explicitly shared [`MemoryDirectory`]; used by tests and embedded fleets
//! - **PeerTransport**: TCP peers with an HMAC-authenticated handshake and a
//!   [`PeerRegistry`] of connected nodes and their advertised capabilities
//!
//! [`WireMessage`] is the tagged union every agent-level payload travels in.

pub mod memory;
pub mod message;
pub mod peer;
pub mod registry;
pub mod transport;

pub use memory::{MemoryDirectory, MemoryTransport};
pub use message::WireMessage;
pub use peer::{PeerConfig, PeerTransport};
pub use registry::{PeerEntry, PeerRegistry, PeerState};
pub use transport::{InboundHandler, Transport, TransportError};
