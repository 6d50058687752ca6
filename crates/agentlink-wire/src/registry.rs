//! Peer registry: TCP peers we have shaken hands with and what they serve.
//!
//! Entries are keyed by node id (the remote agent's public key hex). The
//! address stored is the peer's *listen* address from its handshake, not the
//! ephemeral port of whatever connection carried the handshake.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

/// Connection state of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    /// Handshake completed; the peer is reachable.
    Connected,
    /// The peer announced shutdown or a delivery failed. Kept for reconnect.
    Disconnected,
}

/// A single known peer.
#[derive(Debug, Clone)]
pub struct PeerEntry {
    pub node_id: String,
    /// Address the peer accepts connections on.
    pub address: SocketAddr,
    /// Capability names the peer advertises.
    pub capabilities: Vec<String>,
    pub state: PeerState,
    /// When the peer was last (re)registered.
    pub connected_at: DateTime<Utc>,
    pub protocol_version: u32,
}

/// Thread-safe registry of all known peers.
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    peers: Arc<RwLock<HashMap<String, PeerEntry>>>,
}

impl PeerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            peers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register or replace a peer after a successful handshake.
    pub fn add_peer(&self, entry: PeerEntry) {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        peers.insert(entry.node_id.clone(), entry);
    }

    /// Mark a peer as disconnected but keep its entry.
    pub fn mark_disconnected(&self, node_id: &str) {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = peers.get_mut(node_id) {
            entry.state = PeerState::Disconnected;
        }
    }

    /// Snapshot of a specific peer.
    pub fn get_peer(&self, node_id: &str) -> Option<PeerEntry> {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        peers.get(node_id).cloned()
    }

    pub fn connected_peers(&self) -> Vec<PeerEntry> {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        peers
            .values()
            .filter(|p| p.state == PeerState::Connected)
            .cloned()
            .collect()
    }

    /// Replace the advertised capability list for a peer.
    pub fn update_capabilities(&self, node_id: &str, capabilities: Vec<String>) {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = peers.get_mut(node_id) {
            entry.capabilities = capabilities;
        }
    }

    /// Node ids of connected peers advertising exactly `capability`, sorted.
    pub fn find_peers(&self, capability: &str) -> Vec<String> {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        let mut found: Vec<String> = peers
            .values()
            .filter(|p| p.state == PeerState::Connected)
            .filter(|p| p.capabilities.iter().any(|c| c == capability))
            .map(|p| p.node_id.clone())
            .collect();
        found.sort();
        found
    }

    pub fn connected_count(&self) -> usize {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        peers
            .values()
            .filter(|p| p.state == PeerState::Connected)
            .count()
    }

    /// Total number of peers (including disconnected).
    pub fn total_count(&self) -> usize {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        peers.len()
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_peer(node_id: &str, capabilities: &[&str]) -> PeerEntry {
        PeerEntry {
            node_id: node_id.to_string(),
            address: "127.0.0.1:9000".parse().unwrap(),
            capabilities: capabilities.iter().map(|s| s.to_string()).collect(),
            state: PeerState::Connected,
            connected_at: Utc::now(),
            protocol_version: 1,
        }
    }

    #[test]
    fn test_add_and_get_peer() {
        let registry = PeerRegistry::new();
        registry.add_peer(make_peer("node-1", &["echo"]));

        let retrieved = registry.get_peer("node-1").unwrap();
        assert_eq!(retrieved.node_id, "node-1");
        assert_eq!(retrieved.capabilities, vec!["echo".to_string()]);
    }

    #[test]
    fn test_disconnect_then_rehandshake() {
        let registry = PeerRegistry::new();
        registry.add_peer(make_peer("node-1", &[]));
        assert_eq!(registry.connected_count(), 1);

        registry.mark_disconnected("node-1");
        assert_eq!(registry.connected_count(), 0);
        assert_eq!(registry.total_count(), 1);

        // A fresh handshake replaces the stale entry.
        registry.add_peer(make_peer("node-1", &["echo"]));
        assert_eq!(registry.connected_count(), 1);
        assert_eq!(registry.total_count(), 1);
    }

    #[test]
    fn test_find_peers_exact_match() {
        let registry = PeerRegistry::new();
        registry.add_peer(make_peer("node-2", &["echo", "sum"]));
        registry.add_peer(make_peer("node-1", &["echo"]));
        registry.add_peer(make_peer("node-3", &["echo-v2"]));

        assert_eq!(registry.find_peers("echo"), vec!["node-1", "node-2"]);
        assert_eq!(registry.find_peers("sum"), vec!["node-2"]);
        assert!(registry.find_peers("ech").is_empty());
    }

    #[test]
    fn test_find_peers_skips_disconnected() {
        let registry = PeerRegistry::new();
        registry.add_peer(make_peer("node-1", &["echo"]));
        registry.mark_disconnected("node-1");
        assert!(registry.find_peers("echo").is_empty());
    }

    #[test]
    fn test_update_capabilities() {
        let registry = PeerRegistry::new();
        registry.add_peer(make_peer("node-1", &[]));
        registry.update_capabilities("node-1", vec!["sum".to_string()]);
        assert_eq!(registry.find_peers("sum"), vec!["node-1"]);
    }
}
