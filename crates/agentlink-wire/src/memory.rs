//! In-process transport over a shared, injectable directory.
//!
//! Every [`MemoryTransport`] is handed a [`MemoryDirectory`] at construction.
//! Transports that share a directory can reach and discover each other; those
//! that don't are fully isolated, so tests can run in parallel without any
//! process-wide state.
//!
//! Each started transport owns an unbounded inbox drained by one dispatch task,
//! which hands messages to the installed handler one at a time.

use crate::transport::{InboundHandler, Transport, TransportError};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A message sitting in a transport's inbox.
#[derive(Debug)]
struct Inbound {
    from: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
struct DirectoryEntry {
    inbox: mpsc::UnboundedSender<Inbound>,
    capabilities: Vec<String>,
}

/// Shared lookup table of running in-memory transports.
///
/// Cloning yields another handle to the same directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    peers: Arc<RwLock<HashMap<String, DirectoryEntry>>>,
}

impl MemoryDirectory {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, address: &str, inbox: mpsc::UnboundedSender<Inbound>, capabilities: Vec<String>) {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        peers.insert(
            address.to_string(),
            DirectoryEntry {
                inbox,
                capabilities,
            },
        );
    }

    fn deregister(&self, address: &str) {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        peers.remove(address);
    }

    fn inbox(&self, address: &str) -> Option<mpsc::UnboundedSender<Inbound>> {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        peers.get(address).map(|entry| entry.inbox.clone())
    }

    fn set_capabilities(&self, address: &str, capabilities: Vec<String>) {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = peers.get_mut(address) {
            entry.capabilities = capabilities;
        }
    }

    /// Addresses advertising exactly `capability`, sorted.
    pub fn find(&self, capability: &str) -> Vec<String> {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        let mut found: Vec<String> = peers
            .iter()
            .filter(|(_, entry)| entry.capabilities.iter().any(|c| c == capability))
            .map(|(address, _)| address.clone())
            .collect();
        found.sort();
        found
    }

    /// Whether a running transport is registered under `address`.
    pub fn contains(&self, address: &str) -> bool {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        peers.contains_key(address)
    }

    /// Number of running transports.
    pub fn len(&self) -> usize {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory [`Transport`] bound to one address in a [`MemoryDirectory`].
pub struct MemoryTransport {
    address: String,
    directory: MemoryDirectory,
    handler: Arc<RwLock<Option<Arc<dyn InboundHandler>>>>,
    capabilities: Mutex<Vec<String>>,
    dispatch_task: Mutex<Option<JoinHandle<()>>>,
    running: AtomicBool,
}

impl MemoryTransport {
    pub fn new(directory: MemoryDirectory, address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            directory,
            handler: Arc::new(RwLock::new(None)),
            capabilities: Mutex::new(Vec::new()),
            dispatch_task: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    /// The directory this transport is registered in.
    pub fn directory(&self) -> &MemoryDirectory {
        &self.directory
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn dispatch_loop(
        address: String,
        mut rx: mpsc::UnboundedReceiver<Inbound>,
        handler: Arc<RwLock<Option<Arc<dyn InboundHandler>>>>,
    ) {
        while let Some(msg) = rx.recv().await {
            let current = handler.read().unwrap_or_else(|e| e.into_inner()).clone();
            match current {
                Some(h) => h.handle_message(&msg.from, msg.bytes).await,
                None => debug!(address = %address, from = %msg.from, "No handler installed, dropping message"),
            }
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn start(&self) -> Result<(), TransportError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let capabilities = self
            .capabilities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        self.directory.register(&self.address, tx, capabilities);

        let task = tokio::spawn(Self::dispatch_loop(
            self.address.clone(),
            rx,
            Arc::clone(&self.handler),
        ));
        *self.dispatch_task.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);

        info!(address = %self.address, "Memory transport started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.directory.deregister(&self.address);
        if let Some(task) = self
            .dispatch_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
        *self.handler.write().unwrap_or_else(|e| e.into_inner()) = None;

        info!(address = %self.address, "Memory transport stopped");
        Ok(())
    }

    async fn send(&self, peer: &str, bytes: Vec<u8>) -> Result<(), TransportError> {
        if !self.is_running() {
            return Err(TransportError::Stopped);
        }
        let inbox = self
            .directory
            .inbox(peer)
            .ok_or_else(|| TransportError::Unreachable(peer.to_string()))?;
        inbox
            .send(Inbound {
                from: self.address.clone(),
                bytes,
            })
            .map_err(|_| TransportError::Unreachable(peer.to_string()))
    }

    fn set_handler(&self, handler: Arc<dyn InboundHandler>) {
        *self.handler.write().unwrap_or_else(|e| e.into_inner()) = Some(handler);
    }

    async fn advertise(&self, capabilities: Vec<String>) -> Result<(), TransportError> {
        *self.capabilities.lock().unwrap_or_else(|e| e.into_inner()) = capabilities.clone();
        if self.is_running() {
            self.directory.set_capabilities(&self.address, capabilities);
        }
        Ok(())
    }

    async fn discover(&self, capability: &str) -> Result<Vec<String>, TransportError> {
        Ok(self
            .directory
            .find(capability)
            .into_iter()
            .filter(|address| address != &self.address)
            .collect())
    }

    fn peer_address(&self) -> String {
        self.address.clone()
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            self.directory.deregister(&self.address);
        }
        if let Some(task) = self
            .dispatch_task
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Forwards every inbound message into a channel.
    struct Collector {
        tx: mpsc::UnboundedSender<(String, Vec<u8>)>,
    }

    #[async_trait]
    impl InboundHandler for Collector {
        async fn handle_message(&self, from: &str, bytes: Vec<u8>) {
            let _ = self.tx.send((from.to_string(), bytes));
        }
    }

    fn collector() -> (Arc<Collector>, mpsc::UnboundedReceiver<(String, Vec<u8>)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Collector { tx }), rx)
    }

    #[tokio::test]
    async fn test_send_between_transports() {
        let directory = MemoryDirectory::new();
        let a = MemoryTransport::new(directory.clone(), "a");
        let b = MemoryTransport::new(directory.clone(), "b");
        let (handler, mut rx) = collector();
        b.set_handler(handler);
        a.start().await.unwrap();
        b.start().await.unwrap();

        a.send("b", b"hello".to_vec()).await.unwrap();
        let (from, bytes) = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(from, "a");
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn test_send_to_unknown_peer_fails() {
        let a = MemoryTransport::new(MemoryDirectory::new(), "a");
        a.start().await.unwrap();
        match a.send("nobody", vec![1]).await {
            Err(TransportError::Unreachable(peer)) => assert_eq!(peer, "nobody"),
            other => panic!("Expected Unreachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stopped_transport_cannot_send_or_receive() {
        let directory = MemoryDirectory::new();
        let a = MemoryTransport::new(directory.clone(), "a");
        let b = MemoryTransport::new(directory.clone(), "b");
        a.start().await.unwrap();
        b.start().await.unwrap();

        a.stop().await.unwrap();
        assert!(matches!(
            a.send("b", vec![1]).await,
            Err(TransportError::Stopped)
        ));
        assert!(matches!(
            b.send("a", vec![1]).await,
            Err(TransportError::Unreachable(_))
        ));
        assert!(!directory.contains("a"));
    }

    #[tokio::test]
    async fn test_advertise_and_discover() {
        let directory = MemoryDirectory::new();
        let a = MemoryTransport::new(directory.clone(), "a");
        let b = MemoryTransport::new(directory.clone(), "b");
        a.start().await.unwrap();
        b.advertise(vec!["echo".to_string()]).await.unwrap();
        b.start().await.unwrap();
        a.advertise(vec!["echo".to_string(), "sum".to_string()])
            .await
            .unwrap();

        assert_eq!(a.discover("echo").await.unwrap(), vec!["b".to_string()]);
        assert_eq!(b.discover("echo").await.unwrap(), vec!["a".to_string()]);
        assert_eq!(b.discover("sum").await.unwrap(), vec!["a".to_string()]);
        assert!(a.discover("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_directories_are_isolated() {
        let a = MemoryTransport::new(MemoryDirectory::new(), "a");
        let b = MemoryTransport::new(MemoryDirectory::new(), "b");
        a.start().await.unwrap();
        b.advertise(vec!["echo".to_string()]).await.unwrap();
        b.start().await.unwrap();

        assert!(a.discover("echo").await.unwrap().is_empty());
        assert!(a.send("b", vec![1]).await.is_err());
    }

    #[tokio::test]
    async fn test_messages_delivered_in_order() {
        let directory = MemoryDirectory::new();
        let a = MemoryTransport::new(directory.clone(), "a");
        let b = MemoryTransport::new(directory.clone(), "b");
        let (handler, mut rx) = collector();
        b.set_handler(handler);
        a.start().await.unwrap();
        b.start().await.unwrap();

        for i in 0..10u8 {
            a.send("b", vec![i]).await.unwrap();
        }
        for i in 0..10u8 {
            let (_, bytes) = rx.recv().await.unwrap();
            assert_eq!(bytes, vec![i]);
        }
    }
}
