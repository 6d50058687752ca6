//! PeerTransport: TCP [`Transport`] with HMAC-authenticated handshakes.
//!
//! A [`PeerTransport`] binds a local TCP listener and accepts connections from
//! other agents. Every connection starts with a handshake in which both sides
//! prove knowledge of the pre-shared secret and exchange their node id, listen
//! address and advertised capabilities. Only then are `Deliver` frames accepted.
//!
//! Sends are connection-per-message: open, authenticate, write one `Deliver`
//! frame, close. The peer's node id is the agent's public key hex, so the
//! orchestrator can address peers by the same string it signs envelopes with.

use crate::message::*;
use crate::registry::{PeerEntry, PeerRegistry, PeerState};
use crate::transport::{InboundHandler, Transport, TransportError};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Maximum single frame size (16 MB).
pub const MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;

/// How long an outbound TCP connect may take.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long an inbound connection may take to present its handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// HMAC-SHA256 over `data`, hex-encoded.
fn hmac_sign(secret: &str, data: &[u8]) -> Result<String, TransportError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| TransportError::HandshakeFailed(format!("Invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify an HMAC-SHA256 signature using constant-time comparison.
fn hmac_verify(secret: &str, data: &[u8], signature: &str) -> bool {
    match hmac_sign(secret, data) {
        Ok(expected) => {
            subtle::ConstantTimeEq::ct_eq(expected.as_bytes(), signature.as_bytes()).into()
        }
        Err(_) => false,
    }
}

/// Configuration for a [`PeerTransport`].
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Address to bind the listener on.
    pub listen_addr: SocketAddr,
    /// This node's id. Agents use their public key hex.
    pub node_id: String,
    /// Pre-shared key for HMAC-SHA256 authentication. Must not be empty.
    pub shared_secret: String,
}

impl PeerConfig {
    pub fn new(
        listen_addr: SocketAddr,
        node_id: impl Into<String>,
        shared_secret: impl Into<String>,
    ) -> Self {
        Self {
            listen_addr,
            node_id: node_id.into(),
            shared_secret: shared_secret.into(),
        }
    }
}

/// State shared between the transport handle and its background tasks.
struct PeerShared {
    config: PeerConfig,
    registry: PeerRegistry,
    handler: RwLock<Option<Arc<dyn InboundHandler>>>,
    capabilities: RwLock<Vec<String>>,
    /// Actual bound address (differs from config when binding to port 0).
    local_addr: RwLock<Option<SocketAddr>>,
    running: AtomicBool,
}

impl PeerShared {
    fn current_handler(&self) -> Option<Arc<dyn InboundHandler>> {
        self.handler.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn current_capabilities(&self) -> Vec<String> {
        self.capabilities
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn advertised_addr(&self) -> String {
        self.local_addr
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .unwrap_or(self.config.listen_addr)
            .to_string()
    }

    /// Build our side of a handshake with a fresh nonce.
    fn handshake_info(&self) -> Result<HandshakeInfo, TransportError> {
        let nonce = uuid::Uuid::new_v4().to_string();
        let auth_data = format!("{}{}", nonce, self.config.node_id);
        let auth_hmac = hmac_sign(&self.config.shared_secret, auth_data.as_bytes())?;
        Ok(HandshakeInfo {
            node_id: self.config.node_id.clone(),
            listen_addr: self.advertised_addr(),
            protocol_version: PROTOCOL_VERSION,
            capabilities: self.current_capabilities(),
            nonce,
            auth_hmac,
        })
    }

    fn verify_handshake(&self, info: &HandshakeInfo) -> bool {
        let expected_data = format!("{}{}", info.nonce, info.node_id);
        hmac_verify(
            &self.config.shared_secret,
            expected_data.as_bytes(),
            &info.auth_hmac,
        )
    }

    fn register(&self, info: &HandshakeInfo, fallback: SocketAddr) {
        let address = info.listen_addr.parse().unwrap_or(fallback);
        self.registry.add_peer(PeerEntry {
            node_id: info.node_id.clone(),
            address,
            capabilities: info.capabilities.clone(),
            state: PeerState::Connected,
            connected_at: chrono::Utc::now(),
            protocol_version: info.protocol_version,
        });
    }

    /// Connect to `addr` and complete the client side of the handshake.
    async fn open_authenticated(
        &self,
        addr: SocketAddr,
    ) -> Result<(OwnedReadHalf, OwnedWriteHalf, HandshakeInfo), TransportError> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::Unreachable(format!("connect to {addr} timed out")))??;
        let (mut reader, mut writer) = stream.into_split();

        write_frame(&mut writer, &PeerFrame::Handshake(self.handshake_info()?)).await?;

        match read_frame(&mut reader).await? {
            PeerFrame::HandshakeAck(info) => {
                if info.protocol_version != PROTOCOL_VERSION {
                    return Err(TransportError::VersionMismatch {
                        local: PROTOCOL_VERSION,
                        remote: info.protocol_version,
                    });
                }
                if !self.verify_handshake(&info) {
                    return Err(TransportError::HandshakeFailed(
                        "HMAC verification failed on HandshakeAck".into(),
                    ));
                }
                Ok((reader, writer, info))
            }
            PeerFrame::Error { code, message } => Err(TransportError::HandshakeFailed(format!(
                "Remote error {code}: {message}"
            ))),
            _ => Err(TransportError::HandshakeFailed(
                "Unexpected response to handshake".to_string(),
            )),
        }
    }

    /// Deliver one frame to a registered peer over a fresh authenticated connection.
    async fn send_frame(&self, node_id: &str, frame: &PeerFrame) -> Result<(), TransportError> {
        let peer = self
            .registry
            .get_peer(node_id)
            .filter(|p| p.state == PeerState::Connected)
            .ok_or_else(|| TransportError::Unreachable(node_id.to_string()))?;

        let (_reader, mut writer, info) = match self.open_authenticated(peer.address).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(peer = %node_id, address = %peer.address, error = %e, "Peer delivery failed");
                self.registry.mark_disconnected(node_id);
                return Err(match e {
                    TransportError::Io(_) | TransportError::ConnectionClosed => {
                        TransportError::Unreachable(node_id.to_string())
                    }
                    other => other,
                });
            }
        };
        if info.node_id != node_id {
            return Err(TransportError::HandshakeFailed(format!(
                "Expected node {node_id}, reached {}",
                info.node_id
            )));
        }
        self.registry
            .update_capabilities(node_id, info.capabilities.clone());

        write_frame(&mut writer, frame).await?;
        writer.shutdown().await?;
        Ok(())
    }

    /// Send a frame to every connected peer, collecting failures.
    async fn broadcast(&self, frame: &PeerFrame) -> Vec<(String, TransportError)> {
        let mut errors = Vec::new();
        for peer in self.registry.connected_peers() {
            if let Err(e) = self.send_frame(&peer.node_id, frame).await {
                errors.push((peer.node_id, e));
            }
        }
        errors
    }
}

/// The TCP transport.
pub struct PeerTransport {
    shared: Arc<PeerShared>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl PeerTransport {
    pub fn new(config: PeerConfig) -> Self {
        Self::with_registry(config, PeerRegistry::new())
    }

    /// Use an existing registry, e.g. one pre-seeded or shared with diagnostics.
    pub fn with_registry(config: PeerConfig, registry: PeerRegistry) -> Self {
        Self {
            shared: Arc::new(PeerShared {
                config,
                registry,
                handler: RwLock::new(None),
                capabilities: RwLock::new(Vec::new()),
                local_addr: RwLock::new(None),
                running: AtomicBool::new(false),
            }),
            accept_task: Mutex::new(None),
        }
    }

    /// The bound listen address once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self
            .shared
            .local_addr
            .read()
            .unwrap_or_else(|e| e.into_inner())
    }

    pub fn node_id(&self) -> &str {
        &self.shared.config.node_id
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.shared.registry
    }

    /// Handshake with the node listening at `addr` and register it.
    ///
    /// The remote side registers us in turn, so after this either node can
    /// `send` to the other. Returns the remote node id.
    pub async fn connect(&self, addr: SocketAddr) -> Result<String, TransportError> {
        if !self.shared.running.load(Ordering::SeqCst) {
            return Err(TransportError::Stopped);
        }
        info!(address = %addr, "Connecting to peer");
        let (_reader, mut writer, info) = self.shared.open_authenticated(addr).await?;
        self.shared.register(&info, addr);
        info!(
            peer = %info.node_id,
            address = %info.listen_addr,
            capabilities = info.capabilities.len(),
            "Handshake complete"
        );
        let _ = writer.shutdown().await;
        Ok(info.node_id)
    }

    /// Internal accept loop: runs in a spawned task.
    async fn accept_loop(listener: TcpListener, shared: Arc<PeerShared>) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(from = %addr, "Accepted connection");
                    let shared = Arc::clone(&shared);
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_inbound(stream, addr, &shared).await {
                            debug!(from = %addr, error = %e, "Inbound connection ended");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Accept error");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    /// Handle a single inbound connection: handshake, then the frame loop.
    async fn handle_inbound(
        stream: TcpStream,
        addr: SocketAddr,
        shared: &PeerShared,
    ) -> Result<(), TransportError> {
        let (mut reader, mut writer) = stream.into_split();

        let first = tokio::time::timeout(HANDSHAKE_TIMEOUT, read_frame(&mut reader))
            .await
            .map_err(|_| TransportError::HandshakeFailed("Handshake timed out".into()))??;

        let peer_node_id = match first {
            PeerFrame::Handshake(info) => {
                if info.protocol_version != PROTOCOL_VERSION {
                    let err = PeerFrame::Error {
                        code: 1,
                        message: format!(
                            "Protocol version mismatch: expected {}, got {}",
                            PROTOCOL_VERSION, info.protocol_version
                        ),
                    };
                    write_frame(&mut writer, &err).await?;
                    return Err(TransportError::VersionMismatch {
                        local: PROTOCOL_VERSION,
                        remote: info.protocol_version,
                    });
                }

                if !shared.verify_handshake(&info) {
                    let err = PeerFrame::Error {
                        code: 403,
                        message: "HMAC authentication failed".to_string(),
                    };
                    write_frame(&mut writer, &err).await?;
                    return Err(TransportError::HandshakeFailed(
                        "HMAC verification failed on incoming Handshake".into(),
                    ));
                }

                // Registered before the ack so the caller can reply as soon as it returns.
                shared.register(&info, addr);
                write_frame(&mut writer, &PeerFrame::HandshakeAck(shared.handshake_info()?))
                    .await?;

                debug!(
                    peer = %info.node_id,
                    from = %addr,
                    listen = %info.listen_addr,
                    "Inbound handshake"
                );
                info.node_id
            }
            // Nothing but a handshake is accepted before authentication.
            _ => {
                warn!(from = %addr, "Rejected unauthenticated frame, handshake required");
                let err = PeerFrame::Error {
                    code: 401,
                    message: "Authentication required: complete HMAC handshake first".to_string(),
                };
                write_frame(&mut writer, &err).await?;
                return Err(TransportError::HandshakeFailed(
                    "Rejected unauthenticated frame".into(),
                ));
            }
        };

        connection_loop(&mut reader, &peer_node_id, shared).await
    }
}

/// Frame loop for an authenticated connection.
async fn connection_loop(
    reader: &mut OwnedReadHalf,
    peer_node_id: &str,
    shared: &PeerShared,
) -> Result<(), TransportError> {
    loop {
        let frame = match read_frame(reader).await {
            Ok(f) => f,
            Err(TransportError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        match frame {
            PeerFrame::Deliver { payload } => {
                let bytes = match hex::decode(&payload) {
                    Ok(b) => b,
                    Err(e) => {
                        warn!(peer = %peer_node_id, error = %e, "Dropping undecodable payload");
                        continue;
                    }
                };
                match shared.current_handler() {
                    Some(handler) => handler.handle_message(peer_node_id, bytes).await,
                    None => debug!(peer = %peer_node_id, "No handler installed, dropping payload"),
                }
            }
            PeerFrame::Advertise { capabilities } => {
                debug!(peer = %peer_node_id, count = capabilities.len(), "Peer advertised capabilities");
                shared
                    .registry
                    .update_capabilities(peer_node_id, capabilities);
            }
            PeerFrame::ShuttingDown => {
                info!(peer = %peer_node_id, "Peer is shutting down");
                shared.registry.mark_disconnected(peer_node_id);
            }
            other => {
                warn!(peer = %peer_node_id, frame = ?other, "Unexpected frame after handshake");
            }
        }
    }
}

#[async_trait]
impl Transport for PeerTransport {
    async fn start(&self) -> Result<(), TransportError> {
        if self.shared.config.shared_secret.is_empty() {
            return Err(TransportError::HandshakeFailed(
                "TCP transport requires a shared secret. Set [network] shared_secret in config.toml"
                    .into(),
            ));
        }
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let listener = match TcpListener::bind(self.shared.config.listen_addr).await {
            Ok(l) => l,
            Err(e) => {
                self.shared.running.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };
        let local_addr = listener.local_addr()?;
        *self
            .shared
            .local_addr
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(local_addr);

        info!(
            address = %local_addr,
            node_id = %self.shared.config.node_id,
            "Peer transport listening"
        );

        let task = tokio::spawn(Self::accept_loop(listener, Arc::clone(&self.shared)));
        *self.accept_task.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        for (peer, e) in self.shared.broadcast(&PeerFrame::ShuttingDown).await {
            debug!(peer = %peer, error = %e, "Shutdown notice not delivered");
        }
        if let Some(task) = self
            .accept_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
        *self
            .shared
            .handler
            .write()
            .unwrap_or_else(|e| e.into_inner()) = None;

        info!(node_id = %self.shared.config.node_id, "Peer transport stopped");
        Ok(())
    }

    async fn send(&self, peer: &str, bytes: Vec<u8>) -> Result<(), TransportError> {
        if !self.shared.running.load(Ordering::SeqCst) {
            return Err(TransportError::Stopped);
        }
        let frame = PeerFrame::Deliver {
            payload: hex::encode(&bytes),
        };
        self.shared.send_frame(peer, &frame).await
    }

    fn set_handler(&self, handler: Arc<dyn InboundHandler>) {
        *self
            .shared
            .handler
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(handler);
    }

    async fn advertise(&self, capabilities: Vec<String>) -> Result<(), TransportError> {
        *self
            .shared
            .capabilities
            .write()
            .unwrap_or_else(|e| e.into_inner()) = capabilities.clone();
        if self.shared.running.load(Ordering::SeqCst) {
            let frame = PeerFrame::Advertise { capabilities };
            for (peer, e) in self.shared.broadcast(&frame).await {
                debug!(peer = %peer, error = %e, "Advertisement not delivered");
            }
        }
        Ok(())
    }

    async fn discover(&self, capability: &str) -> Result<Vec<String>, TransportError> {
        Ok(self
            .shared
            .registry
            .find_peers(capability)
            .into_iter()
            .filter(|id| id != &self.shared.config.node_id)
            .collect())
    }

    fn peer_address(&self) -> String {
        self.shared.config.node_id.clone()
    }
}

impl Drop for PeerTransport {
    fn drop(&mut self) {
        if let Some(task) = self
            .accept_task
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
    }
}

/// Write a framed message (4-byte length + JSON) to a TCP stream.
pub async fn write_frame(
    writer: &mut OwnedWriteHalf,
    frame: &PeerFrame,
) -> Result<(), TransportError> {
    let bytes = encode_frame(frame)?;
    if bytes.len() - 4 > MAX_MESSAGE_SIZE as usize {
        return Err(TransportError::MessageTooLarge {
            size: (bytes.len() - 4) as u32,
            max: MAX_MESSAGE_SIZE,
        });
    }
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a framed message (4-byte length + JSON) from a TCP stream.
pub async fn read_frame(reader: &mut OwnedReadHalf) -> Result<PeerFrame, TransportError> {
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(TransportError::ConnectionClosed);
        }
        Err(e) => return Err(TransportError::Io(e)),
    }

    let len = decode_length(&header);
    if len > MAX_MESSAGE_SIZE {
        return Err(TransportError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;

    Ok(decode_frame(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    const SECRET: &str = "test-secret-for-unit-tests";

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

    async fn start_node(node_id: &str, secret: &str) -> PeerTransport {
        let config = PeerConfig::new("127.0.0.1:0".parse().unwrap(), node_id, secret);
        let node = PeerTransport::new(config);
        node.start().await.unwrap();
        node
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<(String, Vec<u8>)>) -> (String, Vec<u8>) {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for delivery")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_connect_and_deliver_both_ways() {
        let node_a = start_node("node-a", SECRET).await;
        let node_b = start_node("node-b", SECRET).await;
        let (handler_a, mut rx_a) = collector();
        let (handler_b, mut rx_b) = collector();
        node_a.set_handler(handler_a);
        node_b.set_handler(handler_b);

        let remote = node_a.connect(node_b.local_addr().unwrap()).await.unwrap();
        assert_eq!(remote, "node-b");
        assert_eq!(node_a.registry().connected_count(), 1);

        node_a.send("node-b", b"ping".to_vec()).await.unwrap();
        let (from, bytes) = recv(&mut rx_b).await;
        assert_eq!(from, "node-a");
        assert_eq!(bytes, b"ping");

        // node-b learned node-a's listen address from the handshake.
        node_b.send("node-a", b"pong".to_vec()).await.unwrap();
        let (from, bytes) = recv(&mut rx_a).await;
        assert_eq!(from, "node-b");
        assert_eq!(bytes, b"pong");
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let node_a = start_node("node-a", SECRET).await;
        let node_b = start_node("node-b", "some-other-secret").await;

        let err = node_a
            .connect(node_b.local_addr().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::HandshakeFailed(_)), "got {err:?}");
        assert_eq!(node_a.registry().total_count(), 0);
    }

    #[tokio::test]
    async fn test_send_to_unknown_peer_is_unreachable() {
        let node = start_node("node-a", SECRET).await;
        match node.send("ghost", vec![1]).await {
            Err(TransportError::Unreachable(peer)) => assert_eq!(peer, "ghost"),
            other => panic!("Expected Unreachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_requires_shared_secret() {
        let config = PeerConfig::new("127.0.0.1:0".parse().unwrap(), "node-a", "");
        let node = PeerTransport::new(config);
        assert!(matches!(
            node.start().await,
            Err(TransportError::HandshakeFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_capabilities_travel_in_handshake_and_advertise() {
        let node_a = start_node("node-a", SECRET).await;
        let node_b = start_node("node-b", SECRET).await;
        node_b.advertise(vec!["echo".to_string()]).await.unwrap();

        node_a.connect(node_b.local_addr().unwrap()).await.unwrap();
        assert_eq!(node_a.discover("echo").await.unwrap(), vec!["node-b"]);

        node_a.advertise(vec!["sum".to_string()]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(node_b.discover("sum").await.unwrap(), vec!["node-a"]);
        assert!(node_b.discover("echo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unauthenticated_deliver_rejected() {
        let node = start_node("server", SECRET).await;
        let stream = TcpStream::connect(node.local_addr().unwrap()).await.unwrap();
        let (mut reader, mut writer) = stream.into_split();

        let frame = PeerFrame::Deliver {
            payload: hex::encode(b"{}"),
        };
        write_frame(&mut writer, &frame).await.unwrap();

        match read_frame(&mut reader).await.unwrap() {
            PeerFrame::Error { code, message } => {
                assert_eq!(code, 401);
                assert!(message.contains("handshake"), "got: {message}");
            }
            other => panic!("Expected Error(401), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stop_notifies_peers() {
        let node_a = start_node("node-a", SECRET).await;
        let node_b = start_node("node-b", SECRET).await;
        node_a.connect(node_b.local_addr().unwrap()).await.unwrap();

        node_b.stop().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(node_a.registry().connected_count(), 0);
        assert!(matches!(
            node_a.send("node-b", vec![1]).await,
            Err(TransportError::Unreachable(_))
        ));
        assert!(matches!(
            node_b.send("node-a", vec![1]).await,
            Err(TransportError::Stopped)
        ));
    }
}
