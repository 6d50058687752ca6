//! The agent orchestrator.
//!
//! An [`Agent`] ties an identity, an optional delegation certificate, a
//! capability registry and a [`Transport`] together:
//!
//! - **Outbound**: `request` signs a [`TaskEnvelope`], parks a pending entry
//!   keyed by task id with its own deadline timer, and sends the envelope.
//!   The entry is resolved by the matching result, the timer, a send failure
//!   or `stop`, whichever removes it from the table first.
//! - **Inbound**: every message is decoded as a [`WireMessage`]. Tasks are
//!   verified, validated and executed on their own tokio task, and always
//!   answered with a signed [`TaskResult`]. Results settle pending entries.
//!   Certificates are verified and cached per sending peer.

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::registry::{CapabilityHandler, CapabilityRegistry};
use crate::schema::validate_payload;

use agentlink_types::delegation::{is_fleet_sibling, verify_certificate};
use agentlink_types::envelope::{
    create_task_envelope, create_task_result, verify_task_envelope, verify_task_result,
};
use agentlink_types::identity::is_public_key_hex;
use agentlink_types::{
    CapabilityDefinition, DelegationCertificate, Keypair, TaskEnvelope, TaskOutcome, TaskResult,
};
use agentlink_wire::{InboundHandler, Transport, WireMessage};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const STATE_NEW: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_STOPPED: u8 = 2;

/// An outbound request awaiting its result.
struct PendingRequest {
    peer: String,
    tx: oneshot::Sender<AgentResult<TaskResult>>,
    /// Set right after insertion; the timer may already have fired by then.
    timer: Option<JoinHandle<()>>,
}

struct AgentInner {
    identity: Keypair,
    certificate: RwLock<Option<DelegationCertificate>>,
    transport: Arc<dyn Transport>,
    registry: CapabilityRegistry,
    pending: DashMap<String, PendingRequest>,
    peer_certificates: DashMap<String, DelegationCertificate>,
    request_timeout: Duration,
    state: AtomicU8,
}

/// A running agent. Cloning yields another handle to the same agent.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

impl Agent {
    pub fn new(identity: Keypair, transport: Arc<dyn Transport>, config: &AgentConfig) -> Self {
        Self {
            inner: Arc::new(AgentInner {
                identity,
                certificate: RwLock::new(None),
                transport,
                registry: CapabilityRegistry::new(),
                pending: DashMap::new(),
                peer_certificates: DashMap::new(),
                request_timeout: config.request_timeout(),
                state: AtomicU8::new(STATE_NEW),
            }),
        }
    }

    /// Attach the delegation certificate this agent acts under.
    pub fn with_certificate(self, certificate: DelegationCertificate) -> Self {
        self.set_certificate(certificate);
        self
    }

    /// Replace the local certificate, e.g. after renewal.
    pub fn set_certificate(&self, certificate: DelegationCertificate) {
        *self
            .inner
            .certificate
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(certificate);
    }

    pub fn certificate(&self) -> Option<DelegationCertificate> {
        self.inner.local_certificate()
    }

    /// This agent's transport address.
    pub fn address(&self) -> String {
        self.inner.transport.peer_address()
    }

    pub fn public_key_hex(&self) -> String {
        self.inner.identity.public_key_hex()
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.inner.registry
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.load(Ordering::SeqCst) == STATE_RUNNING
    }

    /// Number of outbound requests still awaiting a result.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Install the inbound handler, start the transport and advertise capabilities.
    ///
    /// A stopped agent cannot be restarted.
    pub async fn start(&self) -> AgentResult<()> {
        match self.inner.state.load(Ordering::SeqCst) {
            STATE_RUNNING => return Ok(()),
            STATE_STOPPED => return Err(AgentError::Stopped),
            _ => {}
        }

        let dispatcher = Arc::new(Dispatcher {
            agent: Arc::downgrade(&self.inner),
        });
        self.inner.transport.set_handler(dispatcher);
        self.inner.transport.start().await?;
        if self
            .inner
            .state
            .compare_exchange(STATE_NEW, STATE_RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }
        self.inner
            .transport
            .advertise(self.inner.registry.names())
            .await?;

        info!(
            address = %self.address(),
            capabilities = self.inner.registry.len(),
            "Agent started"
        );
        Ok(())
    }

    /// Fail every pending request with [`AgentError::Stopped`], then stop the transport.
    pub async fn stop(&self) -> AgentResult<()> {
        let previous = self.inner.state.swap(STATE_STOPPED, Ordering::SeqCst);
        if previous != STATE_RUNNING {
            return Ok(());
        }

        let task_ids: Vec<String> = self
            .inner
            .pending
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let mut failed = 0usize;
        for task_id in task_ids {
            if self.inner.settle(&task_id, Err(AgentError::Stopped)) {
                failed += 1;
            }
        }

        self.inner.transport.stop().await?;
        info!(address = %self.address(), failed_requests = failed, "Agent stopped");
        Ok(())
    }

    /// Register a capability. If the agent is running the new list is re-advertised.
    pub async fn register_capability(
        &self,
        definition: CapabilityDefinition,
        handler: CapabilityHandler,
    ) -> AgentResult<()> {
        self.inner.registry.register(definition, handler);
        if self.is_running() {
            self.inner
                .transport
                .advertise(self.inner.registry.names())
                .await?;
        }
        Ok(())
    }

    /// Sign a task for `capability` and send it to `peer`, awaiting the verified result.
    ///
    /// A result carrying an error outcome (unknown capability, handler failure...)
    /// is still a successful, verified response and is returned as `Ok`.
    pub async fn request(
        &self,
        peer: &str,
        capability: &str,
        payload: Value,
    ) -> AgentResult<TaskResult> {
        let envelope = create_task_envelope(&self.inner.identity, peer, capability, payload)?;
        self.send_raw_envelope(peer, envelope).await
    }

    /// Send an already-built envelope and await its result under the usual
    /// pending discipline. The envelope is sent exactly as given.
    pub async fn send_raw_envelope(
        &self,
        peer: &str,
        envelope: TaskEnvelope,
    ) -> AgentResult<TaskResult> {
        match self.inner.state.load(Ordering::SeqCst) {
            STATE_NEW => return Err(AgentError::NotStarted),
            STATE_STOPPED => return Err(AgentError::Stopped),
            _ => {}
        }

        let task_id = envelope.task_id.clone();
        let capability = envelope.capability.clone();
        let bytes = WireMessage::Task { envelope }.to_bytes()?;
        let rx = self.inner.register_pending(&task_id, peer)?;

        // stop() may have drained the table between the state check and insertion.
        if !self.is_running() {
            self.inner.settle(&task_id, Err(AgentError::Stopped));
        } else {
            debug!(task_id = %task_id, peer = %peer, capability = %capability, "Sending task");
            if let Err(e) = self.inner.transport.send(peer, bytes).await {
                warn!(task_id = %task_id, peer = %peer, error = %e, "Task send failed");
                self.inner.settle(&task_id, Err(e.into()));
            }
        }

        rx.await.unwrap_or(Err(AgentError::Stopped))
    }

    /// Addresses of other peers advertising `capability`.
    pub async fn discover(&self, capability: &str) -> AgentResult<Vec<String>> {
        let own = self.address();
        let peers = self.inner.transport.discover(capability).await?;
        Ok(peers.into_iter().filter(|p| p != &own).collect())
    }

    /// Send the local certificate to `peer`. Returns false if there is none.
    pub async fn announce_certificate(&self, peer: &str) -> AgentResult<bool> {
        if !self.is_running() {
            return Err(AgentError::NotStarted);
        }
        let Some(cert) = self.inner.local_certificate() else {
            return Ok(false);
        };
        let bytes = WireMessage::Certificate { cert }.to_bytes()?;
        self.inner.transport.send(peer, bytes).await?;
        debug!(peer = %peer, "Certificate announced");
        Ok(true)
    }

    /// Whether `remote` shows an agent of the same owner as this one.
    ///
    /// False when this agent holds no certificate. Both certificates are
    /// re-verified against the current time.
    pub fn check_fleet_sibling(&self, remote: &DelegationCertificate) -> bool {
        match self.inner.local_certificate() {
            Some(local) => is_fleet_sibling(&local, remote),
            None => false,
        }
    }

    /// The verified certificate most recently received from `peer`.
    pub fn peer_certificate(&self, peer: &str) -> Option<DelegationCertificate> {
        self.inner
            .peer_certificates
            .get(peer)
            .map(|c| c.value().clone())
    }

    /// Whether `peer` has announced a certificate that makes it a fleet sibling.
    pub fn is_fleet_peer(&self, peer: &str) -> bool {
        self.peer_certificate(peer)
            .map(|cert| self.check_fleet_sibling(&cert))
            .unwrap_or(false)
    }
}

impl AgentInner {
    fn local_certificate(&self) -> Option<DelegationCertificate> {
        self.certificate
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Insert a pending entry and arm its deadline timer.
    fn register_pending(
        self: &Arc<Self>,
        task_id: &str,
        peer: &str,
    ) -> AgentResult<oneshot::Receiver<AgentResult<TaskResult>>> {
        let (tx, rx) = oneshot::channel();
        match self.pending.entry(task_id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(AgentError::DuplicateTask(task_id.to_string()));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(PendingRequest {
                    peer: peer.to_string(),
                    tx,
                    timer: None,
                });
            }
        }

        let timer = tokio::spawn(deadline_timer(
            Arc::downgrade(self),
            task_id.to_string(),
            self.request_timeout,
        ));
        match self.pending.get_mut(task_id) {
            Some(mut entry) => entry.timer = Some(timer),
            // Already settled; nothing left to time out.
            None => timer.abort(),
        }
        Ok(rx)
    }

    /// Remove a pending entry, cancel its timer and deliver `outcome`.
    ///
    /// Returns false if the entry was already gone.
    fn settle(&self, task_id: &str, outcome: AgentResult<TaskResult>) -> bool {
        let Some((_, pending)) = self.pending.remove(task_id) else {
            return false;
        };
        if let Some(timer) = pending.timer {
            timer.abort();
        }
        // The caller may have given up on the future.
        let _ = pending.tx.send(outcome);
        true
    }

    async fn handle_task(&self, from: &str, envelope: TaskEnvelope) {
        let task_id = envelope.task_id.clone();
        let outcome = self.execute(&envelope).await;
        if let TaskOutcome::Error(ref reason) = outcome {
            debug!(task_id = %task_id, peer = %from, reason = %reason, "Task failed");
        }

        let result = match create_task_result(&self.identity, &task_id, outcome) {
            Ok(r) => r,
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Could not sign task result");
                return;
            }
        };
        let bytes = match (WireMessage::Result { result }).to_bytes() {
            Ok(b) => b,
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Could not encode task result");
                return;
            }
        };
        if let Err(e) = self.transport.send(from, bytes).await {
            warn!(task_id = %task_id, peer = %from, error = %e, "Could not deliver task result");
        }
    }

    /// Verify, look up, validate and run. Every failure becomes an error outcome.
    async fn execute(&self, envelope: &TaskEnvelope) -> TaskOutcome {
        if !verify_task_envelope(envelope) {
            warn!(task_id = %envelope.task_id, from = %envelope.from, "Rejected task with invalid signature");
            return TaskOutcome::Error("invalid signature".to_string());
        }

        let Some(handler) = self.registry.get_handler(&envelope.capability) else {
            return TaskOutcome::Error(format!("unknown capability: {}", envelope.capability));
        };

        if let Some(schema) = self
            .registry
            .get_definition(&envelope.capability)
            .and_then(|d| d.parameter_schema)
        {
            if let Err(violation) = validate_payload(&schema, &envelope.payload) {
                return TaskOutcome::Error(format!("invalid payload: {violation}"));
            }
        }

        debug!(task_id = %envelope.task_id, capability = %envelope.capability, "Executing task");
        match AssertUnwindSafe(handler(envelope.payload.clone()))
            .catch_unwind()
            .await
        {
            Ok(Ok(value)) => TaskOutcome::Result(value),
            Ok(Err(e)) => TaskOutcome::Error(format!("{e:#}")),
            Err(_) => TaskOutcome::Error(format!(
                "capability {} panicked",
                envelope.capability
            )),
        }
    }

    fn handle_result(&self, from: &str, result: TaskResult) {
        // When the request went to a public-key address only that key may answer.
        let expected = self
            .pending
            .get(&result.task_id)
            .map(|entry| entry.peer.clone())
            .filter(|peer| is_public_key_hex(peer));
        if let Some(expected) = expected {
            if result.from != expected {
                warn!(
                    task_id = %result.task_id,
                    peer = %from,
                    signer = %result.from,
                    "Dropping task result from an agent that was not asked"
                );
                return;
            }
        }

        let Some((_, pending)) = self.pending.remove(&result.task_id) else {
            debug!(task_id = %result.task_id, peer = %from, "Dropping unmatched task result");
            return;
        };
        if let Some(timer) = pending.timer {
            timer.abort();
        }

        let outcome = if verify_task_result(&result) {
            debug!(task_id = %result.task_id, peer = %pending.peer, "Task result received");
            Ok(result)
        } else {
            warn!(task_id = %result.task_id, peer = %from, "Task result failed verification");
            Err(AgentError::InvalidSignature)
        };
        let _ = pending.tx.send(outcome);
    }

    fn handle_certificate(&self, from: &str, cert: DelegationCertificate) {
        if verify_certificate(&cert) {
            debug!(peer = %from, owner = %cert.owner, "Cached peer certificate");
            self.peer_certificates.insert(from.to_string(), cert);
        } else {
            debug!(peer = %from, "Discarding unverifiable certificate");
        }
    }
}

/// Fires once after `timeout` and rejects the request if it is still pending.
async fn deadline_timer(agent: Weak<AgentInner>, task_id: String, timeout: Duration) {
    tokio::time::sleep(timeout).await;
    let Some(inner) = agent.upgrade() else {
        return;
    };
    // Removal decides the winner; a result that got there first leaves nothing.
    if let Some((_, pending)) = inner.pending.remove(&task_id) {
        debug!(task_id = %task_id, peer = %pending.peer, "Request timed out");
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let _ = pending
            .tx
            .send(Err(AgentError::Timeout { task_id, timeout_ms }));
    }
}

/// The transport-facing entry point. Holds the agent weakly so an agent
/// dropped without `stop` is not kept alive by its own transport.
struct Dispatcher {
    agent: Weak<AgentInner>,
}

#[async_trait]
impl InboundHandler for Dispatcher {
    async fn handle_message(&self, from: &str, bytes: Vec<u8>) {
        let Some(inner) = self.agent.upgrade() else {
            return;
        };
        if inner.state.load(Ordering::SeqCst) == STATE_STOPPED {
            return;
        }

        let message = match WireMessage::from_bytes(&bytes) {
            Ok(m) => m,
            Err(e) => {
                debug!(peer = %from, error = %e, "Dropping malformed message");
                return;
            }
        };

        match message {
            WireMessage::Task { envelope } => {
                let from = from.to_string();
                tokio::spawn(async move {
                    inner.handle_task(&from, envelope).await;
                });
            }
            WireMessage::Result { result } => inner.handle_result(from, result),
            WireMessage::Certificate { cert } => inner.handle_certificate(from, cert),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::handler_fn;
    use agentlink_wire::{MemoryDirectory, MemoryTransport};
    use serde_json::json;

    fn agent_on(directory: &MemoryDirectory, name: &str, timeout_ms: u64) -> Agent {
        let transport = Arc::new(MemoryTransport::new(directory.clone(), name));
        let config = AgentConfig {
            request_timeout_ms: timeout_ms,
            ..AgentConfig::default()
        };
        Agent::new(Keypair::generate(), transport, &config)
    }

    #[tokio::test]
    async fn test_request_before_start_is_rejected() {
        let directory = MemoryDirectory::new();
        let agent = agent_on(&directory, "a", 1000);
        let err = agent.request("b", "echo", json!({})).await.unwrap_err();
        assert!(matches!(err, AgentError::NotStarted));
        assert_eq!(agent.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_stopped_agent_cannot_restart() {
        let directory = MemoryDirectory::new();
        let agent = agent_on(&directory, "a", 1000);
        agent.start().await.unwrap();
        agent.stop().await.unwrap();
        assert!(matches!(agent.start().await, Err(AgentError::Stopped)));
        assert!(matches!(
            agent.request("b", "echo", json!({})).await,
            Err(AgentError::Stopped)
        ));
    }

    #[tokio::test]
    async fn test_timeout_when_peer_never_answers() {
        let directory = MemoryDirectory::new();
        let a = agent_on(&directory, "a", 100);
        // A bare transport that accepts messages but never replies.
        let silent = MemoryTransport::new(directory.clone(), "silent");
        silent.start().await.unwrap();
        a.start().await.unwrap();

        match a.request("silent", "echo", json!({})).await {
            Err(AgentError::Timeout { timeout_ms, .. }) => assert_eq!(timeout_ms, 100),
            other => panic!("Expected Timeout, got {other:?}"),
        }
        assert_eq!(a.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_pending_task_rejected() {
        let directory = MemoryDirectory::new();
        let a = agent_on(&directory, "a", 300);
        let silent = MemoryTransport::new(directory.clone(), "silent");
        silent.start().await.unwrap();
        a.start().await.unwrap();

        let envelope =
            create_task_envelope(&Keypair::generate(), "silent", "echo", json!({})).unwrap();
        let first = {
            let a = a.clone();
            let envelope = envelope.clone();
            tokio::spawn(async move { a.send_raw_envelope("silent", envelope).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(
            a.send_raw_envelope("silent", envelope).await,
            Err(AgentError::DuplicateTask(_))
        ));
        assert!(matches!(
            first.await.unwrap(),
            Err(AgentError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_error_result() {
        let directory = MemoryDirectory::new();
        let a = agent_on(&directory, "a", 2000);
        let b = agent_on(&directory, "b", 2000);
        b.register_capability(
            CapabilityDefinition::new("explode", "Always panics"),
            handler_fn(|payload: Value| async move {
                if payload.is_object() {
                    panic!("boom");
                }
                Ok(payload)
            }),
        )
        .await
        .unwrap();
        a.start().await.unwrap();
        b.start().await.unwrap();

        let result = a.request("b", "explode", json!({})).await.unwrap();
        assert!(verify_task_result(&result));
        assert_eq!(result.error(), Some("capability explode panicked"));
    }

    #[tokio::test]
    async fn test_malformed_inbound_bytes_are_ignored() {
        let directory = MemoryDirectory::new();
        let a = agent_on(&directory, "a", 2000);
        let b = agent_on(&directory, "b", 2000);
        b.register_capability(
            CapabilityDefinition::new("echo", ""),
            handler_fn(|payload| async move { Ok(payload) }),
        )
        .await
        .unwrap();
        a.start().await.unwrap();
        b.start().await.unwrap();

        let raw = MemoryTransport::new(directory.clone(), "raw");
        raw.start().await.unwrap();
        raw.send("b", b"not json".to_vec()).await.unwrap();
        raw.send("b", br#"{"kind":"gossip"}"#.to_vec()).await.unwrap();

        let result = a.request("b", "echo", json!({"x": 1})).await.unwrap();
        assert_eq!(result.value(), Some(&json!({"x": 1})));
    }

    #[tokio::test]
    async fn test_capabilities_registered_after_start_are_advertised() {
        let directory = MemoryDirectory::new();
        let a = agent_on(&directory, "a", 2000);
        let b = agent_on(&directory, "b", 2000);
        a.start().await.unwrap();
        b.start().await.unwrap();
        assert!(a.discover("late").await.unwrap().is_empty());

        b.register_capability(
            CapabilityDefinition::new("late", ""),
            handler_fn(|_| async { Ok(json!(null)) }),
        )
        .await
        .unwrap();
        assert_eq!(a.discover("late").await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_announce_without_certificate() {
        let directory = MemoryDirectory::new();
        let a = agent_on(&directory, "a", 2000);
        let b = agent_on(&directory, "b", 2000);
        a.start().await.unwrap();
        b.start().await.unwrap();

        assert!(!a.announce_certificate("b").await.unwrap());
        assert!(b.peer_certificate("a").is_none());
        assert!(!b.is_fleet_peer("a"));
    }
}
