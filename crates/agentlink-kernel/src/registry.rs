//! Capability registry: what this agent can do and the code that does it.

use agentlink_types::CapabilityDefinition;
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Async handler invoked with a task's payload.
pub type CapabilityHandler =
    Arc<dyn Fn(Value) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Wrap an async closure as a [`CapabilityHandler`].
pub fn handler_fn<F, Fut>(f: F) -> CapabilityHandler
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move |payload| Box::pin(f(payload)))
}

#[derive(Clone)]
struct Registration {
    definition: CapabilityDefinition,
    handler: CapabilityHandler,
}

/// Name-keyed table of capabilities. Registration is last-write-wins.
#[derive(Default)]
pub struct CapabilityRegistry {
    entries: DashMap<String, Registration>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `definition`, replacing any prior registration of the same name.
    pub fn register(&self, definition: CapabilityDefinition, handler: CapabilityHandler) {
        let name = definition.name.clone();
        let replaced = self
            .entries
            .insert(name.clone(), Registration { definition, handler })
            .is_some();
        debug!(capability = %name, replaced, "Capability registered");
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get_handler(&self, name: &str) -> Option<CapabilityHandler> {
        self.entries.get(name).map(|r| Arc::clone(&r.handler))
    }

    pub fn get_definition(&self, name: &str) -> Option<CapabilityDefinition> {
        self.entries.get(name).map(|r| r.definition.clone())
    }

    /// All definitions, in no particular order.
    pub fn list(&self) -> Vec<CapabilityDefinition> {
        self.entries
            .iter()
            .map(|r| r.value().definition.clone())
            .collect()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
