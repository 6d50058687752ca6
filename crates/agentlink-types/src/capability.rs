//! Capability definitions and name-pattern matching.
//!
//! A capability is a named unit of work an agent performs on request. The
//! definition is what gets advertised and described; the executable half lives
//! in the kernel's registry and never crosses the wire.

use serde::{Deserialize, Serialize};

/// Describes a capability an agent offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDefinition {
    /// Unique capability name within one agent (e.g. "echo").
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Optional JSON-Schema-style description of the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_schema: Option<serde_json::Value>,
}

impl CapabilityDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema: None,
        }
    }

    /// Attach a payload schema.
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.parameter_schema = Some(schema);
        self
    }
}

/// Simple glob pattern matching supporting '*' as wildcard.
///
/// - Exact match: "echo" matches "echo"
/// - Wildcard: "*" matches anything
/// - Prefix/suffix/middle: "fs.*", "*.read", "fs.*.read"
pub fn glob_matches(pattern: &str, value: &str) -> bool {
    if pattern == "*" || pattern == value {
        return true;
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return value.ends_with(suffix);
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return value.starts_with(prefix);
    }
    if let Some(star_pos) = pattern.find('*') {
        let prefix = &pattern[..star_pos];
        let suffix = &pattern[star_pos + 1..];
        return value.starts_with(prefix)
            && value.ends_with(suffix)
            && value.len() >= prefix.len() + suffix.len();
    }
    false
}
