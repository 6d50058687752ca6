//! AgentLink kernel: the agent orchestrator and what it needs.
//!
//! - [`Agent`]: outbound request correlation, inbound task execution,
//!   certificate exchange and fleet-trust queries over any
//!   [`agentlink_wire::Transport`]
//! - [`CapabilityRegistry`]: named capabilities and their async handlers
//! - [`config`]: TOML configuration with defaults

pub mod agent;
pub mod config;
pub mod error;
pub mod registry;
pub mod schema;

pub use agent::Agent;
pub use config::{load_config, AgentConfig, NetworkConfig};
pub use error::{AgentError, AgentResult};
pub use registry::{handler_fn, CapabilityHandler, CapabilityRegistry};
