//! Clap CLI definitions for AgentLink.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const AFTER_HELP: &str = "\
Examples:
  agentlink keygen --out owner.key.json
  agentlink keygen --out agent.key.json
  agentlink delegate --owner-key owner.key.json --agent <AGENT_PUBKEY> --scope 'echo' --out agent.cert.json
  agentlink inspect-cert agent.cert.json
  agentlink run --key agent.key.json --cert agent.cert.json
  agentlink call --peer 127.0.0.1:4300 echo '{\"message\":\"hello\"}'";

/// AgentLink: signed task exchange between autonomous agents.
#[derive(Parser)]
#[command(name = "agentlink", version, about, after_help = AFTER_HELP)]
pub struct Cli {
    /// Path to config file (default: ~/.agentlink/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new ed25519 keypair and write it as a key file.
    Keygen {
        /// Where to write the key file.
        #[arg(long)]
        out: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Issue a delegation certificate from an owner key to an agent public key.
    Delegate {
        /// The owner's key file.
        #[arg(long)]
        owner_key: PathBuf,
        /// The agent's public key (hex).
        #[arg(long)]
        agent: String,
        /// Capability patterns the agent may serve (comma separated, `*` wildcards).
        #[arg(long, value_delimiter = ',', default_value = "*")]
        scope: Vec<String>,
        /// Validity period in seconds.
        #[arg(long, default_value_t = 86_400)]
        ttl_secs: u64,
        /// Where to write the certificate.
        #[arg(long)]
        out: PathBuf,
    },
    /// Print and verify a delegation certificate.
    InspectCert {
        /// Certificate file.
        path: PathBuf,
        /// Output as JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Run an agent over TCP serving the built-in capabilities until Ctrl+C.
    Run {
        /// Key file (overrides `key_file` in config).
        #[arg(long)]
        key: Option<PathBuf>,
        /// Certificate file (overrides `certificate_file` in config).
        #[arg(long)]
        cert: Option<PathBuf>,
        /// Listen address (overrides `[network] listen_addr`).
        #[arg(long)]
        listen: Option<String>,
        /// Additional peers to connect to at startup.
        #[arg(long = "peer")]
        peers: Vec<String>,
    },
    /// Connect to a peer, send one task and print the verified result.
    Call {
        /// Peer listen address (host:port).
        #[arg(long)]
        peer: String,
        /// Capability name.
        capability: String,
        /// JSON payload.
        #[arg(default_value = "{}")]
        payload: String,
        /// Key file to sign with. A throwaway key is generated if omitted.
        #[arg(long)]
        key: Option<PathBuf>,
    },
}
