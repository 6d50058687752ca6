//! AgentLink CLI: manage keys and certificates, run an agent, call a peer.
//!
//! `run` and `call` use the TCP peer transport and need `[network]
//! shared_secret` set in the config file.

mod cli;
mod files;

use crate::cli::*;
use agentlink_kernel::{handler_fn, load_config, Agent, AgentConfig};
use agentlink_types::delegation::{create_certificate, verify_certificate_detailed};
use agentlink_types::envelope::verify_task_result;
use agentlink_types::{CapabilityDefinition, Keypair};
use agentlink_wire::{PeerConfig, PeerTransport};
use anyhow::{bail, Context};
use clap::Parser;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

fn init_tracing_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing_stderr();

    let result = match cli.command {
        Commands::Keygen { out, force } => cmd_keygen(&out, force),
        Commands::Delegate {
            owner_key,
            agent,
            scope,
            ttl_secs,
            out,
        } => cmd_delegate(&owner_key, &agent, scope, ttl_secs, &out),
        Commands::InspectCert { path, json } => cmd_inspect_cert(&path, json),
        Commands::Run {
            key,
            cert,
            listen,
            peers,
        } => {
            let config = load_config(cli.config.as_deref());
            block_on(cmd_run(config, key, cert, listen, peers))
        }
        Commands::Call {
            peer,
            capability,
            payload,
            key,
        } => {
            let config = load_config(cli.config.as_deref());
            block_on(cmd_call(config, &peer, &capability, &payload, key))
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn block_on<F: std::future::Future<Output = anyhow::Result<()>>>(fut: F) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(fut)
}

fn cmd_keygen(out: &std::path::Path, force: bool) -> anyhow::Result<()> {
    let keypair = Keypair::generate();
    files::write_key_file(out, &keypair, force)?;
    println!("{}", keypair.public_key_hex());
    info!(path = %out.display(), "Key file written");
    Ok(())
}

fn cmd_delegate(
    owner_key: &std::path::Path,
    agent: &str,
    scope: Vec<String>,
    ttl_secs: u64,
    out: &std::path::Path,
) -> anyhow::Result<()> {
    let owner = files::read_key_file(owner_key)?;
    let scope: Vec<String> = scope
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let cert = create_certificate(&owner, agent, scope, Duration::from_secs(ttl_secs))?;
    files::write_certificate(out, &cert)?;
    info!(
        owner = %cert.owner,
        agent = %cert.agent,
        expires_at = cert.expires_at,
        "Certificate issued"
    );
    Ok(())
}

fn cmd_inspect_cert(path: &std::path::Path, as_json: bool) -> anyhow::Result<()> {
    let cert = files::read_certificate(path)?;
    let verdict = verify_certificate_detailed(&cert, agentlink_types::now_ms());

    if as_json {
        let out = json!({
            "certificate": cert,
            "valid": verdict.is_ok(),
            "reason": verdict.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("owner:      {}", cert.owner);
    println!("agent:      {}", cert.agent);
    println!("scope:      {}", cert.scope.join(", "));
    println!("issued at:  {}", format_ms(cert.issued_at));
    println!("expires at: {}", format_ms(cert.expires_at));
    match verdict {
        Ok(()) => println!("status:     valid"),
        Err(e) => println!("status:     INVALID ({e})"),
    }
    Ok(())
}

fn format_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

fn tcp_transport(
    config: &AgentConfig,
    keypair: &Keypair,
    listen: &str,
) -> anyhow::Result<Arc<PeerTransport>> {
    if config.network.shared_secret.is_empty() {
        bail!("[network] shared_secret must be set in the config file");
    }
    let listen_addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("invalid listen address {listen}"))?;
    Ok(Arc::new(PeerTransport::new(PeerConfig::new(
        listen_addr,
        keypair.public_key_hex(),
        config.network.shared_secret.clone(),
    ))))
}

async fn register_builtin_capabilities(agent: &Agent) -> anyhow::Result<()> {
    agent
        .register_capability(
            CapabilityDefinition::new("echo", "Returns the given message").with_schema(json!({
                "type": "object",
                "properties": { "message": { "type": "string" } },
                "required": ["message"]
            })),
            handler_fn(|payload: Value| async move { Ok(json!({ "echo": payload["message"] })) }),
        )
        .await?;
    agent
        .register_capability(
            CapabilityDefinition::new("time", "Current time in epoch milliseconds"),
            handler_fn(|_| async { Ok(json!({ "now": agentlink_types::now_ms() })) }),
        )
        .await?;
    Ok(())
}

async fn cmd_run(
    config: AgentConfig,
    key: Option<PathBuf>,
    cert: Option<PathBuf>,
    listen: Option<String>,
    peers: Vec<String>,
) -> anyhow::Result<()> {
    let key_path = key
        .or_else(|| config.key_file.clone())
        .context("no key file given (use --key or set key_file in config)")?;
    let keypair = files::read_key_file(&key_path)?;
    let certificate = match cert.or_else(|| config.certificate_file.clone()) {
        Some(path) => Some(files::read_certificate(&path)?),
        None => None,
    };
    if let Some(c) = &certificate {
        if c.agent != keypair.public_key_hex() {
            warn!(cert_agent = %c.agent, "Certificate was issued to a different key");
        }
        if let Err(e) = verify_certificate_detailed(c, agentlink_types::now_ms()) {
            warn!(error = %e, "Certificate does not verify; peers will not treat this agent as a fleet sibling");
        }
    }

    let listen = listen.unwrap_or_else(|| config.network.listen_addr.clone());
    let transport = tcp_transport(&config, &keypair, &listen)?;
    let mut agent = Agent::new(keypair, transport.clone(), &config);
    if let Some(c) = certificate {
        agent = agent.with_certificate(c);
    }
    register_builtin_capabilities(&agent).await?;
    agent.start().await?;

    let bootstrap = config.network.bootstrap_peers.iter().chain(peers.iter());
    for addr in bootstrap {
        let Ok(socket) = addr.parse::<SocketAddr>() else {
            warn!(peer = %addr, "Skipping unparsable peer address");
            continue;
        };
        match transport.connect(socket).await {
            Ok(node_id) => {
                if let Err(e) = agent.announce_certificate(&node_id).await {
                    warn!(peer = %node_id, error = %e, "Certificate announcement failed");
                }
            }
            Err(e) => warn!(peer = %addr, error = %e, "Could not connect to peer"),
        }
    }

    println!("agent {} listening", agent.public_key_hex());
    if let Some(addr) = transport.local_addr() {
        println!("address {addr}");
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl+C")?;
    info!("Shutting down");
    agent.stop().await?;
    Ok(())
}

async fn cmd_call(
    config: AgentConfig,
    peer: &str,
    capability: &str,
    payload: &str,
    key: Option<PathBuf>,
) -> anyhow::Result<()> {
    let payload: Value = serde_json::from_str(payload).context("payload is not valid JSON")?;
    let peer_addr: SocketAddr = peer
        .parse()
        .with_context(|| format!("invalid peer address {peer}"))?;
    let keypair = match key.or_else(|| config.key_file.clone()) {
        Some(path) => files::read_key_file(&path)?,
        None => Keypair::generate(),
    };

    let transport = tcp_transport(&config, &keypair, "127.0.0.1:0")?;
    let agent = Agent::new(keypair, transport.clone(), &config);
    agent.start().await?;

    let outcome = async {
        let node_id = transport.connect(peer_addr).await?;
        let result = agent.request(&node_id, capability, payload).await?;
        anyhow::Ok(result)
    }
    .await;
    agent.stop().await?;

    let result = outcome?;
    // request() only returns verified results; checked again for the printout.
    let verified = verify_task_result(&result);
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "taskId": result.task_id,
            "from": result.from,
            "verified": verified,
            "result": result.value(),
            "error": result.error(),
        }))?
    );
    if result.is_error() {
        std::process::exit(2);
    }
    Ok(())
}
