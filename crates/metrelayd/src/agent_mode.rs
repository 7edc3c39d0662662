//! Agent mode — runs on worker nodes, feeds host gauges to a proxy.
//!
//! In this mode the daemon:
//! 1. Resolves the node identity (flag value, else the host name)
//! 2. Starts the sample-and-push loop
//! 3. On Ctrl-C, signals the loop and waits for it to stop

use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use metrelay_agent::{AgentConfig, PushAgent};

/// Run the agent node.
pub async fn run_agent(
    proxy_addr: String,
    node: Option<String>,
    push_interval: u64,
    push_timeout: u64,
) -> anyhow::Result<()> {
    info!("Metrelay daemon starting in agent mode");

    let node_id = node
        .or_else(sysinfo::System::host_name)
        .unwrap_or_else(|| "node-1".to_string());

    let config = AgentConfig {
        proxy_addr,
        node_id: node_id.clone(),
        push_interval: Duration::from_secs(push_interval),
        push_timeout: Duration::from_secs(push_timeout),
    };

    // ── Shutdown signal ──────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Push loop ────────────────────────────────────────────────
    let agent = PushAgent::new(config);
    let push_handle = tokio::spawn(async move {
        agent.run(shutdown_rx).await;
    });

    info!(%node_id, "agent started");

    // ── Wait for shutdown ────────────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C handler");
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = push_handle.await;

    info!("agent stopped");
    Ok(())
}
