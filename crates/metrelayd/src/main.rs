//! metrelayd — the Metrelay daemon.
//!
//! Single binary with two modes:
//! - `proxy`: the aggregation proxy. Accepts snapshot pushes from
//!   agents and serves the merged store to scrapes.
//! - `agent`: the node agent. Samples host gauges and pushes them to
//!   a proxy.
//!
//! # Usage
//!
//! ```text
//! metrelayd proxy --port 8080
//! metrelayd agent --proxy 127.0.0.1:8080 --node worker-1
//! ```

mod agent_mode;

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "metrelayd", about = "Metrelay daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the aggregation proxy (push ingest + scrape endpoint).
    Proxy {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// Run the node agent, pushing host gauges to a proxy.
    Agent {
        /// `host:port` of the aggregation proxy.
        #[arg(long, default_value = "127.0.0.1:8080")]
        proxy: String,

        /// Node identity for pushed snapshots. Defaults to the host name.
        #[arg(long)]
        node: Option<String>,

        /// Seconds between pushes.
        #[arg(long, default_value = "2")]
        push_interval: u64,

        /// Per-push timeout in seconds.
        #[arg(long, default_value = "5")]
        push_timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,metrelayd=debug,metrelay_store=debug,metrelay_api=debug,metrelay_agent=debug"
                    .parse()
                    .unwrap()
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Proxy { port } => run_proxy(port).await,
        Command::Agent {
            proxy,
            node,
            push_interval,
            push_timeout,
        } => agent_mode::run_agent(proxy, node, push_interval, push_timeout).await,
    }
}

async fn run_proxy(port: u16) -> anyhow::Result<()> {
    info!("Metrelay daemon starting in proxy mode");

    let store = metrelay_store::MetricStore::new();
    let router = metrelay_api::build_router(store);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "proxy listening");

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("proxy stopped");
    Ok(())
}
