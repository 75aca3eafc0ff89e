//! mirror-proxy
//!
//! Relays every request to one fixed upstream, rewriting headers on the way
//! through and following redirects on the caller's behalf.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 MIRROR PROXY                  │
//!                      │                                               │
//!   Client Request     │  ┌──────────┐   ┌───────────┐   ┌──────────┐  │
//!   ───────────────────┼─▶│  gates   │──▶│  request  │──▶│ redirect │──┼──▶ Upstream
//!                      │  │preflight │   │  headers  │   │ follower │  │
//!                      │  │bypass/405│   │  cookies  │   └────┬─────┘  │
//!                      │  └──────────┘   └───────────┘        │        │
//!   Client Response    │                 ┌───────────┐        │        │
//!   ◀──────────────────┼─────────────────│ response  │◀───────┘        │
//!                      │                 │  headers  │                 │
//!                      │                 └───────────┘                 │
//!                      │   config · observability · lifecycle          │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use mirror_proxy::config::{load_config, load_from_env, ProxyConfig};
use mirror_proxy::observability::{logging, metrics};
use mirror_proxy::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "mirror-proxy", version, about = "Transparent HTTP proxy for a single upstream")]
struct Cli {
    /// Path to a TOML config file; defaults plus environment overrides when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config: ProxyConfig = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mirror-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
