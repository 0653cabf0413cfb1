//! Grant Transaction Coordinator
//!
//! HTTP service that turns grant-management requests into unsigned Soroban
//! transaction envelopes and serves merged on-chain/off-chain grant views.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────▶ http server ──▶ grants::GrantReconciler
//!                                   │          │
//!                                   ▼          ▼
//!                           soroban (codec,   store (SQLite:
//!                           envelope, rpc,    participants,
//!                           simulator)        grant records)
//!                                   │
//!                                   ▼
//!                            Soroban RPC node
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use grant_coordinator::config::resolve_config;
use grant_coordinator::http::HttpServer;
use grant_coordinator::lifecycle::build_reconciler;
use grant_coordinator::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "grant-coordinator")]
#[command(about = "Soroban grant transaction coordinator", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GRANT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init_logging();

    tracing::info!("grant-coordinator v{} starting", env!("CARGO_PKG_VERSION"));

    let config = resolve_config(args.config.as_deref(), |key| std::env::var(key).ok())?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.soroban.rpc_url,
        contract_id = %config.soroban.contract_id,
        store_path = %config.store.path,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let reconciler = build_reconciler(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let server = HttpServer::new(config, reconciler);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
