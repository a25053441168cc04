//! # Relay Node
//!
//! Hosts one relay endpoint.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`RUST_LOG`, default `info`, written to stderr)
//! 2. Load configuration (`ICP_CONFIG` file, then `ICP_*` overrides)
//! 3. Build the fork store and relay service, crediting genesis balances
//! 4. Read JSON commands from stdin, one per line, until EOF
//!
//! Each command yields one JSON result line on stdout, followed by any
//! outbox events it produced.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use relay_node::{load_config, parse_command, JsonLinesTransport, NodeRuntime, Response};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  Inter-Chain Relay Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let config = load_config().context("Failed to load configuration")?;
    let mut node = NodeRuntime::new(config).context("Failed to initialize relay node")?;
    let transport = JsonLinesTransport::stdout();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = match parse_command(line) {
            Ok(command) => node.handle(command),
            Err(e) => {
                warn!("Rejected malformed command: {}", e);
                Response::error(format!("malformed command: {e}"))
            }
        };
        println!("{}", serde_json::to_string(&response)?);

        if let Err(e) = node.flush(&transport).await {
            error!("Outbox delivery failed, events kept for retry: {}", e);
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}
