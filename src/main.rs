//! `userhub` — the dashboard backend binary.
//!
//! Usage:
//!   userhub [--config <path>] [--host <addr>] [--port <port>]
//!
//! Configuration precedence: CLI flags, then `PORT`/`JWT_SECRET` env vars,
//! then the config file, then built-in defaults.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use userhub::auth::TokenIssuer;
use userhub::config::Config;
use userhub::gateway::{self, AppState};
use userhub::store::Store;

/// UserHub dashboard backend.
#[derive(Parser, Debug)]
#[command(name = "userhub", about = "UserHub admin dashboard backend")]
struct Cli {
    /// Path to the config file (defaults to the platform config dir).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Listen host (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides config and `PORT`).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let host = cli.host.unwrap_or_else(|| config.gateway.host.clone());
    let port = cli
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(config.gateway.port);

    let data_dir = config.resolve_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let snapshot = data_dir.join("userhub.json");
    info!("opening snapshot at {}", snapshot.display());

    let store = Arc::new(Store::open(&snapshot)?);
    let tokens = Arc::new(TokenIssuer::new(
        &config.jwt_secret(),
        config.auth.token_ttl_secs,
    ));

    gateway::run_gateway(&host, port, AppState { store, tokens }).await
}
