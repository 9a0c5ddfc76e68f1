use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use likeledger_server::{LedgerServer, LogFormat, ServerConfig, init_tracing};

#[derive(Parser)]
#[command(name = "likeledger", about = "Durable per-post like ledger")]
struct Cli {
    /// TOML config file. Missing file means defaults.
    #[arg(long, env = "LIKELEDGER_CONFIG", default_value = "likeledger.toml")]
    config: PathBuf,

    /// Listen address, overrides `bind_addr`.
    #[arg(long, env = "LIKELEDGER_BIND")]
    bind: Option<SocketAddr>,

    /// Snapshot file, overrides `snapshot_path`.
    #[arg(long, env = "LIKELEDGER_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Emit JSON logs.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::load(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(snapshot) = cli.snapshot {
        config.snapshot_path = snapshot;
    }
    if cli.json_logs {
        config.log_format = LogFormat::Json;
    }

    init_tracing(config.log_format);
    tracing::info!(
        config = %cli.config.display(),
        snapshot = %config.snapshot_path.display(),
        policy = ?config.identity_policy,
        "Starting like ledger"
    );

    LedgerServer::open(config).await?.serve().await
}
