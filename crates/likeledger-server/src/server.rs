use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, ServerConfig};
use crate::handlers::router;
use crate::state::AppState;

/// Initialize logging. `RUST_LOG` overrides the default filter.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "likeledger=info,likeledger_server=info,likeledger_store=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

/// HTTP front of the like ledger.
pub struct LedgerServer {
    config: ServerConfig,
    state: AppState,
}

impl LedgerServer {
    /// Load the snapshot and prepare to serve.
    pub async fn open(config: ServerConfig) -> Result<Self> {
        let state = AppState::from_config(&config)
            .await
            .with_context(|| format!("Failed to open ledger at {}", config.snapshot_path.display()))?;
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn router(&self) -> axum::Router {
        router(self.state.clone())
    }

    /// Serve until Ctrl-C, then write a final snapshot.
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.bind_addr))?;
        tracing::info!(addr = %self.config.bind_addr, "Like ledger listening");

        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server failed")?;

        tracing::info!("Shutting down, flushing snapshot");
        self.state
            .ledger
            .flush()
            .await
            .context("Final snapshot flush failed")?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
