use std::sync::Arc;

use likeledger_store::{DurableLedger, FileSnapshotStore, LikeLedger, SnapshotStore};
use likeledger_types::Result;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LikeLedger>,
}

impl AppState {
    pub fn new(ledger: Arc<dyn LikeLedger>) -> Self {
        Self { ledger }
    }

    /// Open the ledger described by `config`, loading its snapshot from disk.
    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        let store: Arc<dyn SnapshotStore> =
            Arc::new(FileSnapshotStore::new(config.snapshot_path.clone()));
        let ledger = DurableLedger::open(store, config.ledger_options()).await?;
        Ok(Self::new(Arc::new(ledger)))
    }
}
