use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid post id: {0}")]
    InvalidPostId(String),

    #[error("Invalid liker identity: {0}")]
    InvalidIdentity(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Snapshot at {location} is corrupt: {reason}")]
    SnapshotCorrupt { location: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// True for errors caused by the caller's input rather than the ledger.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidPostId(_) | LedgerError::InvalidIdentity(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
