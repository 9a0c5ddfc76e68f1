use std::time::Duration;

use serde::{Deserialize, Serialize};

use likeledger_types::IdentityPolicy;

/// What to do when the snapshot exists but cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptSnapshotPolicy {
    /// Move the snapshot aside and start empty.
    #[default]
    Quarantine,
    /// Refuse to start.
    Fail,
}

/// Tuning for a [`crate::DurableLedger`].
#[derive(Debug, Clone)]
pub struct LedgerOptions {
    pub identity_policy: IdentityPolicy,
    pub on_corrupt: CorruptSnapshotPolicy,
    /// Total tries per persist, including the first.
    pub persist_attempts: u32,
    pub retry_backoff: Duration,
    /// Upper bound on a single snapshot write. Timeouts are not retried.
    pub persist_timeout: Duration,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            identity_policy: IdentityPolicy::Exact,
            on_corrupt: CorruptSnapshotPolicy::Quarantine,
            persist_attempts: 3,
            retry_backoff: Duration::from_millis(50),
            persist_timeout: Duration::from_secs(5),
        }
    }
}
