use async_trait::async_trait;

use likeledger_types::{AddLikeOutcome, LikeSummary, PostId, Result};

/// Durable home of the serialized ledger state.
///
/// Implementations are blocking; callers move them onto the blocking pool.
pub trait SnapshotStore: Send + Sync {
    /// Read the snapshot bytes. `None` means no snapshot has been written yet.
    fn load(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the snapshot with `bytes`. A crash during `save` must leave
    /// either the old or the new snapshot readable, never a partial one.
    fn save(&self, bytes: &[u8]) -> Result<()>;

    /// Move an unreadable snapshot out of the way. Returns where it went.
    fn quarantine(&self) -> Result<String>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Aggregate figures over the whole ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LedgerStats {
    pub posts: usize,
    pub likes: usize,
}

/// Core like-ledger trait. Every implementation must be safe under parallel callers.
#[async_trait]
pub trait LikeLedger: Send + Sync {
    /// Count and likers of `post`. Unknown posts report zero likes.
    async fn get_likes(&self, post: &PostId) -> LikeSummary;

    /// Record that `liker` likes `post`. Idempotent per (post, liker).
    async fn add_like(&self, post: &PostId, liker: &str) -> Result<AddLikeOutcome>;

    /// Whether `liker` has already liked `post`.
    async fn has_liked(&self, post: &PostId, liker: &str) -> Result<bool>;

    /// Write the current state to durable storage again.
    async fn flush(&self) -> Result<()>;

    async fn stats(&self) -> LedgerStats;
}
