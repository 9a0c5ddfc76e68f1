use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;

use likeledger_types::{
    AddLikeOutcome, LedgerError, LedgerState, LikeSummary, LikerId, PostId, Result,
};

use crate::codec;
use crate::options::{CorruptSnapshotPolicy, LedgerOptions};
use crate::traits::{LedgerStats, LikeLedger, SnapshotStore};

type PublishedState = Arc<RwLock<Arc<LedgerState>>>;

/// A snapshot write still running on the blocking pool after its caller gave up.
type PendingWrite = JoinHandle<Result<()>>;

enum PersistError {
    Failed(LedgerError),
    TimedOut { error: LedgerError, pending: PendingWrite },
}

/// Like ledger backed by a whole-state snapshot.
///
/// Readers clone the current `Arc<LedgerState>` and never wait on storage.
/// Writers serialize on `writer`, build the next state off to the side,
/// persist it, and only then publish it. A failed persist therefore leaves
/// the published state untouched.
pub struct DurableLedger {
    state: PublishedState,
    /// Generation of the most recent persist attempt. Held for the whole
    /// read-modify-persist cycle, and past it while a timed-out write settles.
    writer: Arc<Mutex<u64>>,
    persister: Persister,
}

impl DurableLedger {
    /// Load the snapshot from `store` and build the ledger around it.
    pub async fn open(store: Arc<dyn SnapshotStore>, options: LedgerOptions) -> Result<Self> {
        let state = {
            let store = store.clone();
            let options = options.clone();
            tokio::task::spawn_blocking(move || load_state(store.as_ref(), &options))
                .await
                .map_err(|e| LedgerError::Internal(format!("snapshot load task failed: {e}")))??
        };

        tracing::info!(
            snapshot = %store.describe(),
            posts = state.post_count(),
            likes = state.total_likes(),
            "Like ledger loaded"
        );

        Ok(Self {
            state: Arc::new(RwLock::new(Arc::new(state))),
            writer: Arc::new(Mutex::new(0)),
            persister: Persister {
                store,
                last_written: Arc::new(StdMutex::new(0)),
                options,
            },
        })
    }

    pub fn options(&self) -> &LedgerOptions {
        &self.persister.options
    }

    /// The currently published state.
    pub async fn snapshot(&self) -> Arc<LedgerState> {
        self.state.read().await.clone()
    }
}

#[derive(Clone)]
struct Persister {
    store: Arc<dyn SnapshotStore>,
    /// Generation of the last snapshot actually written.
    last_written: Arc<StdMutex<u64>>,
    options: LedgerOptions,
}

impl Persister {
    /// Write `state` with bounded retries. A timeout ends the attempts and
    /// hands back the write that is still in flight.
    async fn persist(&self, state: &LedgerState, generation: u64) -> std::result::Result<(), PersistError> {
        let bytes = Arc::new(codec::encode(state).map_err(PersistError::Failed)?);
        let attempts = self.options.persist_attempts.max(1);
        let timeout = self.options.persist_timeout;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let store = self.store.clone();
            let last_written = self.last_written.clone();
            let bytes = bytes.clone();
            let mut write = tokio::task::spawn_blocking(move || {
                write_generation(store.as_ref(), &last_written, generation, &bytes)
            });

            match tokio::time::timeout(timeout, &mut write).await {
                Ok(Ok(Ok(()))) => {
                    tracing::debug!(generation, attempt, "Snapshot written");
                    return Ok(());
                }
                Ok(Ok(Err(e))) => last_error = e.to_string(),
                Ok(Err(e)) => last_error = format!("snapshot write task failed: {e}"),
                Err(_) => {
                    tracing::error!(generation, ?timeout, "Snapshot write timed out");
                    return Err(PersistError::TimedOut {
                        error: LedgerError::Storage(format!(
                            "snapshot write timed out after {timeout:?}"
                        )),
                        pending: write,
                    });
                }
            }

            if attempt < attempts {
                tracing::warn!(generation, attempt, attempts, error = %last_error, "Snapshot write failed, retrying");
                tokio::time::sleep(self.options.retry_backoff).await;
            }
        }

        tracing::error!(generation, attempts, error = %last_error, "Snapshot write failed");
        Err(PersistError::Failed(LedgerError::Storage(last_error)))
    }
}

/// Wait out a timed-out write of `next` while still holding the writer lock.
/// If it reached storage, put `previous` back on disk; if that cannot be
/// done, publish `next` instead so memory and disk agree again.
async fn settle_abandoned_write(
    persister: Persister,
    state: PublishedState,
    mut generation: OwnedMutexGuard<u64>,
    pending: PendingWrite,
    previous: Arc<LedgerState>,
    next: LedgerState,
) {
    if !matches!(pending.await, Ok(Ok(()))) {
        tracing::debug!("Abandoned snapshot write did not land");
        return;
    }

    *generation += 1;
    let restored = match persister.persist(&previous, *generation).await {
        Ok(()) => true,
        Err(PersistError::Failed(_)) => false,
        Err(PersistError::TimedOut { pending, .. }) => matches!(pending.await, Ok(Ok(()))),
    };

    if restored {
        tracing::info!(generation = *generation, "Rolled back snapshot after timed-out write");
    } else {
        tracing::warn!(
            generation = *generation,
            "Could not roll back timed-out write, publishing it instead"
        );
        *state.write().await = Arc::new(next);
    }
}

fn load_state(store: &dyn SnapshotStore, options: &LedgerOptions) -> Result<LedgerState> {
    let Some(bytes) = store.load()? else {
        tracing::info!(snapshot = %store.describe(), "No snapshot found, starting empty");
        return Ok(LedgerState::new());
    };

    let mut state = match codec::decode(&bytes) {
        Ok(state) => state,
        Err(e) => match options.on_corrupt {
            CorruptSnapshotPolicy::Fail => {
                tracing::error!(snapshot = %store.describe(), error = %e, "Snapshot is corrupt");
                return Err(LedgerError::SnapshotCorrupt {
                    location: store.describe(),
                    reason: e.to_string(),
                });
            }
            CorruptSnapshotPolicy::Quarantine => {
                let moved_to = store.quarantine()?;
                tracing::warn!(
                    snapshot = %store.describe(),
                    quarantined_to = %moved_to,
                    error = %e,
                    "Snapshot is corrupt, quarantined it and starting empty"
                );
                LedgerState::new()
            }
        },
    };

    let merged = state.normalize(options.identity_policy);
    if merged > 0 {
        tracing::warn!(
            merged,
            policy = ?options.identity_policy,
            "Merged liker identities that collide under the identity policy"
        );
    }
    Ok(state)
}

/// Write `bytes` unless a newer generation has already been written.
fn write_generation(
    store: &dyn SnapshotStore,
    last_written: &StdMutex<u64>,
    generation: u64,
    bytes: &[u8],
) -> Result<()> {
    let mut last = last_written.lock().unwrap_or_else(PoisonError::into_inner);
    if generation < *last {
        tracing::debug!(generation, last = *last, "Skipping stale snapshot write");
        return Ok(());
    }
    store.save(bytes)?;
    *last = generation;
    Ok(())
}

#[async_trait]
impl LikeLedger for DurableLedger {
    async fn get_likes(&self, post: &PostId) -> LikeSummary {
        self.snapshot().await.summary(post)
    }

    async fn add_like(&self, post: &PostId, liker: &str) -> Result<AddLikeOutcome> {
        let liker = LikerId::parse(liker, self.persister.options.identity_policy)?;

        let mut generation = self.writer.clone().lock_owned().await;
        let current = self.snapshot().await;
        if current.has_liked(post, &liker) {
            return Ok(AddLikeOutcome {
                count: current.count(post),
                liked: true,
                inserted: false,
            });
        }

        let mut next = LedgerState::clone(&current);
        next.insert(post.clone(), liker.clone());
        let count = next.count(post);

        *generation += 1;
        match self.persister.persist(&next, *generation).await {
            Ok(()) => {}
            Err(PersistError::Failed(e)) => return Err(e),
            Err(PersistError::TimedOut { error, pending }) => {
                tokio::spawn(settle_abandoned_write(
                    self.persister.clone(),
                    self.state.clone(),
                    generation,
                    pending,
                    current,
                    next,
                ));
                return Err(error);
            }
        }
        *self.state.write().await = Arc::new(next);

        tracing::info!(post = %post, liker = %liker, count, "Like recorded");
        Ok(AddLikeOutcome {
            count,
            liked: true,
            inserted: true,
        })
    }

    async fn has_liked(&self, post: &PostId, liker: &str) -> Result<bool> {
        let liker = LikerId::parse(liker, self.persister.options.identity_policy)?;
        Ok(self.snapshot().await.has_liked(post, &liker))
    }

    async fn flush(&self) -> Result<()> {
        let mut generation = self.writer.lock().await;
        let current = self.snapshot().await;
        *generation += 1;
        // A flush writes what is already published, so a late write cannot diverge.
        match self.persister.persist(&current, *generation).await {
            Ok(()) => Ok(()),
            Err(PersistError::Failed(e)) | Err(PersistError::TimedOut { error: e, .. }) => Err(e),
        }
    }

    async fn stats(&self) -> LedgerStats {
        let state = self.snapshot().await;
        LedgerStats {
            posts: state.post_count(),
            likes: state.total_likes(),
        }
    }
}
