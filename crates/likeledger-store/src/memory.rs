use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use likeledger_types::{LedgerError, Result};

use crate::traits::SnapshotStore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process snapshot store. Supports injected failures and slow writes.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    bytes: Mutex<Option<Vec<u8>>>,
    quarantined: Mutex<Vec<Vec<u8>>>,
    pending_failures: AtomicUsize,
    next_delay: Mutex<Option<Duration>>,
    saves: AtomicUsize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing snapshot.
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        *lock(&store.bytes) = Some(bytes.into());
        store
    }

    /// Make the next `n` saves fail.
    pub fn fail_next_saves(&self, n: usize) {
        self.pending_failures.store(n, Ordering::SeqCst);
    }

    /// Make the next save sleep for `delay` before completing.
    pub fn delay_next_save(&self, delay: Duration) {
        *lock(&self.next_delay) = Some(delay);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        lock(&self.bytes).clone()
    }

    pub fn quarantined(&self) -> Vec<Vec<u8>> {
        lock(&self.quarantined).clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.contents())
    }

    fn save(&self, bytes: &[u8]) -> Result<()> {
        // Outcome is fixed when the save starts, as with a real write in flight.
        let failing = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if let Some(delay) = lock(&self.next_delay).take() {
            std::thread::sleep(delay);
        }
        if failing {
            return Err(LedgerError::Storage("injected save failure".into()));
        }
        *lock(&self.bytes) = Some(bytes.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn quarantine(&self) -> Result<String> {
        let bytes = lock(&self.bytes)
            .take()
            .ok_or_else(|| LedgerError::Storage("no snapshot to quarantine".into()))?;
        let mut quarantined = lock(&self.quarantined);
        quarantined.push(bytes);
        Ok(format!("memory://quarantine/{}", quarantined.len() - 1))
    }

    fn describe(&self) -> String {
        "memory://snapshot".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injected_failures_are_consumed() {
        let store = MemorySnapshotStore::new();
        store.fail_next_saves(2);
        assert!(store.save(b"a").is_err());
        assert!(store.save(b"a").is_err());
        store.save(b"b").unwrap();
        assert_eq!(store.contents().unwrap(), b"b");
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_quarantine_takes_snapshot() {
        let store = MemorySnapshotStore::with_bytes("garbage");
        let location = store.quarantine().unwrap();
        assert_eq!(location, "memory://quarantine/0");
        assert!(store.load().unwrap().is_none());
        assert_eq!(store.quarantined(), vec![b"garbage".to_vec()]);
    }
}
