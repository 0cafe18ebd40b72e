//! The live snapshot cache and the shared size budget.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use sfc_virtual::Snapshot;

/// Snapshots keyed by real path. The engine's versioning protocol
/// requires that the same path and version always be served from here
/// rather than recomputed.
#[derive(Default)]
pub struct SnapshotStore {
    entries: Mutex<FxHashMap<Utf8PathBuf, Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Utf8Path) -> Option<Arc<Snapshot>> {
        self.lock().get(path).cloned()
    }

    /// Replaces the entry for the snapshot's path, returning the
    /// superseded snapshot so the caller can release its fragment.
    pub fn insert(&self, snapshot: Arc<Snapshot>) -> Option<Arc<Snapshot>> {
        self.lock().insert(snapshot.path().to_owned(), snapshot)
    }

    pub fn remove(&self, path: &Utf8Path) -> Option<Arc<Snapshot>> {
        self.lock().remove(path)
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.lock().contains_key(path)
    }

    pub fn paths(&self) -> Vec<Utf8PathBuf> {
        let mut paths: Vec<Utf8PathBuf> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<Utf8PathBuf, Arc<Snapshot>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Bytes of non-script project content charged across every active
/// project container. Exceeding the limit is the signal for containers
/// to enter reduced mode.
#[derive(Debug)]
pub struct SizeBudget {
    limit: u64,
    used: AtomicU64,
}

impl SizeBudget {
    /// 20 MiB across all containers combined.
    pub const DEFAULT_LIMIT: u64 = 20 * 1024 * 1024;

    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            used: AtomicU64::new(0),
        }
    }

    pub fn charge(&self, bytes: u64) {
        self.used.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn release(&self, bytes: u64) {
        let mut current = self.used.load(Ordering::Relaxed);
        loop {
            let next = current.saturating_sub(bytes);
            match self.used.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn used(&self) -> u64 {
        self.used.load(Ordering::Relaxed)
    }

    pub fn is_exceeded(&self) -> bool {
        self.used() > self.limit
    }
}

impl Default for SizeBudget {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_accumulates_and_releases() {
        let budget = SizeBudget::new(100);
        budget.charge(60);
        assert!(!budget.is_exceeded());
        budget.charge(50);
        assert!(budget.is_exceeded());
        budget.release(30);
        assert!(!budget.is_exceeded());
        budget.release(1000);
        assert_eq!(budget.used(), 0);
    }
}
