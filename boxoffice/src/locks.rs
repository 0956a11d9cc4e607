//! Per-key exclusive critical sections.
//!
//! Seat conflicts are only possible within one show, and schedule conflicts
//! within one showroom, so mutual exclusion is partitioned by key instead of
//! being global. A partition's mutex is created lazily on first contact and
//! reused for the key's lifetime.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::error::Elapsed;
use tokio::time::timeout;

/// A lazily-populated map from partition key to an exclusive async mutex.
///
/// Acquisition is bounded: callers pass the longest they are willing to
/// wait, and an expired bound comes back as [`Elapsed`] so they can surface
/// a `Busy` error. Guards are owned, so a critical section may span await
/// points (store calls) without borrowing from the registry.
#[derive(Debug)]
pub struct PartitionLocks<K> {
    registry: RwLock<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> PartitionLocks<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the partition's mutex, creating it on first contact.
    ///
    /// The registry lock is never held across an await; only the returned
    /// handle is.
    fn handle(&self, key: &K) -> Arc<Mutex<()>> {
        if let Some(found) = self
            .registry
            .read()
            .expect("lock registry poisoned")
            .get(key)
        {
            return Arc::clone(found);
        }
        let mut registry = self.registry.write().expect("lock registry poisoned");
        Arc::clone(
            registry
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Acquires the partition's exclusive guard, waiting at most `bound`.
    pub async fn acquire(&self, key: &K, bound: Duration) -> Result<OwnedMutexGuard<()>, Elapsed> {
        let partition = self.handle(key);
        timeout(bound, partition.lock_owned()).await
    }
}

impl<K> Default for PartitionLocks<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
