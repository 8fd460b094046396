//! Per-match mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::matches::MatchId;

/// Registry of one async lock per match.
///
/// Holding the guard for a match serializes every read-modify-write of
/// that match; different matches never contend. Entries nobody holds or
/// waits on are pruned, so the registry only grows with contention.
#[derive(Debug, Clone, Default)]
pub struct MatchLocks {
    locks: Arc<Mutex<HashMap<MatchId, Arc<AsyncMutex<()>>>>>,
}

impl MatchLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `match_id`.
    pub async fn acquire(&self, match_id: &MatchId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Handles are only cloned under this mutex, so a count of one
            // means no guard and no waiter exists.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(match_id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of registered locks.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when no lock is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
