//! Per-identity exclusion
//!
//! Each `EntityKey` gets its own FIFO async mutex, created on first use and
//! dropped again once nobody holds or waits for it. Attempts on different
//! keys never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::domain::EntityKey;

#[derive(Debug, Default)]
pub struct KeyLocks {
    table: Mutex<HashMap<EntityKey, Arc<AsyncMutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free and hold it until the guard drops
    pub async fn acquire(&self, key: &EntityKey) -> KeyGuard<'_> {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(key.clone()).or_default())
        };
        debug!(%key, "KeyLocks::acquire: waiting");
        let guard = lock.lock_owned().await;
        debug!(%key, "KeyLocks::acquire: held");

        KeyGuard {
            locks: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    /// Number of keys with a live lock entry
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: &EntityKey) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the table itself still references the lock: no holder, no waiter
        if table.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            table.remove(key);
        }
    }
}

/// Held exclusion on one identity
pub struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: EntityKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Drop the owned guard (and its Arc) before pruning the table
        self.guard.take();
        self.locks.release(&self.key);
        debug!(key = %self.key, "KeyGuard::drop: released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_excludes() {
        let locks = Arc::new(KeyLocks::new());
        let key = EntityKey::Habit("h1".to_string());

        let first = locks.acquire(&key).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            let key = key.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&key).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_disjoint_keys_do_not_contend() {
        let locks = KeyLocks::new();
        let _a = locks.acquire(&EntityKey::Task("a".to_string())).await;
        let _b = locks.acquire(&EntityKey::Task("b".to_string())).await;
        let _facts = locks.acquire(&EntityKey::Facts).await;
        assert_eq!(locks.len(), 3);
    }

    #[tokio::test]
    async fn test_table_is_pruned_after_release() {
        let locks = KeyLocks::new();
        {
            let _guard = locks.acquire(&EntityKey::Facts).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }
}
