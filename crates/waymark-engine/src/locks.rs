//! Keyed async locks for per-beacon and per-user serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A registry of named async mutexes.
///
/// The store offers last-writer-wins semantics per key, so every
/// read-check-write span against a hot key (beacon scan counters, quota
/// counters) must be serialized in-process. Cloning shares the
/// registry.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        // The guarded map cannot be left half-modified, so a poisoned
        // registry is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Acquire the lock for `key`, creating it on first use. The
    /// registry itself is only held long enough to clone the entry.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .map()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop registry entries nobody currently holds or awaits, keeping
    /// the map proportional to the active key set.
    pub fn purge_idle(&self) {
        self.map().retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_key_is_mutually_exclusive() {
        let locks = KeyedLocks::new();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..8u32 {
            let locks = locks.clone();
            let hits = hits.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("beacon:plaza-01").await;
                hits.lock().unwrap().push(("enter", i));
                tokio::time::sleep(Duration::from_millis(2)).await;
                hits.lock().unwrap().push(("exit", i));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Entries and exits must strictly alternate: no task enters
        // while another is inside the critical section.
        let hits = hits.lock().unwrap();
        assert_eq!(hits.len(), 16);
        for pair in hits.chunks(2) {
            assert_eq!(pair[0].0, "enter");
            assert_eq!(pair[1].0, "exit");
            assert_eq!(pair[0].1, pair[1].1);
        }
    }

    #[tokio::test]
    async fn different_keys_do_not_contend() {
        let locks = KeyedLocks::new();
        let _a = locks.acquire("a").await;
        // Completes immediately despite `a` being held.
        let _b = locks.acquire("b").await;
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn purge_idle_keeps_held_locks() {
        let locks = KeyedLocks::new();
        {
            let _guard = locks.acquire("held").await;
            let _released = locks.acquire("released-later").await;
            drop(_released);

            locks.purge_idle();
            assert_eq!(locks.len(), 1, "held lock must survive the purge");
        }
        locks.purge_idle();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn reacquire_after_purge_works() {
        let locks = KeyedLocks::new();
        drop(locks.acquire("k").await);
        locks.purge_idle();
        let _guard = locks.acquire("k").await;
        assert_eq!(locks.len(), 1);
    }
}
