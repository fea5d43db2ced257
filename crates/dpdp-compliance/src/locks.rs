//! Per-client write serialization.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// One mutex per client id.
///
/// Writes to the same client run one at a time; writes to different
/// clients never contend beyond the brief map lookup. An id's entry lives
/// only while some caller holds or waits for its lock.
#[derive(Debug, Default)]
pub struct ClientLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ClientLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the client's lock.
    pub fn with_client_lock<T>(&self, client_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(client_id);
        let result = {
            let _guard = lock.lock();
            f()
        };
        self.release(client_id, lock);
        result
    }

    fn lock_for(&self, client_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(
            locks
                .entry(client_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    // Entries are only cloned under the map lock, so a count of one there
    // means nobody else holds or awaits this client's lock.
    fn release(&self, client_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock();
        drop(lock);
        if locks
            .get(client_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(client_id);
        }
    }

    /// Number of clients whose lock is held or awaited.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    #[test]
    fn test_same_client_is_serialized() {
        let locks = ClientLocks::new();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    locks.with_client_lock("c", || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_different_clients_do_not_block() {
        let locks = ClientLocks::new();
        let barrier = Barrier::new(2);

        // Both closures must be inside their locks at once to pass the barrier.
        std::thread::scope(|s| {
            for client in ["a", "b"] {
                let locks = &locks;
                let barrier = &barrier;
                s.spawn(move || {
                    locks.with_client_lock(client, || {
                        barrier.wait();
                    });
                });
            }
        });

        assert!(locks.is_empty());
    }

    #[test]
    fn test_entry_lives_while_the_lock_is_held() {
        let locks = ClientLocks::new();
        let held = locks.with_client_lock("c", || locks.len());
        assert_eq!(held, 1);
        assert!(locks.is_empty());

        let nested = locks.with_client_lock("a", || locks.with_client_lock("b", || locks.len()));
        assert_eq!(nested, 2);
        assert!(locks.is_empty());
    }
}
