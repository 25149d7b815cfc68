//! Concurrency properties of the pool lifecycle manager, exercised over a
//! mock pool so no database server is needed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use pgscope::db::pool::{Drainable, PoolManager};

/// Shared counters recording close activity across all pools in a test.
#[derive(Default)]
struct CloseTracker {
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    overlap_seen: AtomicBool,
}

#[derive(Clone)]
struct TrackedPool {
    id: usize,
    tracker: Arc<CloseTracker>,
}

impl TrackedPool {
    fn new(id: usize, tracker: &Arc<CloseTracker>) -> Self {
        Self {
            id,
            tracker: Arc::clone(tracker),
        }
    }
}

impl Drainable for TrackedPool {
    async fn close(&self) {
        let concurrent = self.tracker.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        if concurrent > 1 {
            self.tracker.overlap_seen.store(true, Ordering::SeqCst);
        }
        // Long enough that unserialized drains would overlap.
        tokio::time::sleep(Duration::from_millis(30)).await;
        self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.tracker.completed.fetch_add(1, Ordering::SeqCst);
    }
}

async fn wait_for_closes(tracker: &CloseTracker, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while tracker.completed.load(Ordering::SeqCst) < expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("drains did not complete in time");
}

/// Two back-to-back switches produce exactly two close attempts, serialized
/// by the dedicated close lock.
#[tokio::test]
async fn test_back_to_back_switches_drain_serially() {
    let tracker = Arc::new(CloseTracker::default());
    let manager = PoolManager::new(
        TrackedPool::new(0, &tracker),
        "db0",
        Duration::from_secs(1),
    );

    let old = manager.swap(TrackedPool::new(1, &tracker), "db1").await;
    manager.drain(old);
    let old = manager.swap(TrackedPool::new(2, &tracker), "db2").await;
    manager.drain(old);

    wait_for_closes(&tracker, 2).await;
    assert_eq!(tracker.completed.load(Ordering::SeqCst), 2);
    assert!(
        !tracker.overlap_seen.load(Ordering::SeqCst),
        "old-pool closes overlapped"
    );
    assert_eq!(manager.database().await, "db2");
}

/// Readers hammering `current()` during repeated swaps never observe a torn
/// pair: the pool id always matches the database name it was committed with.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_current_never_returns_torn_pair() {
    let tracker = Arc::new(CloseTracker::default());
    let manager = PoolManager::new(
        TrackedPool::new(0, &tracker),
        "db0",
        Duration::from_secs(1),
    );

    let mut readers = Vec::new();
    for _ in 0..4 {
        let manager = manager.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..500 {
                let (pool, name) = manager.current().await;
                assert_eq!(
                    name,
                    format!("db{}", pool.id),
                    "pool and database name out of sync"
                );
                tokio::task::yield_now().await;
            }
        }));
    }

    let writer = {
        let manager = manager.clone();
        let tracker = Arc::clone(&tracker);
        tokio::spawn(async move {
            for id in 1..=20 {
                let old = manager
                    .swap(TrackedPool::new(id, &tracker), format!("db{id}"))
                    .await;
                manager.drain(old);
                tokio::task::yield_now().await;
            }
        })
    };

    for reader in readers {
        reader.await.unwrap();
    }
    writer.await.unwrap();

    wait_for_closes(&tracker, 20).await;
    assert!(!tracker.overlap_seen.load(Ordering::SeqCst));
    assert_eq!(manager.database().await, "db20");
}

/// A reader that obtained the pool before a swap can keep using its clone;
/// the swap alone never closes anything.
#[tokio::test]
async fn test_pre_swap_reader_keeps_its_pool() {
    let tracker = Arc::new(CloseTracker::default());
    let manager = PoolManager::new(
        TrackedPool::new(0, &tracker),
        "db0",
        Duration::from_secs(1),
    );

    let (held, _) = manager.current().await;
    let old = manager.swap(TrackedPool::new(1, &tracker), "db1").await;
    assert_eq!(
        tracker.completed.load(Ordering::SeqCst),
        0,
        "swap must not close the old pool"
    );
    assert_eq!(held.id, old.id);

    manager.drain(old);
    wait_for_closes(&tracker, 1).await;
    assert_eq!(tracker.completed.load(Ordering::SeqCst), 1);
}
