//! Connection pool lifecycle management.
//!
//! [`PoolManager`] owns the single authoritative `(pool, database)` pair and
//! lets it be replaced atomically while introspection reads are in flight.
//! Readers take a clone of the pair under a read lock and never hold the
//! lock across a query. Replaced pools are drained in the background with a
//! bounded wait; a dedicated lock keeps at most one drain running at a time
//! so a burst of database switches cannot pile up concurrent closes.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::error::{SchemaError, SchemaResult};

/// Floor for the old-pool drain wait regardless of the configured timeout.
pub const MIN_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that can be closed like a connection pool. Seam between the
/// lifecycle logic and sqlx so the swap/drain behavior is testable without a
/// running server.
pub trait Drainable: Clone + Send + Sync + 'static {
    fn close(&self) -> impl Future<Output = ()> + Send;
}

impl Drainable for PgPool {
    async fn close(&self) {
        PgPool::close(self).await;
    }
}

struct Active<P> {
    pool: P,
    database: String,
}

struct Inner<P> {
    active: RwLock<Active<P>>,
    /// Serializes old-pool drains. Independent from `active`'s lock: it
    /// guards against concurrent-close overload, not read consistency.
    close_lock: Mutex<()>,
    drain_timeout: Duration,
}

/// Owner of the live `(pool, database)` pair.
#[derive(Clone)]
pub struct PoolManager<P: Drainable> {
    inner: Arc<Inner<P>>,
}

impl<P: Drainable> PoolManager<P> {
    /// Create a manager around the initial pool. The drain timeout is
    /// `max(2 * query_timeout, 5s)`.
    pub fn new(pool: P, database: impl Into<String>, query_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                active: RwLock::new(Active {
                    pool,
                    database: database.into(),
                }),
                close_lock: Mutex::new(()),
                drain_timeout: (query_timeout * 2).max(MIN_DRAIN_TIMEOUT),
            }),
        }
    }

    /// The live pair. Always fully consistent: a reader sees either the
    /// previous pair or the new one, never a mix. The returned pool may be
    /// swapped out and drained concurrently; callers must not keep it past
    /// the operation that obtained it.
    pub async fn current(&self) -> (P, String) {
        let active = self.inner.active.read().await;
        (active.pool.clone(), active.database.clone())
    }

    /// Name of the currently connected database.
    pub async fn database(&self) -> String {
        self.inner.active.read().await.database.clone()
    }

    /// Atomically replace the pair, returning the previous pool. The caller
    /// must have verified the new pool is reachable before calling this;
    /// connect and ping happen outside the lock so readers are never blocked
    /// on a slow handshake.
    pub async fn swap(&self, pool: P, database: impl Into<String>) -> P {
        let mut active = self.inner.active.write().await;
        let old = std::mem::replace(
            &mut *active,
            Active {
                pool,
                database: database.into(),
            },
        );
        old.pool
    }

    /// Close a replaced pool in the background with a bounded wait. Returns
    /// immediately; the spawned task takes the close-serialization lock, so
    /// drains from rapid back-to-back switches run one at a time. If the
    /// close does not finish within the bound it is abandoned and the
    /// driver's own idle reclamation takes over.
    pub fn drain(&self, old: P) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _serialized = inner.close_lock.lock().await;
            match tokio::time::timeout(inner.drain_timeout, old.close()).await {
                Ok(()) => info!("old connection pool closed"),
                Err(_) => warn!(
                    timeout_secs = inner.drain_timeout.as_secs(),
                    "old connection pool close timed out, abandoning"
                ),
            }
        });
    }

    /// The bounded wait applied to each old-pool close.
    pub fn drain_timeout(&self) -> Duration {
        self.inner.drain_timeout
    }
}

/// Open a PostgreSQL pool for the given connection URL.
pub async fn connect(
    url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> SchemaResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .test_before_acquire(true)
        .connect(url)
        .await
        .map_err(|e| SchemaError::connection(format!("failed to connect: {e}")))
}

/// Verify a pool can actually serve queries.
pub async fn ping(pool: &PgPool) -> SchemaResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| SchemaError::connection(format!("ping failed: {e}")))
}
