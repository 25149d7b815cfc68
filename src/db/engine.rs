//! The schema engine: composition root wiring the pool lifecycle manager,
//! the introspection reader, and the DDL synthesizer into one object the
//! HTTP boundary talks to.
//!
//! Every operation that touches the database is bounded by the configured
//! query timeout, clamped by the caller's deadline when one is supplied: the
//! engine never grants an operation more time than the boundary intended.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::PgPool;
use tracing::info;

use crate::db::pool::{self, PoolManager};
use crate::db::validate::TYPE_CATALOG;
use crate::db::{ddl, introspect};
use crate::error::{SchemaError, SchemaResult};
use crate::models::{ColumnRequest, Schema, TypeInfo};

/// Capability for building a connection URL for a named database. Supplied
/// by the configuration layer; the engine never parses connection strings.
pub trait ConnectUrl: Send + Sync {
    fn url_for(&self, database: &str) -> String;
}

/// Tunables handed to the engine at construction.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub query_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_connections: u32,
}

pub struct SchemaEngine {
    pools: PoolManager<PgPool>,
    urls: Arc<dyn ConnectUrl>,
    options: EngineOptions,
}

/// Time budget for an operation: the configured timeout, unless the caller's
/// remaining deadline is shorter, in which case the caller's budget is
/// preserved unchanged.
fn effective_timeout(configured: Duration, deadline: Option<Instant>) -> Duration {
    match deadline {
        Some(d) => configured.min(d.saturating_duration_since(Instant::now())),
        None => configured,
    }
}

impl SchemaEngine {
    pub fn new(
        pool: PgPool,
        database: impl Into<String>,
        urls: Arc<dyn ConnectUrl>,
        options: EngineOptions,
    ) -> Self {
        Self {
            pools: PoolManager::new(pool, database, options.query_timeout),
            urls,
            options,
        }
    }

    async fn bounded<T, F>(
        &self,
        operation: &'static str,
        deadline: Option<Instant>,
        fut: F,
    ) -> SchemaResult<T>
    where
        F: Future<Output = SchemaResult<T>>,
    {
        let budget = effective_timeout(self.options.query_timeout, deadline);
        match tokio::time::timeout(budget, fut).await {
            Ok(result) => result,
            Err(_) => Err(SchemaError::timeout(operation)),
        }
    }

    /// Name of the currently connected database. No database round trip.
    pub async fn current_database(&self) -> String {
        self.pools.database().await
    }

    /// The static allow-listed type catalog, for client-side display.
    pub fn types(&self) -> &'static [TypeInfo] {
        TYPE_CATALOG
    }

    pub async fn list_databases(&self, deadline: Option<Instant>) -> SchemaResult<Vec<String>> {
        let (pool, _) = self.pools.current().await;
        self.bounded("list databases", deadline, introspect::list_databases(&pool))
            .await
    }

    pub async fn get_schema(&self, deadline: Option<Instant>) -> SchemaResult<Schema> {
        let (pool, _) = self.pools.current().await;
        self.bounded("load schema", deadline, introspect::get_schema(&pool))
            .await
    }

    /// Commit a new pool for `database`, or leave the current one in place on
    /// any failure. Connect and ping run before the swap, outside any lock,
    /// so in-flight readers keep the previous pool until the candidate has
    /// proven reachable. The replaced pool drains in the background.
    pub async fn switch_database(
        &self,
        database: &str,
        deadline: Option<Instant>,
    ) -> SchemaResult<()> {
        let known = self.list_databases(deadline).await?;
        if !known.iter().any(|d| d == database) {
            return Err(SchemaError::unknown_database(database));
        }

        let url = self.urls.url_for(database);
        let budget = effective_timeout(self.options.query_timeout, deadline);
        let candidate = tokio::time::timeout(
            budget,
            pool::connect(&url, self.options.max_connections, self.options.connect_timeout),
        )
        .await
        .map_err(|_| SchemaError::connection("connect timed out"))??;

        if let Err(e) = tokio::time::timeout(budget, pool::ping(&candidate))
            .await
            .map_err(|_| SchemaError::connection("ping timed out"))
            .and_then(|r| r)
        {
            candidate.close().await;
            return Err(e);
        }

        let old = self.pools.swap(candidate, database).await;
        self.pools.drain(old);
        info!(database = %database, "switched database");
        Ok(())
    }

    pub async fn create_table(
        &self,
        table_name: &str,
        deadline: Option<Instant>,
    ) -> SchemaResult<()> {
        const OP: &str = "create table";
        let stmt = ddl::build_create_table(table_name)?;
        let (pool, _) = self.pools.current().await;
        self.bounded(OP, deadline, async {
            sqlx::query(&stmt)
                .execute(&pool)
                .await
                .map(|_| ())
                .map_err(|e| SchemaError::from_sqlx(OP, e))
        })
        .await?;
        info!(table = %table_name, "created table");
        Ok(())
    }

    pub async fn add_column(
        &self,
        table_name: &str,
        request: ColumnRequest,
        deadline: Option<Instant>,
    ) -> SchemaResult<()> {
        const OP: &str = "add column";
        let spec = ddl::ColumnSpec::from(request);
        let stmt = ddl::build_add_column(table_name, &spec)?;
        let (pool, _) = self.pools.current().await;
        self.bounded(OP, deadline, async {
            sqlx::query(&stmt)
                .execute(&pool)
                .await
                .map(|_| ())
                .map_err(|e| SchemaError::from_sqlx(OP, e))
        })
        .await?;
        info!(table = %table_name, column = %spec.name, "added column");
        Ok(())
    }

    /// Close the live pool. Called once at process shutdown.
    pub async fn close(&self) {
        let (pool, _) = self.pools.current().await;
        pool.close().await;
    }
}
