//! Batched schema introspection against the PostgreSQL system catalogs.
//!
//! A full snapshot costs at most three queries regardless of table count:
//! one for table names, one for all columns of all tables, one for all
//! single-column foreign keys. Introspection runs on every UI refresh, so
//! the per-table N+1 alternative is deliberately avoided. Rows are grouped
//! by table name and merged into the table list, preserving the catalog's
//! ordinal ordering within each table.

use std::collections::HashMap;

use sqlx::{PgPool, Row};
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::models::{Column, ForeignKey, Schema, Table};

mod queries {
    /// User databases only; templates and the maintenance database are not
    /// browsable targets.
    pub const LIST_DATABASES: &str = r#"
        SELECT datname FROM pg_database
        WHERE datistemplate = false
          AND datname NOT IN ('postgres', 'template0', 'template1')
        ORDER BY datname
        "#;

    pub const LIST_TABLES: &str = r#"
        SELECT table_name
        FROM information_schema.tables
        WHERE table_schema = 'public'
          AND table_type = 'BASE TABLE'
        ORDER BY table_name
        "#;

    /// All columns of all public tables in one pass, joined against the
    /// primary-key constraint catalog and against unique constraints
    /// restricted to single-column ones.
    pub const LIST_COLUMNS: &str = r#"
        SELECT
            c.table_name,
            c.column_name,
            c.data_type,
            c.is_nullable = 'YES' AS is_nullable,
            c.column_default,
            COALESCE(pk.is_pk, false) AS is_primary,
            COALESCE(uq.is_unique, false) AS is_unique
        FROM information_schema.columns c
        LEFT JOIN (
            SELECT DISTINCT kcu.table_name, kcu.column_name, true AS is_pk
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema = 'public'
        ) pk ON c.table_name = pk.table_name AND c.column_name = pk.column_name
        LEFT JOIN (
            SELECT DISTINCT kcu.table_name, kcu.column_name, true AS is_unique
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
            WHERE tc.constraint_type = 'UNIQUE'
              AND tc.table_schema = 'public'
              AND (SELECT COUNT(*) FROM information_schema.key_column_usage kcu2
                   WHERE kcu2.constraint_name = tc.constraint_name
                     AND kcu2.table_schema = tc.table_schema) = 1
        ) uq ON c.table_name = uq.table_name AND c.column_name = uq.column_name
        WHERE c.table_schema = 'public'
        ORDER BY c.table_name, c.ordinal_position
        "#;

    /// All foreign keys of all public tables in one pass. Composite foreign
    /// keys come back flattened into one row per participating column.
    pub const LIST_FOREIGN_KEYS: &str = r#"
        SELECT
            tc.table_name,
            kcu.column_name,
            ccu.table_name AS references_table,
            ccu.column_name AS references_column
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
          ON tc.constraint_name = kcu.constraint_name
         AND tc.table_schema = kcu.table_schema
        JOIN information_schema.constraint_column_usage ccu
          ON ccu.constraint_name = tc.constraint_name
         AND ccu.table_schema = tc.table_schema
        WHERE tc.constraint_type = 'FOREIGN KEY'
          AND tc.table_schema = 'public'
        ORDER BY tc.table_name, kcu.column_name
        "#;
}

/// List all user databases on the server, sorted lexicographically.
pub async fn list_databases(pool: &PgPool) -> SchemaResult<Vec<String>> {
    const OP: &str = "list databases";
    let rows = sqlx::query(queries::LIST_DATABASES)
        .fetch_all(pool)
        .await
        .map_err(|e| SchemaError::from_sqlx(OP, e))?;

    let mut databases = Vec::with_capacity(rows.len());
    for row in &rows {
        databases.push(
            row.try_get::<String, _>("datname")
                .map_err(|e| SchemaError::from_sqlx(OP, e))?,
        );
    }
    debug!(count = databases.len(), "listed databases");
    Ok(databases)
}

/// Produce a complete schema snapshot for the public namespace.
///
/// Issues the table query first; when the database has no tables, the
/// column and foreign-key queries are skipped entirely.
pub async fn get_schema(pool: &PgPool) -> SchemaResult<Schema> {
    let tables = fetch_table_names(pool).await?;
    if tables.is_empty() {
        return Ok(Schema::empty());
    }

    let columns = fetch_columns(pool).await?;
    let foreign_keys = fetch_foreign_keys(pool).await?;

    let schema = assemble(tables, columns, foreign_keys);
    debug!(tables = schema.tables.len(), "assembled schema snapshot");
    Ok(schema)
}

async fn fetch_table_names(pool: &PgPool) -> SchemaResult<Vec<String>> {
    const OP: &str = "list tables";
    let rows = sqlx::query(queries::LIST_TABLES)
        .fetch_all(pool)
        .await
        .map_err(|e| SchemaError::from_sqlx(OP, e))?;

    let mut names = Vec::with_capacity(rows.len());
    for row in &rows {
        names.push(
            row.try_get::<String, _>("table_name")
                .map_err(|e| SchemaError::from_sqlx(OP, e))?,
        );
    }
    Ok(names)
}

async fn fetch_columns(pool: &PgPool) -> SchemaResult<HashMap<String, Vec<Column>>> {
    const OP: &str = "load columns";
    let rows = sqlx::query(queries::LIST_COLUMNS)
        .fetch_all(pool)
        .await
        .map_err(|e| SchemaError::from_sqlx(OP, e))?;

    let mut by_table: HashMap<String, Vec<Column>> = HashMap::new();
    for row in &rows {
        let table: String = row
            .try_get("table_name")
            .map_err(|e| SchemaError::from_sqlx(OP, e))?;
        let column = Column {
            name: row
                .try_get("column_name")
                .map_err(|e| SchemaError::from_sqlx(OP, e))?,
            data_type: row
                .try_get("data_type")
                .map_err(|e| SchemaError::from_sqlx(OP, e))?,
            is_nullable: row
                .try_get("is_nullable")
                .map_err(|e| SchemaError::from_sqlx(OP, e))?,
            is_primary: row
                .try_get("is_primary")
                .map_err(|e| SchemaError::from_sqlx(OP, e))?,
            is_unique: row
                .try_get("is_unique")
                .map_err(|e| SchemaError::from_sqlx(OP, e))?,
            default: row
                .try_get("column_default")
                .map_err(|e| SchemaError::from_sqlx(OP, e))?,
        };
        by_table.entry(table).or_default().push(column);
    }
    Ok(by_table)
}

async fn fetch_foreign_keys(pool: &PgPool) -> SchemaResult<HashMap<String, Vec<ForeignKey>>> {
    const OP: &str = "load foreign keys";
    let rows = sqlx::query(queries::LIST_FOREIGN_KEYS)
        .fetch_all(pool)
        .await
        .map_err(|e| SchemaError::from_sqlx(OP, e))?;

    let mut by_table: HashMap<String, Vec<ForeignKey>> = HashMap::new();
    for row in &rows {
        let table: String = row
            .try_get("table_name")
            .map_err(|e| SchemaError::from_sqlx(OP, e))?;
        let fk = ForeignKey {
            column_name: row
                .try_get("column_name")
                .map_err(|e| SchemaError::from_sqlx(OP, e))?,
            references_table: row
                .try_get("references_table")
                .map_err(|e| SchemaError::from_sqlx(OP, e))?,
            references_column: row
                .try_get("references_column")
                .map_err(|e| SchemaError::from_sqlx(OP, e))?,
        };
        by_table.entry(table).or_default().push(fk);
    }
    Ok(by_table)
}

/// Merge grouped columns and foreign keys into the ordered table list.
/// Within each table the input vectors already carry catalog order (ordinal
/// position for columns, column name for foreign keys), which is preserved.
fn assemble(
    table_names: Vec<String>,
    mut columns: HashMap<String, Vec<Column>>,
    mut foreign_keys: HashMap<String, Vec<ForeignKey>>,
) -> Schema {
    let tables = table_names
        .into_iter()
        .map(|name| {
            let cols = columns.remove(&name).unwrap_or_default();
            let fks = foreign_keys.remove(&name).unwrap_or_default();
            Table {
                name,
                columns: cols,
                foreign_keys: fks,
            }
        })
        .collect();
    Schema { tables }
}
