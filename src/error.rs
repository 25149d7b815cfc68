//! Error types for pgscope.
//!
//! All failures are expressed as [`SchemaError`] via `thiserror`. Validation
//! errors are produced before any database round trip; database-originated
//! errors keep the full detail for server-side logs while the client-facing
//! projection (`client_code` / `client_message`) only ever carries a safe,
//! generic message.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid identifier for {field}: {value:?}")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("type {requested:?} is not in the allowed type list")]
    InvalidType { requested: String },

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("unknown database: {database}")]
    UnknownDatabase { database: String },

    #[error("connection failed: {message}")]
    Connection { message: String },

    #[error("query timeout during {operation}")]
    QueryTimeout { operation: &'static str },

    #[error("scan failed during {operation}: {message}")]
    Scan {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} rejected by database: {message}")]
    Execution {
        operation: &'static str,
        /// e.g. "42P07" for duplicate table
        sql_state: Option<String>,
        message: String,
    },
}

impl SchemaError {
    pub fn invalid_identifier(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            field,
            value: value.into(),
        }
    }

    pub fn invalid_type(requested: impl Into<String>) -> Self {
        Self::InvalidType {
            requested: requested.into(),
        }
    }

    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    pub fn unknown_database(database: impl Into<String>) -> Self {
        Self::UnknownDatabase {
            database: database.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn timeout(operation: &'static str) -> Self {
        Self::QueryTimeout { operation }
    }

    /// Categorize an sqlx error raised while running `operation`.
    pub fn from_sqlx(operation: &'static str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => Self::Execution {
                operation,
                sql_state: db_err.code().map(|c| c.to_string()),
                message: db_err.message().to_string(),
            },
            sqlx::Error::ColumnDecode { index, source } => Self::Scan {
                operation,
                message: format!("failed to decode column {index}: {source}"),
            },
            sqlx::Error::Decode(source) => Self::Scan {
                operation,
                message: source.to_string(),
            },
            sqlx::Error::ColumnNotFound(col) => Self::Scan {
                operation,
                message: format!("column not found: {col}"),
            },
            sqlx::Error::PoolTimedOut => Self::QueryTimeout { operation },
            sqlx::Error::Io(io_err) => Self::Connection {
                message: format!("I/O error: {io_err}"),
            },
            sqlx::Error::Tls(tls_err) => Self::Connection {
                message: format!("TLS error: {tls_err}"),
            },
            sqlx::Error::Protocol(msg) => Self::Connection {
                message: format!("protocol error: {msg}"),
            },
            sqlx::Error::Configuration(msg) => Self::Connection {
                message: msg.to_string(),
            },
            sqlx::Error::PoolClosed => Self::Connection {
                message: "connection pool is closed".to_string(),
            },
            other => Self::Connection {
                message: other.to_string(),
            },
        }
    }

    /// True for errors detected before any database call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. } | Self::InvalidType { .. } | Self::MissingField { .. }
        )
    }

    /// Stable machine-readable code for API responses.
    pub fn client_code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { field, .. } => match *field {
                "table name" => "INVALID_TABLE_NAME",
                "column name" => "INVALID_COLUMN_NAME",
                _ => "INVALID_IDENTIFIER",
            },
            Self::InvalidType { .. } => "INVALID_TYPE",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::UnknownDatabase { .. } => "UNKNOWN_DATABASE",
            Self::Connection { .. } => "CONNECTION_ERROR",
            Self::QueryTimeout { .. } => "QUERY_TIMEOUT",
            Self::Scan { .. } => "SCHEMA_ERROR",
            Self::Execution { .. } => "DATABASE_ERROR",
        }
    }

    /// Message safe to return to an external caller. Validation errors are
    /// descriptive; database-originated errors are reduced to a generic
    /// category so raw server text never leaks schema details.
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidIdentifier { field, .. } => format!(
                "Invalid {field}: must be lowercase letters, digits, and underscores, \
                 starting with a letter or underscore (max 63 bytes)"
            ),
            Self::InvalidType { .. } => "Invalid column type".to_string(),
            Self::MissingField { field } => format!("{field} is required"),
            Self::UnknownDatabase { .. } => "Database not found".to_string(),
            Self::Connection { .. } => "Failed to connect to database".to_string(),
            Self::QueryTimeout { .. } => "Query timed out".to_string(),
            Self::Scan { .. } => "Failed to load schema".to_string(),
            Self::Execution { operation, .. } => format!("Failed to {operation}"),
        }
    }

    /// HTTP status for the API layer.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidIdentifier { .. }
            | Self::InvalidType { .. }
            | Self::MissingField { .. }
            | Self::UnknownDatabase { .. } => StatusCode::BAD_REQUEST,
            Self::QueryTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Connection { .. } | Self::Scan { .. } | Self::Execution { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_flagged() {
        assert!(SchemaError::invalid_identifier("table name", "Users").is_validation());
        assert!(SchemaError::invalid_type("varchar(99)").is_validation());
        assert!(SchemaError::missing_field("name").is_validation());
        assert!(!SchemaError::connection("refused").is_validation());
    }

    #[test]
    fn test_client_code_distinguishes_identifier_fields() {
        let table = SchemaError::invalid_identifier("table name", "Bad");
        let column = SchemaError::invalid_identifier("column name", "Bad");
        let fk = SchemaError::invalid_identifier("reference table", "Bad");
        assert_eq!(table.client_code(), "INVALID_TABLE_NAME");
        assert_eq!(column.client_code(), "INVALID_COLUMN_NAME");
        assert_eq!(fk.client_code(), "INVALID_IDENTIFIER");
    }

    #[test]
    fn test_client_message_hides_database_detail() {
        let err = SchemaError::Execution {
            operation: "create table",
            sql_state: Some("42P07".to_string()),
            message: "relation \"users\" already exists".to_string(),
        };
        let msg = err.client_message();
        assert!(!msg.contains("users"), "client message leaked: {msg}");
        assert!(!msg.contains("42P07"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SchemaError::unknown_database("missing").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SchemaError::timeout("load schema").status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            SchemaError::connection("refused").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_sqlx_pool_timeout() {
        let err = SchemaError::from_sqlx("load schema", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, SchemaError::QueryTimeout { .. }));
    }

    #[test]
    fn test_from_sqlx_pool_closed_is_connection() {
        let err = SchemaError::from_sqlx("list databases", sqlx::Error::PoolClosed);
        assert!(matches!(err, SchemaError::Connection { .. }));
    }
}
