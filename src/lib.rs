//! pgscope library
//!
//! Browse and lightly mutate the schema of a running PostgreSQL instance
//! over HTTP: list databases, introspect tables and foreign keys in a
//! bounded number of catalog queries, create tables, add columns, and switch
//! between databases without breaking in-flight requests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::Config;
pub use db::SchemaEngine;
pub use error::{SchemaError, SchemaResult};
