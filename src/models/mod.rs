//! Data models for pgscope.

pub mod schema;

pub use schema::{
    Column, ColumnRequest, ForeignKey, ForeignKeyRef, Schema, Table, TypeCategory, TypeInfo,
};
