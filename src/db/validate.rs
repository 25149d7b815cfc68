//! Identifier and type validation for the DDL path.
//!
//! Everything that gets interpolated into statement text passes through this
//! module first. The identifier rule is deliberately narrower than what
//! PostgreSQL itself would accept: lowercase ASCII only, no quoting tricks,
//! no case folding. Types must match the frozen catalog exactly.

use crate::models::{TypeCategory, TypeInfo};

/// Check that a name is a safe SQL identifier: non-empty, at most 63 bytes
/// (the Postgres identifier limit), first byte `[a-z_]`, rest `[a-z0-9_]`.
pub fn is_valid_identifier(name: &str) -> bool {
    if name.is_empty() || name.len() > 63 {
        return false;
    }
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b'a'..=b'z') | Some(b'_') => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Wrap an identifier in double quotes, doubling any embedded quote.
///
/// The validator's character set already excludes `"`, so the doubling is
/// defense in depth rather than a reachable code path for validated input.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// The frozen allow-list of column types the mutation path accepts.
///
/// This is the single source of truth shared with the client (served at
/// `/api/types`). Introspection is never constrained by it. Matches are
/// exact and case-sensitive; `varchar(n)`, arrays, and custom types are
/// rejected rather than coerced.
pub const TYPE_CATALOG: &[TypeInfo] = &[
    TypeInfo {
        name: "text",
        description: "Variable-length character string",
        category: TypeCategory::Character,
    },
    TypeInfo {
        name: "integer",
        description: "32-bit signed integer",
        category: TypeCategory::Numeric,
    },
    TypeInfo {
        name: "bigint",
        description: "64-bit signed integer",
        category: TypeCategory::Numeric,
    },
    TypeInfo {
        name: "numeric",
        description: "Arbitrary-precision decimal",
        category: TypeCategory::Numeric,
    },
    TypeInfo {
        name: "real",
        description: "32-bit floating point",
        category: TypeCategory::Numeric,
    },
    TypeInfo {
        name: "double precision",
        description: "64-bit floating point",
        category: TypeCategory::Numeric,
    },
    TypeInfo {
        name: "boolean",
        description: "True/false value",
        category: TypeCategory::Boolean,
    },
    TypeInfo {
        name: "date",
        description: "Calendar date without time of day",
        category: TypeCategory::DateTime,
    },
    TypeInfo {
        name: "time",
        description: "Time of day without date",
        category: TypeCategory::DateTime,
    },
    TypeInfo {
        name: "timestamp",
        description: "Date and time without time zone",
        category: TypeCategory::DateTime,
    },
    TypeInfo {
        name: "timestamptz",
        description: "Date and time with time zone",
        category: TypeCategory::DateTime,
    },
    TypeInfo {
        name: "interval",
        description: "Span of time",
        category: TypeCategory::DateTime,
    },
    TypeInfo {
        name: "json",
        description: "Textual JSON document",
        category: TypeCategory::Json,
    },
    TypeInfo {
        name: "jsonb",
        description: "Binary JSON document with indexing support",
        category: TypeCategory::Json,
    },
    TypeInfo {
        name: "uuid",
        description: "Universally unique identifier",
        category: TypeCategory::Identifier,
    },
    TypeInfo {
        name: "bytea",
        description: "Variable-length binary data",
        category: TypeCategory::Binary,
    },
    TypeInfo {
        name: "inet",
        description: "IPv4 or IPv6 host address",
        category: TypeCategory::Network,
    },
];

/// Exact, case-sensitive membership check against [`TYPE_CATALOG`].
pub fn is_allowed_type(data_type: &str) -> bool {
    TYPE_CATALOG.iter().any(|t| t.name == data_type)
}
