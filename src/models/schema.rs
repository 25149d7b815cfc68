//! Wire models for schema introspection and mutation requests.
//!
//! Field names follow the JSON contract the browser client expects
//! (camelCase), so every type carries `#[serde(rename_all = "camelCase")]`.
//! These values are rebuilt from the system catalogs on every introspection
//! call and discarded after serialization; nothing here is cached.

use serde::{Deserialize, Serialize};

/// A complete snapshot of the public namespace, tables in lexicographic order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn empty() -> Self {
        Self { tables: Vec::new() }
    }
}

/// A base table with columns and foreign keys in catalog order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    /// Raw catalog type string. Deliberately not filtered through the
    /// mutation allow-list: introspection reflects whatever exists.
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary: bool,
    /// True only when the column participates in a single-column unique
    /// constraint. Composite unique constraints are invisible here (known
    /// limitation).
    pub is_unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// One row per single-column foreign key constraint. Composite foreign keys
/// appear as multiple independent rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub column_name: String,
    pub references_table: String,
    pub references_column: String,
}

/// Static catalog entry describing a column type the mutation path accepts.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub category: TypeCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    Character,
    Numeric,
    Boolean,
    DateTime,
    Json,
    Identifier,
    Binary,
    Network,
}

/// Foreign key target supplied with an add-column request. Only the
/// reference fields are read; the clause is emitted when both are non-empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyRef {
    #[serde(default)]
    pub references_table: String,
    #[serde(default)]
    pub references_column: String,
}

/// JSON-decoded, not yet validated add-column request body.
///
/// `nullable` defaults to false: columns are NOT NULL unless the caller
/// explicitly opts in to nullability.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRequest {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub foreign_key: Option<ForeignKeyRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_serializes_camel_case() {
        let col = Column {
            name: "created_at".to_string(),
            data_type: "timestamptz".to_string(),
            is_nullable: false,
            is_primary: false,
            is_unique: false,
            default: Some("now()".to_string()),
        };
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["dataType"], "timestamptz");
        assert_eq!(json["isNullable"], false);
        assert_eq!(json["default"], "now()");
    }

    #[test]
    fn test_column_default_omitted_when_none() {
        let col = Column {
            name: "id".to_string(),
            data_type: "integer".to_string(),
            is_nullable: false,
            is_primary: true,
            is_unique: false,
            default: None,
        };
        let json = serde_json::to_value(&col).unwrap();
        assert!(json.get("default").is_none());
    }

    #[test]
    fn test_column_request_defaults() {
        let req: ColumnRequest =
            serde_json::from_str(r#"{"name":"email","type":"text"}"#).unwrap();
        assert_eq!(req.name, "email");
        assert_eq!(req.data_type, "text");
        assert!(!req.nullable, "columns default to NOT NULL");
        assert!(!req.primary_key);
        assert!(!req.unique);
        assert!(req.foreign_key.is_none());
    }

    #[test]
    fn test_column_request_foreign_key() {
        let req: ColumnRequest = serde_json::from_str(
            r#"{"name":"user_id","type":"integer","foreignKey":{"referencesTable":"users","referencesColumn":"id"}}"#,
        )
        .unwrap();
        let fk = req.foreign_key.unwrap();
        assert_eq!(fk.references_table, "users");
        assert_eq!(fk.references_column, "id");
    }
}
