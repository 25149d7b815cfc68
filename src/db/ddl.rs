//! DDL statement synthesis.
//!
//! Builds exactly one `CREATE TABLE` or `ALTER TABLE ... ADD COLUMN`
//! statement from validated inputs. Each clause's inclusion is an explicit
//! decision over a typed [`ColumnSpec`]; no statement text is ever produced
//! from an input that failed validation.

use crate::db::validate::{is_allowed_type, is_valid_identifier, quote_ident};
use crate::error::{SchemaError, SchemaResult};
use crate::models::{ColumnRequest, ForeignKeyRef};

/// A validated-on-use column definition for `ALTER TABLE ... ADD COLUMN`.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub references: Option<ForeignKeyRef>,
}

impl From<ColumnRequest> for ColumnSpec {
    fn from(req: ColumnRequest) -> Self {
        Self {
            name: req.name,
            data_type: req.data_type,
            nullable: req.nullable,
            primary_key: req.primary_key,
            unique: req.unique,
            references: req.foreign_key,
        }
    }
}

fn checked_ident(field: &'static str, name: &str) -> SchemaResult<String> {
    if !is_valid_identifier(name) {
        return Err(SchemaError::invalid_identifier(field, name));
    }
    Ok(quote_ident(name))
}

/// Build `CREATE TABLE "<name>" (id SERIAL PRIMARY KEY)`.
///
/// Every created table gets exactly one surrogate integer primary key named
/// `id`; there is no alternate primary-key strategy.
pub fn build_create_table(table_name: &str) -> SchemaResult<String> {
    let table = checked_ident("table name", table_name)?;
    Ok(format!("CREATE TABLE {table} (id SERIAL PRIMARY KEY)"))
}

/// Build `ALTER TABLE "<table>" ADD COLUMN <definition>`.
///
/// Clause order is fixed: type, `NOT NULL`, `PRIMARY KEY`, `UNIQUE`,
/// `REFERENCES`. `NOT NULL` is emitted unless the definition explicitly
/// marks the column nullable. `UNIQUE` is suppressed when `PRIMARY KEY` is requested
/// since a primary key is already unique. The foreign-key clause is emitted
/// only when both reference fields are non-empty, but any non-empty
/// reference field is validated regardless so an invalid identifier cannot
/// ride along inside a skipped clause.
pub fn build_add_column(table_name: &str, spec: &ColumnSpec) -> SchemaResult<String> {
    let table = checked_ident("table name", table_name)?;
    let column = checked_ident("column name", &spec.name)?;

    if !is_allowed_type(&spec.data_type) {
        return Err(SchemaError::invalid_type(&spec.data_type));
    }

    let mut stmt = format!("ALTER TABLE {table} ADD COLUMN {column} {}", spec.data_type);

    if !spec.nullable {
        stmt.push_str(" NOT NULL");
    }
    if spec.primary_key {
        stmt.push_str(" PRIMARY KEY");
    }
    if spec.unique && !spec.primary_key {
        stmt.push_str(" UNIQUE");
    }
    if let Some(fk) = &spec.references {
        let ref_table = if fk.references_table.is_empty() {
            None
        } else {
            Some(checked_ident("reference table", &fk.references_table)?)
        };
        let ref_column = if fk.references_column.is_empty() {
            None
        } else {
            Some(checked_ident("reference column", &fk.references_column)?)
        };
        if let (Some(ref_table), Some(ref_column)) = (ref_table, ref_column) {
            stmt.push_str(&format!(" REFERENCES {ref_table}({ref_column})"));
        }
    }

    Ok(stmt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, data_type: &str) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: false,
            primary_key: false,
            unique: false,
            references: None,
        }
    }

    #[test]
    fn test_create_table_exact_text() {
        assert_eq!(
            build_create_table("users").unwrap(),
            "CREATE TABLE \"users\" (id SERIAL PRIMARY KEY)"
        );
    }

    #[test]
    fn test_create_table_rejects_uppercase() {
        let err = build_create_table("Users").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_add_column_not_null_default() {
        let stmt = build_add_column("users", &spec("email", "text")).unwrap();
        assert_eq!(
            stmt,
            "ALTER TABLE \"users\" ADD COLUMN \"email\" text NOT NULL"
        );
    }

    #[test]
    fn test_add_column_nullable_omits_not_null() {
        let mut s = spec("bio", "text");
        s.nullable = true;
        let stmt = build_add_column("users", &s).unwrap();
        assert_eq!(stmt, "ALTER TABLE \"users\" ADD COLUMN \"bio\" text");
    }

    #[test]
    fn test_primary_key_suppresses_unique() {
        let mut s = spec("code", "uuid");
        s.primary_key = true;
        s.unique = true;
        let stmt = build_add_column("users", &s).unwrap();
        assert!(stmt.contains("PRIMARY KEY"));
        assert!(!stmt.contains("UNIQUE"));
    }

    #[test]
    fn test_clause_order_is_fixed() {
        let mut s = spec("user_id", "integer");
        s.unique = true;
        s.references = Some(ForeignKeyRef {
            references_table: "users".to_string(),
            references_column: "id".to_string(),
        });
        let stmt = build_add_column("orders", &s).unwrap();
        assert_eq!(
            stmt,
            "ALTER TABLE \"orders\" ADD COLUMN \"user_id\" integer NOT NULL UNIQUE \
             REFERENCES \"users\"(\"id\")"
        );
    }

    #[test]
    fn test_invalid_reference_table_fails_whole_operation() {
        let mut s = spec("user_id", "integer");
        s.references = Some(ForeignKeyRef {
            references_table: "Users; DROP TABLE".to_string(),
            references_column: "id".to_string(),
        });
        let err = build_add_column("orders", &s).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidIdentifier {
                field: "reference table",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_reference_validated_even_when_clause_skipped() {
        // Column side empty, so no REFERENCES clause would be emitted, but
        // the bad table name must still fail the operation.
        let mut s = spec("user_id", "integer");
        s.references = Some(ForeignKeyRef {
            references_table: "BAD".to_string(),
            references_column: String::new(),
        });
        let err = build_add_column("orders", &s).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_half_specified_reference_skips_clause() {
        let mut s = spec("user_id", "integer");
        s.references = Some(ForeignKeyRef {
            references_table: "users".to_string(),
            references_column: String::new(),
        });
        let stmt = build_add_column("orders", &s).unwrap();
        assert!(!stmt.contains("REFERENCES"));
    }

    #[test]
    fn test_unknown_type_rejected_not_coerced() {
        let err = build_add_column("users", &spec("email", "varchar(255)")).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidType { .. }));
    }

    #[test]
    fn test_invalid_column_name_rejected_before_type_check() {
        let err = build_add_column("users", &spec("Email", "nonsense")).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidIdentifier {
                field: "column name",
                ..
            }
        ));
    }
}
