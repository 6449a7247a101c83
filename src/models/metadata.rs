use crate::models::mapping::ColumnMapping;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A column as reported by the remote engine's information schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteColumn {
    pub name: String,
    /// Declared type text, e.g. "decimal(20, 5)" or "tinyint unsigned"
    pub type_decl: String,
    pub is_nullable: bool,
    pub default_value: Option<String>,
    pub comment: Option<String>,
}

impl RemoteColumn {
    pub fn new(name: impl Into<String>, type_decl: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_decl: type_decl.into(),
            is_nullable: true,
            default_value: None,
            comment: None,
        }
    }
}

/// Identifies one remote table for the lifetime of its resolved schema.
/// Invalidation (DDL change, cache eviction) replaces the handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableHandle {
    pub id: String,
    pub schema: String,
    pub table: String,
}

impl TableHandle {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// The visible schema of a remote table after type resolution. Columns whose
/// types have no mapping are left out of `columns` and listed by name in
/// `hidden_columns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedTable {
    pub handle: TableHandle,
    pub columns: Vec<ColumnMapping>,
    pub hidden_columns: Vec<String>,
    pub resolved_at: chrono::DateTime<chrono::Utc>,
}

impl ResolvedTable {
    pub fn new(
        handle: TableHandle,
        columns: Vec<ColumnMapping>,
        hidden_columns: Vec<String>,
    ) -> Self {
        Self {
            handle,
            columns,
            hidden_columns,
            resolved_at: chrono::Utc::now(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMapping> {
        self.columns.iter().find(|mapping| mapping.column == name)
    }
}
