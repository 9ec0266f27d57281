//! Operation descriptors
//!
//! An [`Operation`] is the immutable record of one schema or data action the
//! host runner is about to execute. Each variant carries the typed arguments
//! the rules and the diagnostic formatter need; nothing here performs the
//! action itself.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One observed schema/data operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `ADD COLUMN`
    AddColumn {
        table: String,
        column: String,
        #[serde(rename = "type")]
        column_type: String,
        /// `None` when no default was given, `Some(DefaultValue::Null)` for an explicit null
        #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
        default: Option<DefaultValue>,
        /// `Some(false)` for a NOT NULL column. Spelled `nullable` in plans,
        /// since a bare `null` key is YAML's null value.
        #[serde(
            default,
            rename = "nullable",
            alias = "null",
            skip_serializing_if = "Option::is_none"
        )]
        null: Option<bool>,
    },
    /// `DROP COLUMN`
    RemoveColumn { table: String, column: String },
    /// `RENAME COLUMN`
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    /// `CREATE INDEX`
    AddIndex {
        table: String,
        columns: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        algorithm: Option<IndexAlgorithm>,
        #[serde(default)]
        unique: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Bulk update, backfill or delete
    DataMutation {
        table: String,
        #[serde(default)]
        description: String,
    },
    /// Iterating the rows of a relation inside a migration
    RawIteration {
        table: String,
        /// Relation is filtered (has a WHERE / scope applied)
        #[serde(default)]
        scoped: bool,
        /// Rows are fetched in chunks rather than loaded all at once
        #[serde(default)]
        batched: bool,
    },
    /// Any other DDL (create/drop table, change column, ...)
    SchemaChange {
        table: String,
        #[serde(default)]
        description: String,
    },
}

/// Plain tag of an [`Operation`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    AddColumn,
    RemoveColumn,
    RenameColumn,
    AddIndex,
    DataMutation,
    RawIteration,
    SchemaChange,
}

/// Coarse grouping used to detect migrations that mix concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Schema,
    Data,
    Index,
}

/// Index build algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexAlgorithm {
    /// Non-locking build (`CREATE INDEX CONCURRENTLY`)
    Concurrently,
    /// Regular build holding a write lock for its whole duration
    Default,
}

/// Literal value of a column default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Only called when the key is present, so an explicit `null` becomes
/// `Some(DefaultValue::Null)` while a missing key falls back to `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<DefaultValue>, D::Error>
where
    D: Deserializer<'de>,
{
    DefaultValue::deserialize(deserializer).map(Some)
}

impl DefaultValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for DefaultValue {
    /// Renders the value as it would be written in a migration source file
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{:?}", x),
            Self::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::AddColumn { .. } => OperationKind::AddColumn,
            Self::RemoveColumn { .. } => OperationKind::RemoveColumn,
            Self::RenameColumn { .. } => OperationKind::RenameColumn,
            Self::AddIndex { .. } => OperationKind::AddIndex,
            Self::DataMutation { .. } => OperationKind::DataMutation,
            Self::RawIteration { .. } => OperationKind::RawIteration,
            Self::SchemaChange { .. } => OperationKind::SchemaChange,
        }
    }

    /// Table the operation targets
    pub fn table(&self) -> &str {
        match self {
            Self::AddColumn { table, .. }
            | Self::RemoveColumn { table, .. }
            | Self::RenameColumn { table, .. }
            | Self::AddIndex { table, .. }
            | Self::DataMutation { table, .. }
            | Self::RawIteration { table, .. }
            | Self::SchemaChange { table, .. } => table,
        }
    }

    pub fn category(&self) -> Category {
        self.kind().category()
    }

    /// Convenience constructor for a column added without default or constraint
    pub fn add_column(
        table: impl Into<String>,
        column: impl Into<String>,
        column_type: impl Into<String>,
    ) -> Self {
        Self::AddColumn {
            table: table.into(),
            column: column.into(),
            column_type: column_type.into(),
            default: None,
            null: None,
        }
    }

    /// Builder: set the default of an `AddColumn` (no-op on other variants)
    pub fn with_default(mut self, value: DefaultValue) -> Self {
        if let Self::AddColumn { default, .. } = &mut self {
            *default = Some(value);
        }
        self
    }

    /// Builder: set the nullability of an `AddColumn` (no-op on other variants)
    pub fn with_null(mut self, nullable: bool) -> Self {
        if let Self::AddColumn { null, .. } = &mut self {
            *null = Some(nullable);
        }
        self
    }

    pub fn remove_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::RemoveColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn rename_column(
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::RenameColumn {
            table: table.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn add_index<I, S>(table: impl Into<String>, columns: I, algorithm: Option<IndexAlgorithm>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AddIndex {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            algorithm,
            unique: false,
            name: None,
        }
    }
}

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        Self::AddColumn,
        Self::RemoveColumn,
        Self::RenameColumn,
        Self::AddIndex,
        Self::DataMutation,
        Self::RawIteration,
        Self::SchemaChange,
    ];

    pub fn category(&self) -> Category {
        match self {
            Self::AddColumn | Self::RemoveColumn | Self::RenameColumn | Self::SchemaChange => {
                Category::Schema
            }
            Self::DataMutation | Self::RawIteration => Category::Data,
            Self::AddIndex => Category::Index,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddColumn => "add_column",
            Self::RemoveColumn => "remove_column",
            Self::RenameColumn => "rename_column",
            Self::AddIndex => "add_index",
            Self::DataMutation => "data_mutation",
            Self::RawIteration => "raw_iteration",
            Self::SchemaChange => "schema_change",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Data => write!(f, "data"),
            Self::Index => write!(f, "index"),
        }
    }
}
