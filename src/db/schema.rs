//! Database schema types for askdb.
//!
//! Represents the structure of a database (tables, columns, foreign keys and
//! a few sample rows per table) and renders it as the schema description
//! given to the language model.

use super::types::Row;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents the complete schema of a database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// All tables in the schema.
    pub tables: Vec<Table>,

    /// Foreign key relationships between tables.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table with the given name, if present.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Formats the schema for inclusion in an LLM prompt.
    ///
    /// Produces a human-readable representation that helps the LLM
    /// understand the database structure.
    pub fn format_for_llm(&self) -> String {
        let tables_text = self
            .tables
            .iter()
            .map(|table| self.format_table_for_llm(table))
            .collect::<Vec<_>>()
            .join("");

        let foreign_keys_text = if self.foreign_keys.is_empty() {
            String::new()
        } else {
            let fk_lines = self
                .foreign_keys
                .iter()
                .map(|fk| {
                    format!(
                        "  - {}.{} -> {}.{}\n",
                        fk.from_table,
                        fk.from_columns.join(", "),
                        fk.to_table,
                        fk.to_columns.join(", ")
                    )
                })
                .collect::<Vec<_>>()
                .join("");
            format!("Foreign Keys:\n{}", fk_lines)
        };

        format!("Database Schema:\n\n{}{}", tables_text, foreign_keys_text)
    }

    fn format_table_for_llm(&self, table: &Table) -> String {
        let column_lines = table
            .columns
            .iter()
            .map(|column| self.format_column_for_llm(table, column))
            .collect::<Vec<_>>()
            .join("");

        format!(
            "Table: {}\n{}{}\n",
            table.name,
            column_lines,
            Self::format_sample_rows(table)
        )
    }

    fn format_column_for_llm(&self, table: &Table, column: &Column) -> String {
        let fk_ref = self
            .foreign_keys
            .iter()
            .find(|fk| fk.from_table == table.name && fk.from_columns.contains(&column.name))
            .map(|fk| {
                let position = fk
                    .from_columns
                    .iter()
                    .position(|c| c == &column.name)
                    .unwrap_or(0);
                format!(
                    "FK -> {}.{}",
                    fk.to_table,
                    fk.to_columns.get(position).map(String::as_str).unwrap_or("")
                )
            });

        let annotations = [
            table
                .primary_key
                .contains(&column.name)
                .then(|| "PK".to_string()),
            (!column.is_nullable).then(|| "NOT NULL".to_string()),
            fk_ref,
            column.default.as_ref().map(|d| format!("DEFAULT {d}")),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

        if annotations.is_empty() {
            format!("  - {}: {}\n", column.name, column.data_type)
        } else {
            format!(
                "  - {}: {} ({})\n",
                column.name,
                column.data_type,
                annotations.join(", ")
            )
        }
    }

    fn format_sample_rows(table: &Table) -> String {
        if table.sample_rows.is_empty() {
            return String::new();
        }

        let header = table
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join("\t");
        let rows = table
            .sample_rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| v.to_display_string())
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "  /* {} rows from {} table:\n{}\n{}\n  */\n",
            table.sample_rows.len(),
            table.name,
            header,
            rows
        )
    }
}

/// Represents a database table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in the table.
    pub columns: Vec<Column>,

    /// Column names that form the primary key.
    pub primary_key: Vec<String>,

    /// A few rows from the table, in column order.
    #[serde(default)]
    pub sample_rows: Vec<Row>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            sample_rows: Vec::new(),
        }
    }

    /// Adds a column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the primary key columns.
    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Sets the sample rows.
    pub fn with_sample_rows(mut self, rows: Vec<Row>) -> Self {
        self.sample_rows = rows;
        self
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Data type (e.g., "int", "varchar(160)").
    pub data_type: String,

    /// Whether the column allows NULL values.
    pub is_nullable: bool,

    /// Default value expression, if any.
    pub default: Option<String>,
}

impl Column {
    /// Creates a new column with the given name and data type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: None,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self {
            is_nullable: nullable,
            ..self
        }
    }

    /// Sets the default value.
    pub fn with_default(self, default: impl Into<String>) -> Self {
        Self {
            default: Some(default.into()),
            ..self
        }
    }
}

/// Represents a foreign key relationship between tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Source table name.
    pub from_table: String,

    /// Source column names.
    pub from_columns: Vec<String>,

    /// Target table name.
    pub to_table: String,

    /// Target column names.
    pub to_columns: Vec<String>,
}

impl ForeignKey {
    /// Creates a new foreign key relationship.
    pub fn new(
        from_table: impl Into<String>,
        from_columns: Vec<String>,
        to_table: impl Into<String>,
        to_columns: Vec<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_columns,
            to_table: to_table.into(),
            to_columns,
        }
    }
}

/// Groups `(constraint, from_table, from_column, to_table, to_column)` rows
/// into one foreign key per constraint, preserving first-seen order.
pub(crate) fn group_foreign_keys(
    rows: impl Iterator<Item = (String, String, String, String, String)>,
) -> Vec<ForeignKey> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut fk_map: HashMap<(String, String), ForeignKey> = HashMap::new();

    for (constraint, from_table, from_column, to_table, to_column) in rows {
        let key = (from_table.clone(), constraint);
        let entry = fk_map.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            ForeignKey::new(from_table, Vec::new(), to_table, Vec::new())
        });
        entry.from_columns.push(from_column);
        entry.to_columns.push(to_column);
    }

    order
        .into_iter()
        .filter_map(|key| fk_map.remove(&key))
        .collect()
}
