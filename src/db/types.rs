//! Query result types for askdb.
//!
//! Defines the structures used to represent query results from the database,
//! and the textual form in which a result is handed to the language model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Represents the result of executing a SQL query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Time taken to execute the query.
    #[serde(with = "duration_serde")]
    pub execution_time: Duration,

    /// Number of rows in the result.
    pub row_count: usize,
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query result with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            execution_time: Duration::ZERO,
            row_count,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the rows as a list of tuples, e.g. `[(59,)]`.
    ///
    /// This is the exact text placed in the answer prompt. A result with no
    /// rows renders as the empty string.
    pub fn to_result_text(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        let tuples = self
            .rows
            .iter()
            .map(|row| {
                let values = row.iter().map(Value::to_literal).collect::<Vec<_>>();
                if values.len() == 1 {
                    format!("({},)", values[0])
                } else {
                    format!("({})", values.join(", "))
                }
            })
            .collect::<Vec<_>>();

        format!("[{}]", tuples.join(", "))
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value from a database query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Exact numeric value, kept in its textual form.
    Decimal(String),

    /// Text/string value (also dates and times).
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts the value to a plain string for display in tables.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Decimal(d) => d.clone(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }

    /// Renders the value as a literal inside a result tuple.
    ///
    /// Strings are quoted, NULL is `None` and booleans are capitalised, so
    /// that `(1, 'AC/DC', None)` reads the same way the model saw it in the
    /// prompt examples.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Decimal(d) => format!("Decimal('{d}')"),
            Value::String(s) => quote_string(s),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

fn quote_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");

    if escaped.contains('\'') && !escaped.contains('"') {
        format!("\"{escaped}\"")
    } else {
        format!("'{}'", escaped.replace('\'', "\\'"))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

/// Serde support for Duration (not natively supported by serde).
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_nanos().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u128::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(Value::Float(2.71).to_display_string(), "2.71");
        assert_eq!(Value::Decimal("0.99".into()).to_display_string(), "0.99");
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_display_string(), "<3 bytes>");
    }

    #[test]
    fn test_value_literals() {
        assert_eq!(Value::Null.to_literal(), "None");
        assert_eq!(Value::Bool(false).to_literal(), "False");
        assert_eq!(Value::Int(-7).to_literal(), "-7");
        assert_eq!(Value::Float(3.0).to_literal(), "3.0");
        assert_eq!(Value::Float(0.5).to_literal(), "0.5");
        assert_eq!(Value::Decimal("1.99".into()).to_literal(), "Decimal('1.99')");
        assert_eq!(Value::from("AC/DC").to_literal(), "'AC/DC'");
        assert_eq!(Value::from("Guns N' Roses").to_literal(), "\"Guns N' Roses\"");
        assert_eq!(Value::from("a'b\"c").to_literal(), "'a\\'b\"c'");
        assert_eq!(Value::from("two\nlines").to_literal(), "'two\\nlines'");
    }

    #[test]
    fn test_result_text_single_column() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("COUNT(*)", "BIGINT")],
            vec![vec![Value::Int(59)]],
        );
        assert_eq!(result.to_result_text(), "[(59,)]");
    }

    #[test]
    fn test_result_text_multiple_columns() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("id", "INT"), ColumnInfo::new("title", "VARCHAR")],
            vec![
                vec![Value::Int(1), Value::from("For Those About To Rock")],
                vec![Value::Int(2), Value::Null],
            ],
        );
        assert_eq!(
            result.to_result_text(),
            "[(1, 'For Those About To Rock'), (2, None)]"
        );
    }

    #[test]
    fn test_result_text_empty() {
        assert_eq!(QueryResult::new().to_result_text(), "");
    }

    #[test]
    fn test_value_from_conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(42i64)), Value::Int(42));
    }

    #[test]
    fn test_query_result_with_data() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("id", "integer")],
            vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        )
        .with_execution_time(Duration::from_millis(12));

        assert!(!result.is_empty());
        assert_eq!(result.row_count, 2);
        assert_eq!(result.execution_time, Duration::from_millis(12));
    }
}
