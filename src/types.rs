//! Core data model types.
//!
//! Raw input arrives as a [`RecordSet`] (rows of string cells). A successful validation run
//! produces a [`DataSet`]: an ordered list of named, typed [`Column`]s of equal length.

use serde::Serialize;

use crate::error::{ValidationError, ValidationResult};

/// Logical data type of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
}

/// A single typed value in a [`Column`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Borrow the string payload, if this is a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Utf8(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Utf8(s)
    }
}

/// Raw delimited input: an ordered sequence of rows, each an ordered sequence of cells.
///
/// Whether row 0 is a header is decided by the [`crate::schema::Schema`], not by the record
/// set itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    /// Row-major cell storage, in input order.
    pub rows: Vec<Vec<String>>,
}

impl RecordSet {
    /// Create a record set from owned rows.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Convenience constructor for tests and literals.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Total number of rows, header included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when there are no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A named, typed column of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Column name (header label or positional label).
    pub name: String,
    /// Type of every non-null value in [`Self::values`].
    pub data_type: DataType,
    /// Values aligned by row index with every other column of the dataset.
    pub values: Vec<Value>,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, data_type: DataType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            data_type,
            values,
        }
    }

    /// Create a UTF-8 column from string cells.
    pub fn utf8<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            DataType::Utf8,
            values.into_iter().map(|v| Value::Utf8(v.into())).collect(),
        )
    }

    /// Number of values in the column.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when the column holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Columnar output of a successful validation run.
///
/// All columns have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataSet {
    /// Ordered columns.
    pub columns: Vec<Column>,
}

impl DataSet {
    /// Create a dataset from columns.
    ///
    /// # Panics
    ///
    /// Panics if the columns do not all have the same length. Use [`DataSet::try_new`] for
    /// columns that are not known to be aligned.
    pub fn new(columns: Vec<Column>) -> Self {
        match Self::try_new(columns) {
            Ok(ds) => ds,
            Err(e) => panic!("{e}"),
        }
    }

    /// Create a dataset from columns, failing if they do not all have the same length.
    pub fn try_new(columns: Vec<Column>) -> ValidationResult<Self> {
        if let Some(first) = columns.first() {
            if let Some(c) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(ValidationError::SchemaConformance {
                    message: format!(
                        "column '{}' has length {} but column '{}' has length {}",
                        c.name,
                        c.len(),
                        first.name,
                        first.len()
                    ),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Iterate column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the index of a column by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
