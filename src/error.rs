use thiserror::Error;

use crate::schema::FieldType;
use crate::validation::DuplicateKey;

/// Convenience result type for the validation engine.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Convenience result type for ingestion (I/O) operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// A data problem found while validating or transforming one record set.
///
/// These are fatal for the record set they were raised on and never retried: the engine is
/// pure, so a retry would reproduce the same error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The record set does not agree with the declared schema (e.g. a primary-key column is
    /// missing from the header, or no primary key is configured).
    #[error("schema conformance: {message}")]
    SchemaConformance { message: String },

    /// Row 0 differs from the declared column names and header mismatches are configured as
    /// fatal.
    #[error("header mismatch: expected {expected:?}, got {actual:?}")]
    HeaderMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// A row does not have the expected number of cells.
    #[error("row {row} has {actual} cells, expected {expected}")]
    RowShape {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Duplicate primary keys were found and the duplicate policy is `fail`.
    #[error(
        "{} duplicate primary key(s) found: {}",
        .duplicates.len(),
        format_duplicates(.duplicates)
    )]
    DuplicateKey { duplicates: Vec<DuplicateKey> },

    /// The duplicate policy is not one of `fail`, `warn`, `ignore`, `remove`.
    #[error("invalid duplicate policy '{policy}'")]
    InvalidPolicy { policy: String },

    /// A cell could not be coerced into its declared field type.
    #[error("failed to coerce value at row {row} column '{column}' to {target}: {message} (raw='{raw}')")]
    Coercion {
        row: usize,
        column: String,
        target: FieldType,
        raw: String,
        message: String,
    },
}

pub(crate) fn format_duplicates(duplicates: &[DuplicateKey]) -> String {
    duplicates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error raised while loading or checking a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The schema document is not valid JSON or does not match the expected layout.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The schema parsed but is internally inconsistent.
    #[error("invalid schema: {message}")]
    Invalid { message: String },
}

/// Infrastructure error raised by the I/O collaborators around the engine.
///
/// Data problems are never reported through this type; see [`ValidationError`].
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The raw bytes could not be decoded into records.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The dataset could not be written as Parquet.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// The schema document could not be loaded.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}
