//! The validation engine.
//!
//! [`validate_and_transform`] is the single entry point. It runs, in order:
//!
//! 1. [`header::validate_header`] (diagnostic, or fatal when configured)
//! 2. [`header::validate_row_shapes`]
//! 3. [`duplicates::scan_duplicates`] then [`duplicates::apply_policy`]
//! 4. [`transform::transform_records`]
//!
//! and stops at the first fatal error. The engine performs no I/O and keeps no state between
//! calls: the same inputs always produce the same [`ValidationReport`].
//!
//! ```rust
//! use record_validation::schema::Schema;
//! use record_validation::types::RecordSet;
//! use record_validation::validation::validate_and_transform;
//!
//! let schema = Schema::new(["id", "name"])
//!     .with_primary_key(["id"])
//!     .with_duplicate_policy("remove");
//! let records = RecordSet::from_rows([
//!     vec!["id", "name"],
//!     vec!["1", "Alice"],
//!     vec!["1", "Bob"],
//! ]);
//!
//! let report = validate_and_transform(&records, &schema);
//! let ds = report.outcome.dataset().unwrap();
//! assert_eq!(ds.row_count(), 1);
//! assert_eq!(report.duplicates.len(), 1);
//! ```

pub mod coerce;
pub mod duplicates;
pub mod header;
pub mod transform;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{format_duplicates, ValidationError, ValidationResult};
use crate::schema::Schema;
use crate::types::{DataSet, RecordSet};

pub use duplicates::DuplicateKey;

/// Severity classification for diagnostics, observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the record set was rejected).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// A non-fatal notice produced while validating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Row 0 differs from the declared column names.
    HeaderMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    /// Duplicate primary keys under the `warn` policy.
    DuplicateKeys { duplicates: Vec<DuplicateKey> },
    /// Duplicate primary keys under the `ignore` policy.
    DuplicatesIgnored { count: usize },
    /// Duplicate primary keys under the `remove` policy; the repeats are dropped.
    DuplicatesRemoved { count: usize },
    /// The file's content type / name does not match the expected file type.
    FileTypeMismatch {
        expected: String,
        content_type: Option<String>,
        file_name: String,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::HeaderMismatch { .. }
            | Diagnostic::DuplicateKeys { .. }
            | Diagnostic::FileTypeMismatch { .. } => Severity::Warning,
            Diagnostic::DuplicatesIgnored { .. } | Diagnostic::DuplicatesRemoved { .. } => Severity::Info,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::HeaderMismatch { expected, actual } => {
                write!(f, "header mismatch: expected {expected:?}, got {actual:?}")
            }
            Diagnostic::DuplicateKeys { duplicates } => {
                write!(f, "duplicate primary keys found: {}", format_duplicates(duplicates))
            }
            Diagnostic::DuplicatesIgnored { count } => {
                write!(f, "{count} duplicate primary key(s) found but ignoring")
            }
            Diagnostic::DuplicatesRemoved { count } => {
                write!(f, "{count} duplicate primary key row(s) removed, first occurrences kept")
            }
            Diagnostic::FileTypeMismatch {
                expected,
                content_type,
                file_name,
            } => write!(
                f,
                "file type mismatch for '{file_name}': expected {expected}, got {}",
                content_type.as_deref().unwrap_or("<none>")
            ),
        }
    }
}

/// Pass/fail result of one validation run.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Every stage passed; the dataset is ready for a columnar writer.
    Valid(DataSet),
    /// A stage failed; no dataset is produced.
    Invalid(ValidationError),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    pub fn dataset(&self) -> Option<&DataSet> {
        match self {
            ValidationOutcome::Valid(ds) => Some(ds),
            ValidationOutcome::Invalid(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationOutcome::Valid(_) => None,
            ValidationOutcome::Invalid(e) => Some(e),
        }
    }

    pub fn into_result(self) -> ValidationResult<DataSet> {
        match self {
            ValidationOutcome::Valid(ds) => Ok(ds),
            ValidationOutcome::Invalid(e) => Err(e),
        }
    }
}

/// Outcome plus everything worth logging about how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub outcome: ValidationOutcome,
    /// Non-fatal notices, in the order they were raised.
    pub diagnostics: Vec<Diagnostic>,
    /// Every repeated primary key found, whatever the policy (empty if the scan did not run).
    pub duplicates: Vec<DuplicateKey>,
}

/// Validate `records` against `schema` and build the output dataset.
pub fn validate_and_transform(records: &RecordSet, schema: &Schema) -> ValidationReport {
    let mut diagnostics = Vec::new();
    let mut duplicates = Vec::new();
    let outcome = match run_stages(records, schema, &mut diagnostics, &mut duplicates) {
        Ok(ds) => ValidationOutcome::Valid(ds),
        Err(e) => {
            debug!(error = %e, "record set rejected");
            ValidationOutcome::Invalid(e)
        }
    };
    ValidationReport {
        outcome,
        diagnostics,
        duplicates,
    }
}

fn run_stages(
    records: &RecordSet,
    schema: &Schema,
    diagnostics: &mut Vec<Diagnostic>,
    found: &mut Vec<DuplicateKey>,
) -> ValidationResult<DataSet> {
    debug!(rows = records.len(), has_header = schema.has_header(), "validating record set");

    diagnostics.extend(header::validate_header(schema, records)?);
    header::validate_row_shapes(schema, records)?;

    *found = duplicates::scan_duplicates(schema, records)?;
    diagnostics.extend(duplicates::apply_policy(schema.duplicate_policy(), found)?);

    let ds = transform::transform_records(records, schema)?;
    debug!(rows = ds.row_count(), columns = ds.columns.len(), "record set transformed");
    Ok(ds)
}
