//! Header and row-shape validation.

use tracing::debug;

use crate::error::{ValidationError, ValidationResult};
use crate::schema::{HeaderMismatchPolicy, Schema};
use crate::types::RecordSet;

use super::Diagnostic;

/// Compare row 0 against the declared column names.
///
/// - No header declared: always passes with no diagnostic.
/// - Exact, case-sensitive, element-wise comparison otherwise. A mismatch (including a
///   different length or a missing row 0) yields a [`Diagnostic::HeaderMismatch`], or a
///   [`ValidationError::HeaderMismatch`] when the schema sets
///   [`HeaderMismatchPolicy::Fail`].
pub fn validate_header(schema: &Schema, records: &RecordSet) -> ValidationResult<Option<Diagnostic>> {
    if !schema.has_header() {
        return Ok(None);
    }

    let actual: &[String] = records.rows.first().map(Vec::as_slice).unwrap_or(&[]);
    if actual == schema.column_names() {
        return Ok(None);
    }

    debug!(expected = ?schema.column_names(), actual = ?actual, "header mismatch");
    let expected = schema.column_names().to_vec();
    let actual = actual.to_vec();
    match schema.header_mismatch() {
        HeaderMismatchPolicy::Warn => Ok(Some(Diagnostic::HeaderMismatch { expected, actual })),
        HeaderMismatchPolicy::Fail => Err(ValidationError::HeaderMismatch { expected, actual }),
    }
}

/// Width every data row must have: the schema's `column_count`, or the width of row 0 when
/// unset.
pub fn expected_width(schema: &Schema, records: &RecordSet) -> Option<usize> {
    schema
        .column_count()
        .or_else(|| records.rows.first().map(Vec::len))
}

/// Check that every data row has the expected number of cells.
///
/// The header row is left to [`validate_header`], so a header of the wrong length follows the
/// header mismatch policy instead of failing here. Rows are reported with 1-based numbers.
pub fn validate_row_shapes(schema: &Schema, records: &RecordSet) -> ValidationResult<()> {
    let Some(expected) = expected_width(schema, records) else {
        return Ok(());
    };

    let data_start = usize::from(schema.has_header());
    for (idx0, row) in records.rows.iter().enumerate().skip(data_start) {
        if row.len() != expected {
            return Err(ValidationError::RowShape {
                row: idx0 + 1,
                expected,
                actual: row.len(),
            });
        }
    }
    Ok(())
}

/// Labels for the cells of a data row, one per position up to [`expected_width`].
///
/// With a header, position `i` is labelled by header cell `i` (`column_{i+1}` past the end of a
/// short header). Without one, the declared names are used when they fit the width, otherwise
/// positional `column_1..column_N`.
pub fn column_labels(schema: &Schema, records: &RecordSet) -> Vec<String> {
    let width = expected_width(schema, records).unwrap_or(schema.column_names().len());
    if schema.has_header() {
        let header: &[String] = records.rows.first().map(Vec::as_slice).unwrap_or(&[]);
        return (0..width)
            .map(|i| header.get(i).cloned().unwrap_or_else(|| format!("column_{}", i + 1)))
            .collect();
    }
    if schema.column_names().len() == width {
        schema.column_names().to_vec()
    } else {
        (1..=width).map(|i| format!("column_{i}")).collect()
    }
}
