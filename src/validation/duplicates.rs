//! Primary-key duplicate detection and duplicate policies.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{ValidationError, ValidationResult};
use crate::schema::{DuplicatePolicy, Schema};
use crate::types::RecordSet;

use super::header::expected_width;
use super::Diagnostic;

/// A data row whose primary-key tuple was already seen on an earlier row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DuplicateKey {
    /// 1-based row number in the record set (the first data row after a header is row 2).
    pub row: usize,
    /// Key values in primary-key column order.
    pub key: Vec<String>,
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: ({})", self.row, self.key.join(", "))
    }
}

/// Resolve primary-key column names to cell positions.
///
/// Positions come from the header row when the schema declares one, otherwise from the
/// declared column names. Fails closed when no primary key is configured or a key column
/// cannot be found within the data row width.
pub fn resolve_key_indexes(schema: &Schema, records: &RecordSet) -> ValidationResult<Vec<usize>> {
    if schema.primary_key().is_empty() {
        return Err(ValidationError::SchemaConformance {
            message: "no primary key configured; duplicate checking requires one".to_string(),
        });
    }

    let labels: &[String] = if schema.has_header() {
        records
            .rows
            .first()
            .ok_or_else(|| ValidationError::SchemaConformance {
                message: "record set is empty; expected a header row".to_string(),
            })?
            .as_slice()
    } else {
        schema.column_names()
    };

    let width = expected_width(schema, records).unwrap_or(labels.len());
    schema
        .primary_key()
        .iter()
        .map(|pk| {
            let idx = labels
                .iter()
                .position(|h| h == pk)
                .ok_or_else(|| ValidationError::SchemaConformance {
                    message: format!(
                        "primary key column '{pk}' not found in {}: {labels:?}",
                        if schema.has_header() { "header" } else { "column names" }
                    ),
                })?;
            if idx >= width {
                return Err(ValidationError::SchemaConformance {
                    message: format!("primary key column '{pk}' is at position {idx} but rows have {width} cells"),
                });
            }
            Ok(idx)
        })
        .collect()
}

/// Scan all data rows in order and report every row whose key tuple was seen before.
pub fn scan_duplicates(schema: &Schema, records: &RecordSet) -> ValidationResult<Vec<DuplicateKey>> {
    let key_indexes = resolve_key_indexes(schema, records)?;
    let data_start = usize::from(schema.has_header());

    let mut seen: HashSet<Vec<&str>> = HashSet::new();
    let mut duplicates = Vec::new();
    for (idx0, row) in records.rows.iter().enumerate().skip(data_start) {
        let key: Vec<&str> = key_indexes
            .iter()
            .map(|&i| row.get(i).map(String::as_str).unwrap_or(""))
            .collect();
        if seen.contains(&key) {
            duplicates.push(DuplicateKey {
                row: idx0 + 1,
                key: key.into_iter().map(str::to_owned).collect(),
            });
        } else {
            seen.insert(key);
        }
    }

    debug!(
        data_rows = records.len().saturating_sub(data_start),
        duplicates = duplicates.len(),
        "primary key scan finished"
    );
    Ok(duplicates)
}

/// Decide the outcome for a duplicate scan.
///
/// | policy | duplicates present | duplicates absent |
/// |---|---|---|
/// | `fail` | [`ValidationError::DuplicateKey`] | pass |
/// | `warn` | pass, [`Diagnostic::DuplicateKeys`] | pass |
/// | `ignore` | pass, [`Diagnostic::DuplicatesIgnored`] | pass |
/// | `remove` | pass, [`Diagnostic::DuplicatesRemoved`] | pass |
/// | other | [`ValidationError::InvalidPolicy`] | pass |
pub fn apply_policy(
    policy: &DuplicatePolicy,
    duplicates: &[DuplicateKey],
) -> ValidationResult<Option<Diagnostic>> {
    if duplicates.is_empty() {
        return Ok(None);
    }
    match policy {
        DuplicatePolicy::Fail => Err(ValidationError::DuplicateKey {
            duplicates: duplicates.to_vec(),
        }),
        DuplicatePolicy::Warn => Ok(Some(Diagnostic::DuplicateKeys {
            duplicates: duplicates.to_vec(),
        })),
        DuplicatePolicy::Ignore => Ok(Some(Diagnostic::DuplicatesIgnored {
            count: duplicates.len(),
        })),
        DuplicatePolicy::Remove => Ok(Some(Diagnostic::DuplicatesRemoved {
            count: duplicates.len(),
        })),
        DuplicatePolicy::Unrecognized(p) => Err(ValidationError::InvalidPolicy { policy: p.clone() }),
    }
}
