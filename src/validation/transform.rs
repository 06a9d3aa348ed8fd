//! Field Transformer: turns validated rows into the output [`DataSet`].
//!
//! Steps, in order:
//!
//! 1. materialize rows into named columns (header labels, declared names, or `column_N`)
//! 2. sanitize text columns against the configured allow-list
//! 3. when the duplicate policy is `remove`, keep only the first row of each primary-key tuple,
//!    compared on the sanitized key cells
//! 4. apply field rules: redact sensitive columns, then map/coerce the rest
//!
//! Steps 2 and 4 work column by column on the rayon pool. When several fields fail to coerce,
//! the error of the first one in declared order is returned, so results do not depend on
//! scheduling.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::debug;

use crate::error::{ValidationError, ValidationResult};
use crate::schema::{DuplicatePolicy, Schema};
use crate::types::{Column, DataSet, RecordSet};

use super::coerce::{apply_field, sanitize};
use super::header::column_labels;

/// Build the output dataset from a record set that passed header, shape and key validation.
pub fn transform_records(records: &RecordSet, schema: &Schema) -> ValidationResult<DataSet> {
    let data_start = usize::from(schema.has_header()).min(records.len());
    let labels = column_labels(schema, records);

    let mut row_numbers: Vec<usize> = (data_start + 1..=records.len()).collect();
    let mut columns: Vec<Column> = labels
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            Column::utf8(
                label.as_str(),
                records.rows[data_start..]
                    .iter()
                    .map(|row| row.get(idx).cloned().unwrap_or_default()),
            )
        })
        .collect();

    let opts = schema.transform();
    if opts.sanitize {
        columns
            .par_iter_mut()
            .filter(|c| schema.field(&c.name).is_none_or(|f| f.field_type.is_textual()))
            .for_each(|c| {
                for v in c.values.iter_mut() {
                    if let Some(s) = v.as_str() {
                        *v = sanitize(s, opts).into();
                    }
                }
            });
    }

    if *schema.duplicate_policy() == DuplicatePolicy::Remove {
        let keep = first_occurrence_mask(&columns, schema.primary_key(), row_numbers.len())?;
        let removed = keep.iter().filter(|k| !**k).count();
        if removed > 0 {
            for c in columns.iter_mut() {
                c.values = retain_by_mask(std::mem::take(&mut c.values), &keep);
            }
            row_numbers = retain_by_mask(row_numbers, &keep);
            debug!(removed, remaining = row_numbers.len(), "dropped duplicate rows");
        }
    }

    let redacted: HashSet<&str> = schema
        .fields()
        .iter()
        .filter(|f| f.metadata.sensitive)
        .map(|f| f.name.as_str())
        .collect();
    columns.retain(|c| !redacted.contains(c.name.as_str()));

    let results: Vec<(usize, ValidationResult<Column>)> = columns
        .into_par_iter()
        .map(|column| {
            match schema.fields().iter().position(|f| f.name == column.name) {
                Some(order) => (
                    order,
                    apply_field(column, &schema.fields()[order], &row_numbers, opts),
                ),
                None => (usize::MAX, Ok(column)),
            }
        })
        .collect();

    if let Some((_, Err(err))) = results
        .iter()
        .filter(|(_, r)| r.is_err())
        .min_by_key(|(order, _)| *order)
    {
        return Err(err.clone());
    }

    let columns = results.into_iter().filter_map(|(_, r)| r.ok()).collect();
    DataSet::try_new(columns)
}

/// `true` for every row whose primary-key tuple has not been seen on an earlier row.
fn first_occurrence_mask(columns: &[Column], primary_key: &[String], rows: usize) -> ValidationResult<Vec<bool>> {
    let key_columns = primary_key
        .iter()
        .map(|pk| {
            columns
                .iter()
                .find(|c| c.name == *pk)
                .ok_or_else(|| ValidationError::SchemaConformance {
                    message: format!("primary key column '{pk}' not found among output columns"),
                })
        })
        .collect::<ValidationResult<Vec<_>>>()?;

    if key_columns.is_empty() {
        return Err(ValidationError::SchemaConformance {
            message: "no primary key configured; duplicate removal requires one".to_string(),
        });
    }

    let mut seen: HashSet<Vec<&str>> = HashSet::new();
    Ok((0..rows)
        .map(|i| {
            let key: Vec<&str> = key_columns
                .iter()
                .map(|c| c.values.get(i).and_then(|v| v.as_str()).unwrap_or(""))
                .collect();
            seen.insert(key)
        })
        .collect())
}

fn retain_by_mask<T>(values: Vec<T>, keep: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(keep)
        .filter_map(|(v, k)| k.then_some(v))
        .collect()
}
