//! Per-type cell coercion and value mapping.
//!
//! Every [`FieldType`] has exactly one routine here. Coercion functions return `Ok(None)` for
//! empty (whitespace-only) cells and `Err(message)` for cells that do not parse.

use crate::error::{ValidationError, ValidationResult};
use crate::schema::{Field, FieldType, TransformOptions, ValueMap};
use crate::types::{Column, DataType, Value};

/// Strip every character outside the allow-list.
pub fn sanitize(raw: &str, opts: &TransformOptions) -> String {
    raw.chars().filter(|c| opts.is_allowed(*c)).collect()
}

/// Replace text cells found as keys in `map`; everything else passes through.
pub fn apply_value_map(values: &mut [Value], map: &ValueMap) {
    for v in values.iter_mut() {
        if let Value::Utf8(s) = v {
            if let Some(replacement) = map.get(s.as_str()) {
                *s = replacement.clone();
            }
        }
    }
}

/// Parse a decimal number, accepting `,` as the decimal mark. `NaN` and infinities are
/// rejected.
pub fn coerce_double(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed = trimmed.replace(',', ".").parse::<f64>().map_err(|e| e.to_string())?;
    finite(parsed).map(Some)
}

/// Parse an amount after removing currency markers and thousands separators.
///
/// `"EUR 1,234"` with marker `EUR` and thousands separator `,` yields `1234.0`.
pub fn coerce_monetary(raw: &str, opts: &TransformOptions) -> Result<Option<f64>, String> {
    let mut s = raw.to_string();
    for marker in opts.currency_markers.iter().filter(|m| !m.is_empty()) {
        s = s.replace(marker.as_str(), "");
    }
    let mut cleaned: String = s
        .chars()
        .filter(|c| *c != opts.thousands_separator && !c.is_whitespace())
        .collect();
    if opts.decimal_separator != '.' {
        cleaned = cleaned.replace(opts.decimal_separator, ".");
    }
    if cleaned.is_empty() {
        return Ok(None);
    }
    let parsed = cleaned
        .parse::<f64>()
        .map_err(|e| format!("{e} (after cleaning: '{cleaned}')"))?;
    finite(parsed).map(Some)
}

fn finite(v: f64) -> Result<f64, String> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("non-finite number '{v}'"))
    }
}

/// Parse a boolean from common spellings.
pub fn coerce_boolean(raw: &str) -> Result<Option<bool>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(Some(true)),
        "false" | "f" | "0" | "no" | "n" => Ok(Some(false)),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}

pub fn coerce_integer(raw: &str) -> Result<Option<i64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<i64>().map(Some).map_err(|e| e.to_string())
}

/// Apply one field's rules (value map, then type coercion or transform steps) to its column.
///
/// `row_numbers[i]` is the record-set row number of `column.values[i]`, used in errors.
/// The first failing cell aborts the column.
pub fn apply_field(
    column: Column,
    field: &Field,
    row_numbers: &[usize],
    opts: &TransformOptions,
) -> ValidationResult<Column> {
    let Column {
        name,
        data_type,
        mut values,
    } = column;

    if let Some(map) = &field.metadata.value_map {
        apply_value_map(&mut values, map);
    }

    match field.field_type {
        FieldType::String => {
            for step in &field.metadata.transform_values {
                apply_value_map(&mut values, step);
            }
            Ok(Column::new(name, data_type, values))
        }
        FieldType::Double => convert(name, field.field_type, values, row_numbers, DataType::Float64, |raw| {
            coerce_double(raw).map(|v| v.map(Value::Float64))
        }),
        FieldType::Monetary => convert(name, field.field_type, values, row_numbers, DataType::Float64, |raw| {
            coerce_monetary(raw, opts).map(|v| v.map(Value::Float64))
        }),
        FieldType::Boolean => convert(name, field.field_type, values, row_numbers, DataType::Bool, |raw| {
            coerce_boolean(raw).map(|v| v.map(Value::Bool))
        }),
        FieldType::Integer => convert(name, field.field_type, values, row_numbers, DataType::Int64, |raw| {
            coerce_integer(raw).map(|v| v.map(Value::Int64))
        }),
    }
}

fn convert<F>(
    name: String,
    target: FieldType,
    values: Vec<Value>,
    row_numbers: &[usize],
    data_type: DataType,
    parse: F,
) -> ValidationResult<Column>
where
    F: Fn(&str) -> Result<Option<Value>, String>,
{
    let mut out = Vec::with_capacity(values.len());
    for (idx, value) in values.into_iter().enumerate() {
        let converted = match value {
            Value::Utf8(raw) => match parse(&raw) {
                Ok(v) => v.unwrap_or(Value::Null),
                Err(message) => {
                    return Err(ValidationError::Coercion {
                        row: row_numbers.get(idx).copied().unwrap_or(idx + 1),
                        column: name,
                        target,
                        raw,
                        message,
                    });
                }
            },
            other => other,
        };
        out.push(converted);
    }
    Ok(Column::new(name, data_type, out))
}
