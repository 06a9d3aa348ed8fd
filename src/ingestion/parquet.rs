//! Parquet output for validated datasets.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parquet::basic::{LogicalType, Repetition, Type as PhysicalType};
use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::Type;

use crate::error::IngestionResult;
use crate::types::{Column, DataSet, DataType, Value};

/// Destination for validated datasets, injected into [`super::Pipeline`].
pub trait DatasetSink: Send + Sync {
    /// Store `dataset` under `key` and return a human-readable location.
    fn store(&self, key: &str, dataset: &DataSet) -> IngestionResult<String>;
}

/// Writes datasets as Parquet files under a local directory.
#[derive(Debug, Clone)]
pub struct ParquetDirSink {
    root: PathBuf,
}

impl ParquetDirSink {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl DatasetSink for ParquetDirSink {
    fn store(&self, key: &str, dataset: &DataSet) -> IngestionResult<String> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        write_parquet(file, dataset)?;
        Ok(path.display().to_string())
    }
}

/// Output key for an input key: a trailing `.csv` becomes `.parquet`.
pub fn output_key(input_key: &str) -> String {
    let stem = input_key
        .len()
        .checked_sub(4)
        .filter(|&i| input_key.is_char_boundary(i) && input_key[i..].eq_ignore_ascii_case(".csv"))
        .map(|i| &input_key[..i])
        .unwrap_or(input_key);
    format!("{stem}.parquet")
}

/// Write `dataset` as a single-row-group Parquet file. Every column is `OPTIONAL` so nulls
/// survive.
pub fn write_parquet<W: Write + Send>(writer: W, dataset: &DataSet) -> IngestionResult<()> {
    let schema = Arc::new(parquet_schema(dataset)?);
    let props = Arc::new(WriterProperties::builder().build());
    let mut file_writer = SerializedFileWriter::new(writer, schema, props)?;

    let mut rg = file_writer.next_row_group()?;
    let mut columns = dataset.columns.iter();
    while let Some(mut col_writer) = rg.next_column()? {
        let column = columns
            .next()
            .ok_or_else(|| ParquetError::General("more parquet columns than dataset columns".to_string()))?;
        let def_levels: Vec<i16> = column
            .values
            .iter()
            .map(|v| i16::from(*v != Value::Null))
            .collect();

        match col_writer.untyped() {
            ColumnWriter::ByteArrayColumnWriter(w) => {
                let values = collect_non_null(column, |v| match v {
                    Value::Utf8(s) => Some(ByteArray::from(s.as_str())),
                    _ => None,
                })?;
                w.write_batch(&values, Some(&def_levels), None)?;
            }
            ColumnWriter::DoubleColumnWriter(w) => {
                let values = collect_non_null(column, |v| match v {
                    Value::Float64(f) => Some(*f),
                    _ => None,
                })?;
                w.write_batch(&values, Some(&def_levels), None)?;
            }
            ColumnWriter::Int64ColumnWriter(w) => {
                let values = collect_non_null(column, |v| match v {
                    Value::Int64(i) => Some(*i),
                    _ => None,
                })?;
                w.write_batch(&values, Some(&def_levels), None)?;
            }
            ColumnWriter::BoolColumnWriter(w) => {
                let values = collect_non_null(column, |v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })?;
                w.write_batch(&values, Some(&def_levels), None)?;
            }
            _ => {
                return Err(ParquetError::General(format!(
                    "unexpected parquet writer for column '{}'",
                    column.name
                ))
                .into());
            }
        }
        col_writer.close()?;
    }
    rg.close()?;
    file_writer.close()?;
    Ok(())
}

fn parquet_schema(dataset: &DataSet) -> Result<Type, ParquetError> {
    let fields = dataset
        .columns
        .iter()
        .map(|c| {
            let (physical, logical) = match c.data_type {
                DataType::Utf8 => (PhysicalType::BYTE_ARRAY, Some(LogicalType::String)),
                DataType::Float64 => (PhysicalType::DOUBLE, None),
                DataType::Int64 => (PhysicalType::INT64, None),
                DataType::Bool => (PhysicalType::BOOLEAN, None),
            };
            Type::primitive_type_builder(&c.name, physical)
                .with_repetition(Repetition::OPTIONAL)
                .with_logical_type(logical)
                .build()
                .map(Arc::new)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Type::group_type_builder("schema").with_fields(fields).build()
}

fn collect_non_null<T, F>(column: &Column, extract: F) -> Result<Vec<T>, ParquetError>
where
    F: Fn(&Value) -> Option<T>,
{
    let mut out = Vec::with_capacity(column.len());
    for (row, v) in column.values.iter().enumerate() {
        if *v == Value::Null {
            continue;
        }
        out.push(extract(v).ok_or_else(|| {
            ParquetError::General(format!(
                "value {v:?} at index {row} does not match {:?} column '{}'",
                column.data_type, column.name
            ))
        })?);
    }
    Ok(out)
}
