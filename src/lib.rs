//! `record-validation` validates delimited records against a declarative [`schema::Schema`] and
//! turns them into a typed, columnar [`types::DataSet`].
//!
//! The primary entrypoint is [`validation::validate_and_transform`], a pure function from a
//! [`types::RecordSet`] and a schema to a [`validation::ValidationReport`]. For file-based runs,
//! [`ingestion::Pipeline`] wires an input source, the engine and a Parquet sink together.
//!
//! ## What the engine checks and does
//!
//! - **Header**: row 0 must equal the declared column names (warning by default, fatal when
//!   `header_mismatch` is `fail`).
//! - **Row shape**: every row must have `column_quantity` cells.
//! - **Primary key**: repeated key tuples are found on every data row and handled by the
//!   duplicate policy (`fail`, `warn`, `ignore`, `remove`).
//! - **Fields**: sensitive columns are dropped, value maps applied, and cells coerced to
//!   `double`, `monetary`, `integer` or `boolean`; text columns are sanitized against a
//!   configurable allow-list.
//!
//! Non-fatal findings are returned as [`validation::Diagnostic`]s next to the outcome.
//!
//! ## Quick example
//!
//! ```rust
//! use record_validation::schema::{Field, FieldType, Schema};
//! use record_validation::types::{RecordSet, Value};
//! use record_validation::validation::validate_and_transform;
//!
//! let schema = Schema::new(["id", "price", "ssn"])
//!     .with_primary_key(["id"])
//!     .with_field(Field::new("price", FieldType::Monetary))
//!     .with_field(Field::new("ssn", FieldType::String).sensitive());
//!
//! let records = RecordSet::from_rows([
//!     vec!["id", "price", "ssn"],
//!     vec!["1", "EUR 1,234", "123-45-6789"],
//! ]);
//!
//! let report = validate_and_transform(&records, &schema);
//! let ds = report.outcome.into_result().unwrap();
//! assert!(ds.column("ssn").is_none());
//! assert_eq!(ds.column("price").unwrap().values, vec![Value::Float64(1234.0)]);
//! ```
//!
//! ## File pipeline
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use record_validation::ingestion::{
//!     LocalDirSource, ParquetDirSink, Pipeline, PipelineOptions, TracingObserver,
//! };
//! use record_validation::schema::Schema;
//!
//! # fn main() -> Result<(), record_validation::IngestionError> {
//! let schema = Schema::from_path("metadata.json")?;
//! let pipeline = Pipeline::new(
//!     Arc::new(LocalDirSource::new("landing")),
//!     Arc::new(ParquetDirSink::new("output")),
//! )
//! .with_options(PipelineOptions {
//!     observer: Some(Arc::new(TracingObserver)),
//!     ..Default::default()
//! });
//!
//! let summary = pipeline.run("data_visualization/DataVisualization.csv", &schema)?;
//! println!("{}", serde_json::to_string(&summary).unwrap());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`schema`]: the Schema Model and its JSON document format
//! - [`types`]: record set and columnar dataset types
//! - [`validation`]: header, duplicate-key and field-transformation stages
//! - [`ingestion`]: record sources, CSV decoding, Parquet output, observers, the pipeline
//! - [`error`]: error types

pub mod error;
pub mod ingestion;
pub mod schema;
pub mod types;
pub mod validation;

pub use error::{IngestionError, IngestionResult, SchemaError, ValidationError, ValidationResult};
pub use validation::{validate_and_transform, ValidationOutcome, ValidationReport};
