//! I/O collaborators around the validation engine.
//!
//! Most callers should use [`Pipeline`] (from [`unified`]) which:
//!
//! - fetches an input object from an injected [`RecordSource`]
//! - decodes it into a [`crate::types::RecordSet`] ([`csv`])
//! - runs [`crate::validation::validate_and_transform`]
//! - stores the dataset through an injected [`DatasetSink`] ([`parquet`])
//! - optionally reports diagnostics/success/failure/alerts to a [`ValidationObserver`]

pub mod csv;
pub mod observability;
pub mod parquet;
pub mod source;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, RunContext, RunStats, StdErrObserver, TracingObserver, ValidationObserver,
};
pub use parquet::{output_key, write_parquet, DatasetSink, ParquetDirSink};
pub use source::{file_type_matches, LocalDirSource, RecordSource, SourceFile};
pub use unified::{validate_file, Pipeline, PipelineOptions, RunStatus, RunSummary};
