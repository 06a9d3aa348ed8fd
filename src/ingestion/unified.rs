//! End-to-end run: fetch → decode → validate/transform → store.
//!
//! [`Pipeline`] owns no I/O of its own: the [`RecordSource`] and [`DatasetSink`] are injected
//! at construction, and the engine in [`crate::validation`] stays pure. A run either stores a
//! dataset ([`RunStatus::Success`]), rejects the data ([`RunStatus::Rejected`]), or fails on
//! infrastructure (`Err(IngestionError)`), so callers can always tell data problems from
//! infrastructure problems.

use std::error::Error as StdError;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{IngestionError, IngestionResult, SchemaError, ValidationError};
use crate::schema::Schema;
use crate::validation::{validate_and_transform, Diagnostic, Severity, ValidationOutcome, ValidationReport};

use super::csv::{decode_record_set, decode_record_set_from_path};
use super::observability::{RunContext, RunStats, ValidationObserver};
use super::parquet::{output_key, DatasetSink};
use super::source::{file_type_matches, RecordSource};

/// Options controlling pipeline reporting.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn ValidationObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Whether a run stored its dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Validated and stored.
    Success,
    /// The data failed validation; nothing was stored.
    Rejected,
}

/// Result of a run that reached the engine.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub file_name: String,
    pub message: String,
    /// Where the dataset was stored (success only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_location: Option<String>,
    /// Output rows (success only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    pub diagnostics: Vec<Diagnostic>,
    /// The rejection reason (rejected only).
    #[serde(skip)]
    pub error: Option<ValidationError>,
}

/// Wires a record source, the validation engine and a dataset sink together.
pub struct Pipeline {
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn DatasetSink>,
    options: PipelineOptions,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(source: Arc<dyn RecordSource>, sink: Arc<dyn DatasetSink>) -> Self {
        Self {
            source,
            sink,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Process one input object.
    ///
    /// When an observer is configured, this reports:
    ///
    /// - `on_diagnostic` for every diagnostic, in order
    /// - `on_success` after the dataset was stored
    /// - `on_failure` on rejection ([`Severity::Error`]) or infrastructure failure
    /// - `on_alert` when the failure severity is >= `alert_at_or_above`
    pub fn run(&self, file_name: &str, schema: &Schema) -> IngestionResult<RunSummary> {
        let ctx = RunContext {
            file_name: file_name.to_string(),
        };
        let result = self.run_inner(&ctx, schema);
        if let Err(e) = &result {
            self.report_failure(&ctx, severity_for_error(e), e);
        }
        result
    }

    fn run_inner(&self, ctx: &RunContext, schema: &Schema) -> IngestionResult<RunSummary> {
        let file = self.source.fetch(&ctx.file_name)?;

        let mut diagnostics = Vec::new();
        if let Some(expected) = schema.file_type() {
            if !file_type_matches(expected, &file.name, file.content_type.as_deref()) {
                diagnostics.push(Diagnostic::FileTypeMismatch {
                    expected: expected.to_string(),
                    content_type: file.content_type.clone(),
                    file_name: file.name.clone(),
                });
            }
        }

        let records = decode_record_set(&file.bytes, schema.separator())?;
        let input_rows = records.len();
        let ValidationReport {
            outcome,
            diagnostics: engine_diagnostics,
            ..
        } = validate_and_transform(&records, schema);
        diagnostics.extend(engine_diagnostics);

        if let Some(obs) = &self.options.observer {
            for d in &diagnostics {
                obs.on_diagnostic(ctx, d);
            }
        }

        match outcome {
            ValidationOutcome::Valid(dataset) => {
                let location = self.sink.store(&output_key(&ctx.file_name), &dataset)?;
                if let Some(obs) = &self.options.observer {
                    obs.on_success(
                        ctx,
                        RunStats {
                            input_rows,
                            output_rows: dataset.row_count(),
                            columns: dataset.columns.len(),
                        },
                    );
                }
                Ok(RunSummary {
                    status: RunStatus::Success,
                    file_name: ctx.file_name.clone(),
                    message: format!("validated {} row(s) and stored as Parquet", dataset.row_count()),
                    output_location: Some(location),
                    rows: Some(dataset.row_count()),
                    diagnostics,
                    error: None,
                })
            }
            ValidationOutcome::Invalid(error) => {
                self.report_failure(ctx, Severity::Error, &error);
                Ok(RunSummary {
                    status: RunStatus::Rejected,
                    file_name: ctx.file_name.clone(),
                    message: format!("validation failed: {error}"),
                    output_location: None,
                    rows: None,
                    diagnostics,
                    error: Some(error),
                })
            }
        }
    }

    fn report_failure(&self, ctx: &RunContext, severity: Severity, error: &dyn StdError) {
        if let Some(obs) = &self.options.observer {
            obs.on_failure(ctx, severity, error);
            if severity >= self.options.alert_at_or_above {
                obs.on_alert(ctx, severity, error);
            }
        }
    }
}

/// Decode a local delimited file and run the engine on it, without storing anything.
pub fn validate_file(path: impl AsRef<Path>, schema: &Schema) -> IngestionResult<ValidationReport> {
    let records = decode_record_set_from_path(path, schema.separator())?;
    Ok(validate_and_transform(&records, schema))
}

fn severity_for_error(e: &IngestionError) -> Severity {
    match e {
        IngestionError::Io(_) => Severity::Critical,
        IngestionError::Parquet(err) => {
            // Parquet errors may wrap IO without a structured variant; walk the source chain.
            if error_chain_contains_io(err) {
                Severity::Critical
            } else {
                Severity::Error
            }
        }
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => Severity::Critical,
            _ => Severity::Error,
        },
        IngestionError::Schema(SchemaError::Io(_)) => Severity::Critical,
        IngestionError::Schema(_) => Severity::Error,
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}
