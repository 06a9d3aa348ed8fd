use std::error::Error as StdError;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::validation::{Diagnostic, Severity};

/// Context about a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Input object key.
    pub file_name: String,
}

/// Minimal stats reported on a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Rows in the input record set, header included.
    pub input_rows: usize,
    /// Rows in the output dataset.
    pub output_rows: usize,
    /// Columns in the output dataset.
    pub columns: usize,
}

/// Observer interface for run outcomes and diagnostics.
///
/// Implementors can record metrics, logs, or trigger alerts. `error` is either a
/// [`crate::ValidationError`] (rejected data) or an [`crate::IngestionError`]
/// (infrastructure).
pub trait ValidationObserver: Send + Sync {
    /// Called once per non-fatal diagnostic, in order.
    fn on_diagnostic(&self, _ctx: &RunContext, _diagnostic: &Diagnostic) {}

    /// Called when the dataset was validated and stored.
    fn on_success(&self, _ctx: &RunContext, _stats: RunStats) {}

    /// Called when the run was rejected or failed.
    fn on_failure(&self, _ctx: &RunContext, _severity: Severity, _error: &dyn StdError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &dyn StdError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ValidationObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn ValidationObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ValidationObserver for CompositeObserver {
    fn on_diagnostic(&self, ctx: &RunContext, diagnostic: &Diagnostic) {
        for o in &self.observers {
            o.on_diagnostic(ctx, diagnostic);
        }
    }

    fn on_success(&self, ctx: &RunContext, stats: RunStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &RunContext, severity: Severity, error: &dyn StdError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &dyn StdError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs run events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl ValidationObserver for StdErrObserver {
    fn on_diagnostic(&self, ctx: &RunContext, diagnostic: &Diagnostic) {
        eprintln!(
            "[validate][{:?}] file={} {}",
            diagnostic.severity(),
            ctx.file_name,
            diagnostic
        );
    }

    fn on_success(&self, ctx: &RunContext, stats: RunStats) {
        eprintln!(
            "[validate][ok] file={} rows_in={} rows_out={} columns={}",
            ctx.file_name, stats.input_rows, stats.output_rows, stats.columns
        );
    }

    fn on_failure(&self, ctx: &RunContext, severity: Severity, error: &dyn StdError) {
        eprintln!("[validate][{severity:?}] file={} err={error}", ctx.file_name);
    }

    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &dyn StdError) {
        eprintln!("[ALERT][validate][{severity:?}] file={} err={error}", ctx.file_name);
    }
}

/// Emits run events as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ValidationObserver for TracingObserver {
    fn on_diagnostic(&self, ctx: &RunContext, diagnostic: &Diagnostic) {
        match diagnostic.severity() {
            Severity::Info => tracing::info!(file = %ctx.file_name, "{diagnostic}"),
            _ => tracing::warn!(file = %ctx.file_name, "{diagnostic}"),
        }
    }

    fn on_success(&self, ctx: &RunContext, stats: RunStats) {
        tracing::info!(
            event = "run_finished",
            status = "success",
            file = %ctx.file_name,
            rows_in = stats.input_rows,
            rows_out = stats.output_rows,
            columns = stats.columns
        );
    }

    fn on_failure(&self, ctx: &RunContext, severity: Severity, error: &dyn StdError) {
        tracing::warn!(
            event = "run_finished",
            status = "failed",
            file = %ctx.file_name,
            severity = ?severity,
            error = %error
        );
    }

    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &dyn StdError) {
        tracing::error!(event = "alert", file = %ctx.file_name, severity = ?severity, error = %error);
    }
}

/// Appends run events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl ValidationObserver for FileObserver {
    fn on_diagnostic(&self, ctx: &RunContext, diagnostic: &Diagnostic) {
        self.append_line(&format!(
            "{} diagnostic severity={:?} file={} {}",
            unix_ts(),
            diagnostic.severity(),
            ctx.file_name,
            diagnostic
        ));
    }

    fn on_success(&self, ctx: &RunContext, stats: RunStats) {
        self.append_line(&format!(
            "{} ok file={} rows_in={} rows_out={} columns={}",
            unix_ts(),
            ctx.file_name,
            stats.input_rows,
            stats.output_rows,
            stats.columns
        ));
    }

    fn on_failure(&self, ctx: &RunContext, severity: Severity, error: &dyn StdError) {
        self.append_line(&format!(
            "{} fail severity={:?} file={} err={}",
            unix_ts(),
            severity,
            ctx.file_name,
            error
        ));
    }

    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &dyn StdError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} file={} err={}",
            unix_ts(),
            severity,
            ctx.file_name,
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
