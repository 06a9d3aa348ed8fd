use std::collections::HashMap;
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;

use record_validation::ingestion::{
    validate_file, CompositeObserver, FileObserver, LocalDirSource, ParquetDirSink, Pipeline, PipelineOptions, RunContext, RunStats, RunStatus,
    ValidationObserver,
};
use record_validation::schema::Schema;
use record_validation::types::Value;
use record_validation::validation::{Diagnostic, Severity};
use record_validation::{IngestionError, ValidationError};

fn tmp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("record-validation-{tag}-{nanos}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn fixture_schema() -> Schema {
    Schema::from_path("tests/fixtures/metadata.json").unwrap()
}

fn pipeline(out: &Path, observer: Option<Arc<dyn ValidationObserver>>) -> Pipeline {
    Pipeline::new(
        Arc::new(LocalDirSource::new("tests/fixtures")),
        Arc::new(ParquetDirSink::new(out)),
    )
    .with_options(PipelineOptions {
        observer,
        alert_at_or_above: Severity::Critical,
    })
}

#[derive(Default)]
struct RecordingObserver {
    diagnostics: Mutex<Vec<Diagnostic>>,
    successes: Mutex<Vec<RunStats>>,
    failures: Mutex<Vec<Severity>>,
    alerts: Mutex<Vec<Severity>>,
}

impl ValidationObserver for RecordingObserver {
    fn on_diagnostic(&self, _ctx: &RunContext, diagnostic: &Diagnostic) {
        self.diagnostics.lock().unwrap().push(diagnostic.clone());
    }

    fn on_success(&self, _ctx: &RunContext, stats: RunStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_failure(&self, _ctx: &RunContext, severity: Severity, _error: &dyn StdError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &RunContext, severity: Severity, _error: &dyn StdError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

#[test]
fn validate_file_applies_fixture_schema() {
    let report = validate_file("tests/fixtures/people.csv", &fixture_schema()).unwrap();
    let ds = report.outcome.dataset().expect("valid");

    assert_eq!(ds.column_names().collect::<Vec<_>>(), vec!["id", "name", "country", "price"]);
    assert_eq!(ds.row_count(), 2);
    assert_eq!(
        ds.column("country").unwrap().values,
        vec![Value::from("Portuguese Republic"), Value::from("ES")]
    );
    assert_eq!(
        ds.column("price").unwrap().values,
        vec![Value::Float64(1234.0), Value::Float64(99.5)]
    );
    assert_eq!(report.diagnostics, vec![Diagnostic::DuplicatesRemoved { count: 1 }]);
}

#[test]
fn pipeline_stores_parquet_and_reports_success() {
    let out = tmp_dir("ok");
    let obs = Arc::new(RecordingObserver::default());
    let summary = pipeline(&out, Some(obs.clone())).run("people.csv", &fixture_schema()).unwrap();

    assert_eq!(summary.status, RunStatus::Success);
    assert_eq!(summary.rows, Some(2));
    let location = PathBuf::from(summary.output_location.as_ref().unwrap());
    assert_eq!(location, out.join("people.parquet"));

    assert_eq!(
        obs.successes.lock().unwrap().clone(),
        vec![RunStats {
            input_rows: 4,
            output_rows: 2,
            columns: 4
        }]
    );
    assert_eq!(obs.diagnostics.lock().unwrap().len(), 1);
    assert!(obs.failures.lock().unwrap().is_empty());

    let reader = SerializedFileReader::try_from(location.as_path()).unwrap();
    assert_eq!(reader.metadata().file_metadata().num_rows(), 2);

    let mut prices = Vec::new();
    let mut names = Vec::new();
    for row in reader.into_iter() {
        let row = row.unwrap();
        let by_name: HashMap<&str, &Field> = row.get_column_iter().map(|(n, f)| (n.as_str(), f)).collect();
        assert!(!by_name.contains_key("ssn"));
        if let Field::Double(v) = by_name["price"] {
            prices.push(*v);
        }
        if let Field::Str(s) = by_name["name"] {
            names.push(s.clone());
        }
    }
    assert_eq!(prices, vec![1234.0, 99.5]);
    assert_eq!(names, vec!["Ada".to_string(), "Grace".to_string()]);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["diagnostics"][0]["kind"], "duplicates_removed");
}

#[test]
fn rejected_data_is_not_an_infrastructure_error() {
    let out = tmp_dir("rejected");
    let obs = Arc::new(RecordingObserver::default());
    let summary = pipeline(&out, Some(obs.clone())).run("bad_price.csv", &fixture_schema()).unwrap();

    assert_eq!(summary.status, RunStatus::Rejected);
    assert!(summary.output_location.is_none());
    assert!(matches!(
        summary.error,
        Some(ValidationError::Coercion { row: 3, ref column, .. }) if column == "price"
    ));
    assert!(!out.join("bad_price.parquet").exists());

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![Severity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
    assert!(obs.successes.lock().unwrap().is_empty());
}

#[test]
fn missing_input_is_critical_and_alerts() {
    let out = tmp_dir("missing");
    let obs = Arc::new(RecordingObserver::default());
    let err = pipeline(&out, Some(obs.clone()))
        .run("does_not_exist.csv", &fixture_schema())
        .unwrap_err();

    assert!(matches!(err, IngestionError::Io(_)));
    assert_eq!(obs.failures.lock().unwrap().clone(), vec![Severity::Critical]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![Severity::Critical]);
}

#[test]
fn file_type_mismatch_is_a_warning() {
    let dir = tmp_dir("filetype");
    std::fs::write(dir.join("people.txt"), "id;name\n1;Ada\n").unwrap();
    let schema = Schema::new(["id", "name"])
        .with_separator(';')
        .with_primary_key(["id"])
        .with_file_type("csv");

    let summary = Pipeline::new(
        Arc::new(LocalDirSource::new(&dir)),
        Arc::new(ParquetDirSink::new(dir.join("out"))),
    )
    .run("people.txt", &schema)
    .unwrap();

    assert_eq!(summary.status, RunStatus::Success);
    assert!(matches!(
        summary.diagnostics.as_slice(),
        [Diagnostic::FileTypeMismatch { expected, .. }] if expected == "csv"
    ));
    assert!(dir.join("out").join("people.txt.parquet").exists());
}

#[test]
fn file_observer_appends_run_events() {
    let out = tmp_dir("filelog");
    let log = out.join("runs.log");
    let observer: Arc<dyn ValidationObserver> = Arc::new(CompositeObserver::new(vec![
        Arc::new(FileObserver::new(&log)),
        Arc::new(RecordingObserver::default()),
    ]));
    let p = pipeline(&out, Some(observer));
    p.run("people.csv", &fixture_schema()).unwrap();
    p.run("bad_price.csv", &fixture_schema()).unwrap();

    let contents = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("diagnostic severity=Info file=people.csv"));
    assert!(lines[1].contains("ok file=people.csv rows_in=4 rows_out=2 columns=4"));
    assert!(lines[2].contains("fail severity=Error file=bad_price.csv"));
}
