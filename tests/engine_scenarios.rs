use record_validation::schema::{DuplicatePolicy, Field, FieldType, HeaderMismatchPolicy, Schema};
use record_validation::types::{Column, DataSet, DataType, RecordSet, Value};
use record_validation::validation::{validate_and_transform, Diagnostic, DuplicateKey, ValidationOutcome};
use record_validation::ValidationError;

fn id_name_schema(policy: &str) -> Schema {
    Schema::new(["id", "name"])
        .with_primary_key(["id"])
        .with_duplicate_policy(policy)
}

fn rows(data: &[[&str; 2]]) -> RecordSet {
    let mut all = vec![vec!["id".to_string(), "name".to_string()]];
    all.extend(data.iter().map(|r| r.iter().map(|s| s.to_string()).collect()));
    RecordSet::new(all)
}

#[test]
fn scenario_a_unique_keys_pass() {
    let report = validate_and_transform(&rows(&[["1", "Alice"], ["2", "Bob"]]), &id_name_schema("fail"));
    assert_eq!(
        report.outcome,
        ValidationOutcome::Valid(DataSet::new(vec![
            Column::utf8("id", ["1", "2"]),
            Column::utf8("name", ["Alice", "Bob"]),
        ]))
    );
    assert!(report.diagnostics.is_empty());
    assert!(report.duplicates.is_empty());
}

#[test]
fn scenario_b_duplicates_fail() {
    let report = validate_and_transform(&rows(&[["1", "Alice"], ["1", "Bob"]]), &id_name_schema("fail"));
    assert_eq!(
        report.outcome,
        ValidationOutcome::Invalid(ValidationError::DuplicateKey {
            duplicates: vec![DuplicateKey {
                row: 3,
                key: vec!["1".to_string()]
            }]
        })
    );
}

#[test]
fn scenario_c_remove_keeps_first_occurrence() {
    let report = validate_and_transform(&rows(&[["1", "Alice"], ["1", "Bob"]]), &id_name_schema("remove"));
    assert_eq!(
        report.outcome,
        ValidationOutcome::Valid(DataSet::new(vec![
            Column::utf8("id", ["1"]),
            Column::utf8("name", ["Alice"]),
        ]))
    );
    assert_eq!(report.diagnostics, vec![Diagnostic::DuplicatesRemoved { count: 1 }]);
}

#[test]
fn scenario_d_monetary_coercion() {
    let schema = Schema::new(["id", "price"])
        .with_primary_key(["id"])
        .with_field(Field::new("price", FieldType::Monetary));
    let records = RecordSet::from_rows([vec!["id", "price"], vec!["1", "EUR 1,234"]]);
    let ds = validate_and_transform(&records, &schema).outcome.into_result().unwrap();
    let price = ds.column("price").unwrap();
    assert_eq!(price.data_type, DataType::Float64);
    assert_eq!(price.values, vec![Value::Float64(1234.0)]);
}

#[test]
fn scenario_e_sensitive_column_is_redacted() {
    let schema = Schema::new(["id", "ssn"])
        .with_primary_key(["id"])
        .with_field(Field::new("ssn", FieldType::String).sensitive());
    let records = RecordSet::from_rows([vec!["id", "ssn"], vec!["1", "123-45-6789"]]);
    let report = validate_and_transform(&records, &schema);
    let ds = report.outcome.dataset().expect("valid outcome");
    assert!(ds.column("ssn").is_none());
    assert_eq!(ds.column_names().collect::<Vec<_>>(), vec!["id"]);
}

#[test]
fn scenario_f_missing_key_column() {
    let schema = Schema::new(["id", "name"]).with_primary_key(["missing_col"]);
    let report = validate_and_transform(&rows(&[["1", "Alice"]]), &schema);
    assert!(matches!(
        report.outcome,
        ValidationOutcome::Invalid(ValidationError::SchemaConformance { .. })
    ));
}

#[test]
fn policy_table_compliance() {
    let with_dups = rows(&[["1", "Alice"], ["1", "Bob"]]);
    let without_dups = rows(&[["1", "Alice"], ["2", "Bob"]]);

    let cases = [
        ("fail", false, true),
        ("warn", true, true),
        ("ignore", true, true),
        ("remove", true, true),
        ("bogus", false, true),
    ];
    for (policy, passes_with_dups, passes_without_dups) in cases {
        let schema = id_name_schema(policy);
        assert_eq!(
            validate_and_transform(&with_dups, &schema).outcome.is_valid(),
            passes_with_dups,
            "policy {policy} with duplicates"
        );
        assert_eq!(
            validate_and_transform(&without_dups, &schema).outcome.is_valid(),
            passes_without_dups,
            "policy {policy} without duplicates"
        );
    }

    let report = validate_and_transform(&with_dups, &id_name_schema("bogus"));
    assert_eq!(
        report.outcome.error(),
        Some(&ValidationError::InvalidPolicy {
            policy: "bogus".to_string()
        })
    );
}

#[test]
fn warn_policy_lists_every_duplicate() {
    let records = rows(&[["1", "a"], ["1", "b"], ["2", "c"], ["2", "d"], ["1", "e"]]);
    let report = validate_and_transform(&records, &id_name_schema("warn"));
    let expected = vec![
        DuplicateKey { row: 3, key: vec!["1".to_string()] },
        DuplicateKey { row: 5, key: vec!["2".to_string()] },
        DuplicateKey { row: 6, key: vec!["1".to_string()] },
    ];
    assert_eq!(report.duplicates, expected);
    assert_eq!(report.diagnostics, vec![Diagnostic::DuplicateKeys { duplicates: expected }]);
    // warn keeps every row
    assert_eq!(report.outcome.dataset().unwrap().row_count(), 5);
}

#[test]
fn duplicate_count_matches_repeats() {
    // 10 rows, keys cycle through 0..4, so 6 rows repeat an earlier key.
    let mut data = vec![vec!["id".to_string(), "name".to_string()]];
    for i in 0..10 {
        data.push(vec![(i % 4).to_string(), format!("n{i}")]);
    }
    let records = RecordSet::new(data);
    let report = validate_and_transform(&records, &id_name_schema("ignore"));
    assert_eq!(report.duplicates.len(), 6);
    assert_eq!(report.duplicates[0].row, 6);
    assert_eq!(report.diagnostics, vec![Diagnostic::DuplicatesIgnored { count: 6 }]);

    let removed = validate_and_transform(&records, &id_name_schema("remove"));
    let ds = removed.outcome.dataset().unwrap();
    // column-length invariant: input data rows minus removed rows
    assert_eq!(ds.row_count(), 10 - 6);
    assert!(ds.columns.iter().all(|c| c.len() == ds.row_count()));
}

#[test]
fn runs_are_idempotent() {
    let schema = Schema::new(["id", "name", "score", "ssn"])
        .with_primary_key(["id"])
        .with_duplicate_policy(DuplicatePolicy::Remove)
        .with_field(Field::new("score", FieldType::Double))
        .with_field(Field::new("ssn", FieldType::String).sensitive())
        .with_field(Field::new("name", FieldType::String).with_value_map([("Bob", "Robert")]));
    let records = RecordSet::from_rows([
        vec!["id", "name", "score", "ssn"],
        vec!["1", "Bob", "1,5", "x"],
        vec!["1", "Ann", "2", "y"],
        vec!["2", "Cy", "", "z"],
    ]);

    let first = validate_and_transform(&records, &schema);
    let second = validate_and_transform(&records, &schema);
    assert_eq!(first, second);

    let ds = first.outcome.dataset().unwrap();
    assert_eq!(ds.column("name").unwrap().values, vec![Value::from("Robert"), Value::from("Cy")]);
    assert_eq!(ds.column("score").unwrap().values, vec![Value::Float64(1.5), Value::Null]);
}

#[test]
fn fatal_header_mismatch_is_configurable() {
    let records = RecordSet::from_rows([vec!["id", "fullname"], vec!["1", "Ada"]]);
    let warn = id_name_schema("fail");
    let report = validate_and_transform(&records, &warn);
    assert!(report.outcome.is_valid());
    assert!(matches!(report.diagnostics[0], Diagnostic::HeaderMismatch { .. }));

    let fail = id_name_schema("fail").with_header_mismatch(HeaderMismatchPolicy::Fail);
    let report = validate_and_transform(&records, &fail);
    assert!(matches!(
        report.outcome,
        ValidationOutcome::Invalid(ValidationError::HeaderMismatch { .. })
    ));
}

#[test]
fn empty_primary_key_fails_closed() {
    let schema = Schema::new(["id", "name"]);
    let report = validate_and_transform(&rows(&[["1", "a"]]), &schema);
    assert!(matches!(
        report.outcome.error(),
        Some(ValidationError::SchemaConformance { message }) if message.contains("no primary key")
    ));
}

#[test]
fn coercion_error_names_column_and_row() {
    let schema = Schema::new(["id", "qty"])
        .with_primary_key(["id"])
        .with_field(Field::new("qty", FieldType::Integer));
    let records = RecordSet::from_rows([vec!["id", "qty"], vec!["1", "3"], vec!["2", "three"]]);
    let err = validate_and_transform(&records, &schema).outcome.into_result().unwrap_err();
    assert_eq!(
        err.to_string(),
        "failed to coerce value at row 3 column 'qty' to integer: invalid digit found in string (raw='three')"
    );
}

#[test]
fn schemas_are_shareable_across_threads() {
    let schema = std::sync::Arc::new(id_name_schema("remove"));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let schema = std::sync::Arc::clone(&schema);
            std::thread::spawn(move || {
                let key = i.to_string();
                let records = rows(&[[key.as_str(), "a"], [key.as_str(), "b"]]);
                validate_and_transform(&records, &schema)
            })
        })
        .collect();
    for h in handles {
        let report = h.join().unwrap();
        assert_eq!(report.outcome.dataset().unwrap().row_count(), 1);
    }
}

#[test]
fn longer_header_with_declared_count_only_warns() {
    let schema = id_name_schema("fail").with_column_count(2);
    let records = RecordSet::from_rows([vec!["id", "name", "extra"], vec!["1", "a"]]);
    let report = validate_and_transform(&records, &schema);
    assert_eq!(
        report.outcome,
        ValidationOutcome::Valid(DataSet::new(vec![
            Column::utf8("id", ["1"]),
            Column::utf8("name", ["a"]),
        ]))
    );
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::HeaderMismatch {
            expected: vec!["id".to_string(), "name".to_string()],
            actual: vec!["id".to_string(), "name".to_string(), "extra".to_string()],
        }]
    );

    let fatal = schema.with_header_mismatch(HeaderMismatchPolicy::Fail);
    assert!(matches!(
        validate_and_transform(&records, &fatal).outcome,
        ValidationOutcome::Invalid(ValidationError::HeaderMismatch { .. })
    ));
}

#[test]
fn remove_leaves_no_duplicate_keys_after_sanitization() {
    let report = validate_and_transform(&rows(&[["1", "a"], ["1#", "b"]]), &id_name_schema("remove"));
    let ds = report.outcome.dataset().unwrap();
    assert_eq!(ds.row_count(), 1);
    assert_eq!(ds.column("id").unwrap().values, vec![Value::from("1")]);
    assert_eq!(ds.column("name").unwrap().values, vec![Value::from("a")]);
}

#[test]
fn non_finite_doubles_are_coercion_errors() {
    let schema = Schema::new(["id", "score"])
        .with_primary_key(["id"])
        .with_field(Field::new("score", FieldType::Double));
    let records = RecordSet::from_rows([vec!["id", "score"], vec!["1", "NaN"]]);
    let report = validate_and_transform(&records, &schema);
    assert!(matches!(
        report.outcome.error(),
        Some(ValidationError::Coercion { row: 2, column, .. }) if column == "score"
    ));
    assert_eq!(report, validate_and_transform(&records, &schema));
}
