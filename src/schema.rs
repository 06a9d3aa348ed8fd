//! The Schema Model: declarative validation and transformation rules for one kind of input
//! file.
//!
//! A [`Schema`] is loaded once per run, either from a JSON metadata document
//! ([`Schema::from_json_str`], [`Schema::from_path`]) or built in code with the `with_*`
//! methods. Documents are checked by [`Schema::validate`] at load time so malformed rules are
//! rejected before any record is processed.
//!
//! ```rust
//! use record_validation::schema::{DuplicatePolicy, FieldType, Schema};
//!
//! let schema = Schema::from_json_str(r#"{
//!     "file_validation": { "separator": ";", "column_quantity": 2 },
//!     "record_validation": {
//!         "header": true,
//!         "column_names": ["id", "price"],
//!         "primary_key": ["id"],
//!         "duplicates": "warn"
//!     },
//!     "fields": [{ "name": "price", "type": "monetary" }]
//! }"#).unwrap();
//!
//! assert_eq!(schema.separator(), ';');
//! assert_eq!(schema.duplicate_policy(), &DuplicatePolicy::Warn);
//! assert_eq!(schema.field("price").unwrap().field_type, FieldType::Monetary);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Raw value → replacement lookup used by value maps and transform steps.
pub type ValueMap = BTreeMap<String, String>;

/// Declared type of a field. This is a closed set: every variant has exactly one coercion
/// routine in [`crate::validation::coerce`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Text; only value mapping applies.
    #[default]
    String,
    /// Floating point number; `,` is accepted as the decimal mark.
    Double,
    /// Amount with optional currency marker and thousands separators.
    Monetary,
    /// `true/false`, `1/0`, `yes/no`, ...
    Boolean,
    /// 64-bit signed integer.
    Integer,
}

impl FieldType {
    /// Returns `true` for types whose cells stay text (and are therefore sanitized).
    pub fn is_textual(self) -> bool {
        matches!(self, FieldType::String)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Double => "double",
            FieldType::Monetary => "monetary",
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when two data rows share a primary-key tuple.
///
/// Unknown policy names are kept as [`DuplicatePolicy::Unrecognized`] so that schemas built in
/// code can still carry them; [`Schema::validate`] rejects them at load time and the duplicate
/// detector rejects them again at use time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DuplicatePolicy {
    /// Reject the record set.
    Fail,
    /// Report every duplicate and continue.
    Warn,
    /// Note the duplicates and continue.
    Ignore,
    /// Keep the first occurrence of each key and drop the rest.
    Remove,
    /// Anything else.
    Unrecognized(String),
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &str {
        match self {
            DuplicatePolicy::Fail => "fail",
            DuplicatePolicy::Warn => "warn",
            DuplicatePolicy::Ignore => "ignore",
            DuplicatePolicy::Remove => "remove",
            DuplicatePolicy::Unrecognized(s) => s.as_str(),
        }
    }
}

impl From<&str> for DuplicatePolicy {
    fn from(s: &str) -> Self {
        match s {
            "fail" => DuplicatePolicy::Fail,
            "warn" => DuplicatePolicy::Warn,
            "ignore" => DuplicatePolicy::Ignore,
            "remove" => DuplicatePolicy::Remove,
            other => DuplicatePolicy::Unrecognized(other.to_owned()),
        }
    }
}

impl From<String> for DuplicatePolicy {
    fn from(s: String) -> Self {
        DuplicatePolicy::from(s.as_str())
    }
}

impl From<DuplicatePolicy> for String {
    fn from(p: DuplicatePolicy) -> Self {
        p.as_str().to_owned()
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a header that differs from the declared column names stops the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderMismatchPolicy {
    /// Record a warning diagnostic and continue.
    #[default]
    Warn,
    /// Reject the record set with [`crate::ValidationError::HeaderMismatch`].
    Fail,
}

/// Per-field rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldMetadata {
    /// Drop the column from the output.
    pub sensitive: bool,
    /// Replace cells found as keys; other cells pass through.
    pub value_map: Option<ValueMap>,
    /// Mappings applied in order after `value_map` (string fields only).
    pub transform_values: Vec<ValueMap>,
}

/// A single field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Field {
    /// Column name the rules apply to.
    pub name: String,
    /// Declared type; defaults to [`FieldType::String`].
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub metadata: FieldMetadata,
}

impl Field {
    /// Create a new field with no metadata.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            metadata: FieldMetadata::default(),
        }
    }

    /// Mark the field as sensitive (redacted from the output).
    pub fn sensitive(mut self) -> Self {
        self.metadata.sensitive = true;
        self
    }

    /// Attach a value map.
    pub fn with_value_map<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata.value_map = Some(collect_map(entries));
        self
    }

    /// Append one mapping to the ordered transform list.
    pub fn with_transform<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata.transform_values.push(collect_map(entries));
        self
    }
}

fn collect_map<I, K, V>(entries: I) -> ValueMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Options for the Field Transformer's sanitization and numeric parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Strip characters outside the allow-list from text columns.
    pub sanitize: bool,
    /// Punctuation kept by sanitization, in addition to letters, digits and space.
    pub allowed_punctuation: String,
    /// Tokens removed from monetary cells before parsing (e.g. `EUR`).
    pub currency_markers: Vec<String>,
    /// Grouping character removed from monetary cells.
    pub thousands_separator: char,
    /// Decimal mark of monetary cells.
    pub decimal_separator: char,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            sanitize: true,
            allowed_punctuation: ".,-_/()&'@:".to_string(),
            currency_markers: vec!["EUR".to_string()],
            thousands_separator: ',',
            decimal_separator: '.',
        }
    }
}

impl TransformOptions {
    /// Returns `true` if `c` survives sanitization.
    pub fn is_allowed(&self, c: char) -> bool {
        c.is_alphanumeric() || c == ' ' || self.allowed_punctuation.contains(c)
    }
}

/// Immutable validation/transformation rules for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    separator: char,
    has_header: bool,
    column_names: Vec<String>,
    column_count: Option<usize>,
    primary_key: Vec<String>,
    duplicate_policy: DuplicatePolicy,
    header_mismatch: HeaderMismatchPolicy,
    fields: Vec<Field>,
    transform: TransformOptions,
    file_type: Option<String>,
}

impl Schema {
    /// Create a schema expecting a header with `column_names`.
    ///
    /// Defaults: `,` separator, no primary key, `fail` duplicate policy, header mismatch as a
    /// warning, no field rules.
    pub fn new<I, S>(column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            separator: ',',
            has_header: true,
            column_names: column_names.into_iter().map(Into::into).collect(),
            column_count: None,
            primary_key: Vec::new(),
            duplicate_policy: DuplicatePolicy::Fail,
            header_mismatch: HeaderMismatchPolicy::Warn,
            fields: Vec::new(),
            transform: TransformOptions::default(),
            file_type: None,
        }
    }

    /// Set the cell separator.
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Declare whether row 0 is a header.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the expected number of cells per data row.
    pub fn with_column_count(mut self, column_count: usize) -> Self {
        self.column_count = Some(column_count);
        self
    }

    /// Set the primary-key columns, in key order.
    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the duplicate policy (`fail`, `warn`, `ignore`, `remove`).
    pub fn with_duplicate_policy(mut self, policy: impl Into<DuplicatePolicy>) -> Self {
        self.duplicate_policy = policy.into();
        self
    }

    /// Choose whether a header mismatch warns or fails.
    pub fn with_header_mismatch(mut self, policy: HeaderMismatchPolicy) -> Self {
        self.header_mismatch = policy;
        self
    }

    /// Append a field descriptor.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Replace the sanitization and numeric parsing options.
    pub fn with_transform_options(mut self, options: TransformOptions) -> Self {
        self.transform = options;
        self
    }

    /// Set the expected file type (e.g. `csv`).
    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    /// Parse and validate a JSON schema document.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let doc: SchemaDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    /// Parse and validate a JSON schema document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SchemaError> {
        let doc: SchemaDocument = serde_json::from_reader(reader)?;
        Self::from_document(doc)
    }

    /// Read, parse and validate a JSON schema document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn from_document(doc: SchemaDocument) -> Result<Self, SchemaError> {
        let separator = single_char(&doc.file_validation.separator)?;
        let schema = Self {
            separator,
            has_header: doc.record_validation.header,
            column_names: doc.record_validation.column_names,
            column_count: doc.file_validation.column_quantity,
            primary_key: doc.record_validation.primary_key,
            duplicate_policy: doc.record_validation.duplicates,
            header_mismatch: doc.record_validation.header_mismatch,
            fields: doc.fields,
            transform: doc.transform,
            file_type: doc.file_validation.file_type,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Check the schema for internal consistency.
    ///
    /// An empty primary key is accepted here; the duplicate detector rejects it when run.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !self.separator.is_ascii() || self.separator == '\n' || self.separator == '\r' {
            return invalid(format!(
                "separator must be a single ASCII character other than a line break, got {:?}",
                self.separator
            ));
        }
        if let DuplicatePolicy::Unrecognized(p) = &self.duplicate_policy {
            return invalid(format!(
                "unrecognized duplicates policy '{p}' (expected fail, warn, ignore or remove)"
            ));
        }
        if self.has_header && self.column_names.is_empty() {
            return invalid("header is declared but column_names is empty".to_string());
        }
        if let Some(n) = self.column_count {
            if n == 0 {
                return invalid("column_quantity must be > 0".to_string());
            }
            if !self.column_names.is_empty() && n != self.column_names.len() {
                return invalid(format!(
                    "column_quantity {n} does not match {} column_names",
                    self.column_names.len()
                ));
            }
        }
        if !self.column_names.is_empty() {
            for pk in &self.primary_key {
                if !self.column_names.contains(pk) {
                    return invalid(format!("primary key column '{pk}' is not a declared column"));
                }
            }
        }
        let mut seen = HashSet::new();
        for f in &self.fields {
            if !seen.insert(f.name.as_str()) {
                return invalid(format!("field '{}' is declared more than once", f.name));
            }
        }
        if self.transform.thousands_separator == self.transform.decimal_separator {
            return invalid("thousands_separator and decimal_separator must differ".to_string());
        }
        Ok(())
    }

    /// Cell separator.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Whether row 0 is a header.
    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Declared column names, in order.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Expected cells per row, if declared.
    pub fn column_count(&self) -> Option<usize> {
        self.column_count
    }

    /// Primary-key columns, in key order.
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Policy applied to repeated primary keys.
    pub fn duplicate_policy(&self) -> &DuplicatePolicy {
        &self.duplicate_policy
    }

    /// Policy applied when the header differs from the declared names.
    pub fn header_mismatch(&self) -> HeaderMismatchPolicy {
        self.header_mismatch
    }

    /// Field descriptors, in declared order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field descriptor by column name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Sanitization and numeric parsing options.
    pub fn transform(&self) -> &TransformOptions {
        &self.transform
    }

    /// Expected file type (e.g. `csv`), if declared.
    pub fn file_type(&self) -> Option<&str> {
        self.file_type.as_deref()
    }
}

fn invalid<T>(message: String) -> Result<T, SchemaError> {
    Err(SchemaError::Invalid { message })
}

fn single_char(s: &str) -> Result<char, SchemaError> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => invalid(format!("separator must be exactly one character, got {s:?}")),
    }
}

// On-disk layout of the metadata document.

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    file_validation: FileValidationSection,
    record_validation: RecordValidationSection,
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default)]
    transform: TransformOptions,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FileValidationSection {
    file_type: Option<String>,
    separator: String,
    column_quantity: Option<usize>,
}

impl Default for FileValidationSection {
    fn default() -> Self {
        Self {
            file_type: None,
            separator: ",".to_string(),
            column_quantity: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecordValidationSection {
    #[serde(default)]
    header: bool,
    #[serde(default)]
    column_names: Vec<String>,
    #[serde(default)]
    primary_key: Vec<String>,
    duplicates: DuplicatePolicy,
    #[serde(default)]
    header_mismatch: HeaderMismatchPolicy,
}
