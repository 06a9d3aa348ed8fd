//! Where raw input bytes come from.

use std::path::{Path, PathBuf};

use crate::error::IngestionResult;

/// A fetched input object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Object key / relative path.
    pub name: String,
    /// MIME type reported by the store, if any.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Source of raw input files, injected into [`super::Pipeline`].
pub trait RecordSource: Send + Sync {
    /// Fetch one object by name.
    fn fetch(&self, name: &str) -> IngestionResult<SourceFile>;
}

/// Reads input files from a local directory.
///
/// Content types are derived from the extension (`.csv` → `text/csv`, anything else →
/// `application/octet-stream`).
#[derive(Debug, Clone)]
pub struct LocalDirSource {
    root: PathBuf,
}

impl LocalDirSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl RecordSource for LocalDirSource {
    fn fetch(&self, name: &str) -> IngestionResult<SourceFile> {
        let path = self.root.join(name);
        let bytes = std::fs::read(&path)?;
        let content_type = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => "text/csv",
            _ => "application/octet-stream",
        };
        Ok(SourceFile {
            name: name.to_string(),
            content_type: Some(content_type.to_string()),
            bytes,
        })
    }
}

/// Check an object against the expected file type.
///
/// Matches when `expected` occurs in the content type, or when the store only reports
/// `application/octet-stream` and `expected` occurs in the file name.
pub fn file_type_matches(expected: &str, file_name: &str, content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) if ct.contains(expected) => true,
        Some(ct) if ct.contains("application/octet-stream") => file_name.contains(expected),
        Some(_) => false,
        None => file_name.contains(expected),
    }
}
