//! Decoding delimited bytes into a [`RecordSet`].

use std::path::Path;

use crate::error::IngestionResult;
use crate::types::RecordSet;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode UTF-8 delimited text (an optional BOM is skipped) into raw rows.
///
/// Every line becomes a row, including the header; rows may have different lengths (the
/// engine reports shape problems with row numbers). `separator` must be ASCII, which
/// [`crate::schema::Schema::validate`] guarantees.
pub fn decode_record_set(bytes: &[u8], separator: char) -> IngestionResult<RecordSet> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(separator as u8)
        .from_reader(bytes);
    read_records(&mut rdr)
}

/// Read and decode a delimited file from disk.
pub fn decode_record_set_from_path(path: impl AsRef<Path>, separator: char) -> IngestionResult<RecordSet> {
    let bytes = std::fs::read(path)?;
    decode_record_set(&bytes, separator)
}

/// Collect all rows from an existing CSV reader.
pub fn read_records<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> IngestionResult<RecordSet> {
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_owned).collect());
    }
    Ok(RecordSet::new(rows))
}
