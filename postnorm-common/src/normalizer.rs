//! Field-mapping normalizer
//!
//! Turns platform-native post objects into records of the common post shape.
//! [`normalize`] is pure and total; [`load_raw_records`] is the only I/O.

use crate::registry::FieldMapping;
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// One platform-native post object
pub type RawRecord = Map<String, Value>;

/// One post in the common shape: exactly the mapping's common keys
pub type NormalizedRecord = Map<String, Value>;

/// Read a raw data source: a JSON array of objects
pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let records: Vec<RawRecord> =
        serde_json::from_str(&content).map_err(|e| Error::SourceMalformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    debug!(path = %path.display(), records = records.len(), "Loaded raw records");
    Ok(records)
}

/// Normalize a single record
///
/// Every common key in `mapping` is present in the output. A source key
/// missing from `record` yields `""`; a present key is copied as-is,
/// including an explicit `null`.
pub fn normalize_record(record: &RawRecord, mapping: &FieldMapping) -> NormalizedRecord {
    mapping
        .iter()
        .map(|(common_key, source_key)| {
            let value = record
                .get(source_key)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            (common_key.to_string(), value)
        })
        .collect()
}

/// Normalize records in input order
pub fn normalize(records: &[RawRecord], mapping: &FieldMapping) -> Vec<NormalizedRecord> {
    records
        .iter()
        .map(|record| normalize_record(record, mapping))
        .collect()
}
