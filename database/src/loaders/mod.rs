//! Bulk loaders that move the exported data files into MongoDB.

pub mod concepts;
pub mod datasets;
pub mod problems;
pub mod units;

pub use concepts::{load_concept_documents, ConceptReport, UnitRelationship};
pub use datasets::{
    dataset_for_upload, dataset_stats, load_all, load_by_key, load_concepts, load_diagnostic_tests, load_unit_tests,
    DatasetLoad,
};
pub use problems::{load_problems, normalize_unit_id};
pub use units::{load_units, ChapterCount, UnitReport};

use bson::Document;
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};
use serde::Serialize;
use std::path::Path;

use crate::errors::{DatabaseError, DatabaseResult};
use crate::schema::is_index_conflict;

pub const UNIT_FILE: &str = "unit_nodes_ts_desc_grade_ordered.txt";
pub const CONCEPT_FILE: &str = "concept_cleaned_ndjson.txt";
pub const CONCEPTS_DATASET_FILE: &str = "개념.txt";
pub const DIAGNOSTIC_TESTS_FILE: &str = "진단테스트.txt";
pub const UNIT_TESTS_FILE: &str = "단원테스트_full버전.txt";

/// Outcome of a loader run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Records found in the input.
    pub read: usize,
    pub saved: usize,
    pub skipped: usize,
}

pub(crate) fn read_file(path: &Path) -> DatabaseResult<String> {
    std::fs::read_to_string(path).map_err(|source| DatabaseError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Lines of an NDJSON file parsed into objects. Blank lines are ignored;
/// lines that are not JSON objects are counted in `invalid`.
pub(crate) struct NdjsonLines {
    pub records: Vec<serde_json::Map<String, serde_json::Value>>,
    pub invalid: usize,
}

pub(crate) fn parse_ndjson(text: &str) -> NdjsonLines {
    let mut records = Vec::new();
    let mut invalid = 0;
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(serde_json::Value::Object(map)) => records.push(map),
            Ok(_) => {
                tracing::warn!(line = line_no + 1, "Skipping non-object line");
                invalid += 1;
            }
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "Skipping malformed line");
                invalid += 1;
            }
        }
    }
    NdjsonLines { records, invalid }
}

/// Create an ascending index named `{field}_idx`. An existing index with
/// the same name or keys is left as it is.
pub(crate) async fn ensure_index(
    collection: &Collection<Document>,
    field: &str,
    unique: bool,
) -> DatabaseResult<()> {
    let mut options = IndexOptions::default();
    options.name = Some(format!("{}_idx", field));
    if unique {
        options.unique = Some(true);
    }
    let mut keys = Document::new();
    keys.insert(field, 1_i32);
    let model = IndexModel::builder().keys(keys).options(options).build();
    match collection.create_index(model, None).await {
        Ok(_) => Ok(()),
        Err(e) if is_index_conflict(&e) => {
            tracing::debug!(collection = %collection.name(), field, "Index already exists");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ndjson_counts_bad_lines() {
        let text = "{\"unitId\": \"unit_01_01\"}\n\n  \nnot json\n[1,2]\n{\"unitId\": \"unit_01_02\"}\n";
        let parsed = parse_ndjson(text);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.invalid, 2);
        assert_eq!(parsed.records[1]["unitId"], "unit_01_02");
    }

    #[test]
    fn test_read_file_reports_path() {
        let err = read_file(Path::new("/definitely/missing.txt")).unwrap_err();
        assert!(err.to_string().contains("/definitely/missing.txt"));
    }
}
