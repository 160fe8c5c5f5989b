//! Raw dataset loaders: each export is stored as-is in its own collection.

use bson::Document;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::{ensure_index, read_file, CONCEPTS_DATASET_FILE, DIAGNOSTIC_TESTS_FILE, UNIT_TESTS_FILE};
use crate::collections;
use crate::convert::json_to_document;
use crate::errors::{DatabaseError, DatabaseResult};
use crate::store::MongoStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetLoad {
    pub success: bool,
    pub message: String,
    pub count: usize,
}

struct Dataset {
    label: &'static str,
    key: &'static str,
    collection: &'static str,
    /// `(field, unique)`
    indexes: &'static [(&'static str, bool)],
}

const CONCEPTS: Dataset = Dataset {
    label: "개념",
    key: "concepts",
    collection: collections::CONCEPTS_DATASET,
    indexes: &[("conceptId", true), ("unitId", false), ("unitCode", false)],
};

const DIAGNOSTIC_TESTS: Dataset = Dataset {
    label: "진단테스트",
    key: "sets",
    collection: collections::DIAGNOSTIC_TESTS_DATASET,
    indexes: &[("test.testId", true), ("test.userId", false), ("problems.unitId", false)],
};

const UNIT_TESTS: Dataset = Dataset {
    label: "단원테스트",
    key: "units",
    collection: collections::UNIT_TESTS_DATASET,
    indexes: &[("code", true), ("problems.problemId", false), ("problems.unitId", false)],
};

/// Pull the record array stored under the dataset's key.
fn records(data: &Value, key: &str) -> DatabaseResult<Vec<Document>> {
    let items = data
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| DatabaseError::MissingKey(key.to_string()))?;
    items.iter().map(json_to_document).collect()
}

async fn load(store: &MongoStore, dataset: &Dataset, data: &Value) -> DatabaseResult<DatasetLoad> {
    let documents = records(data, dataset.key)?;
    let count = store.replace_all(dataset.collection, documents).await?;

    let collection = store.collection(dataset.collection);
    for (field, unique) in dataset.indexes {
        ensure_index(&collection, field, *unique).await?;
    }

    tracing::info!(collection = dataset.collection, count, "Dataset stored");
    Ok(DatasetLoad {
        success: true,
        message: format!("{} 데이터 저장 완료: {}개", dataset.label, count),
        count,
    })
}

pub async fn load_concepts(store: &MongoStore, data: &Value) -> DatabaseResult<DatasetLoad> {
    load(store, &CONCEPTS, data).await
}

pub async fn load_diagnostic_tests(store: &MongoStore, data: &Value) -> DatabaseResult<DatasetLoad> {
    load(store, &DIAGNOSTIC_TESTS, data).await
}

pub async fn load_unit_tests(store: &MongoStore, data: &Value) -> DatabaseResult<DatasetLoad> {
    load(store, &UNIT_TESTS, data).await
}

/// Load the three dataset files from `data_dir`.
///
/// Every file must exist before anything is written. A dataset that fails
/// to load is reported and does not stop the others.
pub async fn load_all(store: &MongoStore, data_dir: &Path) -> DatabaseResult<DatasetLoad> {
    let files = [
        (CONCEPTS_DATASET_FILE, &CONCEPTS),
        (DIAGNOSTIC_TESTS_FILE, &DIAGNOSTIC_TESTS),
        (UNIT_TESTS_FILE, &UNIT_TESTS),
    ];
    for (file, _) in &files {
        let path = data_dir.join(file);
        if !path.exists() {
            return Err(DatabaseError::Io {
                path: path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }
    }

    let mut succeeded = 0;
    let mut total = 0;
    for (file, dataset) in &files {
        let path = data_dir.join(file);
        let outcome = match read_file(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(data) => load(store, dataset, &data).await,
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        };
        match outcome {
            Ok(result) => {
                succeeded += 1;
                total += result.count;
            }
            Err(e) => tracing::error!(file, error = %e, "Dataset load failed"),
        }
    }

    Ok(DatasetLoad {
        success: succeeded == files.len(),
        message: format!("데이터 로드 완료: {}/{} 성공", succeeded, files.len()),
        count: total,
    })
}

/// Document counts of the three dataset collections; missing collections count 0.
pub async fn dataset_stats(store: &MongoStore) -> DatabaseResult<BTreeMap<String, u64>> {
    let existing = store.list_collections().await?;
    let mut stats = BTreeMap::new();
    for name in [
        collections::CONCEPTS_DATASET,
        collections::DIAGNOSTIC_TESTS_DATASET,
        collections::UNIT_TESTS_DATASET,
    ] {
        let count = if existing.iter().any(|c| c == name) {
            store.count(name).await?
        } else {
            tracing::warn!(collection = name, "Dataset collection does not exist");
            0
        };
        stats.insert(name.to_string(), count);
    }
    Ok(stats)
}

/// Map the upload path segment to its loader key.
pub fn dataset_for_upload(data_type: &str) -> Option<&'static str> {
    match data_type {
        "concepts" => Some(CONCEPTS.key),
        "diagnostic-tests" | "diagnostic_tests" => Some(DIAGNOSTIC_TESTS.key),
        "unit-tests" | "unit_tests" => Some(UNIT_TESTS.key),
        _ => None,
    }
}

pub async fn load_by_key(store: &MongoStore, key: &str, data: &Value) -> DatabaseResult<DatasetLoad> {
    let dataset = [&CONCEPTS, &DIAGNOSTIC_TESTS, &UNIT_TESTS]
        .into_iter()
        .find(|d| d.key == key)
        .ok_or_else(|| DatabaseError::InvalidData(format!("unknown dataset '{}'", key)))?;
    load(store, dataset, data).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_requires_key() {
        let data = json!({ "concepts": [{ "conceptId": "c-1" }, { "conceptId": "c-2" }] });
        assert_eq!(records(&data, "concepts").unwrap().len(), 2);
        assert!(matches!(
            records(&data, "sets"),
            Err(DatabaseError::MissingKey(key)) if key == "sets"
        ));
    }

    #[test]
    fn test_records_rejects_non_objects() {
        let data = json!({ "units": [1, 2] });
        assert!(matches!(records(&data, "units"), Err(DatabaseError::InvalidData(_))));
    }

    #[test]
    fn test_upload_data_types() {
        assert_eq!(dataset_for_upload("concepts"), Some("concepts"));
        assert_eq!(dataset_for_upload("diagnostic-tests"), Some("sets"));
        assert_eq!(dataset_for_upload("unit_tests"), Some("units"));
        assert_eq!(dataset_for_upload("vocabulary"), None);
    }
}
