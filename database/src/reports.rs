//! Read-only summaries and maintenance helpers over the stored data.

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::collections;
use crate::convert::document_to_json;
use crate::errors::DatabaseResult;
use crate::store::MongoStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitEntry {
    #[serde(default)]
    pub unit_id: String,
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub chapter: Value,
    #[serde(default)]
    pub chapter_title: Option<String>,
}

impl UnitEntry {
    /// `"{chapter}. {title.ko}"`, as the grade table lists units.
    pub fn label(&self) -> String {
        let title = match &self.title {
            Value::Object(map) => map
                .get("ko")
                .and_then(Value::as_str)
                .unwrap_or("제목 없음")
                .to_string(),
            Value::String(s) => s.clone(),
            Value::Null => "제목 없음".to_string(),
            other => other.to_string(),
        };
        format!("{}. {}", self.chapter, title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeSummary {
    #[serde(rename = "_id")]
    pub grade: Value,
    pub count: u64,
    pub units: Vec<UnitEntry>,
}

/// Units grouped by grade, lowest grade first.
pub async fn unit_summary_by_grade(store: &MongoStore) -> DatabaseResult<Vec<GradeSummary>> {
    let pipeline = vec![
        doc! {
            "$group": {
                "_id": "$grade",
                "count": { "$sum": 1 },
                "units": { "$push": {
                    "unitId": "$unitId",
                    "title": "$title",
                    "chapter": "$chapter",
                    "chapterTitle": "$chapterTitle",
                }},
            }
        },
        doc! { "$sort": { "_id": 1 } },
    ];
    let groups: Vec<Document> = store
        .collection(collections::UNIT)
        .aggregate(pipeline, None)
        .await?
        .try_collect()
        .await?;

    let mut summary = Vec::with_capacity(groups.len());
    for group in groups {
        summary.push(serde_json::from_value(document_to_json(group))?);
    }
    Ok(summary)
}

/// Document count of every collection in the database.
pub async fn collection_counts(store: &MongoStore) -> DatabaseResult<BTreeMap<String, u64>> {
    let mut counts = BTreeMap::new();
    for name in store.list_collections().await? {
        let count = store.count(&name).await?;
        counts.insert(name, count);
    }
    Ok(counts)
}

#[derive(Debug, Clone, Serialize)]
pub struct Export {
    pub export_time: DateTime<Utc>,
    pub diagnostic_results: Vec<Value>,
    pub learning_paths: Vec<Value>,
}

/// The newest diagnostic results and learning paths, rendered as JSON.
pub async fn export_recent(store: &MongoStore, limit: i64) -> DatabaseResult<Export> {
    let results = store
        .latest(collections::EXPRESS_DIAGNOSTIC_RESULTS, limit)
        .await?;
    let paths = store.latest(collections::LEARNING_PATHS, limit).await?;
    Ok(Export {
        export_time: Utc::now(),
        diagnostic_results: results.into_iter().map(document_to_json).collect(),
        learning_paths: paths.into_iter().map(document_to_json).collect(),
    })
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub diagnostic_results_deleted: u64,
    pub learning_paths_deleted: u64,
}

/// Delete diagnostic results by `testId` and learning paths by `pathId`.
pub async fn cleanup_test_data(
    store: &MongoStore,
    test_ids: &[String],
    path_ids: &[String],
) -> DatabaseResult<CleanupReport> {
    let mut report = CleanupReport::default();

    let results = store.collection(collections::EXPRESS_DIAGNOSTIC_RESULTS);
    for test_id in test_ids {
        let deleted = results
            .delete_many(doc! { "testId": test_id }, None)
            .await?
            .deleted_count;
        tracing::info!(test_id = %test_id, deleted, "Removed diagnostic results");
        report.diagnostic_results_deleted += deleted;
    }

    let paths = store.collection(collections::LEARNING_PATHS);
    for path_id in path_ids {
        let deleted = paths
            .delete_many(doc! { "pathId": path_id }, None)
            .await?
            .deleted_count;
        tracing::info!(path_id = %path_id, deleted, "Removed learning paths");
        report.learning_paths_deleted += deleted;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grade_summary_from_aggregate_output() {
        let group = doc! {
            "_id": 1_i32,
            "count": 2_i32,
            "units": [
                { "unitId": "unit_01_01", "title": { "ko": "소인수분해" }, "chapter": 1_i32, "chapterTitle": "1. 수와 연산" },
                { "unitId": "unit_01_02", "chapter": 1_i32 },
            ],
        };
        let summary: GradeSummary = serde_json::from_value(document_to_json(group)).unwrap();
        assert_eq!(summary.grade, json!(1));
        assert_eq!(summary.count, 2);
        assert_eq!(summary.units[0].label(), "1. 소인수분해");
        assert_eq!(summary.units[1].label(), "1. 제목 없음");
    }
}
