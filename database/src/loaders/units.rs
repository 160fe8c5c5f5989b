//! Unit loader for the NDJSON curriculum export.

use bson::{Bson, Document};
use futures::TryStreamExt;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use super::{parse_ndjson, read_file, LoadReport};
use crate::collections;
use crate::convert::{date_or_default, json_to_document};
use crate::errors::DatabaseResult;
use crate::store::MongoStore;

pub const DEFAULT_UNIT_CREATED_AT: &str = "2025-08-28T10:26:51Z";

fn with_defaults(mut unit: Map<String, Value>) -> Map<String, Value> {
    let defaults = [
        ("unitId", json!("")),
        ("subject", json!("math")),
        ("title", json!({})),
        ("grade", json!(1)),
        ("chapter", json!(1)),
        ("chapterTitle", json!("")),
        ("orderInGrade", json!(1)),
        ("description", json!({})),
        ("status", json!("active")),
    ];
    for (key, value) in defaults {
        unit.entry(key).or_insert(value);
    }
    unit
}

/// Parse the export into unit documents with defaults applied.
/// Returns the documents and the number of unusable lines.
pub fn parse_units(text: &str) -> DatabaseResult<(Vec<Document>, usize)> {
    let parsed = parse_ndjson(text);
    let mut documents = Vec::with_capacity(parsed.records.len());
    for record in parsed.records {
        let mut document = json_to_document(&Value::Object(with_defaults(record)))?;
        date_or_default(&mut document, "createdAt", DEFAULT_UNIT_CREATED_AT);
        documents.push(document);
    }
    Ok((documents, parsed.invalid))
}

/// Replace the `unit` collection with the contents of `path`.
pub async fn load_units(store: &MongoStore, path: &Path) -> DatabaseResult<LoadReport> {
    let text = read_file(path)?;
    let (documents, invalid) = parse_units(&text)?;
    let read = documents.len() + invalid;
    let saved = store.replace_all(collections::UNIT, documents).await?;
    tracing::info!(read, saved, skipped = invalid, "Unit load finished");
    Ok(LoadReport { read, saved, skipped: invalid })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterCount {
    pub grade: i64,
    pub chapter: i64,
    pub count: usize,
}

/// Unit counts by grade and by `(grade, chapter)`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct UnitReport {
    pub total: usize,
    pub by_grade: BTreeMap<i64, usize>,
    pub by_chapter: Vec<ChapterCount>,
}

fn as_int(value: Option<&Bson>) -> i64 {
    match value {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(n)) => *n as i64,
        _ => 0,
    }
}

impl UnitReport {
    pub fn from_documents<'a>(units: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut report = UnitReport::default();
        let mut chapters: BTreeMap<(i64, i64), usize> = BTreeMap::new();
        for unit in units {
            let grade = as_int(unit.get("grade"));
            let chapter = as_int(unit.get("chapter"));
            report.total += 1;
            *report.by_grade.entry(grade).or_default() += 1;
            *chapters.entry((grade, chapter)).or_default() += 1;
        }
        report.by_chapter = chapters
            .into_iter()
            .map(|((grade, chapter), count)| ChapterCount { grade, chapter, count })
            .collect();
        report
    }

    pub async fn collect(store: &MongoStore) -> DatabaseResult<Self> {
        let units: Vec<Document> = store
            .collection(collections::UNIT)
            .find(None, None)
            .await?
            .try_collect()
            .await?;
        Ok(Self::from_documents(&units))
    }
}
