//! Problem loader for the unit-test and diagnostic-test exports.

use bson::{Bson, Document};
use nerdmath_models::ProblemDocument;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

use super::{read_file, LoadReport};
use crate::collections;
use crate::convert::{convert_dates, json_to_document};
use crate::errors::{DatabaseError, DatabaseResult};
use crate::schema::{collection_spec, is_index_conflict, IndexSpec};
use crate::store::MongoStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemSource {
    /// `{"units": [{"code", "title", "problems": [...]}]}`
    UnitTest,
    /// `{"sets": [{"problems": [...]}]}`
    Diagnostic,
}

impl ProblemSource {
    fn container_key(&self) -> &'static str {
        match self {
            ProblemSource::UnitTest => "units",
            ProblemSource::Diagnostic => "sets",
        }
    }
}

/// `"3.1"` becomes `"unit_03_01"`. Anything that is not exactly two
/// dot-separated parts is returned unchanged.
pub fn normalize_unit_id(raw: &str) -> String {
    let mut parts = raw.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(grade), Some(chapter), None) => {
            format!("unit_{:0>2}_{:0>2}", grade.trim(), chapter.trim())
        }
        _ => raw.to_string(),
    }
}

fn prepare(mut problem: Map<String, Value>, source: ProblemSource) -> Map<String, Value> {
    if let Some(id) = problem.get("problemId").cloned() {
        let id = match id {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        if !id.is_empty() {
            problem.insert("problemId".into(), Value::String(id));
        }
    }
    if let Some(Value::String(unit_id)) = problem.get("unitId") {
        let normalized = normalize_unit_id(unit_id);
        problem.insert("unitId".into(), Value::String(normalized));
    }
    match source {
        ProblemSource::UnitTest => {
            problem.insert("diagnosticTest".into(), Value::Bool(false));
        }
        ProblemSource::Diagnostic => {
            problem
                .entry("diagnosticTest")
                .or_insert(Value::Bool(true));
        }
    }
    problem
}

/// Extract and normalize every problem in an export.
pub fn parse_problems(text: &str, source: ProblemSource) -> DatabaseResult<Vec<Value>> {
    let data: Value = serde_json::from_str(text)?;
    let key = source.container_key();
    let groups = data
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| DatabaseError::MissingKey(key.to_string()))?;

    let problems = groups
        .iter()
        .filter_map(|group| group.get("problems").and_then(Value::as_array))
        .flatten()
        .filter_map(|p| p.as_object().cloned())
        .map(|p| Value::Object(prepare(p, source)))
        .collect();
    Ok(problems)
}

/// Split problems into those to insert and the number skipped, either for
/// missing required fields or for a `problemId` already seen.
pub fn select_new_problems(problems: Vec<Value>, existing: &HashSet<String>) -> (Vec<Value>, usize) {
    let mut seen = existing.clone();
    let mut accepted = Vec::new();
    let mut skipped = 0;

    for value in problems {
        let problem = ProblemDocument::new(value);
        let missing = problem.missing_required_fields();
        if !missing.is_empty() {
            tracing::debug!(problem_id = ?problem.id(), ?missing, "Skipping incomplete problem");
            skipped += 1;
            continue;
        }
        let Some(id) = problem.id() else {
            skipped += 1;
            continue;
        };
        if !seen.insert(id) {
            skipped += 1;
            continue;
        }
        accepted.push(problem.0);
    }
    (accepted, skipped)
}

fn read_source(path: &Path, source: ProblemSource) -> Vec<Value> {
    let parsed = read_file(path).and_then(|text| parse_problems(&text, source));
    match parsed {
        Ok(problems) => {
            tracing::info!(path = %path.display(), count = problems.len(), "Read problems");
            problems
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read problem export");
            Vec::new()
        }
    }
}

/// Indexes the loader maintains on `problem`; the same set collection setup
/// creates, so either may run first.
fn problem_indexes() -> &'static [IndexSpec] {
    collection_spec(collections::PROBLEM).map_or(&[], |spec| spec.indexes)
}

/// Returns `(created, skipped)`. An index that already exists is skipped;
/// any other failure is logged and does not fail the load.
async fn create_problem_indexes(store: &MongoStore) -> (usize, usize) {
    let collection = store.collection(collections::PROBLEM);
    let (mut created, mut skipped) = (0, 0);
    for index in problem_indexes() {
        match collection.create_index(index.model(), None).await {
            Ok(_) => created += 1,
            Err(e) if is_index_conflict(&e) => {
                tracing::debug!(index = %index.name(), "Index already exists");
                skipped += 1;
            }
            Err(e) => {
                tracing::warn!(index = %index.name(), error = %e, "Failed to create problem index");
            }
        }
    }
    (created, skipped)
}

/// Load both exports into the `problem` collection.
///
/// An unreadable export contributes no problems; the other one is still
/// loaded. Problems already in the collection are kept.
pub async fn load_problems(
    store: &MongoStore,
    unit_test_path: &Path,
    diagnostic_path: &Path,
) -> DatabaseResult<LoadReport> {
    let mut problems = read_source(unit_test_path, ProblemSource::UnitTest);
    problems.extend(read_source(diagnostic_path, ProblemSource::Diagnostic));
    let read = problems.len();

    let collection = store.collection(collections::PROBLEM);
    let existing: HashSet<String> = collection
        .distinct("problemId", None, None)
        .await?
        .into_iter()
        .filter_map(|id| match id {
            Bson::String(s) => Some(s),
            _ => None,
        })
        .collect();

    let (accepted, skipped) = select_new_problems(problems, &existing);
    let mut documents: Vec<Document> = Vec::with_capacity(accepted.len());
    for problem in &accepted {
        let mut document = json_to_document(problem)?;
        convert_dates(&mut document, &["createdAt", "updatedAt"]);
        documents.push(document);
    }

    let saved = if documents.is_empty() {
        0
    } else {
        collection.insert_many(documents, None).await?.inserted_ids.len()
    };
    let (indexes, existing_indexes) = create_problem_indexes(store).await;

    tracing::info!(read, saved, skipped, indexes, existing_indexes, "Problem load finished");
    Ok(LoadReport { read, saved, skipped })
}
