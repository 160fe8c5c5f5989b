//! Concept explanation loader and its consistency checks against `unit`.

use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use nerdmath_models::ConceptDocument;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::{parse_ndjson, read_file, LoadReport};
use crate::collections;
use crate::convert::{date_or_default, document_to_json, json_to_document};
use crate::errors::DatabaseResult;
use crate::store::MongoStore;

pub const DEFAULT_CONCEPT_CREATED_AT: &str = "2025-08-28T06:14:18Z";

fn with_defaults(mut concept: Map<String, Value>) -> Map<String, Value> {
    concept.entry("conceptId").or_insert(json!(""));
    concept.entry("unitId").or_insert(json!(""));
    concept.entry("blocks").or_insert(json!([]));
    concept
}

pub fn parse_concepts(text: &str) -> DatabaseResult<(Vec<Document>, usize)> {
    let parsed = parse_ndjson(text);
    let mut documents = Vec::with_capacity(parsed.records.len());
    for record in parsed.records {
        let mut document = json_to_document(&Value::Object(with_defaults(record)))?;
        date_or_default(&mut document, "createdAt", DEFAULT_CONCEPT_CREATED_AT);
        documents.push(document);
    }
    Ok((documents, parsed.invalid))
}

/// Replace the `concept` collection with the contents of `path`.
pub async fn load_concept_documents(store: &MongoStore, path: &Path) -> DatabaseResult<LoadReport> {
    let text = read_file(path)?;
    let (documents, invalid) = parse_concepts(&text)?;
    let read = documents.len() + invalid;
    let saved = store.replace_all(collections::CONCEPT, documents).await?;
    tracing::info!(read, saved, skipped = invalid, "Concept load finished");
    Ok(LoadReport { read, saved, skipped: invalid })
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ConceptReport {
    pub total: usize,
    pub by_unit: BTreeMap<String, usize>,
    pub block_types: BTreeMap<String, usize>,
    pub practice_blocks: usize,
    pub practice_problems: usize,
}

impl ConceptReport {
    pub fn from_concepts<'a>(concepts: impl IntoIterator<Item = &'a ConceptDocument>) -> Self {
        let mut report = ConceptReport::default();
        for concept in concepts {
            report.total += 1;
            *report.by_unit.entry(concept.unit_id.clone()).or_default() += 1;
            for block_type in concept.block_types() {
                *report.block_types.entry(block_type.to_string()).or_default() += 1;
                if block_type == "practiceProblems" {
                    report.practice_blocks += 1;
                }
            }
            report.practice_problems += concept.practice_problem_count();
        }
        report
    }

    pub async fn collect(store: &MongoStore) -> DatabaseResult<Self> {
        let documents: Vec<Document> = store
            .collection(collections::CONCEPT)
            .find(None, None)
            .await?
            .try_collect()
            .await?;
        let mut concepts = Vec::with_capacity(documents.len());
        for document in documents {
            concepts.push(serde_json::from_value::<ConceptDocument>(document_to_json(document))?);
        }
        Ok(Self::from_concepts(&concepts))
    }
}

/// How the `unitId`s referenced by concepts line up with the stored units.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct UnitRelationship {
    pub common: BTreeSet<String>,
    pub concept_only: BTreeSet<String>,
    pub unit_only: BTreeSet<String>,
    /// Share of concept unit ids that exist in `unit`, in percent.
    pub match_rate: f64,
}

impl UnitRelationship {
    pub fn compare(concept_unit_ids: BTreeSet<String>, unit_ids: BTreeSet<String>) -> Self {
        let common: BTreeSet<String> = concept_unit_ids.intersection(&unit_ids).cloned().collect();
        let concept_only = concept_unit_ids.difference(&unit_ids).cloned().collect();
        let unit_only = unit_ids.difference(&concept_unit_ids).cloned().collect();
        let match_rate = if concept_unit_ids.is_empty() {
            0.0
        } else {
            common.len() as f64 / concept_unit_ids.len() as f64 * 100.0
        };
        Self {
            common,
            concept_only,
            unit_only,
            match_rate,
        }
    }

    pub async fn collect(store: &MongoStore) -> DatabaseResult<Self> {
        let concept_ids = unit_ids_in(store, collections::CONCEPT).await?;
        let unit_ids = unit_ids_in(store, collections::UNIT).await?;
        Ok(Self::compare(concept_ids, unit_ids))
    }
}

async fn unit_ids_in(store: &MongoStore, collection: &str) -> DatabaseResult<BTreeSet<String>> {
    let options = FindOptions::builder().projection(doc! { "unitId": 1 }).build();
    let documents: Vec<Document> = store
        .collection(collection)
        .find(None, options)
        .await?
        .try_collect()
        .await?;
    Ok(documents
        .iter()
        .filter_map(|d| d.get_str("unitId").ok())
        .map(str::to_string)
        .collect())
}
