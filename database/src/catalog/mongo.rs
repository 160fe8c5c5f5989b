use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use nerdmath_models::{LearningPath, ProblemDocument, Unit};

use super::{Catalog, DiagnosticRecord};
use crate::collections;
use crate::convert::{bson_date, document_to_json};
use crate::errors::DatabaseResult;
use crate::store::MongoStore;

pub struct MongoCatalog {
    store: MongoStore,
}

impl MongoCatalog {
    pub fn new(store: MongoStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MongoStore {
        &self.store
    }

    /// Try each filter in order and return the first hit.
    async fn find_first(&self, collection: &str, filters: Vec<Document>) -> DatabaseResult<Option<Document>> {
        let coll = self.store.collection(collection);
        for filter in filters {
            if let Some(found) = coll.find_one(filter, None).await? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

/// `field = id` filters for each key, then `_id` as string and ObjectId.
fn id_filters(keys: &[&str], id: &str) -> Vec<Document> {
    let mut filters: Vec<Document> = keys.iter().map(|k| doc! { *k: id }).collect();
    filters.push(doc! { "_id": id });
    if let Ok(oid) = ObjectId::parse_str(id) {
        filters.push(doc! { "_id": oid });
    }
    filters
}

#[async_trait]
impl Catalog for MongoCatalog {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> DatabaseResult<()> {
        self.store.ping().await
    }

    async fn find_problem(&self, problem_id: &str) -> DatabaseResult<Option<ProblemDocument>> {
        let found = self
            .find_first(collections::PROBLEM, id_filters(&["problemId", "problem_id"], problem_id))
            .await?;
        Ok(found.map(|d| ProblemDocument::new(document_to_json(d))))
    }

    async fn find_unit(&self, unit_id: &str) -> DatabaseResult<Option<Unit>> {
        let found = self
            .find_first(collections::UNIT, id_filters(&["unitId"], unit_id))
            .await?;
        match found {
            Some(d) => Ok(Some(serde_json::from_value(document_to_json(d))?)),
            None => Ok(None),
        }
    }

    async fn save_diagnostic_result(&self, record: &DiagnosticRecord) -> DatabaseResult<String> {
        let mut document = bson::to_document(record)?;
        document.insert("createdAt", bson_date(record.created_at));
        let result = self
            .store
            .collection(collections::EXPRESS_DIAGNOSTIC_RESULTS)
            .insert_one(document, None)
            .await?;
        let id = match result.inserted_id {
            bson::Bson::ObjectId(oid) => oid.to_hex(),
            other => other.to_string(),
        };
        tracing::info!(test_id = %record.test_id, id = %id, "Saved express diagnostic result");
        Ok(id)
    }

    async fn save_learning_path(&self, path: &LearningPath) -> DatabaseResult<()> {
        let mut document = bson::to_document(path)?;
        document.insert("createdAt", bson_date(path.created_at));
        self.store
            .collection(collections::LEARNING_PATHS)
            .insert_one(document, None)
            .await?;
        tracing::info!(path_id = %path.path_id, nodes = path.nodes.len(), "Saved learning path");
        Ok(())
    }

    async fn find_learning_path(&self, path_id: &str) -> DatabaseResult<Option<LearningPath>> {
        let found = self
            .store
            .collection(collections::LEARNING_PATHS)
            .find_one(doc! { "pathId": path_id }, None)
            .await?;
        match found {
            Some(d) => Ok(Some(serde_json::from_value(document_to_json(d))?)),
            None => Ok(None),
        }
    }
}
