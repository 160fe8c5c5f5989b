use async_trait::async_trait;
use nerdmath_models::{LearningPath, ProblemDocument, Unit};
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{Catalog, DiagnosticRecord};
use crate::errors::DatabaseResult;

/// Catalog kept in process memory, for tests and offline runs.
#[derive(Default)]
pub struct InMemoryCatalog {
    problems: RwLock<HashMap<String, ProblemDocument>>,
    units: RwLock<HashMap<String, Unit>>,
    results: RwLock<Vec<(String, DiagnosticRecord)>>,
    paths: RwLock<HashMap<String, LearningPath>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Problems without any id are ignored.
    pub fn insert_problem(&self, problem: ProblemDocument) {
        if let Some(id) = problem.id() {
            self.problems.write().insert(id, problem);
        }
    }

    pub fn insert_unit(&self, unit: Unit) {
        self.units.write().insert(unit.unit_id.clone(), unit);
    }

    pub fn diagnostic_results(&self) -> Vec<DiagnosticRecord> {
        self.results.read().iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn path_count(&self) -> usize {
        self.paths.read().len()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> DatabaseResult<()> {
        Ok(())
    }

    async fn find_problem(&self, problem_id: &str) -> DatabaseResult<Option<ProblemDocument>> {
        Ok(self.problems.read().get(problem_id).cloned())
    }

    async fn find_unit(&self, unit_id: &str) -> DatabaseResult<Option<Unit>> {
        Ok(self.units.read().get(unit_id).cloned())
    }

    async fn save_diagnostic_result(&self, record: &DiagnosticRecord) -> DatabaseResult<String> {
        let id = bson::oid::ObjectId::new().to_hex();
        self.results.write().push((id.clone(), record.clone()));
        Ok(id)
    }

    async fn save_learning_path(&self, path: &LearningPath) -> DatabaseResult<()> {
        self.paths.write().insert(path.path_id.clone(), path.clone());
        Ok(())
    }

    async fn find_learning_path(&self, path_id: &str) -> DatabaseResult<Option<LearningPath>> {
        Ok(self.paths.read().get(path_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_problem_and_unit_lookup() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_problem(ProblemDocument::new(json!({ "problemId": "p-1", "unitId": "unit_01_03" })));
        catalog.insert_problem(ProblemDocument::new(json!({ "content": {} })));
        catalog.insert_unit(serde_json::from_value(json!({ "unitId": "unit_01_03", "title": { "ko": "정수와 유리수" } })).unwrap());

        let problem = catalog.find_problem("p-1").await.unwrap().unwrap();
        assert_eq!(problem.unit_id().as_deref(), Some("unit_01_03"));
        assert!(catalog.find_problem("missing").await.unwrap().is_none());

        let unit = catalog.find_unit("unit_01_03").await.unwrap().unwrap();
        assert_eq!(unit.display_name(), "정수와 유리수");
    }
}
