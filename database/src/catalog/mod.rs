//! Lookups and persistence the tutoring services depend on.

mod memory;
mod mongo;

pub use memory::InMemoryCatalog;
pub use mongo::MongoCatalog;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nerdmath_models::{
    DiagnosticAnalysis, ExpressDiagnosticRequest, ExternalId, LearningPath, ProblemDocument, Unit,
};
use serde::{Deserialize, Serialize};

use crate::errors::DatabaseResult;

/// One completed express diagnostic, as stored in `express_diagnostic_results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRecord {
    pub test_id: String,
    pub user_id: ExternalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_range: Option<String>,
    pub status: String,
    pub diagnostic_data: ExpressDiagnosticRequest,
    pub analysis_result: DiagnosticAnalysis,
    pub learning_path: LearningPath,
    pub created_at: DateTime<Utc>,
}

impl DiagnosticRecord {
    pub fn completed(
        request: &ExpressDiagnosticRequest,
        analysis: &DiagnosticAnalysis,
        path: &LearningPath,
    ) -> Self {
        Self {
            test_id: request.test_id.clone(),
            user_id: request.user_id.clone(),
            grade_range: request.grade_range.clone(),
            status: "completed".to_string(),
            diagnostic_data: request.clone(),
            analysis_result: analysis.clone(),
            learning_path: path.clone(),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Short name of the backing store for health output.
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> DatabaseResult<()>;

    /// Look a problem up by `problemId`, legacy `problem_id`, or `_id`.
    async fn find_problem(&self, problem_id: &str) -> DatabaseResult<Option<ProblemDocument>>;

    /// Look a unit up by `unitId` or `_id`.
    async fn find_unit(&self, unit_id: &str) -> DatabaseResult<Option<Unit>>;

    /// Returns the stored record id.
    async fn save_diagnostic_result(&self, record: &DiagnosticRecord) -> DatabaseResult<String>;

    async fn save_learning_path(&self, path: &LearningPath) -> DatabaseResult<()>;

    async fn find_learning_path(&self, path_id: &str) -> DatabaseResult<Option<LearningPath>>;
}
