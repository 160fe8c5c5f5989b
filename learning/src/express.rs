use nerdmath_config::LearningConfig;
use nerdmath_database::{Catalog, DiagnosticRecord};
use nerdmath_graph::ConceptGraph;
use nerdmath_models::{ExpressDiagnosticRequest, ExpressDiagnosticResponse};
use std::sync::Arc;

use crate::comment::CommentWriter;
use crate::diagnostic::DiagnosticService;
use crate::errors::LearningResult;
use crate::path_builder::LearningPathBuilder;

/// Analyze a diagnostic, build its learning path and store both.
pub struct ExpressDiagnosticFlow {
    catalog: Arc<dyn Catalog>,
    diagnostics: DiagnosticService,
    paths: LearningPathBuilder,
}

impl ExpressDiagnosticFlow {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        graph: Arc<dyn ConceptGraph>,
        comments: Option<Arc<dyn CommentWriter>>,
        config: LearningConfig,
    ) -> Self {
        let mut diagnostics = DiagnosticService::new(catalog.clone(), config.clone());
        if let Some(writer) = comments {
            diagnostics = diagnostics.with_comment_writer(writer);
        }
        Self {
            catalog,
            diagnostics,
            paths: LearningPathBuilder::new(graph, config),
        }
    }

    pub async fn run(&self, request: &ExpressDiagnosticRequest) -> LearningResult<ExpressDiagnosticResponse> {
        let mut analysis = self.diagnostics.analyze(request).await?;

        let path = match self.paths.build(&analysis).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(test_id = %request.test_id, error = %e, "Graph unavailable, building path without prerequisites");
                self.paths.build_without_prerequisites(&analysis)
            }
        };
        analysis.recommended_start_concept = path.start_concept.clone();

        let record = DiagnosticRecord::completed(request, &analysis, &path);
        let result_id = self.catalog.save_diagnostic_result(&record).await?;
        self.catalog.save_learning_path(&path).await?;

        tracing::info!(
            test_id = %request.test_id,
            result_id = %result_id,
            path_id = %path.path_id,
            nodes = path.total_concepts,
            "Express diagnostic completed"
        );

        Ok(ExpressDiagnosticResponse {
            success: true,
            message: "진단 분석 및 학습 경로 생성이 완료되었습니다.".to_string(),
            result_id,
            analysis,
            learning_path: path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nerdmath_database::InMemoryCatalog;
    use nerdmath_graph::{
        ConnectionReport, GraphError, GraphImport, GraphResult, GraphStatistics, InMemoryConceptGraph,
    };
    use nerdmath_models::{ConceptNode, ProblemDocument, Prerequisite};
    use serde_json::json;

    /// Graph whose every call fails.
    struct DownGraph;

    #[async_trait]
    impl ConceptGraph for DownGraph {
        fn backend(&self) -> &'static str {
            "down"
        }
        async fn health(&self) -> GraphResult<()> {
            Err(GraphError::Neo4j("connection refused".into()))
        }
        async fn find_concept(&self, _name: &str) -> GraphResult<Option<ConceptNode>> {
            Err(GraphError::Neo4j("connection refused".into()))
        }
        async fn find_similar_concept(&self, _name: &str) -> GraphResult<Option<ConceptNode>> {
            Err(GraphError::Neo4j("connection refused".into()))
        }
        async fn prerequisites(&self, _name: &str, _max_depth: u32) -> GraphResult<Vec<Prerequisite>> {
            Err(GraphError::Neo4j("connection refused".into()))
        }
        async fn successors(&self, _name: &str, _limit: usize) -> GraphResult<Vec<ConceptNode>> {
            Err(GraphError::Neo4j("connection refused".into()))
        }
        async fn statistics(&self) -> GraphResult<GraphStatistics> {
            Err(GraphError::Neo4j("connection refused".into()))
        }
        async fn connection_report(&self, _top: usize) -> GraphResult<ConnectionReport> {
            Err(GraphError::Neo4j("connection refused".into()))
        }
    }

    fn catalog() -> Arc<InMemoryCatalog> {
        let catalog = InMemoryCatalog::new();
        catalog.insert_problem(ProblemDocument::new(json!({ "problemId": "101", "unitId": "unit_01_02" })));
        catalog.insert_unit(
            serde_json::from_value(json!({ "unitId": "unit_01_02", "title": "1.2 정수와 유리수" })).unwrap(),
        );
        Arc::new(catalog)
    }

    fn request() -> ExpressDiagnosticRequest {
        serde_json::from_value(json!({
            "testId": "express-1",
            "userId": "learner-9",
            "answers": [
                { "problemId": 101, "isCorrect": false, "durationSeconds": 45 },
                { "problemId": "5.1-02", "isCorrect": true, "durationSeconds": 15 }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_flow_persists_result_and_path() {
        let import = GraphImport::from_csv_str(
            "concept,unit,grade\n1.1 소인수분해,수와 연산,1\n1.2 정수와 유리수,수와 연산,1\n",
            "source,target,type\n1.1 소인수분해,1.2 정수와 유리수,precedes\n",
        )
        .unwrap();
        let catalog = catalog();
        let flow = ExpressDiagnosticFlow::new(
            catalog.clone(),
            Arc::new(InMemoryConceptGraph::from_import(&import)),
            None,
            LearningConfig::default(),
        );

        let response = flow.run(&request()).await.unwrap();
        assert!(response.success);
        assert_eq!(response.analysis.weak_units, vec!["1.2 정수와 유리수"]);
        assert_eq!(response.learning_path.total_concepts, 2);
        assert_eq!(
            response.analysis.recommended_start_concept.as_deref(),
            Some("1.1 소인수분해")
        );
        assert_eq!(response.learning_path.analysis_id, response.analysis.analysis_id);

        let stored = catalog.diagnostic_results();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, "completed");
        assert_eq!(stored[0].test_id, "express-1");
        assert_eq!(catalog.path_count(), 1);
        assert!(catalog
            .find_learning_path(&response.learning_path.path_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_graph_failure_degrades_to_weak_concepts_only() {
        let flow = ExpressDiagnosticFlow::new(catalog(), Arc::new(DownGraph), None, LearningConfig::default());
        let response = flow.run(&request()).await.unwrap();
        assert_eq!(response.learning_path.total_concepts, 1);
        assert!(response.learning_path.nodes[0].is_weak_concept);
        assert_eq!(response.learning_path.estimated_duration, 20);
    }
}
