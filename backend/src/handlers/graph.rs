use actix_web::{web, HttpResponse};
use nerdmath_graph::{clamp_depth, GraphError};
use serde::Deserialize;
use serde_json::json;

use crate::errors::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PrerequisiteQuery {
    pub depth: Option<u32>,
}

pub async fn prerequisites(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PrerequisiteQuery>,
) -> ApiResult<HttpResponse> {
    let name = path.into_inner();
    let depth = clamp_depth(query.depth.unwrap_or(state.config.learning.max_depth));

    let (node, kind) = state
        .graph
        .resolve_concept(&name)
        .await?
        .ok_or_else(|| GraphError::ConceptNotFound(name.clone()))?;
    let prerequisites = state.graph.prerequisites(&node.concept, depth).await?;

    Ok(HttpResponse::Ok().json(json!({
        "concept": node,
        "match": kind,
        "depth": depth,
        "count": prerequisites.len(),
        "prerequisites": prerequisites,
    })))
}

pub async fn statistics(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let stats = state.graph.statistics().await?;
    Ok(HttpResponse::Ok().json(json!({
        "backend": state.graph.backend(),
        "statistics": stats,
    })))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{test_app_state, TestParts};
    use actix_web::{http::StatusCode, test as actix_test, web, App};
    use nerdmath_graph::{GraphImport, InMemoryConceptGraph};
    use serde_json::Value;
    use std::sync::Arc;

    const NODES: &str = "concept,unit,grade\n\
        1.1 소인수분해,수와 연산,1\n\
        1.2 정수와 유리수,수와 연산,1\n\
        1.3 정수와 유리수의 계산,수와 연산,1\n\
        2.1 문자의 사용과 식,문자와 식,1\n";
    const EDGES: &str = "source,target,type\n\
        1.1 소인수분해,1.2 정수와 유리수,precedes\n\
        1.2 정수와 유리수,1.3 정수와 유리수의 계산,precedes\n\
        1.3 정수와 유리수의 계산,2.1 문자의 사용과 식,precedes\n";

    macro_rules! app {
        () => {{
            let import = GraphImport::from_csv_str(NODES, EDGES).unwrap();
            let state = test_app_state(TestParts {
                graph: Some(Arc::new(InMemoryConceptGraph::from_import(&import))),
                ..Default::default()
            });
            actix_test::init_service(
                App::new()
                    .app_data(web::Data::new(state))
                    .configure(|cfg| crate::routes::configure_routes(cfg, None)),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn test_prerequisites_with_depth() {
        let app = app!();
        let uri = "/api/graph/concepts/2.1%20%EB%AC%B8%EC%9E%90%EC%9D%98%20%EC%82%AC%EC%9A%A9%EA%B3%BC%20%EC%8B%9D/prerequisites?depth=2";
        let body: Value =
            actix_test::call_and_read_body_json(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;

        assert_eq!(body["match"], "exact");
        assert_eq!(body["depth"], 2);
        assert_eq!(body["count"], 2);
        assert_eq!(body["prerequisites"][0]["concept"], "1.3 정수와 유리수의 계산");
        assert_eq!(body["prerequisites"][0]["depth"], 1);
        assert_eq!(body["prerequisites"][1]["concept"], "1.2 정수와 유리수");
    }

    #[actix_web::test]
    async fn test_depth_is_clamped_and_unknown_concept_is_404() {
        let app = app!();
        let uri = "/api/graph/concepts/%EC%86%8C%EC%9D%B8%EC%88%98%EB%B6%84%ED%95%B4/prerequisites?depth=0";
        let body: Value =
            actix_test::call_and_read_body_json(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(body["match"], "similar");
        assert_eq!(body["depth"], 1);
        assert_eq!(body["count"], 0);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/graph/concepts/geometry/prerequisites")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_statistics() {
        let app = app!();
        let body: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/api/graph/statistics").to_request(),
        )
        .await;
        assert_eq!(body["backend"], "memory");
        assert_eq!(body["statistics"]["conceptCount"], 4);
        assert_eq!(body["statistics"]["precedesCount"], 3);
        assert!(body["statistics"]["averageConnections"].is_number());
        assert!(body["statistics"].get("concept_count").is_none());
    }
}
