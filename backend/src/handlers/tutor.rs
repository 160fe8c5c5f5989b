use actix_web::{web, HttpResponse};
use nerdmath_ai::{chat_reply, TutorKind};
use nerdmath_models::{ExternalId, ProblemDocument};
use serde::Deserialize;
use serde_json::json;

use crate::errors::{ApiError, ApiResult};
use crate::state::AppState;

async fn fetch_problem(state: &AppState, problem_id: &str) -> ApiResult<ProblemDocument> {
    state
        .catalog()?
        .find_problem(problem_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("문제를 찾을 수 없습니다: {}", problem_id)))
}

pub async fn get_problem(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let problem = fetch_problem(&state, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "problem": problem })))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

pub async fn chat(body: web::Json<ChatRequest>) -> ApiResult<HttpResponse> {
    let reply = chat_reply(&body.message).ok_or_else(|| ApiError::BadRequest("메시지가 필요합니다.".to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "reply": reply })))
}

#[derive(Debug, Default, Deserialize)]
pub struct TutorRequest {
    #[serde(default)]
    pub problem_id: Option<ExternalId>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub concept_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl TutorRequest {
    fn text_for(&self, kind: TutorKind) -> String {
        let text = match kind {
            TutorKind::Concept => self.concept_name.as_ref().or(self.question.as_ref()),
            TutorKind::Solve | TutorKind::Recommend => self.question.as_ref(),
        };
        text.cloned().unwrap_or_default()
    }
}

async fn assist(state: &AppState, kind: TutorKind, body: TutorRequest) -> ApiResult<HttpResponse> {
    let problem_id = body
        .problem_id
        .as_ref()
        .map(ToString::to_string)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("problem_id가 필요합니다.".to_string()))?;

    let problem = fetch_problem(state, &problem_id).await?;
    let tutor = state.tutor()?;

    tracing::info!(problem_id = %problem_id, kind = ?kind, session_id = ?body.session_id, "Tutor request");
    let reply = tutor.assist(kind, &problem, &body.text_for(kind)).await?;
    Ok(HttpResponse::Ok().json(reply.into_response(&problem)))
}

pub async fn solve_with_problem(
    state: web::Data<AppState>,
    body: web::Json<TutorRequest>,
) -> ApiResult<HttpResponse> {
    assist(&state, TutorKind::Solve, body.into_inner()).await
}

pub async fn concept_with_problem(
    state: web::Data<AppState>,
    body: web::Json<TutorRequest>,
) -> ApiResult<HttpResponse> {
    assist(&state, TutorKind::Concept, body.into_inner()).await
}

pub async fn rag_with_problem(
    state: web::Data<AppState>,
    body: web::Json<TutorRequest>,
) -> ApiResult<HttpResponse> {
    assist(&state, TutorKind::Recommend, body.into_inner()).await
}

#[cfg(test)]
mod tests {
    use crate::test_support::{test_app_state, TestParts};
    use actix_web::{http::StatusCode, test as actix_test, web, App};
    use nerdmath_ai::StaticLlm;
    use nerdmath_database::InMemoryCatalog;
    use nerdmath_models::ProblemDocument;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn catalog() -> Arc<InMemoryCatalog> {
        let catalog = InMemoryCatalog::new();
        catalog.insert_problem(ProblemDocument::new(json!({
            "problemId": "42",
            "unitId": "unit_01_01",
            "content": { "question": "12를 소인수분해하시오." }
        })));
        Arc::new(catalog)
    }

    macro_rules! app {
        ($parts:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data(web::Data::new(test_app_state($parts)))
                    .configure(|cfg| crate::routes::configure_routes(cfg, None)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_get_problem_both_paths() {
        let app = app!(TestParts {
            catalog: Some(catalog()),
            ..Default::default()
        });

        for uri in ["/api/problems/42", "/api/problem/42"] {
            let body: Value =
                actix_test::call_and_read_body_json(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(body["problem"]["problemId"], "42");
        }

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/problems/7").to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_problem_without_store_is_unavailable() {
        let app = app!(TestParts::default());
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/problems/42").to_request()).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_chat() {
        let app = app!(TestParts::default());

        let req = actix_test::TestRequest::post()
            .uri("/api/chat")
            .set_json(json!({ "message": "수학 문제 질문이요" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert!(body["reply"].as_str().unwrap().contains("/api/solve"));

        let req = actix_test::TestRequest::post()
            .uri("/api/chat")
            .set_json(json!({ "message": "" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["error"], "메시지가 필요합니다.");
    }

    #[actix_web::test]
    async fn test_solve_with_problem() {
        let llm = Arc::new(StaticLlm::new().reply(r#"{"steps": ["12 = 2 × 2 × 3"], "answer": "2² × 3"}"#));
        let app = app!(TestParts {
            catalog: Some(catalog()),
            llm: Some(llm.clone()),
            ..Default::default()
        });

        let req = actix_test::TestRequest::post()
            .uri("/api/solve_with_problem")
            .set_json(json!({ "problem_id": 42, "question": "어떻게 풀어요?" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["ai_solution"]["answer"], "2² × 3");
        assert_eq!(body["problem"]["problemId"], "42");
        assert!(llm.requests()[0].user.starts_with("문제: 12를 소인수분해하시오."));
    }

    #[actix_web::test]
    async fn test_concept_with_problem_partial_success() {
        let llm = Arc::new(StaticLlm::new().reply("소인수분해란 ..."));
        let app = app!(TestParts {
            catalog: Some(catalog()),
            llm: Some(llm.clone()),
            ..Default::default()
        });

        let req = actix_test::TestRequest::post()
            .uri("/api/concept_with_problem")
            .set_json(json!({ "problem_id": "42", "concept_name": "소인수분해" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "partial_success");
        assert_eq!(body["ai_concept"]["raw_response"], "소인수분해란 ...");
        assert!(llm.requests()[0].user.ends_with("개념 설명 요청: 소인수분해"));
    }

    #[actix_web::test]
    async fn test_tutor_request_errors() {
        let app = app!(TestParts {
            catalog: Some(catalog()),
            ..Default::default()
        });

        let req = actix_test::TestRequest::post()
            .uri("/api/rag_with_problem")
            .set_json(json!({ "question": "추천해줘" }))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = actix_test::TestRequest::post()
            .uri("/api/rag_with_problem")
            .set_json(json!({ "problem_id": "404" }))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        // no LLM configured
        let req = actix_test::TestRequest::post()
            .uri("/api/rag_with_problem")
            .set_json(json!({ "problem_id": "42" }))
            .to_request();
        assert_eq!(
            actix_test::call_service(&app, req).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
