use actix_web::{web, HttpResponse};
use chrono::Utc;
use nerdmath_middleware::token_matches;
use serde::Deserialize;
use serde_json::json;

use crate::errors::ApiResult;
use crate::state::AppState;

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "NerdMath API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "GET /health",
            "GET /api/db/health",
            "GET /api/env/check",
            "POST /api/auth/verify-token",
            "GET /api/problems/{id}",
            "POST /api/chat",
            "POST /api/solve_with_problem",
            "POST /api/concept_with_problem",
            "POST /api/rag_with_problem",
            "POST /api/learning-path/express/diagnostic",
            "GET /api/learning-path/{path_id}",
            "GET /api/graph/concepts/{name}/prerequisites",
            "GET /api/graph/statistics",
            "POST /api/data/load-concepts",
            "POST /api/data/load-diagnostic-tests",
            "POST /api/data/load-unit-tests",
            "POST /api/data/upload/{data_type}",
            "POST /api/data/load-all",
            "GET /api/data/stats"
        ]
    }))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub async fn db_health(state: web::Data<AppState>) -> HttpResponse {
    let mongodb = match &state.store {
        Some(store) => match store.ping().await {
            Ok(()) => json!({
                "status": "connected",
                "database": store.name(),
                "collections": store.list_collections().await.unwrap_or_default(),
            }),
            Err(e) => json!({ "status": "error", "error": e.to_string() }),
        },
        None => json!({ "status": "not_connected" }),
    };

    let graph = match state.graph.health().await {
        Ok(()) => json!({ "status": "connected", "backend": state.graph.backend() }),
        Err(e) => json!({ "status": "error", "backend": state.graph.backend(), "error": e.to_string() }),
    };

    HttpResponse::Ok().json(json!({
        "mongodb": mongodb,
        "graph": graph,
        "uptime_seconds": (Utc::now() - state.started_at).num_seconds(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn env_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.config.redacted())
}

#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    #[serde(default)]
    pub service_token: String,
}

pub async fn verify_token(
    state: web::Data<AppState>,
    body: web::Json<VerifyTokenRequest>,
) -> ApiResult<HttpResponse> {
    let valid = state
        .config
        .service_token
        .as_deref()
        .map_or(false, |expected| token_matches(expected, body.service_token.trim()));

    if valid {
        Ok(HttpResponse::Ok().json(json!({ "valid": true, "message": "토큰 검증 성공" })))
    } else {
        tracing::warn!("Service token verification failed");
        Ok(HttpResponse::Unauthorized().json(json!({ "valid": false, "message": "토큰 검증 실패" })))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{test_app_state, TestParts};
    use actix_web::{http::StatusCode, test as actix_test, web, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_health_and_index() {
        let state = web::Data::new(test_app_state(TestParts::default()));
        let app = actix_test::init_service(
            App::new().app_data(state).configure(|cfg| crate::routes::configure_routes(cfg, None)),
        )
        .await;

        let body: Value =
            actix_test::call_and_read_body_json(&app, actix_test::TestRequest::get().uri("/health").to_request())
                .await;
        assert_eq!(body, json!({ "status": "ok" }));

        let body: Value =
            actix_test::call_and_read_body_json(&app, actix_test::TestRequest::get().uri("/").to_request()).await;
        assert!(body["endpoints"].as_array().unwrap().len() > 10);
    }

    #[actix_web::test]
    async fn test_db_health_reports_missing_store() {
        let state = web::Data::new(test_app_state(TestParts::default()));
        let app = actix_test::init_service(
            App::new().app_data(state).configure(|cfg| crate::routes::configure_routes(cfg, None)),
        )
        .await;

        let body: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/api/db/health").to_request(),
        )
        .await;
        assert_eq!(body["mongodb"]["status"], "not_connected");
        assert_eq!(body["graph"]["backend"], "memory");
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn test_env_check_masks_secrets() {
        let state = web::Data::new(test_app_state(TestParts {
            env: vec![("OPENAI_API_KEY", "sk-abcdefghijklmnop"), ("SERVICE_TOKEN", "s3cret")],
            ..Default::default()
        }));
        let app = actix_test::init_service(
            App::new().app_data(state).configure(|cfg| crate::routes::configure_routes(cfg, None)),
        )
        .await;

        let body = actix_test::call_and_read_body(
            &app,
            actix_test::TestRequest::get().uri("/api/env/check").to_request(),
        )
        .await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("sk-abcdefghijklmnop"));
        assert!(!text.contains("s3cret"));
    }

    #[actix_web::test]
    async fn test_verify_token() {
        let state = web::Data::new(test_app_state(TestParts {
            env: vec![("SERVICE_TOKEN", "s3cret")],
            ..Default::default()
        }));
        let app = actix_test::init_service(
            App::new().app_data(state).configure(|cfg| crate::routes::configure_routes(cfg, None)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/auth/verify-token")
            .set_json(json!({ "service_token": "s3cret" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["message"], "토큰 검증 성공");

        let req = actix_test::TestRequest::post()
            .uri("/api/auth/verify-token")
            .set_json(json!({ "service_token": "nope" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["valid"], false);
        assert!(body.get("service_token").is_none());
    }
}
