use actix_web::{web, HttpResponse};
use nerdmath_database::loaders::{self, DatasetLoad};
use serde_json::{json, Value};

use crate::errors::{ApiError, ApiResult};
use crate::state::AppState;

fn load_response(result: DatasetLoad) -> HttpResponse {
    if result.success {
        HttpResponse::Ok().json(result)
    } else {
        HttpResponse::BadRequest().json(result)
    }
}

async fn load_dataset(state: &AppState, data_type: &str, data: &Value) -> ApiResult<HttpResponse> {
    let key = loaders::dataset_for_upload(data_type)
        .ok_or_else(|| ApiError::BadRequest(format!("지원하지 않는 데이터 타입입니다: {}", data_type)))?;
    let store = state.store()?;
    let result = loaders::load_by_key(store, key, data).await?;
    tracing::info!(dataset = data_type, count = result.count, "📊 Dataset loaded");
    Ok(load_response(result))
}

pub async fn load_concepts(state: web::Data<AppState>, body: web::Json<Value>) -> ApiResult<HttpResponse> {
    load_dataset(&state, "concepts", &body).await
}

pub async fn load_diagnostic_tests(state: web::Data<AppState>, body: web::Json<Value>) -> ApiResult<HttpResponse> {
    load_dataset(&state, "diagnostic-tests", &body).await
}

pub async fn load_unit_tests(state: web::Data<AppState>, body: web::Json<Value>) -> ApiResult<HttpResponse> {
    load_dataset(&state, "unit-tests", &body).await
}

pub async fn upload(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    load_dataset(&state, &path.into_inner(), &body).await
}

pub async fn load_all(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let store = state.store()?;
    let result = loaders::load_all(store, &state.config.data.data_dir).await?;
    Ok(load_response(result))
}

pub async fn stats(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let store = state.store()?;
    let stats = loaders::dataset_stats(store).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "stats": stats })))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{test_app_state, TestParts};
    use actix_web::{http::StatusCode, test as actix_test, web, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_unknown_upload_type_is_bad_request() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(test_app_state(TestParts::default())))
                .configure(|cfg| crate::routes::configure_routes(cfg, None)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/data/upload/videos")
            .set_json(json!({ "videos": [] }))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_dataset_endpoints_need_store() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(test_app_state(TestParts::default())))
                .configure(|cfg| crate::routes::configure_routes(cfg, None)),
        )
        .await;

        for uri in ["/api/data/load-concepts", "/api/data/upload/unit_tests"] {
            let req = actix_test::TestRequest::post()
                .uri(uri)
                .set_json(json!({ "concepts": [] }))
                .to_request();
            assert_eq!(
                actix_test::call_service(&app, req).await.status(),
                StatusCode::SERVICE_UNAVAILABLE,
                "{}",
                uri
            );
        }

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/data/stats").to_request()).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
