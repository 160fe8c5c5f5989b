use actix_web::{web, HttpResponse};
use nerdmath_models::ExpressDiagnosticRequest;
use serde_json::json;

use crate::errors::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn express_diagnostic(
    state: web::Data<AppState>,
    body: web::Json<ExpressDiagnosticRequest>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    tracing::info!(
        test_id = %request.test_id,
        user_id = %request.user_id,
        answers = request.answers.len(),
        "📝 Express diagnostic received"
    );

    let response = state.express()?.run(&request).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn get_learning_path(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let path_id = path.into_inner();
    let learning_path = state
        .catalog()?
        .find_learning_path(&path_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("학습 경로를 찾을 수 없습니다: {}", path_id)))?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "learningPath": learning_path })))
}
