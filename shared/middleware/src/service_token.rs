//! Shared-secret guard for service-to-service routes.
//!
//! Callers present the token in `x-service-token` or as a bearer token. When
//! no token is configured the guard lets every request through.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error as ActixError, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use serde_json::json;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

pub const SERVICE_TOKEN_HEADER: &str = "x-service-token";

#[derive(Clone)]
enum GuardMode {
    Enabled(Arc<str>),
    Disabled,
}

/// Constant-time comparison against the configured token.
pub fn token_matches(expected: &str, presented: &str) -> bool {
    constant_time_eq::constant_time_eq(expected.as_bytes(), presented.as_bytes())
}

fn presented_token(req: &ServiceRequest) -> Option<String> {
    let headers = req.headers();
    if let Some(token) = headers.get(SERVICE_TOKEN_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(token.trim().to_string());
    }
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
}

pub struct ServiceTokenMiddleware<S> {
    service: Rc<S>,
    mode: GuardMode,
}

impl<S, B> Service<ServiceRequest> for ServiceTokenMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let mode = self.mode.clone();

        Box::pin(async move {
            let expected = match mode {
                GuardMode::Disabled => {
                    let res = service.call(req).await?;
                    return Ok(res.map_into_left_body());
                }
                GuardMode::Enabled(expected) => expected,
            };

            // CORS preflight carries no credentials
            if req.method() == Method::OPTIONS {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            match presented_token(&req) {
                Some(token) if token_matches(&expected, &token) => {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Some(_) => {
                    tracing::warn!(path = %req.path(), "Rejected request with invalid service token");
                    Ok(req
                        .into_response(HttpResponse::Unauthorized().json(json!({
                            "error": "Invalid service token"
                        })))
                        .map_into_right_body())
                }
                None => Ok(req
                    .into_response(HttpResponse::Unauthorized().json(json!({
                        "error": "Service token required",
                        "message": "Provide the token in the x-service-token header"
                    })))
                    .map_into_right_body()),
            }
        })
    }
}

#[derive(Clone)]
pub struct ServiceTokenGuard {
    mode: GuardMode,
}

impl ServiceTokenGuard {
    pub fn new(token: Option<String>) -> Self {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => Self {
                mode: GuardMode::Enabled(Arc::from(token)),
            },
            None => {
                tracing::warn!("SERVICE_TOKEN not set; service routes are unauthenticated");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            mode: GuardMode::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, GuardMode::Enabled(_))
    }
}

impl<S, B> Transform<S, ServiceRequest> for ServiceTokenGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type Transform = ServiceTokenMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ServiceTokenMiddleware {
            service: Rc::new(service),
            mode: self.mode.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test as actix_test, web, App};

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_rejects_missing_and_wrong_tokens() {
        let app = actix_test::init_service(
            App::new().service(
                web::scope("/guarded")
                    .wrap(ServiceTokenGuard::new(Some("s3cret".to_string())))
                    .route("", web::get().to(ok)),
            ),
        )
        .await;

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/guarded").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = actix_test::TestRequest::get()
            .uri("/guarded")
            .insert_header((SERVICE_TOKEN_HEADER, "wrong"))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = actix_test::TestRequest::get()
            .uri("/guarded")
            .insert_header((SERVICE_TOKEN_HEADER, "s3cret"))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = actix_test::TestRequest::get()
            .uri("/guarded")
            .insert_header(("Authorization", "Bearer s3cret"))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_disabled_guard_allows_everything() {
        let guard = ServiceTokenGuard::new(None);
        assert!(!guard.is_enabled());

        let app = actix_test::init_service(
            App::new().service(web::scope("/open").wrap(guard).route("", web::get().to(ok))),
        )
        .await;
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/open").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[test]
    fn test_token_matches() {
        assert!(token_matches("abc", "abc"));
        assert!(!token_matches("abc", "abcd"));
        assert!(!token_matches("abc", ""));
    }
}
