//! Request logging for the actix-web service.
//!
//! Each request runs inside an `http_request` span tagged with its
//! `x-request-id` (taken from the caller or generated), and one line is
//! logged when it completes. The level follows the outcome.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request identifier, readable by handlers from the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub service_name: String,
    /// Exact paths (and their sub-paths) that are not logged.
    pub exclude_paths: Vec<String>,
    pub slow_request_threshold_ms: u64,
}

impl ObservabilityConfig {
    pub fn for_service(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            exclude_paths: vec!["/health".to_string()],
            slow_request_threshold_ms: 1000,
        }
    }

    pub fn with_slow_threshold(mut self, ms: u64) -> Self {
        self.slow_request_threshold_ms = ms;
        self
    }

    pub fn exclude_path(mut self, path: impl Into<String>) -> Self {
        self.exclude_paths.push(path.into());
        self
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude_paths.iter().any(|p| {
            path.strip_prefix(p.as_str())
                .map_or(false, |rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// How a finished request is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ok,
    Slow,
    ClientError,
    ServerError,
}

fn classify(status: u16, duration_ms: u64, slow_threshold_ms: u64) -> Outcome {
    match status {
        500.. => Outcome::ServerError,
        400..=499 => Outcome::ClientError,
        _ if duration_ms > slow_threshold_ms => Outcome::Slow,
        _ => Outcome::Ok,
    }
}

fn request_id(req: &ServiceRequest) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[derive(Clone)]
pub struct ObservabilityMiddleware {
    config: Arc<ObservabilityConfig>,
}

impl ObservabilityMiddleware {
    pub fn new(config: ObservabilityConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Request logging with the default settings for `service_name`.
pub fn observability(service_name: impl Into<String>) -> ObservabilityMiddleware {
    ObservabilityMiddleware::new(ObservabilityConfig::for_service(service_name))
}

impl<S, B> Transform<S, ServiceRequest> for ObservabilityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ObservabilityService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ObservabilityService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct ObservabilityService<S> {
    service: Rc<S>,
    config: Arc<ObservabilityConfig>,
}

impl<S, B> Service<ServiceRequest> for ObservabilityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            if config.is_excluded(req.path()) {
                return service.call(req).await;
            }

            let id = request_id(&req);
            let method = req.method().to_string();
            let path = req.path().to_string();
            req.extensions_mut().insert(RequestId(id.clone()));

            let span = tracing::info_span!(
                "http_request",
                request_id = %id,
                method = %method,
                path = %path,
                service = %config.service_name,
            );

            let started = Instant::now();
            let result = service.call(req).instrument(span).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let mut res = match result {
                Ok(res) => res,
                Err(e) => {
                    tracing::error!(request_id = %id, duration_ms, error = %e, "❌ {} {} failed", method, path);
                    return Err(e);
                }
            };

            if let Ok(value) = HeaderValue::from_str(&id) {
                res.headers_mut().insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            let status = res.status().as_u16();
            match classify(status, duration_ms, config.slow_request_threshold_ms) {
                Outcome::ServerError => {
                    tracing::error!(request_id = %id, status, duration_ms, "{} {} → {}", method, path, status)
                }
                Outcome::ClientError => {
                    tracing::warn!(request_id = %id, status, duration_ms, "{} {} → {}", method, path, status)
                }
                Outcome::Slow => {
                    tracing::warn!(request_id = %id, status, duration_ms, "🐢 slow {} {} → {}", method, path, status)
                }
                Outcome::Ok => {
                    tracing::info!(request_id = %id, status, duration_ms, "{} {} → {}", method, path, status)
                }
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, web, App, HttpRequest, HttpResponse};

    async fn echo_request_id(req: HttpRequest) -> HttpResponse {
        let id = req
            .extensions()
            .get::<RequestId>()
            .map(|r| r.0.clone())
            .unwrap_or_default();
        HttpResponse::Ok().body(id)
    }

    #[actix_web::test]
    async fn test_request_id_is_propagated_or_generated() {
        let app = actix_test::init_service(
            App::new()
                .wrap(observability("test"))
                .route("/api/echo", web::get().to(echo_request_id)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/echo")
            .insert_header((REQUEST_ID_HEADER, "abc-123"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.headers().get(REQUEST_ID_HEADER).unwrap(), "abc-123");
        assert_eq!(actix_test::read_body(res).await, "abc-123");

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/echo").to_request()).await;
        let generated = res.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&generated).is_ok());
    }

    #[actix_web::test]
    async fn test_excluded_path_gets_no_request_id() {
        let app = actix_test::init_service(
            App::new()
                .wrap(observability("test"))
                .route("/health", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/health").to_request()).await;
        assert!(res.headers().get(REQUEST_ID_HEADER).is_none());
    }

    #[test]
    fn test_excluded_paths() {
        let config = ObservabilityConfig::for_service("test").exclude_path("/api/env");
        assert!(config.is_excluded("/health"));
        assert!(config.is_excluded("/api/env/check"));
        assert!(!config.is_excluded("/healthz"));
        assert!(!config.is_excluded("/api/problems/1"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(200, 10, 1000), Outcome::Ok);
        assert_eq!(classify(200, 1500, 1000), Outcome::Slow);
        assert_eq!(classify(404, 1500, 1000), Outcome::ClientError);
        assert_eq!(classify(503, 5, 1000), Outcome::ServerError);
    }
}
