use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use nerdmath_backend::{configure_routes, AppState};
use nerdmath_config::AppConfig;
use nerdmath_middleware::ServiceTokenGuard;
use nerdmath_observability::{info, init_tracing, observability, TracingConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::from_env().map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    init_tracing(TracingConfig::for_service("nerdmath-backend"));
    info!("🚀 [NerdMath] Starting API service ({} mode)", config.server.environment);

    let host = config.server.host.clone();
    let port = config.server.port;
    let guard = ServiceTokenGuard::new(config.service_token.clone());

    let state = web::Data::new(AppState::initialize(config).await);

    info!("🌐 [NerdMath] Listening on {}:{}", host, port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();
        let guard = guard.clone();

        App::new()
            .app_data(state.clone())
            // Observability middleware (HTTP logging + tracing)
            .wrap(observability("nerdmath-backend"))
            .wrap(cors)
            .configure(move |cfg| configure_routes(cfg, Some(guard)))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
