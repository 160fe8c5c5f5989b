use actix_web::web;
use nerdmath_middleware::ServiceTokenGuard;

use crate::handlers::{data, graph, learning_path, system, tutor};

/// Register every route. `/api/learning-path` sits behind `guard` when given.
pub fn configure_routes(cfg: &mut web::ServiceConfig, guard: Option<ServiceTokenGuard>) {
    let guard = guard.unwrap_or_else(ServiceTokenGuard::disabled);

    cfg.route("/", web::get().to(system::index))
        .route("/health", web::get().to(system::health))
        .service(
            web::scope("/api/learning-path")
                .wrap(guard)
                .route("/express/diagnostic", web::post().to(learning_path::express_diagnostic))
                .route("/{path_id}", web::get().to(learning_path::get_learning_path)),
        )
        .service(
            web::scope("/api/graph")
                .route("/concepts/{name}/prerequisites", web::get().to(graph::prerequisites))
                .route("/statistics", web::get().to(graph::statistics)),
        )
        .service(
            web::scope("/api/data")
                .route("/load-concepts", web::post().to(data::load_concepts))
                .route("/load-diagnostic-tests", web::post().to(data::load_diagnostic_tests))
                .route("/load-unit-tests", web::post().to(data::load_unit_tests))
                .route("/upload/{data_type}", web::post().to(data::upload))
                .route("/load-all", web::post().to(data::load_all))
                .route("/stats", web::get().to(data::stats)),
        )
        .service(
            web::scope("/api")
                .route("/db/health", web::get().to(system::db_health))
                .route("/env/check", web::get().to(system::env_check))
                .route("/auth/verify-token", web::post().to(system::verify_token))
                .route("/problems/{id}", web::get().to(tutor::get_problem))
                .route("/problem/{id}", web::get().to(tutor::get_problem))
                .route("/chat", web::post().to(tutor::chat))
                .route("/solve_with_problem", web::post().to(tutor::solve_with_problem))
                .route("/concept_with_problem", web::post().to(tutor::concept_with_problem))
                .route("/rag_with_problem", web::post().to(tutor::rag_with_problem)),
        );
}
