pub mod auth;
pub mod portals;
pub mod projects;
pub mod sources;

use axum::{
    extract::DefaultBodyLimit,
    http::header,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;
use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Prometheus text exposition of the process registry.
pub async fn metrics() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], common::metrics::render())
}

/// Room for the multipart envelope and text fields on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the full application router: public, authentication and `/api/v1` routes.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let api = Router::new()
        .route("/api/v1/me", get(auth::me))
        .route("/api/v1/projects", post(projects::create))
        .route("/api/v1/dashboard-portals", get(portals::list).post(portals::create))
        .route("/api/v1/dashboard-portals/:id", put(portals::update).delete(portals::delete))
        .route("/api/v1/dashboard-portals/:id/exclude-teams", get(portals::exclude_teams))
        .route("/api/v1/sources", get(sources::list).post(sources::create))
        .route("/api/v1/sources/test", post(sources::test))
        .route("/api/v1/sources/:id", put(sources::update).delete(sources::delete))
        .route("/api/v1/sources/:id/upload-meta", post(sources::upload_meta))
        .route("/api/v1/sources/:id/upload/:file_type", post(sources::upload))
        .route("/api/v1/sources/:id/tables", get(sources::tables))
        .route("/api/v1/sources/:id/tables/:table/columns", get(sources::columns))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token))
        .layer(DefaultBodyLimit::max(state.max_file_bytes.saturating_add(FORM_OVERHEAD_BYTES)));

    public
        .merge(api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx at ERROR
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
