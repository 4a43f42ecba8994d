//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - challenge and submission API under `/api/v1/...`
/// - per-user profile code and scan under `/api/v1/users/:user/...`
/// - CORS (allow any origin/method/headers), adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/challenges", get(http::http_list_challenges))
        .route("/api/v1/challenges/import", post(http::http_import_challenge))
        .route("/api/v1/challenges/:id/render", post(http::http_render))
        .route("/api/v1/challenges/:id/parse", post(http::http_parse))
        .route("/api/v1/challenges/:id/join", post(http::http_join))
        .route("/api/v1/challenges/:id/register", post(http::http_register))
        .route(
            "/api/v1/challenges/:id/submission",
            get(http::http_fetch_submission)
                .put(http::http_update_submission)
                .delete(http::http_delete_submission),
        )
        .route(
            "/api/v1/challenges/:id/announcement",
            post(http::http_announce).delete(http::http_delete_announcement),
        )
        .route("/api/v1/users/:user/profile_code", get(http::http_profile_code))
        .route("/api/v1/users/:user/scan", post(http::http_scan))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
