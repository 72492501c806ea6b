//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - teacher and student API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Shared
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/catalog", get(http::http_catalog))
        // Teacher
        .route("/api/v1/teacher/login", post(http::http_teacher_login))
        .route(
            "/api/v1/assignments",
            get(http::http_list_assignments).post(http::http_create_assignment),
        )
        .route("/api/v1/assignments/:code/submissions", get(http::http_list_submissions))
        // Student
        .route("/api/v1/student/enter", post(http::http_student_enter))
        .route("/api/v1/sessions/:id", get(http::http_get_session).delete(http::http_leave))
        .route("/api/v1/sessions/:id/quiz", post(http::http_submit_quiz))
        .route("/api/v1/sessions/:id/mission", post(http::http_choose_mission))
        .route(
            "/api/v1/sessions/:id/activity",
            get(http::http_start_activity).post(http::http_submit_activity),
        )
        .route("/api/v1/sessions/:id/activity/hint", post(http::http_hint))
        .route("/api/v1/sessions/:id/report", get(http::http_get_report))
        .route("/api/v1/sessions/:id/retry", post(http::http_retry))
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
        // Frontend fallback
        .fallback_service(static_service)
}
