//! HTTP route handlers for the chat API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                - Welcome message
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (store ping)
//!
//! # Chat
//! POST /api/chat                        - Run one chat turn
//!
//! # Users
//! GET  /users?skip=&limit=              - List users
//! GET  /users/{user_id}/conversations   - A user's conversations, newest first
//!
//! # Conversations
//! GET  /conversations/{id}/messages     - A conversation's messages, oldest first
//! ```

pub mod chat;
pub mod conversations;
pub mod users;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Body of the welcome endpoint.
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
}

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .merge(chat::router())
        .merge(users::router())
        .merge(conversations::router())
}

/// Build the complete application: API routes, health checks, CORS and
/// request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        #[allow(clippy::cast_possible_truncation)]
                        span.record("latency_ms", latency.as_millis() as u64);
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.conversations().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /
async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the shopchat assistant API",
    })
}
