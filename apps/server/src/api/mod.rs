//! API layer - routes and handlers

pub mod handlers;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors = cors(&state.config.server.cors_origins);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Search and read-only record access
        .route("/api/search", get(handlers::search::search))
        .route("/api/academies/:id", get(handlers::academies::get_academy))
        // Add state
        .with_state(state)
        // Add middleware (applied in reverse order)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let parsed: Vec<axum::http::HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(parsed))
}

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "academy-server"
        })),
    )
}
