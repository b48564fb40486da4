use super::handlers;
use super::state::AppState;
use super::ws;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Live call ingest
        .route("/ws/calls/:call_id", get(ws::call_stream))
        // Companion queries
        .route("/api/calls", get(handlers::list_calls))
        .route("/api/classify", post(handlers::classify_text))
        .route("/api/simulate/:scenario", get(handlers::simulate_call))
        // The dashboard is served from another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
