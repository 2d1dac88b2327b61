use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let artifacts = ServeDir::new(&state.artifacts_dir);
    let body_limit = state.body_limit;

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/login", post(handlers::login))
        .route("/logout", get(handlers::logout))
        // Conversation
        .route("/chat", get(handlers::get_chat).post(handlers::post_chat))
        // Synthesized replies
        .nest_service("/audio", artifacts)
        // Oversized bodies reach the handler as a rejection, not a bare 413
        .layer(DefaultBodyLimit::max(body_limit))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
