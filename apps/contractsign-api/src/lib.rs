//! contractsign API server
//!
//! Reference implementation of the endpoints the field placement engine
//! consumes:
//! - Contract seeding and fetch (documents with their fields, signers)
//! - Field create / update / delete
//! - Send readiness and the draft to sent transition

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;
#[cfg(test)]
mod tests;

pub use state::AppState;

/// Full application router with tracing and permissive CORS
pub fn build_router(state: Arc<AppState>) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Contracts
        .route("/api/contracts", post(handlers::create_contract))
        .route("/api/contracts/:id", get(handlers::get_contract))
        .route("/api/contracts/:id/readiness", get(handlers::get_readiness))
        .route("/api/contracts/:id/send", post(handlers::send_contract))
        // Fields
        .route(
            "/api/fields",
            post(handlers::create_field)
                .put(handlers::update_field)
                .delete(handlers::delete_field),
        )
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
