//! Followup gateway library.
//!
//! This module exposes the application builder for use in tests.

use axum::http::{header, HeaderName, Method};
use axum::{
    routing::{delete, get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};

pub mod api;
pub mod config;
pub mod draft;
pub mod email;
pub mod mcp;
pub mod state;
pub mod tools;

use mcp::SessionRegistry;
use state::AppState;

/// Create the Axum application router.
///
/// This function is used both by the main server binary and by integration tests.
pub fn create_app() -> Router {
    create_app_with_state(AppState::default())
}

/// Create the Axum application router with a given state.
///
/// The session registry is constructed here, once, and handed to the MCP
/// routes as an extension; it is the only shared mutable state.
pub fn create_app_with_state(state: AppState) -> Router {
    let sessions = SessionRegistry::new();

    let mcp_router = Router::new()
        .route("/mcp", post(api::mcp::mcp_post))
        .route("/mcp", get(api::mcp::mcp_get))
        .route("/mcp", delete(api::mcp::mcp_delete))
        .layer(Extension(sessions));

    Router::new()
        .route("/health", get(health))
        .merge(mcp_router)
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    HeaderName::from_static("mcp-session-id"),
                ])
                .expose_headers([HeaderName::from_static("mcp-session-id")])
                .allow_origin(Any),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}
