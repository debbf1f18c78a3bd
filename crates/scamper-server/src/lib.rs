// ABOUTME: HTTP server for scamper, exposing the chat endpoint and a browser chat page.
// ABOUTME: Uses Axum with shared runtime state, optional basic auth, and request tracing.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod routes;
pub mod web;

pub use app_state::{AppState, SharedState};
pub use auth::BasicAuthLayer;
pub use config::{ConfigError, ScamperConfig};
pub use routes::create_router;
