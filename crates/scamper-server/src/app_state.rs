// ABOUTME: Shared application state for the scamper HTTP server.
// ABOUTME: Holds the hosted-model runtime and the top-level persona; no conversation state.

use std::sync::Arc;

use scamper_agent::{AgentRuntime, Persona};

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub runtime: Arc<dyn AgentRuntime>,
    pub assistant: Persona,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(runtime: Arc<dyn AgentRuntime>, assistant: Persona) -> Self {
        Self { runtime, assistant }
    }
}
