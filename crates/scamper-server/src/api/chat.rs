// ABOUTME: Chat API handler running one turn of the top-level persona.
// ABOUTME: The client sends its history with each prompt and receives the updated history back.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use scamper_agent::{AgentError, run_chat};
use scamper_core::Message;

use crate::app_state::SharedState;

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<Message>,
}

/// Response body for POST /chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub history: Vec<Message>,
}

/// POST /chat - Run the assistant on the supplied history plus the new prompt.
pub async fn chat(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    if req.prompt.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "prompt must not be empty" })),
        )
            .into_response();
    }

    match run_chat(
        state.runtime.as_ref(),
        &state.assistant,
        &req.prompt,
        req.history,
    )
    .await
    {
        Ok(output) => (
            StatusCode::OK,
            Json(ChatResponse {
                response: output.final_output,
                history: output.conversation,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "chat turn failed");
            (
                error_status(&e),
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Map a runtime failure to the HTTP status the client sees.
fn error_status(err: &AgentError) -> StatusCode {
    match err {
        AgentError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::BAD_GATEWAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_defaults_to_empty() {
        let req: ChatRequest = serde_json::from_str(r#"{"prompt":"hello"}"#).unwrap();
        assert_eq!(req.prompt, "hello");
        assert!(req.history.is_empty());
    }

    #[test]
    fn rate_limits_map_to_429_and_the_rest_to_502() {
        assert_eq!(
            error_status(&AgentError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            error_status(&AgentError::ProviderError("down".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(&AgentError::MaxTurnsExceeded(10)),
            StatusCode::BAD_GATEWAY
        );
    }
}
