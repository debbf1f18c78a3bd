// ABOUTME: Route definitions for the scamper HTTP server.
// ABOUTME: Assembles the chat API, the chat page, and health into one Axum Router.

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;
use crate::auth::BasicAuthLayer;
use crate::web;

/// Build the complete Axum router. When `auth` is set, every route except
/// `/health` requires those basic credentials.
pub fn create_router(state: SharedState, auth: Option<BasicAuthLayer>) -> Router {
    let router = Router::new()
        .route("/", get(web::index))
        .route("/chat", post(api::chat::chat))
        .route("/health", get(health))
        .with_state(state);

    let router = match auth {
        Some(layer) => router.layer(layer),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

/// Health check handler. Reports which hosted model backs the assistant.
async fn health(State(state): State<SharedState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "provider": state.runtime.provider_name(),
        "model": state.runtime.model_name(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use axum::body::Body;
    use http::Request;
    use scamper_agent::persona;
    use scamper_agent::testing::ScriptedRuntime;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(runtime: ScriptedRuntime) -> SharedState {
        Arc::new(AppState::new(
            Arc::new(runtime),
            persona::assistant(Vec::new()),
        ))
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_chat(body: serde_json::Value) -> Request<Body> {
        Request::post("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = create_router(test_state(ScriptedRuntime::new()), None);
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["provider"], "scripted");
        assert_eq!(json["model"], "scripted-model");
    }

    #[tokio::test]
    async fn chat_returns_reply_and_history() {
        let runtime = ScriptedRuntime::new().reply(persona::ASSISTANT_NAME, "Hi! Which token?");
        let app = create_router(test_state(runtime), None);

        let resp = app
            .oneshot(post_chat(serde_json::json!({
                "prompt": "hello",
                "history": [
                    { "role": "user", "content": "earlier" },
                    { "role": "assistant", "content": "earlier reply" }
                ]
            })))
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        assert_eq!(json["response"], "Hi! Which token?");
        let history = json["history"].as_array().unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[2]["role"], "user");
        assert_eq!(history[2]["content"], "hello");
        assert_eq!(history[3]["role"], "assistant");
    }

    #[tokio::test]
    async fn chat_rejects_empty_prompt() {
        let app = create_router(test_state(ScriptedRuntime::new()), None);

        let resp = app
            .oneshot(post_chat(serde_json::json!({ "prompt": "   " })))
            .await
            .unwrap();

        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn chat_maps_runtime_failure_to_bad_gateway() {
        let runtime = ScriptedRuntime::new().fail(persona::ASSISTANT_NAME, "upstream exploded");
        let app = create_router(test_state(runtime), None);

        let resp = app
            .oneshot(post_chat(serde_json::json!({ "prompt": "hello" })))
            .await
            .unwrap();

        assert_eq!(resp.status(), 502);
        let json = json_body(resp).await;
        assert!(json["error"].as_str().unwrap().contains("upstream exploded"));
    }

    #[tokio::test]
    async fn index_serves_chat_page() {
        let app = create_router(test_state(ScriptedRuntime::new()), None);
        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("<title>Scamper</title>"));
        assert!(html.contains("localStorage"));
    }

    #[tokio::test]
    async fn auth_layer_gates_chat_but_not_health() {
        let app = create_router(
            test_state(ScriptedRuntime::new()),
            Some(BasicAuthLayer::new("alice", "s3cret")),
        );

        let resp = app
            .clone()
            .oneshot(post_chat(serde_json::json!({ "prompt": "hello" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
}
