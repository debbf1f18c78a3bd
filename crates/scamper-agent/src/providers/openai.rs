// ABOUTME: OpenAI API adapter implementing the AgentRuntime trait.
// ABOUTME: Runs Chat Completions turns with function calling until the model produces a final reply.

use async_trait::async_trait;
use serde_json::{Value, json};

use scamper_core::Message;

use crate::persona::Persona;
use crate::runtime::{AgentError, AgentRuntime, RunOutput};
use crate::tools::{find_tool, tool_definitions};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";
const MAX_TOKENS: u32 = 4096;
/// Model turns allowed per run before giving up.
pub const DEFAULT_MAX_TURNS: usize = 10;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// What one Chat Completions response asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The model is done; this is its reply.
    Reply(String),
    /// The model wants tools run. `message` is the assistant message to echo
    /// back into the transcript before the tool results.
    ToolCalls { message: Value, calls: Vec<ToolCall> },
}

/// OpenAI runtime adapter. Calls the Chat Completions API with the persona's
/// tools as function definitions and executes the calls the model makes.
pub struct OpenAIRuntime {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_turns: usize,
}

impl OpenAIRuntime {
    /// Create a new OpenAIRuntime reading configuration from environment variables.
    /// Required: `OPENAI_API_KEY`
    /// Optional: `OPENAI_BASE_URL` (defaults to https://api.openai.com)
    /// Optional: `OPENAI_MODEL` (defaults to gpt-4o)
    pub fn from_env() -> Result<Self, AgentError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AgentError::ProviderError("OPENAI_API_KEY not set".to_string()))?;

        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_key, base_url, model))
    }

    /// Create a new OpenAIRuntime with explicit configuration.
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    /// System message from the persona's instructions followed by the input.
    pub fn initial_messages(persona: &Persona, input: &[Message]) -> Vec<Value> {
        let mut messages = vec![json!({
            "role": "system",
            "content": persona.instructions
        })];
        messages.extend(input.iter().map(|msg| {
            json!({
                "role": msg.role.as_str(),
                "content": msg.content
            })
        }));
        messages
    }

    /// Build the JSON request body for the OpenAI Chat Completions API.
    pub fn build_request_body(&self, persona: &Persona, messages: &[Value]) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": messages,
        });

        if !persona.tools.is_empty() {
            body["tools"] = Value::Array(build_openai_tools(persona));
            body["tool_choice"] = json!("auto");
        }

        if let Some(schema) = &persona.output_schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": format!("{}_reply", persona.name.to_ascii_lowercase()),
                    "schema": schema,
                    "strict": true
                }
            });
        }

        body
    }

    /// Parse an OpenAI Chat Completions response.
    pub fn parse_response(response_body: &Value) -> Result<Completion, AgentError> {
        let choices = response_body
            .get("choices")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                AgentError::InvalidResponse("missing choices array in response".to_string())
            })?;

        let choice = choices
            .first()
            .ok_or_else(|| AgentError::InvalidResponse("empty choices array".to_string()))?;

        let message = choice.get("message").ok_or_else(|| {
            AgentError::InvalidResponse("missing message in choice".to_string())
        })?;

        if let Some(tool_calls) = message.get("tool_calls").and_then(|t| t.as_array())
            && !tool_calls.is_empty()
        {
            let calls = tool_calls
                .iter()
                .map(parse_openai_tool_call)
                .collect::<Result<Vec<_>, _>>()?;
            let echoed = json!({
                "role": "assistant",
                "content": message.get("content").cloned().unwrap_or(Value::Null),
                "tool_calls": tool_calls,
            });
            return Ok(Completion::ToolCalls {
                message: echoed,
                calls,
            });
        }

        // A refusal under structured output arrives in its own field.
        let text = message
            .get("content")
            .and_then(|c| c.as_str())
            .or_else(|| message.get("refusal").and_then(|r| r.as_str()))
            .unwrap_or("");

        Ok(Completion::Reply(text.to_string()))
    }

    async fn send(&self, body: &Value) -> Result<Value, AgentError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::ProviderError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AgentError::RateLimited);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AgentError::ProviderError(
                "Unauthorized: check OPENAI_API_KEY".to_string(),
            ));
        }

        if status.is_server_error() {
            return Err(AgentError::ProviderError(format!(
                "Server error: {}",
                status
            )));
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AgentError::ProviderError(format!(
                "API error {}: {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(format!("failed to parse JSON: {}", e)))
    }
}

/// Convert the persona's tools to OpenAI's function calling format.
fn build_openai_tools(persona: &Persona) -> Vec<Value> {
    tool_definitions(&persona.tools)
        .into_iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.get("name").cloned().unwrap_or(Value::Null),
                    "description": tool.get("description").cloned().unwrap_or(Value::Null),
                    "parameters": tool
                        .get("parameters")
                        .cloned()
                        .unwrap_or(json!({"type": "object"}))
                }
            })
        })
        .collect()
}

/// Parse a single tool_call entry from the OpenAI response.
fn parse_openai_tool_call(tool_call: &Value) -> Result<ToolCall, AgentError> {
    let id = tool_call
        .get("id")
        .and_then(|i| i.as_str())
        .ok_or_else(|| AgentError::InvalidResponse("tool_call missing id".to_string()))?;

    let function = tool_call.get("function").ok_or_else(|| {
        AgentError::InvalidResponse("tool_call missing function".to_string())
    })?;

    let name = function
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| AgentError::InvalidResponse("function missing name".to_string()))?;

    let arguments = function
        .get("arguments")
        .and_then(|a| a.as_str())
        .unwrap_or("{}");

    Ok(ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    })
}

/// Run one requested tool. Failures are returned as text for the model to
/// read rather than aborting the run.
async fn execute_tool(persona: &Persona, call: &ToolCall) -> String {
    let Some(tool) = find_tool(&persona.tools, &call.name) else {
        tracing::warn!(persona = %persona.name, tool = %call.name, "model called unknown tool");
        return format!("Error: unknown tool '{}'", call.name);
    };

    let args: Value = match serde_json::from_str(&call.arguments) {
        Ok(args) => args,
        Err(e) => return format!("Error: arguments are not valid JSON: {}", e),
    };

    tracing::debug!(persona = %persona.name, tool = %call.name, "calling tool");
    match tool.call(args).await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(persona = %persona.name, tool = %call.name, error = %e, "tool call failed");
            format!("Error: {}", e)
        }
    }
}

#[async_trait]
impl AgentRuntime for OpenAIRuntime {
    async fn run(&self, persona: &Persona, input: Vec<Message>) -> Result<RunOutput, AgentError> {
        let mut messages = Self::initial_messages(persona, &input);

        for turn in 1..=self.max_turns {
            let body = self.build_request_body(persona, &messages);
            let response = self.send(&body).await?;

            match Self::parse_response(&response)? {
                Completion::Reply(text) => {
                    tracing::debug!(persona = %persona.name, turn, "model replied");
                    return Ok(RunOutput::from_reply(input, text));
                }
                Completion::ToolCalls { message, calls } => {
                    messages.push(message);
                    for call in &calls {
                        let output = execute_tool(persona, call).await;
                        messages.push(json!({
                            "role": "tool",
                            "tool_call_id": call.id,
                            "content": output
                        }));
                    }
                }
            }
        }

        Err(AgentError::MaxTurnsExceeded(self.max_turns))
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona;
    use crate::testing::EchoTool;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    fn runtime() -> OpenAIRuntime {
        OpenAIRuntime::new(
            "test-key".to_string(),
            "https://api.openai.com/".to_string(),
            "gpt-4o".to_string(),
        )
    }

    #[test]
    fn openai_runtime_creation() {
        let runtime = runtime();

        assert_eq!(runtime.provider_name(), "openai");
        assert_eq!(runtime.model_name(), "gpt-4o");
        assert_eq!(runtime.api_key, "test-key");
        assert_eq!(runtime.base_url, "https://api.openai.com");
        assert_eq!(runtime.max_turns, DEFAULT_MAX_TURNS);
    }

    #[test]
    fn initial_messages_start_with_instructions() {
        let persona = Persona::new("Scamper", "You are Scamper.", Vec::new());
        let messages = OpenAIRuntime::initial_messages(
            &persona,
            &[Message::user("hi"), Message::assistant("hello")],
        );

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "You are Scamper.");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
    }

    #[test]
    fn request_body_includes_tools_only_when_present() {
        let runtime = runtime();

        let bare = Persona::new("Coordinatorless", "x", Vec::new());
        let body = runtime.build_request_body(&bare, &[]);
        assert_eq!(body.get("model").and_then(|m| m.as_str()), Some("gpt-4o"));
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());

        let tooled = Persona::new(
            "Researcher_1",
            "x",
            vec![Arc::new(EchoTool::new("web_search")), Arc::new(EchoTool::new("fetch_price"))],
        );
        let body = runtime.build_request_body(&tooled, &[]);
        let tools = body.get("tools").and_then(|t| t.as_array()).unwrap();
        assert_eq!(tools.len(), 2);
        for tool in tools {
            assert_eq!(tool.get("type").and_then(|t| t.as_str()), Some("function"));
            assert!(tool.get("function").and_then(|f| f.get("name")).is_some());
        }
        assert_eq!(body.get("tool_choice").and_then(|t| t.as_str()), Some("auto"));
    }

    #[test]
    fn structured_persona_sets_response_format() {
        let body = runtime().build_request_body(&persona::coordinator(2), &[]);
        let format = body.get("response_format").unwrap();

        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "coordinator_reply");
        assert_eq!(format["json_schema"]["strict"], true);

        let summary = runtime().build_request_body(&persona::coordinator_summary(2), &[]);
        assert!(summary.get("response_format").is_none());
    }

    #[test]
    fn openai_parses_text_response() {
        let response = json!({
            "id": "chatcmpl-456",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "That token looks like a scam."
                    },
                    "finish_reason": "stop"
                }
            ]
        });

        let completion = OpenAIRuntime::parse_response(&response).unwrap();
        assert_eq!(
            completion,
            Completion::Reply("That token looks like a scam.".to_string())
        );
    }

    #[test]
    fn openai_parses_tool_call_response() {
        let response = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [
                            {
                                "id": "call_abc",
                                "type": "function",
                                "function": {
                                    "name": "multi_agent_research",
                                    "arguments": "{\"user_prompt\": \"Is PEPE legit?\"}"
                                }
                            }
                        ]
                    },
                    "finish_reason": "tool_calls"
                }
            ]
        });

        match OpenAIRuntime::parse_response(&response).unwrap() {
            Completion::ToolCalls { message, calls } => {
                assert_eq!(message["role"], "assistant");
                assert!(message["tool_calls"].is_array());
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].id, "call_abc");
                assert_eq!(calls[0].name, "multi_agent_research");
                assert!(calls[0].arguments.contains("Is PEPE legit?"));
            }
            other => panic!("expected ToolCalls, got {:?}", other),
        }
    }

    #[test]
    fn openai_parses_empty_content_as_empty_reply() {
        let response = json!({
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": null },
                    "finish_reason": "stop"
                }
            ]
        });

        assert_eq!(
            OpenAIRuntime::parse_response(&response).unwrap(),
            Completion::Reply(String::new())
        );
    }

    #[test]
    fn openai_uses_refusal_when_content_missing() {
        let response = json!({
            "choices": [
                {
                    "message": { "role": "assistant", "content": null, "refusal": "I can't help with that." },
                    "finish_reason": "stop"
                }
            ]
        });

        assert_eq!(
            OpenAIRuntime::parse_response(&response).unwrap(),
            Completion::Reply("I can't help with that.".to_string())
        );
    }

    #[test]
    fn openai_rejects_missing_choices() {
        let result = OpenAIRuntime::parse_response(&json!({"error": "nope"}));
        assert!(matches!(result, Err(AgentError::InvalidResponse(_))));

        let result = OpenAIRuntime::parse_response(&json!({"choices": []}));
        assert!(result.unwrap_err().to_string().contains("empty choices"));
    }

    #[tokio::test]
    async fn tool_execution_reports_problems_as_text() {
        let persona = Persona::new("P", "x", vec![Arc::new(EchoTool::new("echo"))]);

        let ok = execute_tool(
            &persona,
            &ToolCall {
                id: "1".into(),
                name: "echo".into(),
                arguments: "{\"a\":1}".into(),
            },
        )
        .await;
        assert_eq!(ok, "echo: {\"a\":1}");

        let unknown = execute_tool(
            &persona,
            &ToolCall {
                id: "2".into(),
                name: "missing".into(),
                arguments: "{}".into(),
            },
        )
        .await;
        assert!(unknown.contains("unknown tool 'missing'"));

        let bad_args = execute_tool(
            &persona,
            &ToolCall {
                id: "3".into(),
                name: "echo".into(),
                arguments: "{not json".into(),
            },
        )
        .await;
        assert!(bad_args.starts_with("Error: arguments are not valid JSON"));
    }

    /// A local stand-in for the Chat Completions endpoint. Replies with the
    /// scripted responses in order, repeating the last one once exhausted.
    struct StubApi {
        responses: Vec<(StatusCode, Value)>,
        requests: Mutex<Vec<(Option<String>, Value)>>,
    }

    impl StubApi {
        fn requests(&self) -> Vec<(Option<String>, Value)> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn completions(
        State(stub): State<Arc<StubApi>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let mut requests = stub.requests.lock().unwrap();
        let index = requests.len().min(stub.responses.len() - 1);
        requests.push((auth, body));
        let (status, response) = stub.responses[index].clone();
        (status, Json(response))
    }

    async fn spawn_stub(responses: Vec<(StatusCode, Value)>) -> (OpenAIRuntime, Arc<StubApi>) {
        let stub = Arc::new(StubApi {
            responses,
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(Arc::clone(&stub));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let runtime = OpenAIRuntime::new(
            "test-key".to_string(),
            format!("http://{}", addr),
            "gpt-4o".to_string(),
        );
        (runtime, stub)
    }

    fn text_response(text: &str) -> Value {
        json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop"
            }]
        })
    }

    fn tool_calls_response(calls: &[(&str, &str, Value)]) -> Value {
        let tool_calls: Vec<Value> = calls
            .iter()
            .map(|(id, name, args)| {
                json!({
                    "id": id,
                    "type": "function",
                    "function": { "name": name, "arguments": args.to_string() }
                })
            })
            .collect();
        json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": null, "tool_calls": tool_calls },
                "finish_reason": "tool_calls"
            }]
        })
    }

    #[tokio::test]
    async fn run_executes_tools_and_feeds_results_back() {
        let (runtime, stub) = spawn_stub(vec![
            (
                StatusCode::OK,
                tool_calls_response(&[
                    ("call_1", "echo", json!({"a": 1})),
                    ("call_2", "missing", json!({})),
                ]),
            ),
            (StatusCode::OK, text_response("All checked.")),
        ])
        .await;
        let persona = Persona::new("Scamper", "Be brief.", vec![Arc::new(EchoTool::new("echo"))]);

        let out = runtime
            .run(&persona, vec![Message::user("check it")])
            .await
            .unwrap();

        assert_eq!(out.final_output, "All checked.");
        assert_eq!(
            out.conversation,
            vec![Message::user("check it"), Message::assistant("All checked.")]
        );

        let requests = stub.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0.as_deref(), Some("Bearer test-key"));
        assert_eq!(requests[0].1["tools"][0]["function"]["name"], "echo");

        let messages = requests[1].1["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[2]["tool_calls"].as_array().unwrap().len(), 2);
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
        assert_eq!(messages[3]["content"], "echo: {\"a\":1}");
        assert_eq!(messages[4]["tool_call_id"], "call_2");
        assert_eq!(messages[4]["content"], "Error: unknown tool 'missing'");
    }

    #[tokio::test]
    async fn run_gives_up_after_max_turns_of_tool_calls() {
        let (runtime, stub) = spawn_stub(vec![(
            StatusCode::OK,
            tool_calls_response(&[("call_1", "echo", json!({}))]),
        )])
        .await;
        let runtime = runtime.with_max_turns(3);
        let persona = Persona::new("Scamper", "x", vec![Arc::new(EchoTool::new("echo"))]);

        let err = runtime
            .run(&persona, vec![Message::user("loop")])
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::MaxTurnsExceeded(3)));
        assert_eq!(stub.requests().len(), 3);
    }

    #[tokio::test]
    async fn run_maps_http_status_to_errors() {
        let persona = Persona::new("Scamper", "x", Vec::new());

        let (runtime, _) =
            spawn_stub(vec![(StatusCode::TOO_MANY_REQUESTS, json!({"error": "slow down"}))]).await;
        let err = runtime.run(&persona, vec![Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, AgentError::RateLimited));

        let (runtime, _) =
            spawn_stub(vec![(StatusCode::UNAUTHORIZED, json!({"error": "bad key"}))]).await;
        let err = runtime.run(&persona, vec![Message::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"), "got: {}", err);

        let (runtime, _) =
            spawn_stub(vec![(StatusCode::SERVICE_UNAVAILABLE, json!({"error": "down"}))]).await;
        let err = runtime.run(&persona, vec![Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, AgentError::ProviderError(ref m) if m.contains("Server error")));

        let (runtime, _) =
            spawn_stub(vec![(StatusCode::BAD_REQUEST, json!({"error": "bad schema"}))]).await;
        let err = runtime.run(&persona, vec![Message::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("bad schema"), "got: {}", err);
    }

    #[tokio::test]
    #[cfg(feature = "live-test")]
    async fn openai_adapter_basic() {
        let runtime = OpenAIRuntime::from_env().expect("OPENAI_API_KEY must be set");
        let persona = Persona::new("Tester", "Reply with one short sentence.", Vec::new());

        let result = runtime.run(&persona, vec![Message::user("Say hello.")]).await;
        assert!(result.is_ok(), "live test failed: {:?}", result.err());
    }
}
