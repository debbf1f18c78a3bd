// ABOUTME: Test utilities for scamper-agent: a scripted runtime, an echo tool, and a fake wallet.
// ABOUTME: Used in tests to drive personas and the research loop without real API calls.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::types::U256;
use serde_json::{Value, json};

use scamper_core::{CredentialBlob, Message};

use crate::persona::Persona;
use crate::runtime::{AgentError, AgentRuntime, RunOutput};
use crate::tools::{Tool, ToolError, find_tool};
use crate::wallet::{TokenAmount, WalletError, WalletProvider};

/// One scripted step for a persona.
#[derive(Debug, Clone)]
enum Step {
    Reply(String),
    CallTool { name: String, args: Value },
    Fail(String),
}

/// A call the scripted runtime received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub persona: String,
    pub input: Vec<Message>,
    pub tools: Vec<String>,
    pub structured: bool,
}

/// A tool invocation performed by the scripted runtime.
#[derive(Debug, Clone)]
pub struct RecordedToolCall {
    pub persona: String,
    pub tool: String,
    pub output: String,
}

/// A runtime that answers from per-persona queues of scripted steps.
///
/// A run pops steps for the persona's name until it reaches a reply or a
/// failure. Tool steps call the named tool from the persona's tool list, which
/// lets a test drive a persona into the research tool and back.
#[derive(Default)]
pub struct ScriptedRuntime {
    steps: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<RecordedCall>>,
    tool_calls: Mutex<Vec<RecordedToolCall>>,
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, persona: &str, step: Step) -> Self {
        if let Ok(mut steps) = self.steps.lock() {
            steps.entry(persona.to_string()).or_default().push_back(step);
        }
        self
    }

    /// Queue a final reply for the named persona.
    pub fn reply(self, persona: &str, text: &str) -> Self {
        self.push(persona, Step::Reply(text.to_string()))
    }

    /// Queue a tool call the named persona will make before its next reply.
    pub fn call_tool(self, persona: &str, tool: &str, args: Value) -> Self {
        self.push(
            persona,
            Step::CallTool {
                name: tool.to_string(),
                args,
            },
        )
    }

    /// Queue a provider failure for the named persona.
    pub fn fail(self, persona: &str, message: &str) -> Self {
        self.push(persona, Step::Fail(message.to_string()))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_for(&self, persona: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.persona == persona)
            .collect()
    }

    pub fn tool_calls(&self) -> Vec<RecordedToolCall> {
        self.tool_calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn next_step(&self, persona: &str) -> Option<Step> {
        self.steps
            .lock()
            .ok()
            .and_then(|mut steps| steps.get_mut(persona).and_then(|q| q.pop_front()))
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn run(&self, persona: &Persona, input: Vec<Message>) -> Result<RunOutput, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                persona: persona.name.clone(),
                input: input.clone(),
                tools: persona.tool_names().into_iter().map(String::from).collect(),
                structured: persona.output_schema.is_some(),
            });
        }

        loop {
            match self.next_step(&persona.name) {
                Some(Step::Reply(text)) => return Ok(RunOutput::from_reply(input, text)),
                Some(Step::Fail(message)) => return Err(AgentError::ProviderError(message)),
                Some(Step::CallTool { name, args }) => {
                    let tool = find_tool(&persona.tools, &name).ok_or_else(|| {
                        let message = format!("{} has no tool {}", persona.name, name);
                        AgentError::InvalidResponse(message)
                    })?;
                    let output = match tool.call(args).await {
                        Ok(output) => output,
                        Err(e) => format!("Error: {}", e),
                    };
                    if let Ok(mut tool_calls) = self.tool_calls.lock() {
                        tool_calls.push(RecordedToolCall {
                            persona: persona.name.clone(),
                            tool: name,
                            output,
                        });
                    }
                }
                None => {
                    return Err(AgentError::InvalidResponse(format!(
                        "no scripted reply for {}",
                        persona.name
                    )));
                }
            }
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

/// A tool that echoes its arguments back.
pub struct EchoTool {
    name: String,
}

impl EchoTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Echo the arguments back."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        Ok(format!("echo: {}", args))
    }
}

/// An in-memory wallet with fixed balances.
pub struct FakeWallet {
    address: Option<String>,
}

impl FakeWallet {
    /// A wallet holding 1.5 ETH and 2.5 USDC on base-sepolia.
    pub fn funded() -> Self {
        Self {
            address: Some("0x52908400098527886e0f7030069857d2e4169ee7".to_string()),
        }
    }

    /// A wallet with no address configured.
    pub fn unconfigured() -> Self {
        Self { address: None }
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    fn network_id(&self) -> &str {
        "base-sepolia"
    }

    fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    async fn native_balance(&self) -> Result<TokenAmount, WalletError> {
        self.address.as_ref().ok_or(WalletError::NoAddress)?;
        Ok(TokenAmount {
            raw: U256::from(1_500_000_000_000_000_000u128),
            decimals: 18,
            symbol: "ETH".to_string(),
        })
    }

    async fn erc20_balance(&self, _token: &str) -> Result<TokenAmount, WalletError> {
        self.address.as_ref().ok_or(WalletError::NoAddress)?;
        Ok(TokenAmount {
            raw: U256::from(2_500_000u64),
            decimals: 6,
            symbol: "USDC".to_string(),
        })
    }

    fn export(&self) -> Result<CredentialBlob, WalletError> {
        Ok(CredentialBlob::from(
            json!({ "network_id": "base-sepolia", "address": self.address }).to_string(),
        ))
    }
}
