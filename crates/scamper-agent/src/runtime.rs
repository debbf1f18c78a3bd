// ABOUTME: Defines the AgentRuntime trait that hosted-model adapters implement.
// ABOUTME: Also defines RunOutput (final reply plus updated conversation) and AgentError.

use async_trait::async_trait;

use scamper_core::Message;

use crate::persona::Persona;

/// The result of running a persona to completion on one input conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// The persona's final textual reply.
    pub final_output: String,
    /// The input conversation followed by the final assistant reply, ready to
    /// be extended and passed to the next run.
    pub conversation: Vec<Message>,
}

impl RunOutput {
    /// Build the output for a run whose final reply is `reply`.
    pub fn from_reply(mut input: Vec<Message>, reply: String) -> Self {
        input.push(Message::assistant(reply.clone()));
        Self {
            final_output: reply,
            conversation: input,
        }
    }
}

/// Errors that can occur during a hosted-runtime invocation.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Exceeded {0} model turns without a final reply")]
    MaxTurnsExceeded(usize),

    #[error("Toolkit error: {0}")]
    Toolkit(String),
}

/// Trait that hosted-model adapters implement. A run hands the persona's
/// instructions and tools to the model together with the input conversation,
/// executes any tool calls the model makes, and returns the final reply.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn run(&self, persona: &Persona, input: Vec<Message>) -> Result<RunOutput, AgentError>;

    /// Provider name for logging and display (e.g. "openai").
    fn provider_name(&self) -> &str;

    /// Model identifier being used (e.g. "gpt-4o").
    fn model_name(&self) -> &str;
}
