// ABOUTME: One chat turn against the top-level persona with caller-owned history.
// ABOUTME: Appends the new prompt to the supplied history and returns the reply plus updated history.

use tracing::Instrument;

use scamper_core::Message;

use crate::persona::Persona;
use crate::runtime::{AgentError, AgentRuntime, RunOutput};

/// Run the persona on `history` followed by the new user `prompt`.
pub async fn run_chat(
    runtime: &dyn AgentRuntime,
    persona: &Persona,
    prompt: &str,
    mut history: Vec<Message>,
) -> Result<RunOutput, AgentError> {
    let span = tracing::info_span!("chat", persona = %persona.name, prior_messages = history.len());

    history.push(Message::user(prompt));
    runtime.run(persona, history).instrument(span).await
}
