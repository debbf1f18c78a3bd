// ABOUTME: Provider module aggregating hosted-model runtime adapters.
// ABOUTME: Each sub-module implements AgentRuntime for a specific LLM API.

pub mod openai;
