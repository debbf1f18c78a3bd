// ABOUTME: Agent system for scamper, wiring hosted-model personas to wallet and search tools.
// ABOUTME: Defines the runtime trait, the toolkit bridge, personas, the research loop, and chat turns.

pub mod chat;
pub mod persona;
pub mod providers;
pub mod research;
pub mod runtime;
pub mod testing;
pub mod toolkit;
pub mod tools;
pub mod wallet;

pub use chat::run_chat;
pub use persona::Persona;
pub use providers::openai::OpenAIRuntime;
pub use research::{ResearchOutcome, ResearchSettings, SubtopicResearcher};
pub use runtime::{AgentError, AgentRuntime, RunOutput};
pub use toolkit::{Toolkit, ToolkitFactory};
pub use tools::{Tool, ToolError};
pub use wallet::{RpcWallet, WalletConfig, WalletError, WalletProvider};
