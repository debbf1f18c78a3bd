// ABOUTME: Callable tools handed to personas, expressed as name + JSON schema + async call.
// ABOUTME: Provider adapters reformat tool_definitions() into their API's function-calling shape.

pub mod price_feed;
pub mod research;
pub mod wallet_actions;
pub mod web_search;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

pub use price_feed::{FetchPrice, FetchPriceFeedId};
pub use research::MultiAgentResearchTool;
pub use wallet_actions::{GetErc20Balance, GetNativeBalance, GetWalletDetails};
pub use web_search::WebSearchTool;

/// Errors a tool call can produce. The runtime reports these back to the
/// model as the tool's output instead of failing the run.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),
}

/// A function the model may call during a run.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;

    async fn call(&self, args: Value) -> Result<String, ToolError>;
}

/// Shared, cloneable list of tools a persona can use.
pub type ToolSet = Vec<Arc<dyn Tool>>;

/// Provider-agnostic definitions for the given tools.
pub fn tool_definitions(tools: &[Arc<dyn Tool>]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name(),
                "description": tool.description(),
                "parameters": tool.parameters(),
            })
        })
        .collect()
}

/// Find a tool by the name the model called it with.
pub fn find_tool<'a>(tools: &'a [Arc<dyn Tool>], name: &str) -> Option<&'a Arc<dyn Tool>> {
    tools.iter().find(|tool| tool.name() == name)
}

/// Pull a required string argument out of a tool's arguments object.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing '{}' argument", key)))
}
