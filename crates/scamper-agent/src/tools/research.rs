// ABOUTME: Exposes the subtopic-research loop as a tool the top-level persona can call.
// ABOUTME: The model decides when a prompt needs deep research; the loop's answer becomes the tool output.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolError, required_str};
use crate::research::SubtopicResearcher;

/// Tool: deep multi-agent token research.
pub struct MultiAgentResearchTool {
    researcher: Arc<SubtopicResearcher>,
}

impl MultiAgentResearchTool {
    pub fn new(researcher: Arc<SubtopicResearcher>) -> Self {
        Self { researcher }
    }
}

#[async_trait]
impl Tool for MultiAgentResearchTool {
    fn name(&self) -> &str {
        "multi_agent_research"
    }

    fn description(&self) -> &str {
        "Perform deep multi-agent token research. Only use this tool if the user is asking about a \
         token or needs advanced research. A coordinator splits the prompt into a few subtopics, \
         a researcher investigates each one with web search and on-chain tools, and the findings \
         are combined into one concise summary, which is returned."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_prompt": {
                    "type": "string",
                    "description": "The entire user prompt describing the token or question that needs deeper research."
                }
            },
            "required": ["user_prompt"]
        })
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let user_prompt = required_str(&args, "user_prompt")?;
        self.researcher
            .research(user_prompt)
            .await
            .map_err(|e| ToolError::Failed(format!("research failed: {}", e)))
    }
}
