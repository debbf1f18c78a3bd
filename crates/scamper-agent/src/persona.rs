// ABOUTME: Declarative persona definitions (name, instructions, tools) handed to the hosted runtime.
// ABOUTME: Provides the top-level Scamper assistant, the research coordinator, and disposable researchers.

use std::fmt;

use serde_json::Value;

use scamper_core::CoordinatorReply;

use crate::tools::ToolSet;

/// Name the top-level assistant answers to.
pub const ASSISTANT_NAME: &str = "Scamper";

/// Name of the research coordinator persona.
pub const COORDINATOR_NAME: &str = "Coordinator";

const ASSISTANT_INSTRUCTIONS: &str = "You are a helpful agent that can read onchain data using \
    your wallet toolkit. Your wallet is read-only: you can look up its details, its native balance, \
    and its token balances, but you cannot send transactions or move funds. If the user wants to \
    fund the wallet, give them the wallet address from your wallet details. Before executing your \
    first action, get the wallet details to see what network you're on. If there is a 5XX \
    (internal) HTTP error code, ask the user to try again later. If someone asks you to do \
    something you can't do with your currently available tools, you must say so. Be concise and \
    helpful with your responses. Refrain from restating your tools' descriptions unless it is \
    explicitly requested.\n\n\
    Your name is Scamper, and your goal is to help users identify scam tokens. You will be asked \
    to evaluate whether tokens seem legitimate or fake, and you should give a firm answer. If you \
    are given a web link, you should search for the website and evaluate the token based on the \
    information you find there.\n\n\
    If you suspect the user is asking about a token or any other cryptocurrency, or complex \
    research is needed, call the 'multi_agent_research' tool with the entire user prompt. Then \
    incorporate the returned results.";

const RESEARCHER_INSTRUCTIONS: &str = "a specialized researcher. \
    You MUST perform a web search for each subtopic you receive. \
    The subtopic will be a short imperative instruction. \
    Use the web_search tool and any relevant actions to find up-to-date info. \
    Then summarize your findings concisely. If you find nothing relevant, say so. \
    Do not reveal chain-of-thought. Return only your final summary.";

/// A named agent definition: instruction text plus the tools it may call.
/// Immutable once built; the hosted runtime does all the work.
#[derive(Clone)]
pub struct Persona {
    pub name: String,
    pub instructions: String,
    pub tools: ToolSet,
    /// JSON schema the reply must follow, for providers that support
    /// structured output.
    pub output_schema: Option<Value>,
}

impl fmt::Debug for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persona")
            .field("name", &self.name)
            .field("tools", &self.tool_names())
            .field("structured", &self.output_schema.is_some())
            .finish()
    }
}

impl Persona {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>, tools: ToolSet) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            tools,
            output_schema: None,
        }
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

/// The top-level assistant users chat with.
pub fn assistant(tools: ToolSet) -> Persona {
    Persona::new(ASSISTANT_NAME, ASSISTANT_INSTRUCTIONS, tools)
}

fn coordinator_instructions(max_subtopics: usize) -> String {
    format!(
        "You are the Coordinator. The user is asking about a token or something needing deeper research.\n\n\
         Your job is:\n\
         1) Produce one research subtopic prompt at a time (up to {max}). Each subtopic should be a short \
         imperative instruction, 1 to 3 sentences, telling the researcher what to research about the token. \
         Reply with action 'subtopic' and the instruction in 'subtopic'.\n\
         2) If you have no more subtopics, reply with action 'done'.\n\
         3) Later, you will receive the research results for each subtopic and produce a final, concise answer.\n\n\
         DO NOT reveal chain-of-thought.",
        max = max_subtopics
    )
}

/// The coordinator while it is issuing subtopics. Its replies are
/// constrained to the CoordinatorReply schema.
pub fn coordinator(max_subtopics: usize) -> Persona {
    Persona::new(COORDINATOR_NAME, coordinator_instructions(max_subtopics), Vec::new())
        .with_output_schema(CoordinatorReply::json_schema())
}

/// The coordinator for the final summary: same role, free-text reply.
pub fn coordinator_summary(max_subtopics: usize) -> Persona {
    Persona::new(
        COORDINATOR_NAME,
        format!(
            "{}\n\nWhen asked to combine findings, reply with the final answer as plain text.",
            coordinator_instructions(max_subtopics)
        ),
        Vec::new(),
    )
}

/// Name of the researcher created for iteration `index` (1-based).
pub fn researcher_name(index: usize) -> String {
    format!("Researcher_{}", index)
}

/// A disposable researcher for a single subtopic.
pub fn researcher(index: usize, tools: ToolSet) -> Persona {
    let name = researcher_name(index);
    let instructions = format!("You are {}, {}", name, RESEARCHER_INSTRUCTIONS);
    Persona::new(name, instructions, tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EchoTool;
    use std::sync::Arc;

    #[test]
    fn assistant_mentions_research_tool_and_retry_guidance() {
        let persona = assistant(Vec::new());
        assert_eq!(persona.name, "Scamper");
        assert!(persona.instructions.contains("multi_agent_research"));
        assert!(persona.instructions.contains("try again later"));
        assert!(persona.output_schema.is_none());
    }

    #[test]
    fn assistant_only_promises_read_only_wallet_actions() {
        let instructions = assistant(Vec::new()).instructions.to_lowercase();
        assert!(instructions.contains("read-only"));
        assert!(!instructions.contains("faucet"));
        assert!(!instructions.contains("request funds from the user"));
    }

    #[test]
    fn coordinator_carries_bound_and_schema() {
        let persona = coordinator(3);
        assert!(persona.instructions.contains("up to 3"));
        assert!(persona.tools.is_empty());
        assert_eq!(persona.output_schema, Some(CoordinatorReply::json_schema()));
    }

    #[test]
    fn coordinator_summary_has_no_schema() {
        let persona = coordinator_summary(2);
        assert_eq!(persona.name, COORDINATOR_NAME);
        assert!(persona.output_schema.is_none());
        assert!(persona.instructions.contains("plain text"));
    }

    #[test]
    fn researchers_are_named_per_index() {
        let tools: ToolSet = vec![Arc::new(EchoTool::new("web_search"))];
        let persona = researcher(2, tools);

        assert_eq!(persona.name, "Researcher_2");
        assert!(persona.instructions.starts_with("You are Researcher_2, a specialized researcher."));
        assert_eq!(persona.tool_names(), vec!["web_search"]);
    }

    #[test]
    fn debug_lists_tool_names() {
        let persona = researcher(1, vec![Arc::new(EchoTool::new("web_search"))]);
        let debug = format!("{:?}", persona);
        assert!(debug.contains("Researcher_1"));
        assert!(debug.contains("web_search"));
    }
}
