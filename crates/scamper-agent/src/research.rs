// ABOUTME: Subtopic-research loop: a coordinator issues sub-questions, disposable researchers answer them.
// ABOUTME: Bounded and strictly sequential; the coordinator finally merges all findings into one answer.

use std::sync::Arc;

use tracing::Instrument;
use ulid::Ulid;

use scamper_core::{
    CoordinatorReply, Message, SubtopicRecord, compile_transcript, findings_report,
    first_subtopic_request, summary_request,
};

use crate::persona;
use crate::runtime::{AgentError, AgentRuntime};
use crate::toolkit::ToolkitFactory;

/// Default number of subtopics the coordinator may issue per research run.
pub const DEFAULT_MAX_SUBTOPICS: usize = 2;

/// Tunables for the research loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResearchSettings {
    /// Upper bound on sub-question iterations.
    pub max_subtopics: usize,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            max_subtopics: DEFAULT_MAX_SUBTOPICS,
        }
    }
}

/// Everything a research run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchOutcome {
    pub records: Vec<SubtopicRecord>,
    pub answer: String,
}

/// Drives the coordinator/researcher exchange for one prompt at a time.
pub struct SubtopicResearcher {
    runtime: Arc<dyn AgentRuntime>,
    toolkits: ToolkitFactory,
    settings: ResearchSettings,
}

impl SubtopicResearcher {
    pub fn new(
        runtime: Arc<dyn AgentRuntime>,
        toolkits: ToolkitFactory,
        settings: ResearchSettings,
    ) -> Self {
        Self {
            runtime,
            toolkits,
            settings,
        }
    }

    pub fn settings(&self) -> ResearchSettings {
        self.settings
    }

    /// Research `user_prompt` and return the synthesized answer.
    pub async fn research(&self, user_prompt: &str) -> Result<String, AgentError> {
        self.investigate(user_prompt).await.map(|outcome| outcome.answer)
    }

    /// Research `user_prompt`, returning the per-subtopic records along with
    /// the synthesized answer. Any runtime failure aborts the whole run.
    pub async fn investigate(&self, user_prompt: &str) -> Result<ResearchOutcome, AgentError> {
        let span = tracing::info_span!(
            "research",
            run_id = %Ulid::new(),
            max_subtopics = self.settings.max_subtopics
        );
        self.run_loop(user_prompt).instrument(span).await
    }

    async fn run_loop(&self, user_prompt: &str) -> Result<ResearchOutcome, AgentError> {
        tracing::debug!(prompt = %user_prompt, "starting multi-agent research");

        let coordinator = persona::coordinator(self.settings.max_subtopics);

        let mut conversation = vec![Message::user(first_subtopic_request(user_prompt))];
        let mut records: Vec<SubtopicRecord> = Vec::new();

        for index in 1..=self.settings.max_subtopics {
            tracing::debug!(subtopic = index, "requesting subtopic from coordinator");
            let coordinator_run = self
                .runtime
                .run(&coordinator, conversation.clone())
                .instrument(tracing::debug_span!("coordinator", subtopic = index))
                .await?;

            let subtopic = match CoordinatorReply::parse(&coordinator_run.final_output) {
                CoordinatorReply::Finished => {
                    tracing::debug!(subtopic = index, "coordinator indicated it is done");
                    break;
                }
                CoordinatorReply::NextSubtopic(text) => text,
            };
            tracing::debug!(subtopic = index, text = %subtopic, "coordinator issued subtopic");

            // Each researcher gets its own wallet bundle, restored from the blob.
            let toolkit = self.toolkits.build().await?;
            let researcher = persona::researcher(index, toolkit.tools());
            let researcher_run = self
                .runtime
                .run(&researcher, vec![Message::user(subtopic.clone())])
                .instrument(tracing::debug_span!("researcher", name = %researcher.name))
                .await?;
            let findings = researcher_run.final_output;
            tracing::debug!(researcher = %researcher.name, findings = %findings, "researcher returned");

            conversation = coordinator_run.conversation;
            conversation.push(Message::user(findings_report(&subtopic, &findings)));
            records.push(SubtopicRecord::new(index, subtopic, findings));
        }

        let compiled = compile_transcript(&records);
        tracing::debug!(subtopics = records.len(), compiled = %compiled, "compiled research");

        conversation.push(Message::user(summary_request(user_prompt, &compiled)));
        let summary = self
            .runtime
            .run(
                &persona::coordinator_summary(self.settings.max_subtopics),
                conversation,
            )
            .instrument(tracing::debug_span!("coordinator", phase = "summary"))
            .await?;

        tracing::debug!(answer = %summary.final_output, "final summary from coordinator");
        Ok(ResearchOutcome {
            records,
            answer: summary.final_output,
        })
    }
}
