// ABOUTME: Subtopic records and the coordinator reply protocol for the research loop.
// ABOUTME: Also builds the prompt texts exchanged between the loop driver and the coordinator.

use serde::Deserialize;

/// One iteration of the research loop: the sub-question the coordinator issued
/// and the summary the researcher returned. `index` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtopicRecord {
    pub index: usize,
    pub subtopic: String,
    pub findings: String,
}

impl SubtopicRecord {
    pub fn new(index: usize, subtopic: impl Into<String>, findings: impl Into<String>) -> Self {
        Self {
            index,
            subtopic: subtopic.into(),
            findings: findings.into(),
        }
    }
}

/// What the coordinator wants next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorReply {
    NextSubtopic(String),
    Finished,
}

/// Wire shape of the coordinator's structured reply.
#[derive(Debug, Deserialize)]
struct StructuredReply {
    action: String,
    #[serde(default)]
    subtopic: String,
}

impl CoordinatorReply {
    /// JSON schema the coordinator's replies are constrained to when the
    /// provider supports structured output.
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["subtopic", "done"],
                    "description": "'subtopic' to issue the next research instruction, 'done' when there is nothing left to research."
                },
                "subtopic": {
                    "type": "string",
                    "description": "The research instruction (1 to 3 sentences). Empty when action is 'done'."
                }
            },
            "required": ["action", "subtopic"],
            "additionalProperties": false
        })
    }

    /// Interpret a coordinator reply.
    ///
    /// Structured replies are matched on their `action` tag, so a subtopic that
    /// literally reads "DONE" is still a subtopic. Anything that is not a
    /// structured reply falls back to the free-text convention: empty or
    /// "DONE" (any case) finishes, everything else is the next subtopic.
    pub fn parse(reply: &str) -> Self {
        let trimmed = reply.trim();

        if let Ok(structured) = serde_json::from_str::<StructuredReply>(trimmed) {
            let subtopic = structured.subtopic.trim();
            return match structured.action.trim().to_ascii_lowercase().as_str() {
                "subtopic" if !subtopic.is_empty() => {
                    CoordinatorReply::NextSubtopic(subtopic.to_string())
                }
                _ => CoordinatorReply::Finished,
            };
        }

        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("DONE") {
            CoordinatorReply::Finished
        } else {
            CoordinatorReply::NextSubtopic(trimmed.to_string())
        }
    }
}

/// Opening message asking the coordinator for its first subtopic.
pub fn first_subtopic_request(user_prompt: &str) -> String {
    format!("{}\n\nPlease produce the first subtopic.", user_prompt)
}

/// Message reporting a researcher's findings back to the coordinator and
/// asking for the next subtopic.
pub fn findings_report(subtopic: &str, findings: &str) -> String {
    format!(
        "Subtopic '{}' is researched. Here is the result:\n\n{}\n\n\
         Now produce the next subtopic. If none, say 'DONE'.",
        subtopic, findings
    )
}

/// Compile every record, in iteration order, into one numbered transcript.
pub fn compile_transcript(records: &[SubtopicRecord]) -> String {
    let mut compiled = String::from("Here are the subtopics and their research:\n\n");
    for record in records {
        compiled.push_str(&format!(
            "{}. {}\nResearch: {}\n\n",
            record.index, record.subtopic, record.findings
        ));
    }
    compiled
}

/// Final instruction asking the coordinator to merge the compiled findings.
pub fn summary_request(user_prompt: &str, compiled: &str) -> String {
    format!(
        "The user prompt was:\n{}\n\n{}\nPlease combine these findings into one concise answer for the user.",
        user_prompt, compiled
    )
}
