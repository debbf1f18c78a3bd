// ABOUTME: Core library for scamper, containing the conversation and research protocol types.
// ABOUTME: This crate defines the shared data model used by the agent runtime and the HTTP server.

pub mod credential;
pub mod message;
pub mod subtopic;

pub use credential::CredentialBlob;
pub use message::{Message, Role};
pub use subtopic::{
    CoordinatorReply, SubtopicRecord, compile_transcript, findings_report,
    first_subtopic_request, summary_request,
};
