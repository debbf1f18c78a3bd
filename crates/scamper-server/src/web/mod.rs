// ABOUTME: Web UI route handler serving the browser chat page via an Askama template.
// ABOUTME: The page stores conversation history in localStorage and posts it to /chat.

use askama::Template;
use askama_derive_axum::IntoResponse as AskamaIntoResponse;

use scamper_agent::persona::ASSISTANT_NAME;

/// Chat page.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub assistant_name: &'static str,
}

/// GET / - Render the chat page.
pub async fn index() -> IndexTemplate {
    IndexTemplate {
        assistant_name: ASSISTANT_NAME,
    }
}
