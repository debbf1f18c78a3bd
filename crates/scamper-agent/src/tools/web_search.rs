// ABOUTME: Web search tool backed by DuckDuckGo's HTML endpoint (no API key needed).
// ABOUTME: Returns titles, snippets, and URLs of the top results as plain text.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolError, required_str};

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const DEFAULT_RESULTS: usize = 5;
const MAX_RESULTS: usize = 10;

/// Search the web and return the top results.
pub struct WebSearchTool {
    client: reqwest::Client,
    search_url: String,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            search_url: SEARCH_URL.to_string(),
        }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for up-to-date information. Returns result titles, snippets, and URLs. \
         Use for token news, project websites, audits, and scam reports."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query."
                },
                "num_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 5)."
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let query = required_str(&args, "query")?;
        let limit = args
            .get("num_results")
            .and_then(|n| n.as_u64())
            .map(|n| (n as usize).clamp(1, MAX_RESULTS))
            .unwrap_or(DEFAULT_RESULTS);

        tracing::debug!(query, limit, "web search");

        let url = format!("{}?q={}", self.search_url, urlencoding::encode(query));
        let html = self
            .client
            .get(&url)
            .header("User-Agent", "Mozilla/5.0 (compatible; scamper/0.1)")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ToolError::Failed(format!("search request failed: {}", e)))?
            .text()
            .await
            .map_err(|e| ToolError::Failed(format!("failed to read search results: {}", e)))?;

        let results = extract_results(&html, limit);
        if results.is_empty() {
            Ok(format!("No results found for: {}", query))
        } else {
            Ok(results.join("\n\n"))
        }
    }
}

/// Extract up to `limit` results from DuckDuckGo's HTML result page.
fn extract_results(html: &str, limit: usize) -> Vec<String> {
    let mut results = Vec::new();

    for chunk in html.split("class=\"result__body\"").skip(1) {
        if results.len() >= limit {
            break;
        }

        let title = element_text(chunk, "result__a");
        if title.is_empty() {
            continue;
        }
        let snippet = element_text(chunk, "result__snippet");
        let url = element_text(chunk, "result__url");

        results.push(format!(
            "**{}**\n{}\nURL: {}",
            html_decode(title),
            html_decode(snippet),
            url
        ));
    }

    results
}

/// Text of the first element carrying `class`, up to its first nested tag.
fn element_text<'a>(chunk: &'a str, class: &str) -> &'a str {
    chunk
        .split(&format!("class=\"{}\"", class))
        .nth(1)
        .and_then(|s| s.split('>').nth(1))
        .and_then(|s| s.split('<').next())
        .map(str::trim)
        .unwrap_or("")
}

fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}
