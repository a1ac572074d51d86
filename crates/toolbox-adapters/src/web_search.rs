//! Web search adapter -- hand a query to a search backend, return its text.
//!
//! The adapter does no ranking, parsing or pagination of its own: whatever
//! text the [`SearchBackend`] produces is the tool's reply.  The bundled
//! [`DuckDuckGoBackend`] scrapes the DuckDuckGo HTML endpoint (no key needed)
//! and joins result snippets into one paragraph.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::error::{AdapterError, Result};
use crate::observer::{Outcome, ToolEvent, ToolObserver, default_observer};
use crate::traits::{
    Adapter, AdapterType, AuthRequirement, HealthStatus, ToolDefinition, ensure_connected,
    require_str,
};

/// Tool name exposed to the agent.
pub const TOOL_SEARCH_WEB: &str = "search_web";

/// Returned by [`DuckDuckGoBackend`] when the page has no snippets.
pub const NO_RESULTS_TEXT: &str = "No good DuckDuckGo Search Result was found";

/// Realistic browser User-Agent to avoid being blocked.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Reply used for every failure.
pub fn search_failure_reply(query: &str) -> String {
    format!("Sorry, I couldn't search the web for {query} right now.")
}

// ═══════════════════════════════════════════════════════════════════════
//  Backend
// ═══════════════════════════════════════════════════════════════════════

/// An external search facility: one query in, unstructured text out.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<String>;
}

/// DuckDuckGo HTML search.
pub struct DuckDuckGoBackend {
    client: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

impl DuckDuckGoBackend {
    pub fn new(config: &SearchConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: config.endpoint.clone(),
            max_results: config.max_results,
        }
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoBackend {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> Result<String> {
        // POST with form data is more reliable than GET for DDG.
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query), ("kl", ""), ("df", "")])
            .send()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                tool_name: TOOL_SEARCH_WEB.into(),
                reason: format!("DuckDuckGo request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(AdapterError::RequestFailed {
                tool_name: TOOL_SEARCH_WEB.into(),
                reason: format!("DuckDuckGo returned status {}", response.status()),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                tool_name: TOOL_SEARCH_WEB.into(),
                reason: format!("failed to read DuckDuckGo response: {e}"),
            })?;

        let snippets = extract_snippets(&html, self.max_results);
        if snippets.is_empty() {
            return Ok(NO_RESULTS_TEXT.to_string());
        }
        Ok(snippets.join(" "))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  DuckDuckGo HTML parsing
// ═══════════════════════════════════════════════════════════════════════

/// Pull the text of each `result__snippet` element, in page order.
fn extract_snippets(html: &str, max_results: usize) -> Vec<String> {
    const SNIPPET_MARKER: &str = "class=\"result__snippet\"";

    let mut snippets = Vec::new();
    let mut rest = html;
    while snippets.len() < max_results {
        let Some(pos) = rest.find(SNIPPET_MARKER) else {
            break;
        };
        rest = &rest[pos + SNIPPET_MARKER.len()..];

        // Skip to the end of the opening tag, then read up to the element's
        // closing tag.  Snippets contain inline <b> tags, so stop at the
        // first closing tag that is not </b>.
        let Some(open_end) = rest.find('>') else {
            break;
        };
        let body = &rest[open_end + 1..];
        let end = find_element_end(body);
        let text = strip_html_tags(&body[..end]);
        let text = collapse_whitespace(&text);
        if !text.is_empty() {
            snippets.push(text);
        }
        rest = &body[end..];
    }
    snippets
}

fn find_element_end(body: &str) -> usize {
    let mut offset = 0;
    while let Some(pos) = body[offset..].find("</") {
        let at = offset + pos;
        if body[at..].starts_with("</b>") {
            offset = at + 4;
            continue;
        }
        return at;
    }
    body.len()
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip HTML tags from a string and decode common HTML entities.
pub fn strip_html_tags(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut inside_tag = false;

    for ch in input.chars() {
        match ch {
            '<' => inside_tag = true,
            '>' => inside_tag = false,
            _ if !inside_tag => result.push(ch),
            _ => {}
        }
    }

    result
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

// ═══════════════════════════════════════════════════════════════════════
//  Adapter
// ═══════════════════════════════════════════════════════════════════════

/// Web search adapter.
pub struct WebSearchAdapter {
    id: String,
    connected: bool,
    backend: Arc<dyn SearchBackend>,
    observer: Arc<dyn ToolObserver>,
}

impl WebSearchAdapter {
    /// Create an adapter backed by DuckDuckGo.
    pub fn new(id: impl Into<String>, config: &SearchConfig) -> Self {
        Self::with_backend(id, Arc::new(DuckDuckGoBackend::new(config)))
    }

    /// Create an adapter over any search backend.
    pub fn with_backend(id: impl Into<String>, backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            id: id.into(),
            connected: false,
            backend,
            observer: default_observer(),
        }
    }

    /// Replace the outcome observer.
    pub fn with_observer(mut self, observer: Arc<dyn ToolObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Tool entry point: the backend's text verbatim, or a fixed apology.
    pub async fn search_web(&self, query: &str) -> String {
        debug!(query, backend = self.backend.name(), "performing web search");
        match self.backend.search(query).await {
            Ok(result) => {
                let detail = format!("search results for {query}: {result}");
                self.observer.record(&ToolEvent {
                    tool: TOOL_SEARCH_WEB,
                    outcome: Outcome::Success,
                    detail: &detail,
                });
                result
            }
            Err(e) => {
                let detail = format!("searching the web for {query}: {e}");
                self.observer.record(&ToolEvent {
                    tool: TOOL_SEARCH_WEB,
                    outcome: Outcome::Failure(e.kind()),
                    detail: &detail,
                });
                search_failure_reply(query)
            }
        }
    }
}

#[async_trait]
impl Adapter for WebSearchAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Information
    }

    async fn connect(&mut self) -> Result<()> {
        info!(id = %self.id, backend = self.backend.name(), "web search adapter connected");
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!(id = %self.id, "web search adapter disconnected");
        self.connected = false;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        if self.connected {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: TOOL_SEARCH_WEB.into(),
            description: "Search the web for information".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The search query" }
                },
                "required": ["query"]
            }),
        }]
    }

    async fn execute_tool(&self, name: &str, params: Value) -> Result<Value> {
        ensure_connected(self.connected, &self.id)?;
        match name {
            TOOL_SEARCH_WEB => {
                let query = require_str(&params, "query", TOOL_SEARCH_WEB)?;
                Ok(Value::String(self.search_web(query).await))
            }
            _ => Err(AdapterError::ToolNotFound {
                adapter_id: self.id.clone(),
                tool_name: name.to_string(),
            }),
        }
    }

    fn required_auth(&self) -> Option<AuthRequirement> {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
