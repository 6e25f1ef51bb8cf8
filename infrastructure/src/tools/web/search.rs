//! WebSearch: query a search backend and list results.
//!
//! The default backend is the DuckDuckGo Instant Answer API, which needs no
//! API key. It returns abstracts and related topics rather than a full result
//! page, so the model is expected to follow up with WebFetch on the links.

use super::fetch::host_matches;
use async_trait::async_trait;
use klaude_domain::{Tool, ToolCall, ToolDefinition, ToolError, ToolParameter};
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Tool name constant
pub const WEB_SEARCH: &str = "WebSearch";

/// DuckDuckGo Instant Answer API endpoint
const DDG_API_URL: &str = "https://api.duckduckgo.com/";

/// Results requested from the backend
const MAX_RESULTS: usize = 10;

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(skip)]
    pub snippet: String,
}

/// A web search provider.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ToolError>;
}

/// [`SearchBackend`] over the DuckDuckGo Instant Answer API.
pub struct DuckDuckGoBackend {
    client: reqwest::Client,
}

impl DuckDuckGoBackend {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("klaude/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoBackend {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ToolError> {
        let response = self
            .client
            .get(DDG_API_URL)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Error: Search request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ToolError::execution_failed(format!(
                "Error: Search API returned error: {}",
                response.status()
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            ToolError::execution_failed(format!("Error: Failed to parse search results: {}", e))
        })?;
        Ok(parse_duckduckgo(&body))
    }
}

/// Flatten an Instant Answer response into hits: the abstract first, then
/// direct results, then related topics (including grouped ones).
pub fn parse_duckduckgo(data: &Value) -> Vec<SearchHit> {
    let mut hits = Vec::new();

    let abstract_text = data["AbstractText"].as_str().unwrap_or_default();
    let abstract_url = data["AbstractURL"].as_str().unwrap_or_default();
    if !abstract_text.is_empty() && !abstract_url.is_empty() {
        let heading = data["Heading"].as_str().unwrap_or_default();
        let source = data["AbstractSource"].as_str().unwrap_or("Summary");
        hits.push(SearchHit {
            title: if heading.is_empty() { source } else { heading }.to_string(),
            url: abstract_url.to_string(),
            snippet: abstract_text.to_string(),
        });
    }

    fn topic_hit(topic: &Value) -> Option<SearchHit> {
        let text = topic["Text"].as_str().filter(|t| !t.is_empty())?;
        let url = topic["FirstURL"].as_str().filter(|u| !u.is_empty())?;
        let (title, snippet) = text.split_once(" - ").unwrap_or((text, text));
        Some(SearchHit {
            title: title.to_string(),
            url: url.to_string(),
            snippet: snippet.to_string(),
        })
    }

    for key in ["Results", "RelatedTopics"] {
        for topic in data[key].as_array().into_iter().flatten() {
            match topic["Topics"].as_array() {
                Some(group) => hits.extend(group.iter().filter_map(topic_hit)),
                None => hits.extend(topic_hit(topic)),
            }
        }
    }

    hits.truncate(MAX_RESULTS);
    hits
}

/// Searches the web and renders results as a numbered list.
pub struct WebSearchTool {
    definition: ToolDefinition,
    backend: Arc<dyn SearchBackend>,
}

impl WebSearchTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        let definition = ToolDefinition::new(
            WEB_SEARCH,
            "Searches the web and returns formatted results with titles, URLs and summaries. \
             Use allowed_domains or blocked_domains to restrict which sites appear.",
        )
        .with_parameter(
            ToolParameter::new("query", "The search query to use", true)
                .with_constraint("minLength", 2),
        )
        .with_parameter(
            ToolParameter::new(
                "allowed_domains",
                "Only include search results from these domains",
                false,
            )
            .with_type("array")
            .with_items(serde_json::json!({"type": "string"})),
        )
        .with_parameter(
            ToolParameter::new(
                "blocked_domains",
                "Never include search results from these domains",
                false,
            )
            .with_type("array")
            .with_items(serde_json::json!({"type": "string"})),
        );
        Self {
            definition,
            backend,
        }
    }
}

fn domain_allowed(url: &str, allowed: &[String], blocked: &[String]) -> bool {
    let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) else {
        return allowed.is_empty();
    };
    if blocked.iter().any(|d| host_matches(&host, d)) {
        return false;
    }
    allowed.is_empty() || allowed.iter().any(|d| host_matches(&host, d))
}

fn render_results(
    query: &str,
    hits: &[SearchHit],
    allowed: &[String],
    blocked: &[String],
) -> Result<String, ToolError> {
    let mut output = format!("Web search results for query: \"{}\"\n\n", query);
    if !allowed.is_empty() {
        output.push_str(&format!(
            "Filtering results to allowed domains: {}\n",
            allowed.join(", ")
        ));
    }
    if !blocked.is_empty() {
        output.push_str(&format!(
            "Excluding results from blocked domains: {}\n",
            blocked.join(", ")
        ));
    }
    if !allowed.is_empty() || !blocked.is_empty() {
        output.push('\n');
    }

    if hits.is_empty() {
        output.push_str("No results found.\n\n");
    }
    for (i, hit) in hits.iter().enumerate() {
        output.push_str(&format!(
            "{}. {}\n   URL: {}\n   Summary: {}\n\n",
            i + 1,
            hit.title,
            hit.url,
            hit.snippet
        ));
    }

    let links = serde_json::to_string(hits)
        .map_err(|e| ToolError::execution_failed(format!("Error: {}", e)))?;
    output.push_str(&format!("Links: {}", links));
    Ok(output)
}

#[async_trait]
impl Tool for WebSearchTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let query = call.require_string("query")?;
        if query.trim().chars().count() < 2 {
            return Err(ToolError::invalid_argument(
                "Error: Query too short (minimum 2 characters)",
            ));
        }
        let allowed = call.get_string_list("allowed_domains");
        let blocked = call.get_string_list("blocked_domains");

        let hits: Vec<SearchHit> = self
            .backend
            .search(query)
            .await?
            .into_iter()
            .filter(|hit| domain_allowed(&hit.url, &allowed, &blocked))
            .collect();
        debug!(query = %query, results = hits.len(), "Web search finished");

        render_results(query, &hits, &allowed, &blocked)
    }
}
