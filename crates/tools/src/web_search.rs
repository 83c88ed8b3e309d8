//! Web search via the DuckDuckGo Instant Answer API.
//!
//! No key is required. Results are the abstract (when DuckDuckGo has one)
//! followed by related topics, each as title/url/snippet.

use async_trait::async_trait;
use aura_core::error::ToolError;
use aura_core::tool::{Tool, ToolResult};
use std::time::Duration;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com/";

pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
}

impl WebSearchTool {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("aura/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout_secs: timeout.as_secs(),
        }
    }

    /// Point at a different Instant Answer-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns relevant results with titles, URLs, and snippets."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (default 5)",
                    "default": 5
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let num_results = arguments["num_results"].as_u64().unwrap_or(5).clamp(1, 10) as usize;

        debug!(query, "Running web search");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout {
                        tool_name: "web_search".into(),
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    ToolError::ExecutionFailed {
                        tool_name: "web_search".into(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let body: serde_json::Value = response.json().await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: "web_search".into(),
            reason: format!("invalid response: {e}"),
        })?;

        let results = parse_instant_answer(&body, num_results);
        let output = if results.is_empty() {
            format!("No results found for '{query}'.")
        } else {
            serde_json::to_string_pretty(&results).unwrap_or_default()
        };

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
            data: serde_json::to_value(&results).ok(),
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

fn parse_instant_answer(body: &serde_json::Value, max: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if let Some(text) = body["AbstractText"].as_str().filter(|t| !t.is_empty()) {
        results.push(SearchResult {
            title: body["Heading"].as_str().unwrap_or_default().to_string(),
            url: body["AbstractURL"].as_str().unwrap_or_default().to_string(),
            snippet: text.to_string(),
        });
    }

    // Related topics are either entries or named groups of entries.
    let topics = body["RelatedTopics"].as_array().into_iter().flatten();
    let entries = topics.flat_map(|t| match t["Topics"].as_array() {
        Some(group) => group.iter().collect::<Vec<_>>(),
        None => vec![t],
    });

    for entry in entries {
        let (Some(text), Some(url)) = (entry["Text"].as_str(), entry["FirstURL"].as_str()) else {
            continue;
        };
        let title = text.split(" - ").next().unwrap_or(text).to_string();
        results.push(SearchResult {
            title,
            url: url.to_string(),
            snippet: text.to_string(),
        });
    }

    results.truncate(max);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> serde_json::Value {
        serde_json::json!({
            "Heading": "Pour-over coffee",
            "AbstractText": "Pour-over is a method of brewing coffee by hand.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Pour-over",
            "RelatedTopics": [
                {"Text": "Cold brew - Coffee steeped in cold water.", "FirstURL": "https://duckduckgo.com/Cold_brew"},
                {"Name": "Equipment", "Topics": [
                    {"Text": "Chemex - A glass coffeemaker.", "FirstURL": "https://duckduckgo.com/Chemex"}
                ]},
                {"Text": "entry without url"}
            ]
        })
    }

    #[test]
    fn parses_abstract_and_topics() {
        let results = parse_instant_answer(&sample(), 10);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Pour-over coffee");
        assert_eq!(results[1].title, "Cold brew");
        assert_eq!(results[2].url, "https://duckduckgo.com/Chemex");
    }

    #[test]
    fn truncates_to_requested_count() {
        assert_eq!(parse_instant_answer(&sample(), 1).len(), 1);
    }

    #[test]
    fn empty_body_yields_nothing() {
        assert!(parse_instant_answer(&serde_json::json!({}), 5).is_empty());
    }

    #[tokio::test]
    async fn missing_query_returns_error() {
        let result = WebSearchTool::default().execute(serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_execution_failure() {
        let tool = WebSearchTool::new(Duration::from_secs(2)).with_endpoint("http://127.0.0.1:1/");
        let result = tool.execute(serde_json::json!({"query": "coffee"})).await;
        assert!(result.is_err());
    }

    #[test]
    fn tool_definition() {
        let def = WebSearchTool::default().to_definition();
        assert_eq!(def.name, "web_search");
        assert!(!def.description.is_empty());
    }
}
