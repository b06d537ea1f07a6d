//! Web search through a SearXNG instance
//!
//! See: https://docs.searxng.org/dev/search_api.html

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{required_str, Tool, ToolError, ToolKind};

#[derive(Debug, Deserialize)]
struct SearXNGResponse {
    #[serde(default)]
    results: Vec<SearXNGResult>,
}

#[derive(Debug, Deserialize)]
struct SearXNGResult {
    title: String,
    url: String,
    content: Option<String>,
    img_src: Option<String>,
}

pub struct WebSearchTool {
    client: Client,
    base_url: String,
    limit: usize,
}

impl WebSearchTool {
    pub fn new(base_url: &str, limit: usize) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            limit: limit.max(1),
        }
    }
}

fn render_results(query: &str, results: Vec<SearXNGResult>, limit: usize) -> String {
    let lines: Vec<String> = results
        .into_iter()
        // Image-only hits carry no text worth reading
        .filter(|r| r.img_src.as_ref().map_or(true, |s| s.is_empty()))
        .take(limit)
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. {}\n   {}\n   {}",
                i + 1,
                r.title,
                r.url,
                r.content.unwrap_or_default().trim()
            )
        })
        .collect();

    if lines.is_empty() {
        return format!("No results found for '{}'.", query);
    }
    lines.join("\n")
}

#[async_trait]
impl Tool for WebSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    async fn invoke(&self, input: &Value) -> Result<String, ToolError> {
        let query = required_str(input, "query")?;
        let url = format!("{}/search", self.base_url);

        tracing::debug!(query = %query, "Web search");

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("pageno", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ToolError::Unavailable(format!(
                "SearXNG error {}: {}",
                status, text
            )));
        }

        let body: SearXNGResponse = response.json().await?;
        Ok(render_results(query, body.results, self.limit))
    }
}
