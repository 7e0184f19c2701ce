//! DuckDuckGo search adapter.
//!
//! Scrapes the DuckDuckGo HTML endpoint (no API key required) into structured
//! search results.

use async_trait::async_trait;
use newsclaw_core::config::SearchConfig;
use newsclaw_core::error::{NewsClawError, Result};
use newsclaw_core::traits::SearchService;
use newsclaw_core::types::{SearchResponse, SearchResult};

/// DuckDuckGo HTML search client.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("NewsClaw/0.3")
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NewsClawError::Search(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl SearchService for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> Result<SearchResponse> {
        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| NewsClawError::Search(format!("Search request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(NewsClawError::Search(format!(
                "Search API error {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| NewsClawError::Search(format!("Read failed: {e}")))?;

        let results = parse_ddg_results(&html, self.max_results);
        tracing::debug!("🔍 {} result(s) for query", results.len());
        Ok(SearchResponse { results })
    }
}

/// Parse DuckDuckGo HTML search results.
fn parse_ddg_results(html: &str, max: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    for segment in html.split("class=\"result__a\"").skip(1).take(max) {
        let title = extract_between(segment, ">", "</a>")
            .unwrap_or_default()
            .replace("<b>", "")
            .replace("</b>", "");

        let url = extract_between(segment, "href=\"", "\"").unwrap_or_default();

        let snippet = if let Some(snip_seg) = segment.split("class=\"result__snippet\"").nth(1) {
            extract_between(snip_seg, ">", "</")
                .unwrap_or_default()
                .replace("<b>", "")
                .replace("</b>", "")
        } else {
            String::new()
        };

        if !title.is_empty() {
            results.push(SearchResult {
                title: title.trim().into(),
                snippet: snippet.trim().into(),
                url: url.trim().into(),
            });
        }
    }
    results
}

fn extract_between(text: &str, start: &str, end: &str) -> Option<String> {
    let start_idx = text.find(start)? + start.len();
    let remaining = &text[start_idx..];
    let end_idx = remaining.find(end)?;
    Some(remaining[..end_idx].to_string())
}
