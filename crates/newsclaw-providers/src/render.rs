//! Template-based newsletter renderer.
//!
//! Deterministic `ContentGenerator`: formats the search results into a dated
//! subject line, a styled HTML body, and a plain-text body. No model calls.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use newsclaw_core::error::Result;
use newsclaw_core::traits::ContentGenerator;
use newsclaw_core::types::{NewsletterContent, SearchResult};

/// Deterministic newsletter renderer.
#[derive(Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentGenerator for TemplateRenderer {
    async fn generate(
        &self,
        prompt: &str,
        results: &[SearchResult],
    ) -> Result<NewsletterContent> {
        let now = Utc::now();
        Ok(NewsletterContent {
            subject: render_subject(prompt, now),
            html_body: render_html(prompt, results),
            text_body: render_text(prompt, results),
        })
    }
}

/// `"YYYY年M月D日 - <topic>"` where the topic is the first sentence of the
/// prompt, capped at 50 characters.
fn render_subject(prompt: &str, date: DateTime<Utc>) -> String {
    let topic: String = prompt
        .split('.')
        .next()
        .unwrap_or(prompt)
        .chars()
        .take(50)
        .collect();
    format!(
        "{}年{}月{}日 - {}",
        date.year(),
        date.month(),
        date.day(),
        topic
    )
}

fn render_html(prompt: &str, results: &[SearchResult]) -> String {
    let mut articles = String::new();
    for result in results {
        articles.push_str(&format!(
            concat!(
                "    <div style=\"margin-bottom: 20px; padding: 15px; border-left: 3px solid #4A90D9;\">\n",
                "      <h3 style=\"margin: 0 0 10px 0;\">\n",
                "        <a href=\"{url}\" style=\"color: #1a73e8; text-decoration: none;\">{title}</a>\n",
                "      </h3>\n",
                "      <p style=\"margin: 0; color: #5f6368;\">{snippet}</p>\n",
                "    </div>\n"
            ),
            url = escape_html(&result.url),
            title = escape_html(&result.title),
            snippet = escape_html(&result.snippet),
        ));
    }

    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html>\n",
            "<head>\n",
            "  <meta charset=\"utf-8\">\n",
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
            "</head>\n",
            "<body style=\"font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;\">\n",
            "  <header style=\"border-bottom: 2px solid #4A90D9; padding-bottom: 15px; margin-bottom: 20px;\">\n",
            "    <h1 style=\"margin: 0; color: #202124;\">Newsletter</h1>\n",
            "    <p style=\"margin: 5px 0 0 0; color: #5f6368;\">{prompt}</p>\n",
            "  </header>\n",
            "  <main>\n",
            "{articles}",
            "  </main>\n",
            "  <footer style=\"margin-top: 30px; padding-top: 15px; border-top: 1px solid #e0e0e0; color: #5f6368; font-size: 12px;\">\n",
            "    <p>This newsletter was automatically generated.</p>\n",
            "  </footer>\n",
            "</body>\n",
            "</html>"
        ),
        prompt = escape_html(prompt),
        articles = articles,
    )
}

fn render_text(prompt: &str, results: &[SearchResult]) -> String {
    let mut out = format!("Newsletter\n{}\n{}\n\n", "=".repeat(50), prompt);
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n   {}\n   {}\n\n",
            i + 1,
            result.title,
            result.snippet,
            result.url
        ));
    }
    out.push_str(&format!(
        "{}\nThis newsletter was automatically generated.",
        "=".repeat(50)
    ));
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}
