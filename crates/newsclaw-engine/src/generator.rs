//! Per-theme newsletter generation.
//!
//! Validates the prompt, expands its date variables, searches with bounded
//! retries, and hands the results to the content generator. Every failure
//! path returns a tagged report; nothing propagates past the theme
//! boundary, so the coordinator can always continue with the next theme.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use newsclaw_core::config::SearchConfig;
use newsclaw_core::retry::{Backoff, RetryPolicy};
use newsclaw_core::traits::{ContentGenerator, SearchService};
use newsclaw_core::types::{GenerationOutcome, GenerationReport, Theme};
use newsclaw_schedule::expand_prompt;

/// Per-theme generation pipeline.
pub struct NewsletterGenerator {
    search: Arc<dyn SearchService>,
    generator: Arc<dyn ContentGenerator>,
    retry: RetryPolicy,
}

impl NewsletterGenerator {
    pub fn new(
        search: Arc<dyn SearchService>,
        generator: Arc<dyn ContentGenerator>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            search,
            generator,
            retry: RetryPolicy::new(
                config.max_attempts,
                Backoff::Linear {
                    base: Duration::from_millis(config.backoff_ms),
                },
            ),
        }
    }

    /// Generate newsletter content for a single theme.
    pub async fn generate_for_theme(&self, theme: &Theme, now: DateTime<Utc>) -> GenerationReport {
        let fail = |reason: String| GenerationReport {
            theme_id: theme.id.clone(),
            outcome: GenerationOutcome::Failed(reason),
        };

        // Permanent failure, no collaborator call
        if theme.prompt.trim().is_empty() {
            return fail(format!("Theme {} has empty prompt", theme.id));
        }

        let prompt = expand_prompt(&theme.prompt, theme.last_delivered_at, now);

        // Transient-failure site: bounded linear-backoff retry
        let search_outcome = self
            .retry
            .run(|attempt| {
                let prompt = prompt.as_str();
                async move {
                    self.search.search(prompt).await.map_err(|e| {
                        tracing::warn!(
                            "⚠️ Web search attempt {attempt} failed ({}): {e}",
                            self.search.name()
                        );
                        e.to_string()
                    })
                }
            })
            .await;

        let response = match search_outcome {
            Ok(response) => response,
            Err(last_error) => {
                return fail(format!(
                    "Web search failed after {} retries: {last_error}",
                    self.retry.max_attempts()
                ));
            }
        };

        // A structurally empty answer is permanent, not retried
        if response.results.is_empty() {
            return fail(format!("No search results found for theme {}", theme.id));
        }

        match self.generator.generate(&prompt, &response.results).await {
            Ok(content) => {
                tracing::info!(
                    "📰 Theme '{}': generated '{}' from {} result(s)",
                    theme.id,
                    content.subject,
                    response.results.len()
                );
                GenerationReport {
                    theme_id: theme.id.clone(),
                    outcome: GenerationOutcome::Generated(content),
                }
            }
            Err(e) => fail(format!("Content generation failed: {e}")),
        }
    }
}
