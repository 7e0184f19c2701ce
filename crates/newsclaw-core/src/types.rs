//! The NewsClaw data model — themes, subscribers, generated content, and the
//! per-run result records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A newsletter theme.
///
/// Themes live in an external store; the engine only reads them and asks the
/// store to stamp `last_delivered_at` after a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    /// Unique theme ID.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Prompt template. May embed `{{period}}`, `{{today}}`, `{{days}}`.
    pub prompt: String,
    /// Delivery cadence string (`weekly:monday`, `biweekly:friday`,
    /// `monthly:1,15`). `None` means deliver every day.
    #[serde(default)]
    pub schedule: Option<String>,
    /// Timestamp of the last successful delivery. Anchors the biweekly rule
    /// and the `{{period}}` variable.
    #[serde(default)]
    pub last_delivered_at: Option<DateTime<Utc>>,
}

/// A single subscriber address, scoped to one theme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscriber {
    pub mailto: String,
}

/// One web search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Structurally successful search response. An empty `results` list is a
/// permanent content failure for the theme, not a transport failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

/// Generated newsletter content. Produced once per theme per run, immutable
/// afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterContent {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Terminal outcome of the generation pipeline for one theme.
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// Content was generated and is ready for dispatch.
    Generated(NewsletterContent),
    /// The theme failed with a human-readable reason.
    Failed(String),
}

impl GenerationOutcome {
    pub fn is_generated(&self) -> bool {
        matches!(self, GenerationOutcome::Generated(_))
    }

    /// The generated content, if any.
    pub fn content(&self) -> Option<&NewsletterContent> {
        match self {
            GenerationOutcome::Generated(c) => Some(c),
            GenerationOutcome::Failed(_) => None,
        }
    }

    /// The failure reason, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Generated(_) => None,
            GenerationOutcome::Failed(reason) => Some(reason),
        }
    }
}

/// Generation result for one theme.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub theme_id: String,
    pub outcome: GenerationOutcome,
}

/// Aggregate dispatch result for one theme.
///
/// `success_count + failed_recipients.len()` may fall short of
/// `total_recipients`: batch-level failures surface only in `errors`.
#[derive(Debug, Clone, Default)]
pub struct SendResult {
    pub theme_id: String,
    pub total_recipients: usize,
    pub success_count: usize,
    pub failed_recipients: Vec<String>,
    pub errors: Vec<String>,
}

impl SendResult {
    pub fn new(theme_id: &str) -> Self {
        Self {
            theme_id: theme_id.to_string(),
            ..Default::default()
        }
    }
}

/// Run-level counts, derived from the generation reports. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    pub total_themes: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub failed_theme_ids: Vec<String>,
}

impl ExecutionSummary {
    /// Derive a summary from per-theme generation reports.
    pub fn from_reports(reports: &[GenerationReport]) -> Self {
        let success_count = reports.iter().filter(|r| r.outcome.is_generated()).count();
        let failed_theme_ids: Vec<String> = reports
            .iter()
            .filter(|r| !r.outcome.is_generated())
            .map(|r| r.theme_id.clone())
            .collect();
        Self {
            total_themes: reports.len(),
            success_count,
            failure_count: failed_theme_ids.len(),
            failed_theme_ids,
        }
    }
}

/// Full output of one coordinator run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub generation: Vec<GenerationReport>,
    pub sends: Vec<SendResult>,
    /// Flattened error list, each entry annotated `[theme-id] ...`.
    pub errors: Vec<String>,
    pub summary: ExecutionSummary,
}

impl RunReport {
    /// Total emails confirmed sent across all themes.
    pub fn total_emails_sent(&self) -> usize {
        self.sends.iter().map(|s| s.success_count).sum()
    }
}

/// One outbound email, as handed to the transport.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Per-message delivery confirmation for one batch, aligned with the
/// submitted order. `None` means the provider returned no id for that slot,
/// so the recipient counts as failed.
#[derive(Debug, Clone, Default)]
pub struct BatchReceipt {
    pub message_ids: Vec<Option<String>>,
}
