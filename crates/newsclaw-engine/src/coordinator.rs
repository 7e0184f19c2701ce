//! Run coordination — sequences generation and dispatch across all themes.
//!
//! Deliberately sequential: one theme at a time, one batch at a time, so
//! failure isolation and provider pacing stay trivially correct. Only the
//! initial theme-list fetch is fatal; every per-theme failure is captured
//! into the run report and the loop continues.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use newsclaw_core::error::Result;
use newsclaw_core::traits::ThemeStore;
use newsclaw_core::types::{
    ExecutionSummary, GenerationReport, NewsletterContent, RunReport, SendResult, Theme,
};
use newsclaw_delivery::BatchDispatcher;
use newsclaw_schedule::should_deliver_on;

use crate::generator::NewsletterGenerator;

/// Drives one full run: eligibility → generation → dispatch → summary.
pub struct RunCoordinator {
    store: Arc<dyn ThemeStore>,
    generator: NewsletterGenerator,
    dispatcher: BatchDispatcher,
}

impl RunCoordinator {
    pub fn new(
        store: Arc<dyn ThemeStore>,
        generator: NewsletterGenerator,
        dispatcher: BatchDispatcher,
    ) -> Self {
        Self {
            store,
            generator,
            dispatcher,
        }
    }

    /// Execute a run for `target_date`. With `dry_run`, content is generated
    /// but nothing is sent and no delivery timestamp is recorded.
    pub async fn run(
        &self,
        target_date: NaiveDate,
        now: DateTime<Utc>,
        dry_run: bool,
    ) -> Result<RunReport> {
        // The one fatal failure mode: no theme list, no run
        let themes = self.store.list_themes().await?;

        let due: Vec<&Theme> = themes
            .iter()
            .filter(|t| should_deliver_on(t.schedule.as_deref(), target_date, t.last_delivered_at))
            .collect();
        tracing::info!(
            "📅 {} of {} theme(s) due on {target_date}",
            due.len(),
            themes.len()
        );

        let mut generation: Vec<GenerationReport> = Vec::new();
        let mut sends: Vec<SendResult> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for theme in due {
            tracing::info!("🔄 Processing theme: {} ({})", theme.id, theme.title);
            let report = self.generator.generate_for_theme(theme, now).await;

            match report.outcome.content() {
                Some(content) => {
                    if dry_run {
                        tracing::info!("📋 Dry run: skipping dispatch for '{}'", theme.id);
                    } else {
                        let send = self.dispatch(theme, content).await;
                        errors.extend(send.errors.iter().map(|e| format!("[{}] {e}", theme.id)));
                        sends.push(send);

                        if let Err(e) = self.store.record_delivered(&theme.id, now).await {
                            tracing::warn!(
                                "⚠️ Failed to record delivery for '{}': {e}",
                                theme.id
                            );
                        }
                    }
                }
                None => {
                    let reason = report.outcome.error().unwrap_or("unknown failure");
                    tracing::warn!("⚠️ Theme {} failed: {reason}", theme.id);
                    errors.push(format!("[{}] {reason}", theme.id));
                }
            }
            generation.push(report);
        }

        let summary = ExecutionSummary::from_reports(&generation);
        Ok(RunReport {
            generation,
            sends,
            errors,
            summary,
        })
    }

    /// Fetch subscribers and dispatch. A store failure here is isolated into
    /// the theme's send result.
    async fn dispatch(&self, theme: &Theme, content: &NewsletterContent) -> SendResult {
        match self.store.subscribers(&theme.id).await {
            Ok(subscribers) => self.dispatcher.send(&theme.id, content, &subscribers).await,
            Err(e) => {
                tracing::warn!("⚠️ Subscriber fetch for '{}' failed: {e}", theme.id);
                let mut result = SendResult::new(&theme.id);
                result
                    .errors
                    .push(format!("Failed to fetch subscribers: {e}"));
                result
            }
        }
    }
}
