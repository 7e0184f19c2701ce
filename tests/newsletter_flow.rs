//! End-to-end newsletter flow over a real JSON store and mock network
//! collaborators: cadence filtering, generation failure isolation, batch
//! splitting, and delivery stamping in one run.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use newsclaw_core::config::{DeliveryConfig, SearchConfig};
use newsclaw_core::error::{NewsClawError, Result, TransportError};
use newsclaw_core::traits::{ContentGenerator, EmailTransport, SearchService, ThemeStore};
use newsclaw_core::types::{
    BatchReceipt, EmailMessage, NewsletterContent, SearchResponse, SearchResult,
};
use newsclaw_delivery::BatchDispatcher;
use newsclaw_engine::{NewsletterGenerator, RunCoordinator};
use newsclaw_store::{JsonThemeStore, ThemeRecord};

struct StubSearch;

#[async_trait]
impl SearchService for StubSearch {
    fn name(&self) -> &str {
        "stub"
    }

    async fn search(&self, query: &str) -> Result<SearchResponse> {
        if query.contains("unreachable") {
            return Err(NewsClawError::Search("dns failure".into()));
        }
        Ok(SearchResponse {
            results: vec![SearchResult {
                title: "Sample News Article".into(),
                snippet: "A sample article for testing.".into(),
                url: "https://example.com/article".into(),
            }],
        })
    }
}

struct StubGenerator;

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        results: &[SearchResult],
    ) -> Result<NewsletterContent> {
        Ok(NewsletterContent {
            subject: format!("Digest ({} articles)", results.len()),
            html_body: "<p>digest</p>".into(),
            text_body: "digest".into(),
        })
    }
}

#[derive(Default)]
struct RecordingTransport {
    batch_sizes: Mutex<Vec<usize>>,
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_batch(
        &self,
        messages: &[EmailMessage],
    ) -> std::result::Result<BatchReceipt, TransportError> {
        self.batch_sizes.lock().unwrap().push(messages.len());
        Ok(BatchReceipt {
            message_ids: (0..messages.len()).map(|i| Some(format!("id-{i}"))).collect(),
        })
    }
}

fn seed_store(name: &str) -> JsonThemeStore {
    let dir = std::env::temp_dir().join(format!("newsclaw-flow-{name}"));
    std::fs::remove_dir_all(&dir).ok();
    let store = JsonThemeStore::new(&dir.join("themes.json")).unwrap();

    // 150 valid subscribers plus two invalid ones the store must drop
    let mut subscribers: Vec<String> = (0..150).map(|i| format!("reader{i}@example.com")).collect();
    subscribers.push("not-an-address".into());
    subscribers.push("spaced out@example.com".into());

    store
        .write_all(&[
            ThemeRecord {
                id: "daily".into(),
                title: "Daily Digest".into(),
                prompt: "news from {{period}}".into(),
                schedule: None,
                last_delivered_at: None,
                subscribers,
            },
            ThemeRecord {
                id: "friday".into(),
                title: "Friday Wrap".into(),
                prompt: "weekly wrap".into(),
                schedule: Some("weekly:friday".into()),
                last_delivered_at: None,
                subscribers: vec!["fan@example.com".into()],
            },
            ThemeRecord {
                id: "broken".into(),
                title: "Broken Theme".into(),
                prompt: "unreachable topic".into(),
                schedule: None,
                last_delivered_at: None,
                subscribers: vec!["fan@example.com".into()],
            },
        ])
        .unwrap();
    store
}

fn coordinator(
    store: Arc<JsonThemeStore>,
    transport: Arc<RecordingTransport>,
) -> RunCoordinator {
    let search_config = SearchConfig {
        backoff_ms: 0,
        ..Default::default()
    };
    let delivery_config = DeliveryConfig {
        rate_limit_delay_ms: 0,
        retry_backoff_ms: 0,
        ..Default::default()
    };
    RunCoordinator::new(
        store,
        NewsletterGenerator::new(Arc::new(StubSearch), Arc::new(StubGenerator), &search_config),
        BatchDispatcher::new(transport, "news@example.com", &delivery_config),
    )
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 16).unwrap()
}

#[tokio::test]
async fn full_run_filters_batches_and_stamps() {
    let store = Arc::new(seed_store("full"));
    let transport = Arc::new(RecordingTransport::default());
    let now: DateTime<Utc> = Utc::now();

    let report = coordinator(store.clone(), transport.clone())
        .run(monday(), now, false)
        .await
        .unwrap();

    // The friday theme is not due on a Monday
    assert_eq!(report.summary.total_themes, 2);
    assert_eq!(report.summary.success_count, 1);
    assert_eq!(report.summary.failed_theme_ids, vec!["broken".to_string()]);

    // 150 valid recipients split into 100 + 50; invalid addresses never
    // reached the transport
    assert_eq!(*transport.batch_sizes.lock().unwrap(), vec![100, 50]);
    assert_eq!(report.sends.len(), 1);
    assert_eq!(report.sends[0].total_recipients, 150);
    assert_eq!(report.total_emails_sent(), 150);

    // The search failure surfaced as an annotated error, citing the retries
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("[broken]"));
    assert!(report.errors[0].contains("after 3 retries"));

    // Only the delivered theme was stamped
    let themes = store.list_themes().await.unwrap();
    let delivered = |id: &str| {
        themes
            .iter()
            .find(|t| t.id == id)
            .unwrap()
            .last_delivered_at
    };
    assert_eq!(delivered("daily"), Some(now));
    assert_eq!(delivered("friday"), None);
    assert_eq!(delivered("broken"), None);
}

#[tokio::test]
async fn friday_theme_runs_on_friday() {
    let store = Arc::new(seed_store("friday"));
    let transport = Arc::new(RecordingTransport::default());
    let friday = NaiveDate::from_ymd_opt(2024, 12, 20).unwrap();

    let report = coordinator(store, transport)
        .run(friday, Utc::now(), false)
        .await
        .unwrap();

    assert!(report.generation.iter().any(|g| g.theme_id == "friday"));
    assert_eq!(report.summary.total_themes, 3);
}
