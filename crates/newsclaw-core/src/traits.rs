//! Collaborator contracts the engine depends on.
//!
//! The engine never talks to a database, a search API, or an email provider
//! directly: always through these trait objects, so a host can swap in its
//! own adapters (or test doubles).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Result, TransportError};
use crate::types::{
    BatchReceipt, EmailMessage, NewsletterContent, SearchResponse, SearchResult, Subscriber, Theme,
};

/// Theme and subscriber storage.
#[async_trait]
pub trait ThemeStore: Send + Sync {
    /// All themes. A failure here is fatal to the run.
    async fn list_themes(&self) -> Result<Vec<Theme>>;

    /// Subscribers of one theme. Implementations filter to syntactically
    /// valid addresses before returning.
    async fn subscribers(&self, theme_id: &str) -> Result<Vec<Subscriber>>;

    /// Stamp the theme's last successful delivery. Advisory: a failure here
    /// is logged by the caller, never fatal.
    async fn record_delivered(&self, theme_id: &str, at: DateTime<Utc>) -> Result<()>;
}

/// Web search capability.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Adapter name, for logs.
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<SearchResponse>;
}

/// Newsletter content synthesis.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        results: &[SearchResult],
    ) -> Result<NewsletterContent>;
}

/// Outbound email, batch-oriented.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Adapter name, for logs.
    fn name(&self) -> &str;

    /// Send one batch. A structural success returns per-message ids aligned
    /// with the submitted order; a transport failure carries the rate-limit
    /// class so the dispatcher can decide whether to retry.
    async fn send_batch(
        &self,
        messages: &[EmailMessage],
    ) -> std::result::Result<BatchReceipt, TransportError>;
}
