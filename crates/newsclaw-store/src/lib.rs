//! File-based theme store — lightweight persistence.
//! Themes and their subscriber lists live in one JSON file — human-readable,
//! git-friendly. The engine reads themes and stamps `last_delivered_at`;
//! everything else is edited by hand or host tooling.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use newsclaw_core::error::{NewsClawError, Result};
use newsclaw_core::traits::ThemeStore;
use newsclaw_core::types::{Subscriber, Theme};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// One theme record on disk: the theme plus its subscriber addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub last_delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscribers: Vec<String>,
}

impl ThemeRecord {
    fn to_theme(&self) -> Theme {
        Theme {
            id: self.id.clone(),
            title: self.title.clone(),
            prompt: self.prompt.clone(),
            schedule: self.schedule.clone(),
            last_delivered_at: self.last_delivered_at,
        }
    }
}

/// JSON-file theme store.
pub struct JsonThemeStore {
    path: PathBuf,
    email_re: Regex,
}

impl JsonThemeStore {
    /// Create a store backed by the given JSON file.
    pub fn new(path: &Path) -> Result<Self> {
        let email_re = Regex::new(EMAIL_PATTERN)
            .map_err(|e| NewsClawError::Store(format!("Email pattern: {e}")))?;
        Ok(Self {
            path: path.to_path_buf(),
            email_re,
        })
    }

    /// Default store path (~/.newsclaw/themes.json).
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".newsclaw").join("themes.json")
    }

    /// Replace the whole store file. Used by host tooling and tests.
    pub fn write_all(&self, records: &[ThemeRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| NewsClawError::Store(format!("Serialize error: {e}")))?;
        std::fs::write(&self.path, &json)?;
        tracing::debug!("💾 Saved {} theme(s) to {}", records.len(), self.path.display());
        Ok(())
    }

    /// A missing file is an empty store; an unreadable or corrupt file is a
    /// fetch failure (fatal to a run).
    fn load_records(&self) -> Result<Vec<ThemeRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = std::fs::read_to_string(&self.path)
            .map_err(|e| NewsClawError::Store(format!("Read {}: {e}", self.path.display())))?;
        serde_json::from_str(&json)
            .map_err(|e| NewsClawError::Store(format!("Parse {}: {e}", self.path.display())))
    }

    fn is_valid_email(&self, address: &str) -> bool {
        !address.is_empty() && self.email_re.is_match(address)
    }
}

#[async_trait]
impl ThemeStore for JsonThemeStore {
    async fn list_themes(&self) -> Result<Vec<Theme>> {
        let records = self.load_records()?;
        let mut themes = Vec::new();
        for record in &records {
            // Records without a usable prompt are skipped, not fatal
            if record.prompt.trim().is_empty() {
                tracing::debug!("Skipping theme '{}': no prompt", record.id);
                continue;
            }
            themes.push(record.to_theme());
        }
        Ok(themes)
    }

    async fn subscribers(&self, theme_id: &str) -> Result<Vec<Subscriber>> {
        let records = self.load_records()?;
        let Some(record) = records.iter().find(|r| r.id == theme_id) else {
            return Ok(Vec::new());
        };

        let mut valid = Vec::new();
        let mut skipped = 0usize;
        for address in &record.subscribers {
            if self.is_valid_email(address) {
                valid.push(Subscriber {
                    mailto: address.clone(),
                });
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            tracing::warn!(
                "⚠️ Theme '{theme_id}': skipped {skipped} invalid address(es)"
            );
        }
        Ok(valid)
    }

    async fn record_delivered(&self, theme_id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut records = self.load_records()?;
        let Some(record) = records.iter_mut().find(|r| r.id == theme_id) else {
            return Err(NewsClawError::Store(format!("Unknown theme '{theme_id}'")));
        };
        record.last_delivered_at = Some(at);
        self.write_all(&records)?;
        tracing::info!("💾 Recorded delivery for theme '{theme_id}'");
        Ok(())
    }
}
