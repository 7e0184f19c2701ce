//! NewsClaw configuration system.
//!
//! TOML config at `~/.newsclaw/config.toml`; secrets may also come from the
//! environment (`RESEND_API_KEY`, `FROM_EMAIL`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NewsClawError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsClawConfig {
    /// Sender address for all outgoing newsletters.
    #[serde(default)]
    pub from_email: String,
    /// Resend API key. Empty unless the resend transport is used.
    #[serde(default)]
    pub resend_api_key: String,
    /// Which transport to use: "resend" or "smtp".
    #[serde(default = "default_transport")]
    pub transport: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

fn default_transport() -> String {
    "resend".into()
}

impl Default for NewsClawConfig {
    fn default() -> Self {
        Self {
            from_email: String::new(),
            resend_api_key: String::new(),
            transport: default_transport(),
            store: StoreConfig::default(),
            search: SearchConfig::default(),
            delivery: DeliveryConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl NewsClawConfig {
    /// Load config from the default path (~/.newsclaw/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NewsClawError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| NewsClawError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| NewsClawError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Environment variables override file values when set.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("RESEND_API_KEY") {
            if !key.is_empty() {
                self.resend_api_key = key;
            }
        }
        if let Ok(from) = std::env::var("FROM_EMAIL") {
            if !from.is_empty() {
                self.from_email = from;
            }
        }
    }

    /// Check that every field required by the chosen transport is present.
    /// Names all missing fields in one error.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        if self.from_email.trim().is_empty() {
            missing.push("from_email (or FROM_EMAIL)");
        }
        match self.transport.as_str() {
            "resend" => {
                if self.resend_api_key.trim().is_empty() {
                    missing.push("resend_api_key (or RESEND_API_KEY)");
                }
            }
            "smtp" => {
                if self.smtp.host.trim().is_empty() {
                    missing.push("smtp.host");
                }
                if self.smtp.username.trim().is_empty() {
                    missing.push("smtp.username");
                }
            }
            other => {
                return Err(NewsClawError::Config(format!(
                    "Unknown transport '{other}' (expected 'resend' or 'smtp')"
                )));
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(NewsClawError::Config(format!(
                "Missing required configuration: {}",
                missing.join(", ")
            )))
        }
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the NewsClaw home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".newsclaw")
    }
}

/// Theme store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the themes JSON file.
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "~/.newsclaw/themes.json".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Web search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Total attempts per theme (first try included).
    #[serde(default = "default_search_attempts")]
    pub max_attempts: u32,
    /// Base delay for the linear backoff between attempts.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// Max results to keep per query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// HTTP timeout per request.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_attempts() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    1000
}
fn default_max_results() -> usize {
    5
}
fn default_search_timeout() -> u64 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_search_attempts(),
            backoff_ms: default_backoff_ms(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// Batched email delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Recipients per transport call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between batches (provider throughput limit).
    #[serde(default = "default_rate_limit_delay")]
    pub rate_limit_delay_ms: u64,
    /// Additional retries of a rate-limited batch.
    #[serde(default = "default_batch_retries")]
    pub batch_retries: u32,
    /// Base delay for the exponential backoff between batch retries.
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_batch_size() -> usize {
    100
}
fn default_rate_limit_delay() -> u64 {
    500
}
fn default_batch_retries() -> u32 {
    3
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            rate_limit_delay_ms: default_rate_limit_delay(),
            batch_retries: default_batch_retries(),
            retry_backoff_ms: default_backoff_ms(),
        }
    }
}

/// SMTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            display_name: None,
        }
    }
}
