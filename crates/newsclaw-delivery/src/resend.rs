//! Resend batch-API transport.
//!
//! One POST per batch; the response carries one id per accepted message.
//! HTTP 429 is surfaced as the rate-limit class so the dispatcher can retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use newsclaw_core::error::{NewsClawError, Result, TransportError};
use newsclaw_core::traits::EmailTransport;
use newsclaw_core::types::{BatchReceipt, EmailMessage};

const BATCH_ENDPOINT: &str = "https://api.resend.com/emails/batch";

/// Resend transactional email transport.
pub struct ResendTransport {
    client: reqwest::Client,
    api_key: String,
}

impl ResendTransport {
    pub fn new(api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("NewsClaw/0.3")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| NewsClawError::Transport(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    data: Vec<BatchItem>,
}

#[derive(Deserialize)]
struct BatchItem {
    #[serde(default)]
    id: Option<String>,
}

#[async_trait]
impl EmailTransport for ResendTransport {
    fn name(&self) -> &str {
        "resend"
    }

    async fn send_batch(
        &self,
        messages: &[EmailMessage],
    ) -> std::result::Result<BatchReceipt, TransportError> {
        let payload: Vec<BatchEntry> = messages
            .iter()
            .map(|m| BatchEntry {
                from: &m.from,
                to: [&m.to],
                subject: &m.subject,
                html: &m.html,
                text: &m.text,
            })
            .collect();

        let response = self
            .client
            .post(BATCH_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError::Failed(format!("Resend request: {e}")))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        parse_batch_response(status, &body)
    }
}

/// Classify the HTTP outcome and extract the per-message ids.
fn parse_batch_response(
    status: u16,
    body: &str,
) -> std::result::Result<BatchReceipt, TransportError> {
    if status == 429 {
        return Err(TransportError::RateLimited(format!(
            "Resend API error 429: {body}"
        )));
    }
    if !(200..300).contains(&status) {
        return Err(TransportError::Failed(format!(
            "Resend API error {status}: {body}"
        )));
    }

    let parsed: BatchResponse = serde_json::from_str(body)
        .map_err(|e| TransportError::Failed(format!("Resend response parse: {e}")))?;
    Ok(BatchReceipt {
        message_ids: parsed.data.into_iter().map(|item| item.id).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success_ids() {
        let body = r#"{"data":[{"id":"abc"},{"id":null},{"id":"def"}]}"#;
        let receipt = parse_batch_response(200, body).unwrap();
        assert_eq!(
            receipt.message_ids,
            vec![Some("abc".to_string()), None, Some("def".to_string())]
        );
    }

    #[test]
    fn test_parse_missing_data_is_empty() {
        let receipt = parse_batch_response(200, "{}").unwrap();
        assert!(receipt.message_ids.is_empty());
    }

    #[test]
    fn test_429_is_rate_limited() {
        let err = parse_batch_response(429, "slow down").unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_other_status_is_plain_failure() {
        let err = parse_batch_response(500, "oops").unwrap_err();
        assert!(!err.is_rate_limited());
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_garbage_body_is_failure() {
        assert!(parse_batch_response(200, "not json").is_err());
    }

    #[test]
    fn test_payload_shape() {
        let message = EmailMessage {
            from: "news@example.com".into(),
            to: "user@example.com".into(),
            subject: "hello".into(),
            html: "<p>hi</p>".into(),
            text: "hi".into(),
        };
        let entry = BatchEntry {
            from: &message.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["from"], "news@example.com");
        assert_eq!(json["to"][0], "user@example.com");
        assert_eq!(json["subject"], "hello");
    }
}
