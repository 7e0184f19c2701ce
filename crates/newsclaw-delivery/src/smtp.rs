//! SMTP transport — async lettre sending for hosts without a transactional
//! email provider.
//!
//! SMTP has no batch call, so a batch is a sequential per-message loop.
//! Locally generated message ids stand in for provider confirmations; a
//! message that fails to build or send leaves a `None` slot in the receipt
//! and the loop continues.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use newsclaw_core::config::SmtpConfig;
use newsclaw_core::error::{NewsClawError, Result, TransportError};
use newsclaw_core::traits::EmailTransport;
use newsclaw_core::types::{BatchReceipt, EmailMessage};

/// Plain SMTP transport.
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    display_name: Option<String>,
}

impl SmtpTransport {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NewsClawError::Transport(format!("SMTP relay: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();
        Ok(Self {
            mailer,
            display_name: config.display_name.clone(),
        })
    }

    fn build_message(&self, email: &EmailMessage, message_id: &str) -> Result<Message> {
        let from_mailbox: Mailbox = match &self.display_name {
            Some(name) => format!("{name} <{}>", email.from),
            None => email.from.clone(),
        }
        .parse()
        .map_err(|e| NewsClawError::Transport(format!("Invalid from: {e}")))?;

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|e| NewsClawError::Transport(format!("Invalid to: {e}")))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(email.subject.as_str())
            .message_id(Some(message_id.to_string()))
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| NewsClawError::Transport(format!("Build email: {e}")))
    }
}

/// Locally generated message id — unique enough for delivery accounting.
fn local_message_id(index: usize) -> String {
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("<{:x}.{:x}.{index}@newsclaw>", t.as_secs(), t.subsec_nanos())
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send_batch(
        &self,
        messages: &[EmailMessage],
    ) -> std::result::Result<BatchReceipt, TransportError> {
        let mut message_ids = Vec::with_capacity(messages.len());

        for (index, email) in messages.iter().enumerate() {
            let id = local_message_id(index);
            let message = match self.build_message(email, &id) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!("⚠️ Skipping {}: {e}", email.to);
                    message_ids.push(None);
                    continue;
                }
            };

            match self.mailer.send(message).await {
                Ok(_) => {
                    tracing::debug!("📤 Email sent to: {}", email.to);
                    message_ids.push(Some(id));
                }
                Err(e) => {
                    tracing::warn!("⚠️ SMTP send to {} failed: {e}", email.to);
                    message_ids.push(None);
                }
            }
        }

        Ok(BatchReceipt { message_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_message_id_shape() {
        let id = local_message_id(7);
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@newsclaw>"));
        assert!(id.contains(".7@"));
    }

    #[tokio::test]
    async fn test_build_message_rejects_bad_address() {
        let transport = SmtpTransport::new(&SmtpConfig {
            host: "smtp.example.com".into(),
            ..Default::default()
        })
        .unwrap();

        let email = EmailMessage {
            from: "news@example.com".into(),
            to: "not an address".into(),
            subject: "s".into(),
            html: "<p>h</p>".into(),
            text: "t".into(),
        };
        assert!(transport.build_message(&email, "<x@newsclaw>").is_err());
    }

    #[tokio::test]
    async fn test_build_message_with_display_name() {
        let transport = SmtpTransport::new(&SmtpConfig {
            host: "smtp.example.com".into(),
            display_name: Some("NewsClaw".into()),
            ..Default::default()
        })
        .unwrap();

        let email = EmailMessage {
            from: "news@example.com".into(),
            to: "user@example.com".into(),
            subject: "s".into(),
            html: "<p>h</p>".into(),
            text: "t".into(),
        };
        assert!(transport.build_message(&email, "<x@newsclaw>").is_ok());
    }
}
