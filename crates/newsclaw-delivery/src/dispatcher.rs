//! Batched email dispatcher.
//!
//! Partitions a theme's recipients into fixed-size batches, paces transport
//! calls to respect provider limits, retries rate-limited batches with
//! exponential backoff, and reconciles per-recipient confirmations into one
//! `SendResult`. Nothing here escapes the theme boundary; every failure mode
//! lands in the result record.

use std::sync::Arc;
use std::time::Duration;

use newsclaw_core::config::DeliveryConfig;
use newsclaw_core::error::TransportError;
use newsclaw_core::retry::{Backoff, RetryPolicy};
use newsclaw_core::traits::EmailTransport;
use newsclaw_core::types::{EmailMessage, NewsletterContent, SendResult, Subscriber};

/// Batched, rate-limited email dispatcher.
pub struct BatchDispatcher {
    transport: Arc<dyn EmailTransport>,
    from_email: String,
    batch_size: usize,
    inter_batch_delay: Duration,
    retry: RetryPolicy,
}

impl BatchDispatcher {
    pub fn new(
        transport: Arc<dyn EmailTransport>,
        from_email: &str,
        config: &DeliveryConfig,
    ) -> Self {
        Self {
            transport,
            from_email: from_email.to_string(),
            batch_size: config.batch_size.max(1),
            inter_batch_delay: Duration::from_millis(config.rate_limit_delay_ms),
            // First attempt + the configured number of rate-limit retries
            retry: RetryPolicy::new(
                config.batch_retries + 1,
                Backoff::Exponential {
                    base: Duration::from_millis(config.retry_backoff_ms),
                },
            ),
        }
    }

    /// Send `content` to every subscriber of a theme.
    pub async fn send(
        &self,
        theme_id: &str,
        content: &NewsletterContent,
        subscribers: &[Subscriber],
    ) -> SendResult {
        let mut result = SendResult::new(theme_id);

        if subscribers.is_empty() {
            tracing::warn!("⚠️ No subscribers found for theme {theme_id}");
            result
                .errors
                .push(format!("No subscribers found for theme {theme_id}"));
            return result;
        }

        result.total_recipients = subscribers.len();
        let addresses: Vec<String> = subscribers.iter().map(|s| s.mailto.clone()).collect();

        let batches: Vec<&[String]> = addresses.chunks(self.batch_size).collect();
        let batch_count = batches.len();
        tracing::info!(
            "📤 Theme '{theme_id}': {} recipient(s) in {batch_count} batch(es) via {}",
            result.total_recipients,
            self.transport.name()
        );

        for (index, batch) in batches.iter().enumerate() {
            self.send_batch(batch, content, &mut result).await;

            // Pace the provider between batches, success or not
            if index + 1 < batch_count {
                tokio::time::sleep(self.inter_batch_delay).await;
            }
        }

        tracing::info!(
            "📤 Theme '{theme_id}': {}/{} delivered",
            result.success_count,
            result.total_recipients
        );
        result
    }

    /// Send one batch, retrying only on rate-limit errors, and fold the
    /// outcome into `result`.
    async fn send_batch(
        &self,
        addresses: &[String],
        content: &NewsletterContent,
        result: &mut SendResult,
    ) {
        let messages: Vec<EmailMessage> = addresses
            .iter()
            .map(|to| EmailMessage {
                from: self.from_email.clone(),
                to: to.clone(),
                subject: content.subject.clone(),
                html: content.html_body.clone(),
                text: content.text_body.clone(),
            })
            .collect();

        let outcome = self
            .retry
            .run_if(
                |attempt| {
                    let messages = &messages;
                    async move {
                        if attempt > 1 {
                            tracing::info!("📧 Retrying rate-limited batch (attempt {attempt})");
                        }
                        self.transport.send_batch(messages).await
                    }
                },
                TransportError::is_rate_limited,
            )
            .await;

        match outcome {
            Ok(receipt) => {
                // An address is delivered only with a confirmed message id
                for (i, address) in addresses.iter().enumerate() {
                    match receipt.message_ids.get(i) {
                        Some(Some(_)) => result.success_count += 1,
                        _ => result.failed_recipients.push(address.clone()),
                    }
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ Batch send failed: {e}");
                result
                    .failed_recipients
                    .extend(addresses.iter().cloned());
                result.errors.push(format!("Batch send failed: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use newsclaw_core::types::BatchReceipt;
    use std::sync::Mutex;

    fn content() -> NewsletterContent {
        NewsletterContent {
            subject: "s".into(),
            html_body: "<p>h</p>".into(),
            text_body: "t".into(),
        }
    }

    fn subscribers(n: usize) -> Vec<Subscriber> {
        (0..n)
            .map(|i| Subscriber {
                mailto: format!("user{i}@example.com"),
            })
            .collect()
    }

    fn config() -> DeliveryConfig {
        DeliveryConfig {
            batch_size: 100,
            rate_limit_delay_ms: 0,
            batch_retries: 3,
            retry_backoff_ms: 0,
        }
    }

    /// Transport double: records batch sizes, replays scripted outcomes.
    struct ScriptedTransport {
        batch_sizes: Mutex<Vec<usize>>,
        script: Mutex<Vec<Result<BatchReceipt, TransportError>>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<BatchReceipt, TransportError>>) -> Self {
            Self {
                batch_sizes: Mutex::new(Vec::new()),
                script: Mutex::new(script),
            }
        }

        /// Succeed every call, confirming every message.
        fn all_ok() -> Self {
            Self::new(Vec::new())
        }

        fn sizes(&self) -> Vec<usize> {
            self.batch_sizes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmailTransport for ScriptedTransport {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn send_batch(
            &self,
            messages: &[EmailMessage],
        ) -> Result<BatchReceipt, TransportError> {
            self.batch_sizes.lock().unwrap().push(messages.len());
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                Ok(BatchReceipt {
                    message_ids: (0..messages.len()).map(|i| Some(format!("id-{i}"))).collect(),
                })
            } else {
                script.remove(0)
            }
        }
    }

    #[tokio::test]
    async fn test_empty_subscribers_no_transport_call() {
        let transport = Arc::new(ScriptedTransport::all_ok());
        let dispatcher = BatchDispatcher::new(transport.clone(), "news@example.com", &config());

        let result = dispatcher.send("t1", &content(), &[]).await;
        assert_eq!(result.total_recipients, 0);
        assert_eq!(result.errors, vec!["No subscribers found for theme t1"]);
        assert!(transport.sizes().is_empty());
    }

    #[tokio::test]
    async fn test_batch_split_150_into_100_and_50() {
        let transport = Arc::new(ScriptedTransport::all_ok());
        let dispatcher = BatchDispatcher::new(transport.clone(), "news@example.com", &config());

        let result = dispatcher.send("t1", &content(), &subscribers(150)).await;
        assert_eq!(transport.sizes(), vec![100, 50]);
        assert_eq!(result.total_recipients, 150);
        assert_eq!(result.success_count, 150);
        assert!(result.failed_recipients.is_empty());
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_null_id_marks_that_position_failed() {
        let receipt = BatchReceipt {
            message_ids: vec![Some("a".into()), None, Some("c".into())],
        };
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(receipt)]));
        let dispatcher = BatchDispatcher::new(transport, "news@example.com", &config());

        let result = dispatcher.send("t1", &content(), &subscribers(3)).await;
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failed_recipients, vec!["user1@example.com".to_string()]);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_short_receipt_fails_missing_tail() {
        let receipt = BatchReceipt {
            message_ids: vec![Some("a".into())],
        };
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(receipt)]));
        let dispatcher = BatchDispatcher::new(transport, "news@example.com", &config());

        let result = dispatcher.send("t1", &content(), &subscribers(3)).await;
        assert_eq!(result.success_count, 1);
        assert_eq!(
            result.failed_recipients,
            vec!["user1@example.com".to_string(), "user2@example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_retries_then_succeeds() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::RateLimited("429".into())),
            Err(TransportError::RateLimited("429".into())),
        ]));
        let dispatcher = BatchDispatcher::new(transport.clone(), "news@example.com", &config());

        let result = dispatcher.send("t1", &content(), &subscribers(5)).await;
        // Two rate-limited attempts, then the scripted fallback succeeds
        assert_eq!(transport.sizes(), vec![5, 5, 5]);
        assert_eq!(result.success_count, 5);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_fails_whole_batch() {
        let limited = || Err(TransportError::RateLimited("429".into()));
        let transport = Arc::new(ScriptedTransport::new(vec![
            limited(),
            limited(),
            limited(),
            limited(),
        ]));
        let dispatcher = BatchDispatcher::new(transport.clone(), "news@example.com", &config());

        let result = dispatcher.send("t1", &content(), &subscribers(5)).await;
        // First attempt + 3 retries
        assert_eq!(transport.sizes(), vec![5, 5, 5, 5]);
        assert_eq!(result.success_count, 0);
        assert_eq!(result.failed_recipients.len(), 5);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("rate limited"));
    }

    #[tokio::test]
    async fn test_non_rate_limit_error_fails_immediately() {
        let transport = Arc::new(ScriptedTransport::new(vec![Err(TransportError::Failed(
            "500 server error".into(),
        ))]));
        let dispatcher = BatchDispatcher::new(transport.clone(), "news@example.com", &config());

        let result = dispatcher.send("t1", &content(), &subscribers(5)).await;
        // No retry for non-rate-limit failures
        assert_eq!(transport.sizes(), vec![5]);
        assert_eq!(result.failed_recipients.len(), 5);
        assert!(result.errors[0].contains("500 server error"));
    }

    #[tokio::test]
    async fn test_second_batch_still_sent_after_first_fails() {
        let mut cfg = config();
        cfg.batch_size = 2;
        let transport = Arc::new(ScriptedTransport::new(vec![Err(TransportError::Failed(
            "boom".into(),
        ))]));
        let dispatcher = BatchDispatcher::new(transport.clone(), "news@example.com", &cfg);

        let result = dispatcher.send("t1", &content(), &subscribers(4)).await;
        assert_eq!(transport.sizes(), vec![2, 2]);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failed_recipients.len(), 2);
    }
}
