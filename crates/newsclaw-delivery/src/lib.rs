//! # NewsClaw Delivery
//!
//! Outbound email: the batched dispatcher (batching, pacing, rate-limit
//! retry, per-recipient reconciliation) and the transport adapters it drives
//! (Resend batch API, plain SMTP).

pub mod dispatcher;
pub mod resend;
pub mod smtp;

pub use dispatcher::BatchDispatcher;
pub use resend::ResendTransport;
pub use smtp::SmtpTransport;
