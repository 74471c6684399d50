//! Transactional mail queueing.
//!
//! Core services enqueue messages; the queue crate owns the Redis-backed
//! implementation and the SMTP worker. Enqueue failures are logged by
//! callers and never fail the surrounding operation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use attenda_common::AppResult;

/// An email to be delivered asynchronously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text_body: String,
    /// HTML body (optional).
    pub html_body: Option<String>,
}

/// Trait for enqueueing transactional mail.
#[async_trait]
pub trait MailQueue: Send + Sync {
    /// Submit a message for asynchronous delivery.
    async fn enqueue(&self, message: EmailMessage) -> AppResult<()>;
}

/// Shared handle to the configured mail queue.
pub type MailService = Arc<dyn MailQueue>;

/// No-op queue for deployments without SMTP credentials and for tests.
#[derive(Debug, Clone, Default)]
pub struct NoOpMailQueue;

#[async_trait]
impl MailQueue for NoOpMailQueue {
    async fn enqueue(&self, message: EmailMessage) -> AppResult<()> {
        tracing::debug!(to = %message.to, subject = %message.subject, "Mail disabled, dropping message");
        Ok(())
    }
}
