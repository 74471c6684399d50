//! Redis-backed mail queue implementation.
//!
//! This module provides a Redis-based implementation of the `MailQueue`
//! trait that queues jobs for the apalis email worker to process.

use async_trait::async_trait;

use attenda_common::{AppError, AppResult};
use attenda_core::{EmailMessage, MailQueue};

use crate::jobs::EmailJob;

/// Redis-backed mail queue.
#[derive(Clone)]
pub struct RedisMailQueue {
    /// Redis storage for the job queue (apalis-redis).
    storage: apalis_redis::RedisStorage<EmailJob>,
}

impl RedisMailQueue {
    /// Create a new Redis mail queue.
    #[must_use]
    pub const fn new(storage: apalis_redis::RedisStorage<EmailJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl MailQueue for RedisMailQueue {
    async fn enqueue(&self, message: EmailMessage) -> AppResult<()> {
        use apalis::prelude::*;

        let job = EmailJob::from(message);
        let to = job.to.clone();

        self.storage
            .clone()
            .push(job)
            .await
            .map_err(|e| AppError::Queue(format!("Failed to queue email job: {e}")))?;

        tracing::debug!(to = %to, "Queued email job");

        Ok(())
    }
}
