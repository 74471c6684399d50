//! Scheduled jobs for periodic background tasks.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between reminder sweeps (default: 1 hour).
    pub reminder_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reminder_interval: Duration::from_secs(3600),
        }
    }
}

/// Job executor trait for scheduled jobs.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Run one reminder sweep; returns the number of events reminded.
    async fn send_event_reminders(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Run the scheduler with the given configuration and executor.
pub async fn run_scheduler<E: JobExecutor + 'static>(config: SchedulerConfig, executor: Arc<E>) {
    let reminder_interval = config.reminder_interval;

    // Spawn reminder sweep task
    tokio::spawn(async move {
        let mut interval = interval(reminder_interval);
        loop {
            interval.tick().await;
            match executor.send_event_reminders().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Sent event reminders");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to send event reminders");
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.reminder_interval, Duration::from_secs(3600));
    }
}
