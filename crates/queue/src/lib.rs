//! Background job queue for attenda.
//!
//! This crate provides asynchronous job processing using Redis:
//!
//! - **Jobs**: transactional email delivery
//! - **Workers**: Concurrent job execution with Apalis
//! - **Scheduler**: Periodic tasks (the event reminder sweep)

pub mod jobs;
pub mod mail_impl;
pub mod scheduler;
pub mod workers;

pub use jobs::EmailJob;
pub use mail_impl::RedisMailQueue;
pub use scheduler::{JobExecutor, SchedulerConfig, run_scheduler};
pub use workers::{MailContext, email_worker};
