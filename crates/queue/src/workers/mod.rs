//! Queue workers.

mod email;

pub use email::{MailContext, email_worker};
