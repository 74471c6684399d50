//! Email delivery job.

use serde::{Deserialize, Serialize};

use attenda_core::EmailMessage;

/// Job to deliver one email via SMTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailJob {
    /// Recipient address.
    pub to: String,

    /// Subject line.
    pub subject: String,

    /// Plain text body.
    pub text_body: String,

    /// HTML body (optional).
    pub html_body: Option<String>,
}

impl From<EmailMessage> for EmailJob {
    fn from(message: EmailMessage) -> Self {
        Self {
            to: message.to,
            subject: message.subject,
            text_body: message.text_body,
            html_body: message.html_body,
        }
    }
}
