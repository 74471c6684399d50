//! Email worker.

use apalis::prelude::*;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{error, info};

use attenda_common::config::SmtpConfig;

use crate::jobs::EmailJob;

/// Context for the email worker.
#[derive(Clone)]
pub struct MailContext {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl MailContext {
    /// Build a mail context from SMTP configuration. `None` when the
    /// config carries no relay host or sender address.
    pub fn from_config(config: &SmtpConfig) -> Result<Option<Self>, lettre::transport::smtp::Error> {
        let (Some(host), Some(from)) = (config.host.as_deref(), config.from.clone()) else {
            return Ok(None);
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Some(Self {
            transport: builder.build(),
            from,
        }))
    }
}

/// Worker function for delivering queued email.
///
/// # Errors
/// Returns an error if the message cannot be built or the relay rejects it,
/// letting apalis apply its retry policy.
pub async fn email_worker(job: EmailJob, ctx: Data<MailContext>) -> Result<(), Error> {
    info!(to = %job.to, subject = %job.subject, "Delivering email");

    match deliver_email(&job, &ctx).await {
        Ok(()) => {
            info!(to = %job.to, "Email delivered successfully");
            Ok(())
        }
        Err(e) => {
            error!(to = %job.to, error = %e, "Failed to deliver email");
            Err(Error::Failed(e.into()))
        }
    }
}

async fn deliver_email(
    job: &EmailJob,
    ctx: &MailContext,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let builder = Message::builder()
        .from(ctx.from.parse()?)
        .to(job.to.parse()?)
        .subject(&job.subject);

    let message = match &job.html_body {
        Some(html) => builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(job.text_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html.clone()),
                ),
        )?,
        None => builder.body(job.text_body.clone())?,
    };

    ctx.transport.send(message).await?;

    Ok(())
}
