use super::{Email, MailError, Mailer};
use async_trait::async_trait;
use tracing::info;

/// A mailer that only logs. Used when no mail API is configured.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        info!(to = %email.to, subject = %email.subject, "Mail API not configured; email not sent.");
        Ok(())
    }
}
