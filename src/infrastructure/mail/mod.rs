//! Mailer implementations

mod smtp;

pub use smtp::{SmtpMailer, SmtpMailerConfig};

use async_trait::async_trait;
use tracing::info;

use crate::application::notifications::{EmailMessage, MailError, Mailer};

/// Used when no SMTP server is configured: messages only go to the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "SMTP not configured, email not sent"
        );
        Ok(())
    }
}
