//! SMTP delivery via lettre

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::application::notifications::{EmailMessage, MailError, Mailer};

#[derive(Debug, Clone)]
pub struct SmtpMailerConfig {
    pub host: String,
    pub port: u16,
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// STARTTLS relay. The transport is built once and reused.
pub struct SmtpMailer {
    from_address: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: SmtpMailerConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port);

        if let (Some(user), Some(pass)) = (config.username, config.password) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        Ok(Self {
            from_address: config.from_address,
            transport: builder.build(),
        })
    }
}

fn build_message(from: &str, message: EmailMessage) -> Result<Message, MailError> {
    let from = from
        .parse()
        .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;
    let to = message
        .to
        .parse()
        .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(message.body)
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let to = message.to.clone();
        let email = build_message(&self.from_address, message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        info!(to = %to, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_recipient_is_an_address_error() {
        let err = build_message(
            "noreply@campus.edu",
            EmailMessage {
                to: "not-an-email".into(),
                subject: "s".into(),
                body: "b".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, MailError::Address(_)));
    }

    #[test]
    fn valid_message_builds() {
        assert!(build_message(
            "noreply@campus.edu",
            EmailMessage {
                to: "admin@campus.edu".into(),
                subject: "Backup".into(),
                body: "done".into(),
            },
        )
        .is_ok());
    }
}
