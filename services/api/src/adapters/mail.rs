//! services/api/src/adapters/mail.rs
//!
//! Adapters implementing the `MailService` port: SMTP delivery via `lettre`,
//! and a logging fallback for development when no SMTP host is configured.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use store_locator_core::ports::{Mail, MailService, PortError, PortResult};
use tracing::info;

use crate::config::SmtpConfig;

//=========================================================================================
// SMTP Adapter
//=========================================================================================

/// Sends mail through an SMTP relay using STARTTLS.
#[derive(Clone)]
pub struct SmtpMailAdapter {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailAdapter {
    /// Creates a new `SmtpMailAdapter`.
    pub fn new(config: &SmtpConfig) -> Result<Self, lettre::transport::smtp::Error> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl MailService for SmtpMailAdapter {
    async fn send(&self, mail: Mail) -> PortResult<()> {
        let message = Message::builder()
            .from(self.from_address.parse().map_err(|_| {
                PortError::Unexpected(format!("Invalid sender address: {}", self.from_address))
            })?)
            .to(mail
                .to
                .parse()
                .map_err(|_| PortError::Unexpected(format!("Invalid recipient: {}", mail.to)))?)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        info!(to = %mail.to, subject = %mail.subject, "Email sent successfully");
        Ok(())
    }
}

//=========================================================================================
// Logging Adapter
//=========================================================================================

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Clone, Default)]
pub struct LogMailAdapter;

#[async_trait]
impl MailService for LogMailAdapter {
    async fn send(&self, mail: Mail) -> PortResult<()> {
        info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "Mail not sent (no SMTP host configured)");
        Ok(())
    }
}
