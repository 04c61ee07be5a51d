// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP mail transport backed by lettre.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use shipwright_config::MailConfig;
use shipwright_core::{MailError, Mailer, ShipwrightError};
use tracing::{debug, info};

/// Production [`Mailer`] sending over SMTP with TLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the transport from configuration. Requires `smtp_host` to be
    /// set; credentials are optional for unauthenticated relays.
    pub fn from_config(config: &MailConfig) -> Result<Self, ShipwrightError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| ShipwrightError::Config("mail.smtp_host is not set".to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| ShipwrightError::Config(format!("invalid SMTP relay {host}: {e}")))?
            .port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| {
                ShipwrightError::Config(format!(
                    "invalid mail.from_address {}: {e}",
                    config.from_address
                ))
            })?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, MailError> {
        // A recipient that cannot be parsed can never be delivered to.
        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| MailError::Permanent(format!("invalid recipient {recipient}: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| MailError::Permanent(format!("message build failed: {e}")))?;

        match self.transport.send(message).await {
            Ok(response) => {
                let message_id = response
                    .message()
                    .collect::<Vec<&str>>()
                    .join(" ");
                debug!(recipient, "mail accepted by relay");
                Ok(message_id)
            }
            Err(e) if e.is_permanent() => Err(MailError::Permanent(e.to_string())),
            Err(e) => Err(MailError::Transient(e.to_string())),
        }
    }
}

/// Fallback [`Mailer`] used when no SMTP relay is configured: messages
/// are logged and reported as delivered, so the queue keeps functioning
/// in development setups.
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        _body: &str,
    ) -> Result<String, MailError> {
        info!(recipient, subject, "mail delivery disabled, message logged");
        Ok("logged".to_string())
    }
}
