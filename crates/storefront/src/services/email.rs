//! Outgoing email.
//!
//! Messages are built here as plain values (recipient, subject, body) and
//! handed to a [`Mailer`]. Delivery is fire-and-forget: the request that
//! triggered the email never waits for SMTP and never fails because of it.

#[cfg(any(test, feature = "test-support"))]
use std::sync::{Arc, Mutex};

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// Longest accepted contact-form name.
pub const CONTACT_NAME_MAX: usize = 100;

/// Longest accepted contact-form message.
pub const CONTACT_MESSAGE_MAX: usize = 600;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// A message ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Greeting sent after signup.
#[must_use]
pub fn welcome_email(to: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_owned(),
        subject: "Welcome to BookTime".to_owned(),
        body: "Welcome to BookTime! We're glad to have you with us.".to_owned(),
    }
}

/// Contact-form submission forwarded to customer service.
///
/// Returns `None` when the name or message is empty or too long.
#[must_use]
pub fn contact_email(customer_service: &str, name: &str, message: &str) -> Option<OutgoingEmail> {
    let name = name.trim();
    if name.is_empty()
        || message.trim().is_empty()
        || name.chars().count() > CONTACT_NAME_MAX
        || message.chars().count() > CONTACT_MESSAGE_MAX
    {
        return None;
    }

    Some(OutgoingEmail {
        to: customer_service.to_owned(),
        subject: "Site message".to_owned(),
        body: format!("From: {name}\n{message}"),
    })
}

/// Where outgoing email goes.
#[derive(Clone)]
pub enum Mailer {
    /// Deliver over SMTP.
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from_address: String,
    },
    /// Write the message to the log only.
    Log,
    /// Keep messages in memory so tests can inspect them.
    #[cfg(any(test, feature = "test-support"))]
    Outbox(Arc<Mutex<Vec<OutgoingEmail>>>),
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Smtp { from_address, .. } => f
                .debug_struct("Smtp")
                .field("from_address", from_address)
                .finish_non_exhaustive(),
            Self::Log => f.write_str("Log"),
            #[cfg(any(test, feature = "test-support"))]
            Self::Outbox(_) => f.write_str("Outbox"),
        }
    }
}

impl Mailer {
    /// Build the mailer for `config`: SMTP when a host is configured,
    /// otherwise log-only.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be set up.
    pub fn from_config(config: &EmailConfig) -> Result<Self, SmtpError> {
        let Some(smtp) = &config.smtp else {
            tracing::warn!("SMTP_HOST not set, outgoing email will only be logged");
            return Ok(Self::Log);
        };

        let credentials = Credentials::new(
            smtp.username.clone(),
            smtp.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
            .port(smtp.port)
            .credentials(credentials)
            .build();

        Ok(Self::Smtp {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    /// An in-memory mailer and a handle to its outbox.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn outbox() -> (Self, Arc<Mutex<Vec<OutgoingEmail>>>) {
        let outbox = Arc::new(Mutex::new(Vec::new()));
        (Self::Outbox(Arc::clone(&outbox)), outbox)
    }

    /// Queue `email` for delivery without waiting for it.
    ///
    /// SMTP failures are logged and otherwise ignored.
    pub fn send(&self, email: OutgoingEmail) {
        match self {
            Self::Smtp {
                transport,
                from_address,
            } => {
                let transport = transport.clone();
                let from_address = from_address.clone();
                tokio::spawn(async move {
                    if let Err(e) = deliver(&transport, &from_address, &email).await {
                        tracing::error!(to = %email.to, subject = %email.subject, error = %e, "Failed to send email");
                    }
                });
            }
            Self::Log => {
                tracing::info!(to = %email.to, subject = %email.subject, body = %email.body, "Email (not sent)");
            }
            #[cfg(any(test, feature = "test-support"))]
            Self::Outbox(outbox) => match outbox.lock() {
                Ok(mut sent) => sent.push(email),
                Err(_) => tracing::error!("Email outbox lock poisoned"),
            },
        }
    }
}

async fn deliver(
    transport: &AsyncSmtpTransport<Tokio1Executor>,
    from_address: &str,
    email: &OutgoingEmail,
) -> Result<(), EmailError> {
    let message = Message::builder()
        .from(
            from_address
                .parse()
                .map_err(|_| EmailError::InvalidAddress(from_address.to_string()))?,
        )
        .to(email
            .to
            .parse()
            .map_err(|_| EmailError::InvalidAddress(email.to.clone()))?)
        .subject(&email.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())?;

    transport.send(message).await?;

    tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_email_format() {
        let email = contact_email("cs@booktime.domain", "Ada", "Where is my book?").unwrap();
        assert_eq!(email.to, "cs@booktime.domain");
        assert_eq!(email.subject, "Site message");
        assert_eq!(email.body, "From: Ada\nWhere is my book?");
    }

    #[test]
    fn test_contact_email_limits() {
        let long_name = "n".repeat(CONTACT_NAME_MAX + 1);
        let long_message = "m".repeat(CONTACT_MESSAGE_MAX + 1);
        assert!(contact_email("cs@booktime.domain", &long_name, "hi").is_none());
        assert!(contact_email("cs@booktime.domain", "Ada", &long_message).is_none());
        assert!(contact_email("cs@booktime.domain", "  ", "hi").is_none());
        assert!(contact_email("cs@booktime.domain", "Ada", &"m".repeat(CONTACT_MESSAGE_MAX)).is_some());
    }

    #[test]
    fn test_outbox_records_sent_mail() {
        let (mailer, outbox) = Mailer::outbox();
        mailer.send(welcome_email("reader@booktime.domain"));

        let sent = outbox.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Welcome to BookTime");
    }
}
