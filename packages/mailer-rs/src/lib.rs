//! Thin SMTP client for outbound notification mail.
//!
//! Wraps `lettre`'s async STARTTLS transport with credentials and a bounded
//! send timeout, and classifies failures into the three kinds the dispatch
//! layer cares about: authentication rejections, transport faults, and
//! timeouts.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::Error as SmtpError;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::debug;

/// Connection settings for the SMTP relay.
///
/// Credentials come from process configuration; nothing here is ever
/// hard-coded by this crate.
#[derive(Debug, Clone)]
pub struct MailerOptions {
    pub host: String,
    pub port: u16,
    pub login: String,
    pub password: String,
    /// Sender address placed in the `From` header.
    pub sender: String,
    /// Upper bound for a single send, socket level and overall.
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("smtp relay rejected credentials")]
    Auth(#[source] SmtpError),
    #[error("smtp transport failed")]
    Transport(#[source] SmtpError),
    #[error("smtp send timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not build message")]
    Message(#[from] lettre::error::Error),
    #[error("invalid mail address")]
    Address(#[from] lettre::address::AddressError),
}

impl MailError {
    /// Whether an immediate retry has a chance of succeeding.
    ///
    /// Auth rejections and permanent SMTP responses do not; timeouts and
    /// transient transport faults (connection reset, 4xx responses) do.
    pub fn is_transient(&self) -> bool {
        match self {
            MailError::Timeout(_) => true,
            MailError::Transport(err) => !err.is_permanent(),
            MailError::Auth(_) | MailError::Message(_) | MailError::Address(_) => false,
        }
    }
}

/// Authenticated SMTP relay client.
#[derive(Clone, Debug)]
pub struct MailerService {
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
    timeout: Duration,
}

impl MailerService {
    /// Build a STARTTLS relay client. No connection is opened until the
    /// first send.
    pub fn new(options: MailerOptions) -> Result<Self, MailError> {
        let sender = options.sender.parse::<Mailbox>()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&options.host)
            .map_err(MailError::Transport)?
            .port(options.port)
            .credentials(Credentials::new(options.login, options.password))
            .timeout(Some(options.timeout))
            .build();

        Ok(Self {
            sender,
            transport,
            timeout: options.timeout,
        })
    }

    /// Send a plain-text message.
    pub async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(to.parse::<Mailbox>()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        // The transport has its own socket timeout, but wrap the whole send
        // as well so DNS stalls and slow TLS handshakes are bounded too.
        match tokio::time::timeout(self.timeout, self.transport.send(message)).await {
            Err(_) => Err(MailError::Timeout(self.timeout)),
            Ok(Ok(response)) => {
                debug!(to = %to, code = %response.code(), "message accepted by relay");
                Ok(())
            }
            Ok(Err(err)) => Err(classify(err)),
        }
    }
}

/// Split SMTP failures into auth rejections and everything else.
fn classify(err: SmtpError) -> MailError {
    let auth_rejected = err
        .status()
        .map(|code| matches!(code.to_string().as_str(), "530" | "534" | "535"))
        .unwrap_or(false);

    if auth_rejected {
        MailError::Auth(err)
    } else {
        MailError::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(sender: &str) -> MailerOptions {
        MailerOptions {
            host: "smtp.example.org".to_string(),
            port: 587,
            login: "mailer@example.org".to_string(),
            password: "secret".to_string(),
            sender: sender.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn builds_without_connecting() {
        assert!(MailerService::new(options("Notifier <mailer@example.org>")).is_ok());
    }

    #[tokio::test]
    async fn rejects_malformed_sender() {
        let err = MailerService::new(options("not an address")).unwrap_err();
        assert!(matches!(err, MailError::Address(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn timeout_is_transient() {
        assert!(MailError::Timeout(Duration::from_secs(5)).is_transient());
    }
}
