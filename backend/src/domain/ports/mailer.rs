//! Port for the outbound email provider.

use async_trait::async_trait;

use crate::domain::contact::EmailAddress;

/// Errors raised by mail adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailerError {
    /// The provider could not be reached.
    #[error("mail transport failed: {message}")]
    Transport { message: String },
    /// The provider refused the message.
    #[error("mail rejected by provider: {message}")]
    Rejected { message: String },
}

/// A rendered email ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: EmailAddress,
    pub subject: String,
    pub html: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Dispatch one message. Best-effort: delivery beyond provider
    /// acceptance is not observable here.
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError>;
}
