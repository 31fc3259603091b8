//! Port for the outbound SMS provider.

use async_trait::async_trait;

use crate::domain::contact::PhoneNumber;

/// Errors raised by SMS adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SmsError {
    /// The provider could not be reached.
    #[error("sms transport failed: {message}")]
    Transport { message: String },
    /// The provider refused the message.
    #[error("sms rejected by provider: {message}")]
    Rejected { message: String },
}

/// A text message ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    pub to: PhoneNumber,
    pub body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Dispatch one message.
    async fn send(&self, message: &SmsMessage) -> Result<(), SmsError>;
}
