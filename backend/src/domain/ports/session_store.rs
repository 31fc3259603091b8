//! Opaque session-token store.
//!
//! Tokens are random strings handed out after the OTP gate; token-issuance
//! mechanics beyond that are out of scope, so no claims are encoded — the
//! store maps token to principal with a TTL.

use async_trait::async_trait;

use crate::domain::doctor::DoctorId;
use crate::domain::patient::PatientId;

/// Errors raised by session store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionStoreError {
    /// Store backend unreachable.
    #[error("session store connection failed: {message}")]
    Connection { message: String },
    /// Read or write failed during execution.
    #[error("session store operation failed: {message}")]
    Query { message: String },
}

/// The authenticated party a session token resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Patient(PatientId),
    Doctor(DoctorId),
    Admin,
}

/// An opaque session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token string presented by a client.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Mint a fresh token for `principal`.
    async fn issue(&self, principal: Principal) -> Result<SessionToken, SessionStoreError>;

    /// Resolve a presented token. Expired or unknown tokens yield `None`.
    async fn resolve(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Principal>, SessionStoreError>;
}
