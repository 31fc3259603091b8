//! Keyed TTL store backing the OTP ledger and the password-reset gate.
//!
//! The original design kept these in ambient process-global maps; here the
//! store is an injected port so deployments can swap the adapter and tests
//! can drive expiry deterministically. Entries are volatile by contract:
//! losing them on restart only invalidates short-lived codes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::otp::{OtpChannel, OtpPurpose};

/// Errors raised by verification store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationStoreError {
    /// Store backend unreachable.
    #[error("verification store connection failed: {message}")]
    Connection { message: String },
    /// Read or write failed during execution.
    #[error("verification store operation failed: {message}")]
    Query { message: String },
}

/// Key of a pending one-time code: at most one live entry per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OtpKey {
    /// Identifier of the party proving contact ownership (patient id,
    /// doctor id, or the fixed admin subject).
    pub subject: String,
    pub purpose: OtpPurpose,
    pub channel: OtpChannel,
}

/// A pending one-time code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    /// Six-digit numeric code, compared by string equality.
    pub code: String,
    pub issued_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Store an entry under `key` with the given time-to-live, replacing any
    /// unconsumed prior entry for the same key.
    async fn put(
        &self,
        key: OtpKey,
        entry: OtpEntry,
        ttl: Duration,
    ) -> Result<(), VerificationStoreError>;

    /// Fetch the live entry for `key`. Expired entries behave as absent.
    async fn get(&self, key: &OtpKey) -> Result<Option<OtpEntry>, VerificationStoreError>;

    /// Remove the entry for `key`, if any.
    async fn remove(&self, key: &OtpKey) -> Result<(), VerificationStoreError>;

    /// Record that `subject` passed reset-OTP verification and may set a new
    /// password within `ttl`.
    async fn open_reset_gate(
        &self,
        subject: &str,
        ttl: Duration,
    ) -> Result<(), VerificationStoreError>;

    /// Consume the reset gate for `subject`. Returns `true` when a live gate
    /// existed; the gate is removed either way.
    async fn take_reset_gate(&self, subject: &str) -> Result<bool, VerificationStoreError>;
}
