//! One-time-code issuance and verification.
//!
//! Codes are six decimal digits, live for ten minutes, and are consumed on
//! successful verification. A mismatch leaves the stored code in place so
//! the holder can retry until it expires.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use rand::Rng;

use super::contact::{EmailAddress, PhoneNumber};
use super::error::{DomainError, DomainResult};
use super::notify::NotificationDispatcher;
use super::ports::verification_store::{OtpEntry, OtpKey, VerificationStore};
use super::ports::VerificationStoreError;

/// Lifetime of an issued code.
pub const OTP_TTL: Duration = Duration::from_secs(10 * 60);

/// How long a verified reset OTP keeps the password-change window open.
const RESET_GATE_TTL: Duration = Duration::from_secs(10 * 60);

/// What the code proves when verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtpPurpose {
    /// Contact-ownership proof during patient registration.
    Registration,
    /// Second factor for doctor and admin logins.
    Login,
    /// Gate before a password reset.
    PasswordReset,
}

/// Delivery channel the code was sent over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtpChannel {
    Email,
    Sms,
}

/// Where to deliver a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpRecipient {
    Email(EmailAddress),
    Sms(PhoneNumber),
}

impl OtpRecipient {
    /// The channel this recipient is reached over.
    pub fn channel(&self) -> OtpChannel {
        match self {
            Self::Email(_) => OtpChannel::Email,
            Self::Sms(_) => OtpChannel::Sms,
        }
    }
}

/// Issues, delivers, and verifies one-time codes.
pub struct OtpLedger {
    store: Arc<dyn VerificationStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<NotificationDispatcher>,
}

impl OtpLedger {
    pub fn new(
        store: Arc<dyn VerificationStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
        }
    }

    /// Generate a fresh code for `(subject, purpose, recipient-channel)`,
    /// store it, and dispatch it. A prior unconsumed code for the same key
    /// is replaced.
    pub async fn issue(
        &self,
        subject: &str,
        purpose: OtpPurpose,
        recipient: &OtpRecipient,
    ) -> DomainResult<()> {
        let code = generate_code();
        let key = OtpKey {
            subject: subject.to_owned(),
            purpose,
            channel: recipient.channel(),
        };
        let entry = OtpEntry {
            code: code.clone(),
            issued_at: self.clock.utc(),
        };
        self.store
            .put(key, entry, OTP_TTL)
            .await
            .map_err(store_error)?;
        self.notifier.send_otp(recipient, purpose, &code).await
    }

    /// Verify a presented code. On success the stored code is consumed; on
    /// mismatch it stays put so the holder can retry.
    pub async fn verify(
        &self,
        subject: &str,
        purpose: OtpPurpose,
        channel: OtpChannel,
        presented: &str,
    ) -> DomainResult<()> {
        let key = OtpKey {
            subject: subject.to_owned(),
            purpose,
            channel,
        };
        let entry = self
            .store
            .get(&key)
            .await
            .map_err(store_error)?
            .ok_or_else(|| DomainError::conflict("Invalid or expired OTP"))?;
        if entry.code != presented.trim() {
            return Err(DomainError::conflict("Invalid or expired OTP"));
        }
        self.store.remove(&key).await.map_err(store_error)?;
        Ok(())
    }

    /// Verify the registration pair: both the email and SMS codes must match
    /// before either is consumed, so a half-correct attempt stays retryable.
    pub async fn verify_registration(
        &self,
        subject: &str,
        email_code: &str,
        sms_code: &str,
    ) -> DomainResult<()> {
        let email_key = OtpKey {
            subject: subject.to_owned(),
            purpose: OtpPurpose::Registration,
            channel: OtpChannel::Email,
        };
        let sms_key = OtpKey {
            subject: subject.to_owned(),
            purpose: OtpPurpose::Registration,
            channel: OtpChannel::Sms,
        };
        let email_entry = self
            .store
            .get(&email_key)
            .await
            .map_err(store_error)?
            .ok_or_else(|| DomainError::conflict("Invalid or expired OTP"))?;
        let sms_entry = self
            .store
            .get(&sms_key)
            .await
            .map_err(store_error)?
            .ok_or_else(|| DomainError::conflict("Invalid or expired OTP"))?;
        if email_entry.code != email_code.trim() || sms_entry.code != sms_code.trim() {
            return Err(DomainError::conflict("Invalid or expired OTP"));
        }
        self.store.remove(&email_key).await.map_err(store_error)?;
        self.store.remove(&sms_key).await.map_err(store_error)?;
        Ok(())
    }

    /// Record that `subject` passed reset-OTP verification and may set a new
    /// password for a short window.
    pub async fn open_reset_gate(&self, subject: &str) -> DomainResult<()> {
        self.store
            .open_reset_gate(subject, RESET_GATE_TTL)
            .await
            .map_err(store_error)
    }

    /// Consume the reset gate. Fails when the subject never verified a reset
    /// OTP or the window expired.
    pub async fn consume_reset_gate(&self, subject: &str) -> DomainResult<()> {
        if self
            .store
            .take_reset_gate(subject)
            .await
            .map_err(store_error)?
        {
            Ok(())
        } else {
            Err(DomainError::unauthorized("OTP verification required"))
        }
    }
}

fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999_u32).to_string()
}

fn store_error(error: VerificationStoreError) -> DomainError {
    tracing::error!(%error, "verification store failure");
    DomainError::internal("verification store unavailable")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{MockMailer, MockSmsSender, MockVerificationStore};
    use chrono::{DateTime, Local, TimeZone, Utc};
    use mockall::predicate::eq;

    struct FixtureClock {
        now: DateTime<Utc>,
    }

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.now.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.now
        }
    }

    fn fixture_clock() -> Arc<dyn Clock> {
        Arc::new(FixtureClock {
            now: Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).single().expect("valid timestamp"),
        })
    }

    fn key(channel: OtpChannel) -> OtpKey {
        OtpKey {
            subject: "subject-1".to_owned(),
            purpose: OtpPurpose::Registration,
            channel,
        }
    }

    fn entry(code: &str) -> OtpEntry {
        OtpEntry {
            code: code.to_owned(),
            issued_at: Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).single().expect("valid timestamp"),
        }
    }

    fn ledger(store: MockVerificationStore) -> OtpLedger {
        let notifier = NotificationDispatcher::new(
            Arc::new(MockMailer::new()),
            Arc::new(MockSmsSender::new()),
        );
        OtpLedger::new(Arc::new(store), fixture_clock(), Arc::new(notifier))
    }

    #[tokio::test]
    async fn issue_stores_a_six_digit_code_before_dispatch() {
        let mut store = MockVerificationStore::new();
        store
            .expect_put()
            .withf(|key, entry, ttl| {
                key.channel == OtpChannel::Sms
                    && entry.code.len() == 6
                    && entry.code.chars().all(|c| c.is_ascii_digit())
                    && *ttl == OTP_TTL
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut sms = MockSmsSender::new();
        sms.expect_send().times(1).returning(|_| Ok(()));
        let notifier =
            NotificationDispatcher::new(Arc::new(MockMailer::new()), Arc::new(sms));
        let ledger = OtpLedger::new(Arc::new(store), fixture_clock(), Arc::new(notifier));

        let recipient = OtpRecipient::Sms(
            crate::domain::contact::PhoneNumber::parse("9876543210", "+91")
                .expect("valid phone"),
        );
        ledger
            .issue("subject-1", OtpPurpose::Registration, &recipient)
            .await
            .expect("code issued");
    }

    #[tokio::test]
    async fn verify_consumes_on_match() {
        let mut store = MockVerificationStore::new();
        store
            .expect_get()
            .with(eq(key(OtpChannel::Email)))
            .times(1)
            .returning(|_| Ok(Some(entry("123456"))));
        store
            .expect_remove()
            .with(eq(key(OtpChannel::Email)))
            .times(1)
            .returning(|_| Ok(()));

        ledger(store)
            .verify("subject-1", OtpPurpose::Registration, OtpChannel::Email, "123456")
            .await
            .expect("matching code verifies");
    }

    #[tokio::test]
    async fn verify_mismatch_is_retryable() {
        let mut store = MockVerificationStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some(entry("123456"))));
        store.expect_remove().times(0);

        let error = ledger(store)
            .verify("subject-1", OtpPurpose::Registration, OtpChannel::Email, "654321")
            .await
            .expect_err("wrong code rejected");
        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn expired_code_behaves_as_absent() {
        let mut store = MockVerificationStore::new();
        store.expect_get().times(1).returning(|_| Ok(None));

        let error = ledger(store)
            .verify("subject-1", OtpPurpose::Registration, OtpChannel::Email, "123456")
            .await
            .expect_err("expired code rejected");
        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn registration_pair_consumes_nothing_on_half_match() {
        let mut store = MockVerificationStore::new();
        store
            .expect_get()
            .with(eq(key(OtpChannel::Email)))
            .times(1)
            .returning(|_| Ok(Some(entry("111111"))));
        store
            .expect_get()
            .with(eq(key(OtpChannel::Sms)))
            .times(1)
            .returning(|_| Ok(Some(entry("222222"))));
        store.expect_remove().times(0);

        let error = ledger(store)
            .verify_registration("subject-1", "111111", "999999")
            .await
            .expect_err("sms code wrong");
        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn registration_pair_consumes_both_on_full_match() {
        let mut store = MockVerificationStore::new();
        store
            .expect_get()
            .with(eq(key(OtpChannel::Email)))
            .times(1)
            .returning(|_| Ok(Some(entry("111111"))));
        store
            .expect_get()
            .with(eq(key(OtpChannel::Sms)))
            .times(1)
            .returning(|_| Ok(Some(entry("222222"))));
        store
            .expect_remove()
            .with(eq(key(OtpChannel::Email)))
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_remove()
            .with(eq(key(OtpChannel::Sms)))
            .times(1)
            .returning(|_| Ok(()));

        ledger(store)
            .verify_registration("subject-1", "111111", "222222")
            .await
            .expect("both codes verify");
    }

    #[tokio::test]
    async fn reset_gate_must_be_open_to_consume() {
        let mut store = MockVerificationStore::new();
        store
            .expect_take_reset_gate()
            .with(eq("subject-1"))
            .times(1)
            .returning(|_| Ok(false));

        let error = ledger(store)
            .consume_reset_gate("subject-1")
            .await
            .expect_err("gate never opened");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }
}
