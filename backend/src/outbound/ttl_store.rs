//! In-memory TTL-keyed stores for verification codes and sessions.
//!
//! Expiry is evaluated lazily against the injected clock on every read, so
//! tests drive time forward without waiting. Expired entries are dropped on
//! access rather than swept in the background.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::Mutex;

use crate::domain::ports::session_store::{
    Principal, SessionStore, SessionStoreError, SessionToken,
};
use crate::domain::ports::verification_store::{
    OtpEntry, OtpKey, VerificationStore, VerificationStoreError,
};

fn deadline(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, String> {
    let delta = TimeDelta::from_std(ttl).map_err(|error| error.to_string())?;
    Ok(now + delta)
}

/// Verification-code store over process memory.
pub struct MemoryVerificationStore {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<OtpKey, (OtpEntry, DateTime<Utc>)>>,
    gates: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryVerificationStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl VerificationStore for MemoryVerificationStore {
    async fn put(
        &self,
        key: OtpKey,
        entry: OtpEntry,
        ttl: Duration,
    ) -> Result<(), VerificationStoreError> {
        let expires_at = deadline(self.clock.utc(), ttl)
            .map_err(|message| VerificationStoreError::Query { message })?;
        self.entries.lock().await.insert(key, (entry, expires_at));
        Ok(())
    }

    async fn get(&self, key: &OtpKey) -> Result<Option<OtpEntry>, VerificationStoreError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((entry, expires_at)) if *expires_at > self.clock.utc() => {
                Ok(Some(entry.clone()))
            }
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &OtpKey) -> Result<(), VerificationStoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn open_reset_gate(
        &self,
        subject: &str,
        ttl: Duration,
    ) -> Result<(), VerificationStoreError> {
        let expires_at = deadline(self.clock.utc(), ttl)
            .map_err(|message| VerificationStoreError::Query { message })?;
        self.gates
            .lock()
            .await
            .insert(subject.to_owned(), expires_at);
        Ok(())
    }

    async fn take_reset_gate(&self, subject: &str) -> Result<bool, VerificationStoreError> {
        let expires_at = self.gates.lock().await.remove(subject);
        Ok(expires_at.is_some_and(|deadline| deadline > self.clock.utc()))
    }
}

/// Session lifetime before clients must log in again.
const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const TOKEN_LENGTH: usize = 48;

/// Opaque-token session store over process memory.
pub struct MemorySessionStore {
    clock: Arc<dyn Clock>,
    tokens: Mutex<HashMap<String, (Principal, DateTime<Utc>)>>,
}

impl MemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tokens: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn issue(&self, principal: Principal) -> Result<SessionToken, SessionStoreError> {
        let raw: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        let expires_at = deadline(self.clock.utc(), SESSION_TTL)
            .map_err(|message| SessionStoreError::Query { message })?;
        self.tokens
            .lock()
            .await
            .insert(raw.clone(), (principal, expires_at));
        Ok(SessionToken::new(raw))
    }

    async fn resolve(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Principal>, SessionStoreError> {
        let mut tokens = self.tokens.lock().await;
        match tokens.get(token.as_str()) {
            Some((principal, expires_at)) if *expires_at > self.clock.utc() => {
                Ok(Some(*principal))
            }
            Some(_) => {
                tokens.remove(token.as_str());
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::otp::{OtpChannel, OtpPurpose};
    use crate::domain::PatientId;
    use std::sync::Mutex as StdMutex;

    struct MutableClock(StdMutex<DateTime<Utc>>);

    impl MutableClock {
        fn new(now: DateTime<Utc>) -> Self {
            Self(StdMutex::new(now))
        }

        fn advance_seconds(&self, seconds: i64) {
            let mut guard = self.0.lock().expect("clock mutex");
            *guard += TimeDelta::seconds(seconds);
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<chrono::Local> {
            self.utc().with_timezone(&chrono::Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.0.lock().expect("clock mutex")
        }
    }

    fn key() -> OtpKey {
        OtpKey {
            subject: "subject-1".to_owned(),
            purpose: OtpPurpose::Registration,
            channel: OtpChannel::Email,
        }
    }

    fn entry(code: &str, issued_at: DateTime<Utc>) -> OtpEntry {
        OtpEntry {
            code: code.to_owned(),
            issued_at,
        }
    }

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let store = MemoryVerificationStore::new(Arc::clone(&clock) as Arc<dyn Clock>);
        store
            .put(key(), entry("123456", clock.utc()), Duration::from_secs(600))
            .await
            .expect("store entry");

        clock.advance_seconds(599);
        assert!(store.get(&key()).await.expect("get").is_some());

        clock.advance_seconds(2);
        assert!(store.get(&key()).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn put_replaces_a_prior_entry() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let store = MemoryVerificationStore::new(Arc::clone(&clock) as Arc<dyn Clock>);
        store
            .put(key(), entry("111111", clock.utc()), Duration::from_secs(600))
            .await
            .expect("first put");
        store
            .put(key(), entry("222222", clock.utc()), Duration::from_secs(600))
            .await
            .expect("second put");

        let live = store.get(&key()).await.expect("get").expect("entry live");
        assert_eq!(live.code, "222222");
    }

    #[tokio::test]
    async fn reset_gate_is_single_use() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let store = MemoryVerificationStore::new(Arc::clone(&clock) as Arc<dyn Clock>);
        store
            .open_reset_gate("subject-1", Duration::from_secs(600))
            .await
            .expect("open gate");

        assert!(store.take_reset_gate("subject-1").await.expect("take"));
        assert!(!store.take_reset_gate("subject-1").await.expect("retake"));
    }

    #[tokio::test]
    async fn expired_reset_gate_does_not_open() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let store = MemoryVerificationStore::new(Arc::clone(&clock) as Arc<dyn Clock>);
        store
            .open_reset_gate("subject-1", Duration::from_secs(600))
            .await
            .expect("open gate");

        clock.advance_seconds(601);
        assert!(!store.take_reset_gate("subject-1").await.expect("take"));
    }

    #[tokio::test]
    async fn sessions_resolve_until_expiry() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let store = MemorySessionStore::new(Arc::clone(&clock) as Arc<dyn Clock>);
        let principal = Principal::Patient(PatientId::random());
        let token = store.issue(principal).await.expect("issue token");
        assert_eq!(token.as_str().len(), TOKEN_LENGTH);

        assert_eq!(
            store.resolve(&token).await.expect("resolve"),
            Some(principal)
        );

        clock.advance_seconds(24 * 60 * 60 + 1);
        assert_eq!(store.resolve(&token).await.expect("resolve"), None);
    }

    #[tokio::test]
    async fn unknown_tokens_resolve_to_none() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let store = MemorySessionStore::new(clock as Arc<dyn Clock>);
        let resolved = store
            .resolve(&SessionToken::new("not-a-token"))
            .await
            .expect("resolve");
        assert_eq!(resolved, None);
    }
}
