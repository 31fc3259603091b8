//! Shared fixtures for HTTP handler tests.
//!
//! The harness wires real domain services over the in-memory adapters, with
//! the mail and SMS providers replaced by permissive mocks. Tests read
//! pending verification codes straight from the in-memory store, which is
//! what a deliverability probe would see in the real system.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use url::Url;

use crate::domain::otp::{OtpChannel, OtpPurpose};
use crate::domain::ports::verification_store::{OtpKey, VerificationStore};
use crate::domain::ports::{MockImageStore, MockMailer, MockPaymentGateway, MockSmsSender};
use crate::domain::{
    AccountService, AdminCredentials, DirectoryService, EmailAddress, NotificationDispatcher,
    OtpLedger, PaymentService, SchedulingService,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::persistence::MemoryDirectory;
use crate::outbound::ttl_store::{MemorySessionStore, MemoryVerificationStore};

pub const ADMIN_EMAIL: &str = "admin@clinic.test";
pub const ADMIN_PASSWORD: &str = "admin-password-123";

pub struct TestHarness {
    pub state: HttpState,
    pub directory: Arc<MemoryDirectory>,
    pub verification: Arc<MemoryVerificationStore>,
}

impl TestHarness {
    /// Harness with a payment gateway that rejects every call.
    pub fn new() -> Self {
        Self::with_gateway(MockPaymentGateway::new())
    }

    pub fn with_gateway(gateway: MockPaymentGateway) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        let directory = Arc::new(MemoryDirectory::new());
        let verification = Arc::new(MemoryVerificationStore::new(Arc::clone(&clock)));
        let sessions = Arc::new(MemorySessionStore::new(Arc::clone(&clock)));

        let mut mailer = MockMailer::new();
        mailer.expect_send().returning(|_| Ok(()));
        let mut sms = MockSmsSender::new();
        sms.expect_send().returning(|_| Ok(()));
        let notifier = Arc::new(NotificationDispatcher::new(Arc::new(mailer), Arc::new(sms)));

        let mut images = MockImageStore::new();
        images.expect_upload().returning(|source| {
            let hosted = format!("https://img.test/hosted{}", source.path());
            Ok(Url::parse(&hosted).expect("hosted url"))
        });

        let otp = Arc::new(OtpLedger::new(
            Arc::clone(&verification) as Arc<dyn VerificationStore>,
            Arc::clone(&clock),
            Arc::clone(&notifier),
        ));
        let images: Arc<MockImageStore> = Arc::new(images);

        let accounts = Arc::new(AccountService::new(
            directory.clone(),
            directory.clone(),
            sessions.clone(),
            Arc::clone(&otp),
            images.clone(),
            Arc::clone(&clock),
            AdminCredentials {
                email: EmailAddress::parse(ADMIN_EMAIL).expect("valid admin email"),
                password: ADMIN_PASSWORD.to_owned(),
            },
            "+91".to_owned(),
        ));
        let scheduling = Arc::new(SchedulingService::new(
            directory.clone(),
            directory.clone(),
            directory.clone(),
            Arc::clone(&notifier),
            Arc::clone(&clock),
        ));
        let payments = Arc::new(PaymentService::new(
            directory.clone(),
            Arc::new(gateway),
            "INR".to_owned(),
        ));
        let directory_service = Arc::new(DirectoryService::new(
            directory.clone(),
            images,
            Arc::clone(&clock),
        ));

        let state = HttpState::new(
            accounts,
            scheduling,
            payments,
            directory_service,
            sessions,
        );
        Self {
            state,
            directory,
            verification,
        }
    }

    /// Read the pending code for `(subject, purpose, channel)`.
    pub async fn otp_code(
        &self,
        subject: &str,
        purpose: OtpPurpose,
        channel: OtpChannel,
    ) -> String {
        self.verification
            .get(&OtpKey {
                subject: subject.to_owned(),
                purpose,
                channel,
            })
            .await
            .expect("verification store read")
            .expect("pending code present")
            .code
    }
}
