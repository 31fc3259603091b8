//! Outbound ports the domain services depend on.
//!
//! Each port is an async trait implemented by an adapter in
//! `crate::outbound`; tests substitute mocks generated by `mockall`.

pub mod appointment_repository;
pub mod doctor_repository;
pub mod image_store;
pub mod mailer;
pub mod patient_repository;
pub mod payment_gateway;
pub mod session_store;
pub mod sms_sender;
pub mod verification_store;

pub use appointment_repository::{AppointmentRepository, AppointmentRepositoryError};
pub use doctor_repository::{
    DoctorProfileUpdate, DoctorRepository, DoctorRepositoryError, MoveOutcome, ReserveOutcome,
};
pub use image_store::{ImageStore, ImageStoreError};
pub use mailer::{EmailMessage, Mailer, MailerError};
pub use patient_repository::{PatientRepository, PatientRepositoryError};
pub use payment_gateway::{
    OrderRequest, OrderStatus, PaymentGateway, PaymentGatewayError, PaymentOrder,
};
pub use session_store::{Principal, SessionStore, SessionStoreError, SessionToken};
pub use sms_sender::{SmsError, SmsMessage, SmsSender};
pub use verification_store::{OtpEntry, OtpKey, VerificationStore, VerificationStoreError};

#[cfg(test)]
pub use appointment_repository::MockAppointmentRepository;
#[cfg(test)]
pub use doctor_repository::MockDoctorRepository;
#[cfg(test)]
pub use image_store::MockImageStore;
#[cfg(test)]
pub use mailer::MockMailer;
#[cfg(test)]
pub use patient_repository::MockPatientRepository;
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
#[cfg(test)]
pub use session_store::MockSessionStore;
#[cfg(test)]
pub use sms_sender::MockSmsSender;
#[cfg(test)]
pub use verification_store::MockVerificationStore;
