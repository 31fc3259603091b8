//! Domain model and services for the booking platform.
//!
//! Purpose: keep all business rules transport and storage agnostic. HTTP
//! handlers call the services here; the services reach outward only through
//! the trait ports in [`ports`], which the `outbound` adapters implement.
//!
//! Public surface:
//! - Entities: [`Patient`], [`Doctor`], [`Appointment`] and their id and
//!   snapshot types.
//! - Services: [`AccountService`], [`SchedulingService`], [`PaymentService`],
//!   [`DirectoryService`], [`OtpLedger`], [`NotificationDispatcher`].
//! - Errors: [`DomainError`] with its stable [`ErrorCode`] taxonomy.

pub mod accounts;
pub mod appointment;
pub mod contact;
pub mod directory;
pub mod doctor;
pub mod error;
pub mod notify;
pub mod otp;
pub mod patient;
pub mod payments;
pub mod ports;
pub mod scheduling;

pub use self::accounts::{AccountService, AdminCredentials, NewPatient, ProfileUpdate};
pub use self::appointment::{Appointment, AppointmentId};
pub use self::contact::{ContactError, EmailAddress, PhoneNumber};
pub use self::directory::{DirectoryService, NewDoctor};
pub use self::doctor::{Doctor, DoctorId, DoctorSnapshot, SlotDate, SlotLedger, SlotTime};
pub use self::error::{DomainError, DomainResult, ErrorCode};
pub use self::notify::{AppointmentEvent, NotificationDispatcher};
pub use self::otp::{OtpChannel, OtpLedger, OtpPurpose, OtpRecipient};
pub use self::patient::{Address, Patient, PatientId, PatientSnapshot};
pub use self::payments::PaymentService;
pub use self::scheduling::{Actor, AdminDashboard, DoctorDashboard, SchedulingService};
