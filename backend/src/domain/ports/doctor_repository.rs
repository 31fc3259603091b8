//! Port abstraction for doctor persistence, including the atomic slot-ledger
//! operations.
//!
//! Slot reservation and release are single conditional updates against the
//! doctor document, never a read followed by a separate write, so two
//! concurrent bookings of the same (doctor, date, time) cannot both succeed.

use async_trait::async_trait;

use crate::domain::contact::EmailAddress;
use crate::domain::doctor::{Doctor, DoctorId, SlotDate, SlotTime};
use crate::domain::patient::Address;

/// Persistence errors raised by doctor repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DoctorRepositoryError {
    /// Repository connection could not be established.
    #[error("doctor repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("doctor repository query failed: {message}")]
    Query { message: String },
}

/// Outcome of an atomic slot reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The slot was appended to the ledger.
    Reserved,
    /// The doctor document does not exist.
    UnknownDoctor,
    /// The doctor is not taking bookings.
    DoctorUnavailable,
    /// The time was already present for that date.
    SlotTaken,
}

/// Outcome of an atomic slot move (release old, reserve new).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The time was moved; the old reservation no longer exists.
    Moved,
    /// The doctor document does not exist.
    UnknownDoctor,
    /// The source slot was not reserved.
    SourceMissing,
    /// The target slot was already reserved.
    TargetTaken,
}

/// Partial update of doctor profile fields. `None` leaves a field untouched.
/// The slot ledger is never written through this path.
#[derive(Debug, Clone, Default)]
pub struct DoctorProfileUpdate {
    pub fees: Option<u64>,
    pub address: Option<Address>,
    pub about: Option<String>,
    pub available: Option<bool>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DoctorRepository: Send + Sync {
    /// Insert a new doctor document.
    async fn insert(&self, doctor: &Doctor) -> Result<(), DoctorRepositoryError>;

    /// Fetch a doctor by identifier.
    async fn find_by_id(&self, id: &DoctorId) -> Result<Option<Doctor>, DoctorRepositoryError>;

    /// Fetch a doctor by normalised email address.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Doctor>, DoctorRepositoryError>;

    /// All doctor documents.
    async fn list(&self) -> Result<Vec<Doctor>, DoctorRepositoryError>;

    /// Number of doctors.
    async fn count(&self) -> Result<u64, DoctorRepositoryError>;

    /// Apply a partial profile update. Returns `false` when the doctor does
    /// not exist.
    async fn update_profile(
        &self,
        id: &DoctorId,
        update: DoctorProfileUpdate,
    ) -> Result<bool, DoctorRepositoryError>;

    /// Replace the stored password hash. Returns `false` when the doctor
    /// does not exist.
    async fn update_password(
        &self,
        id: &DoctorId,
        password_hash: &str,
    ) -> Result<bool, DoctorRepositoryError>;

    /// Flip the availability flag, returning the new value, or `None` when
    /// the doctor does not exist.
    async fn toggle_availability(
        &self,
        id: &DoctorId,
    ) -> Result<Option<bool>, DoctorRepositoryError>;

    /// Atomically reserve `time` on `date` if the doctor is available and the
    /// slot is free.
    async fn reserve_slot(
        &self,
        id: &DoctorId,
        date: &SlotDate,
        time: &SlotTime,
    ) -> Result<ReserveOutcome, DoctorRepositoryError>;

    /// Atomically release `time` on `date`. Releasing an absent slot is a
    /// no-op, not an error.
    async fn release_slot(
        &self,
        id: &DoctorId,
        date: &SlotDate,
        time: &SlotTime,
    ) -> Result<(), DoctorRepositoryError>;

    /// Atomically move a reservation from one time to another on the same
    /// date. Availability is not checked: doctors may rearrange their own
    /// ledger while paused.
    async fn move_slot(
        &self,
        id: &DoctorId,
        date: &SlotDate,
        from: &SlotTime,
        to: &SlotTime,
    ) -> Result<MoveOutcome, DoctorRepositoryError>;
}
