//! Port abstraction for appointment persistence adapters.

use async_trait::async_trait;

use crate::domain::appointment::{Appointment, AppointmentId};
use crate::domain::doctor::DoctorId;
use crate::domain::patient::PatientId;

/// Persistence errors raised by appointment repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppointmentRepositoryError {
    /// Repository connection could not be established.
    #[error("appointment repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("appointment repository query failed: {message}")]
    Query { message: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Store a freshly booked appointment.
    async fn insert(&self, appointment: &Appointment) -> Result<(), AppointmentRepositoryError>;

    /// Fetch an appointment by identifier.
    async fn find_by_id(
        &self,
        id: &AppointmentId,
    ) -> Result<Option<Appointment>, AppointmentRepositoryError>;

    /// Set the `cancelled` flag. Returns `false` when the appointment does
    /// not exist.
    async fn mark_cancelled(&self, id: &AppointmentId)
        -> Result<bool, AppointmentRepositoryError>;

    /// Set the `is_completed` flag. Returns `false` when the appointment does
    /// not exist.
    async fn mark_completed(&self, id: &AppointmentId)
        -> Result<bool, AppointmentRepositoryError>;

    /// Set the `payment` flag. Returns `false` when the appointment does not
    /// exist.
    async fn mark_paid(&self, id: &AppointmentId) -> Result<bool, AppointmentRepositoryError>;

    /// Appointments booked by a patient, oldest first.
    async fn list_for_patient(
        &self,
        patient_id: &PatientId,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError>;

    /// Appointments held with a doctor, oldest first.
    async fn list_for_doctor(
        &self,
        doctor_id: &DoctorId,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError>;

    /// Every appointment, oldest first.
    async fn list_all(&self) -> Result<Vec<Appointment>, AppointmentRepositoryError>;
}
