//! Appointment entity: the booked slot plus denormalized party snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::doctor::{DoctorId, DoctorSnapshot, SlotDate, SlotTime};
use super::patient::{PatientId, PatientSnapshot};

/// Appointment identifier. Doubles as the payment-order receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(Uuid);

impl AppointmentId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AppointmentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A booked appointment.
///
/// ## Invariants
/// - The (doctor, date, time) triple was reserved in the doctor's slot
///   ledger when this record was created; cancellation releases exactly that
///   reservation.
/// - `cancelled` and `is_completed` are terminal and mutually exclusive;
///   `payment` moves independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    /// Patient fields frozen at booking time.
    pub patient_data: PatientSnapshot,
    /// Doctor fields frozen at booking time.
    pub doctor_data: DoctorSnapshot,
    pub slot_date: SlotDate,
    pub slot_time: SlotTime,
    /// Fee owed, in whole currency units.
    pub amount: u64,
    pub booked_at: DateTime<Utc>,
    pub cancelled: bool,
    pub is_completed: bool,
    pub payment: bool,
}

impl Appointment {
    /// Create a freshly booked appointment.
    pub fn book(
        patient: PatientSnapshot,
        doctor: DoctorSnapshot,
        slot_date: SlotDate,
        slot_time: SlotTime,
        booked_at: DateTime<Utc>,
    ) -> Self {
        let amount = doctor.fees;
        Self {
            id: AppointmentId::random(),
            patient_id: patient.id,
            doctor_id: doctor.id,
            patient_data: patient,
            doctor_data: doctor,
            slot_date,
            slot_time,
            amount,
            booked_at,
            cancelled: false,
            is_completed: false,
            payment: false,
        }
    }
}
