//! Doctor entity, practice metadata, and the embedded slot ledger.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::contact::EmailAddress;
use super::patient::Address;

/// Doctor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorId(Uuid);

impl DoctorId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for DoctorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DoctorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Validation failures for slot date and time strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("slot dates and times must not be empty")]
pub struct SlotValueError;

/// Calendar date key of the slot ledger, e.g. `2025-01-10`.
///
/// Kept as an opaque trimmed string: the ledger only needs equality, and the
/// wire format matches what the booking UI sends.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotDate(String);

impl SlotDate {
    /// Parse a non-empty date key.
    pub fn parse(raw: &str) -> Result<Self, SlotValueError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SlotValueError);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The raw date key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SlotDate {
    type Error = SlotValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SlotDate> for String {
    fn from(value: SlotDate) -> Self {
        value.0
    }
}

impl std::fmt::Display for SlotDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time-of-day value within a ledger date, e.g. `10:00 AM`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(String);

impl SlotTime {
    /// Parse a non-empty time value.
    pub fn parse(raw: &str) -> Result<Self, SlotValueError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SlotValueError);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The raw time value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SlotTime {
    type Error = SlotValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.0
    }
}

impl std::fmt::Display for SlotTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-doctor record of which date/time combinations are already reserved.
///
/// ## Invariants
/// - A time appears at most once per date.
/// - A date with no reservations left is removed, so releasing the last slot
///   restores the ledger to its pre-booking state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotLedger(BTreeMap<SlotDate, Vec<SlotTime>>);

impl SlotLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the given date/time is already reserved.
    pub fn is_booked(&self, date: &SlotDate, time: &SlotTime) -> bool {
        self.0
            .get(date)
            .is_some_and(|times| times.contains(time))
    }

    /// Reserve a time on a date. Returns `false` without mutating when the
    /// time is already present.
    pub fn reserve(&mut self, date: SlotDate, time: SlotTime) -> bool {
        let times = self.0.entry(date).or_default();
        if times.contains(&time) {
            return false;
        }
        times.push(time);
        true
    }

    /// Release a time on a date. Removing an absent slot is a no-op.
    pub fn release(&mut self, date: &SlotDate, time: &SlotTime) {
        if let Some(times) = self.0.get_mut(date) {
            times.retain(|t| t != time);
            if times.is_empty() {
                self.0.remove(date);
            }
        }
    }

    /// Booked times for a date, in reservation order.
    pub fn times_for(&self, date: &SlotDate) -> &[SlotTime] {
        self.0.get(date).map_or(&[], Vec::as_slice)
    }

    /// True when no date holds a reservation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over dates and their booked times.
    pub fn iter(&self) -> impl Iterator<Item = (&SlotDate, &[SlotTime])> {
        self.0.iter().map(|(date, times)| (date, times.as_slice()))
    }
}

/// A doctor on the platform.
#[derive(Debug, Clone)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub email: EmailAddress,
    /// bcrypt hash of the login password.
    pub password_hash: String,
    /// Hosted profile image URL.
    pub image: String,
    pub speciality: String,
    pub speciality_list: Vec<String>,
    pub degree: String,
    pub experience: String,
    pub about: String,
    /// Consultation fee in whole currency units.
    pub fees: u64,
    pub address: Address,
    pub languages: Vec<String>,
    /// Whether the doctor currently takes bookings.
    pub available: bool,
    pub slots_booked: SlotLedger,
    pub created_at: DateTime<Utc>,
}

/// Doctor fields copied into an appointment at booking time.
///
/// The slot ledger is deliberately excluded: appointments must not embed a
/// stale copy of another document's bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSnapshot {
    pub id: DoctorId,
    pub name: String,
    pub email: EmailAddress,
    pub image: String,
    pub speciality: String,
    pub degree: String,
    pub fees: u64,
    pub address: Address,
}

impl From<&Doctor> for DoctorSnapshot {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name.clone(),
            email: doctor.email.clone(),
            image: doctor.image.clone(),
            speciality: doctor.speciality.clone(),
            degree: doctor.degree.clone(),
            fees: doctor.fees,
            address: doctor.address.clone(),
        }
    }
}
