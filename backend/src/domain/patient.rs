//! Patient entity and the denormalized snapshot embedded in appointments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::contact::{EmailAddress, PhoneNumber};

/// Patient identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(Uuid);

impl PatientId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PatientId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Two-line postal address, as captured by the profile form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: String,
    pub line2: String,
}

/// A registered patient.
///
/// Created unverified; both verification flags flip together once the email
/// and SMS codes are confirmed. Records are never hard-deleted.
#[derive(Debug, Clone)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    /// bcrypt hash of the login password.
    pub password_hash: String,
    pub is_email_verified: bool,
    pub is_mobile_verified: bool,
    pub address: Option<Address>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    /// Hosted profile image URL.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// Build a freshly registered, unverified patient.
    pub fn register(
        name: String,
        email: EmailAddress,
        phone: PhoneNumber,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PatientId::random(),
            name,
            email,
            phone,
            password_hash,
            is_email_verified: false,
            is_mobile_verified: false,
            address: None,
            dob: None,
            gender: None,
            image: None,
            created_at,
        }
    }

    /// True once both contact channels are verified.
    pub fn is_verified(&self) -> bool {
        self.is_email_verified && self.is_mobile_verified
    }
}

/// Patient fields copied into an appointment at booking time.
///
/// Later profile edits do not touch existing appointments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSnapshot {
    pub id: PatientId,
    pub name: String,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&Patient> for PatientSnapshot {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name.clone(),
            email: patient.email.clone(),
            phone: patient.phone.clone(),
            address: patient.address.clone(),
            dob: patient.dob.clone(),
            gender: patient.gender.clone(),
            image: patient.image.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Patient {
        Patient::register(
            "Asha Rao".to_owned(),
            EmailAddress::parse("a@x.com").expect("valid email"),
            PhoneNumber::parse("9876543210", "+91").expect("valid phone"),
            "$2b$12$fixture".to_owned(),
            Utc::now(),
        )
    }

    #[test]
    fn registration_starts_unverified() {
        let patient = sample();
        assert!(!patient.is_email_verified);
        assert!(!patient.is_mobile_verified);
        assert!(!patient.is_verified());
    }

    #[test]
    fn snapshot_copies_contact_fields() {
        let patient = sample();
        let snapshot = PatientSnapshot::from(&patient);
        assert_eq!(snapshot.id, patient.id);
        assert_eq!(snapshot.email, patient.email);
        assert_eq!(snapshot.phone, patient.phone);
    }
}
