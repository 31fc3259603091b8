//! Response shapes exposing entities without their credential fields.
//!
//! Entities deliberately do not implement `Serialize`; every outward view
//! passes through one of these structs so a password hash can never ride
//! along by accident.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    Address, Doctor, DoctorId, EmailAddress, Patient, PatientId, PhoneNumber, SlotLedger,
};

/// Patient profile as returned to the patient themselves.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientView {
    pub id: PatientId,
    pub name: String,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub is_email_verified: bool,
    pub is_mobile_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Patient> for PatientView {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            email: patient.email,
            phone: patient.phone,
            is_email_verified: patient.is_email_verified,
            is_mobile_verified: patient.is_mobile_verified,
            address: patient.address,
            dob: patient.dob,
            gender: patient.gender,
            image: patient.image,
            created_at: patient.created_at,
        }
    }
}

/// Doctor document for the admin panel and the doctor's own profile page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorView {
    pub id: DoctorId,
    pub name: String,
    pub email: EmailAddress,
    pub image: String,
    pub speciality: String,
    pub speciality_list: Vec<String>,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: u64,
    pub address: Address,
    pub languages: Vec<String>,
    pub available: bool,
    pub slots_booked: SlotLedger,
    pub created_at: DateTime<Utc>,
}

impl From<Doctor> for DoctorView {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name,
            email: doctor.email,
            image: doctor.image,
            speciality: doctor.speciality,
            speciality_list: doctor.speciality_list,
            degree: doctor.degree,
            experience: doctor.experience,
            about: doctor.about,
            fees: doctor.fees,
            address: doctor.address,
            languages: doctor.languages,
            available: doctor.available,
            slots_booked: doctor.slots_booked,
            created_at: doctor.created_at,
        }
    }
}

/// Roster entry for the public doctor listing. No email, no credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicDoctorView {
    pub id: DoctorId,
    pub name: String,
    pub image: String,
    pub speciality: String,
    pub speciality_list: Vec<String>,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: u64,
    pub address: Address,
    pub languages: Vec<String>,
    pub available: bool,
    pub slots_booked: SlotLedger,
}

impl From<Doctor> for PublicDoctorView {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name,
            image: doctor.image,
            speciality: doctor.speciality,
            speciality_list: doctor.speciality_list,
            degree: doctor.degree,
            experience: doctor.experience,
            about: doctor.about,
            fees: doctor.fees,
            address: doctor.address,
            languages: doctor.languages,
            available: doctor.available,
            slots_booked: doctor.slots_booked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor() -> Doctor {
        Doctor {
            id: DoctorId::random(),
            name: "Dr. Mehta".to_owned(),
            email: EmailAddress::parse("mehta@clinic.test").expect("valid email"),
            password_hash: "$2b$12$fixture".to_owned(),
            image: "https://img.test/mehta.png".to_owned(),
            speciality: "Dermatologist".to_owned(),
            speciality_list: vec!["Dermatologist".to_owned()],
            degree: "MBBS".to_owned(),
            experience: "4 Years".to_owned(),
            about: "Skin specialist".to_owned(),
            fees: 500,
            address: Address {
                line1: "12 Clinic Road".to_owned(),
                line2: "Pune".to_owned(),
            },
            languages: vec!["English".to_owned()],
            available: true,
            slots_booked: SlotLedger::new(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn views_never_carry_credentials() {
        let admin = serde_json::to_value(DoctorView::from(doctor())).expect("serialize view");
        let public =
            serde_json::to_value(PublicDoctorView::from(doctor())).expect("serialize view");
        for value in [&admin, &public] {
            let keys: Vec<&String> = value.as_object().expect("object").keys().collect();
            assert!(keys.iter().all(|k| !k.contains("password")), "{keys:?}");
        }
        assert!(admin.get("email").is_some());
        assert!(public.get("email").is_none());
    }
}
