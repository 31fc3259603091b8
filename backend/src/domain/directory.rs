//! Doctor directory: onboarding, the public roster, availability, and the
//! doctor's own slot-blocking tools.

use std::sync::Arc;

use bcrypt::{hash, DEFAULT_COST};
use mockable::Clock;
use url::Url;

use super::accounts::ensure_strong_password;
use super::contact::EmailAddress;
use super::doctor::{Doctor, DoctorId, SlotDate, SlotLedger, SlotTime};
use super::error::{DomainError, DomainResult};
use super::patient::Address;
use super::ports::{
    DoctorProfileUpdate, DoctorRepository, DoctorRepositoryError, ImageStore, MoveOutcome,
    ReserveOutcome,
};

/// Input for onboarding a doctor.
#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Remote image to ingest into hosting.
    pub image_source: Url,
    pub speciality: String,
    pub speciality_list: Vec<String>,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: u64,
    pub address: Address,
    pub languages: Vec<String>,
}

/// Manages the doctor roster.
pub struct DirectoryService {
    doctors: Arc<dyn DoctorRepository>,
    images: Arc<dyn ImageStore>,
    clock: Arc<dyn Clock>,
}

impl DirectoryService {
    pub fn new(
        doctors: Arc<dyn DoctorRepository>,
        images: Arc<dyn ImageStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            doctors,
            images,
            clock,
        }
    }

    /// Onboard a doctor: validate, hash the password, host the profile
    /// image, and insert the document.
    pub async fn add_doctor(&self, input: NewDoctor) -> DomainResult<DoctorId> {
        if input.name.trim().is_empty()
            || input.email.trim().is_empty()
            || input.password.is_empty()
            || input.speciality.trim().is_empty()
            || input.degree.trim().is_empty()
            || input.about.trim().is_empty()
        {
            return Err(DomainError::invalid_request("Missing details"));
        }
        let email = EmailAddress::parse(&input.email)
            .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        ensure_strong_password(&input.password)?;
        if self
            .doctors
            .find_by_email(&email)
            .await
            .map_err(repo_error)?
            .is_some()
        {
            return Err(DomainError::conflict("Doctor already exists"));
        }

        let password_hash = hash(&input.password, DEFAULT_COST).map_err(|error| {
            tracing::error!(%error, "password hashing failed");
            DomainError::internal("failed to process credentials")
        })?;
        let image = self
            .images
            .upload(&input.image_source)
            .await
            .map_err(|error| {
                tracing::warn!(%error, "doctor image upload failed");
                DomainError::upstream("failed to upload image")
            })?;

        let doctor = Doctor {
            id: DoctorId::random(),
            name: input.name.trim().to_owned(),
            email,
            password_hash,
            image: image.to_string(),
            speciality: input.speciality,
            speciality_list: input.speciality_list,
            degree: input.degree,
            experience: input.experience,
            about: input.about,
            fees: input.fees,
            address: input.address,
            languages: input.languages,
            available: true,
            slots_booked: SlotLedger::new(),
            created_at: self.clock.utc(),
        };
        self.doctors.insert(&doctor).await.map_err(repo_error)?;
        Ok(doctor.id)
    }

    /// The full roster. Callers strip credentials before exposure.
    pub async fn list(&self) -> DomainResult<Vec<Doctor>> {
        self.doctors.list().await.map_err(repo_error)
    }

    /// Fetch one doctor.
    pub async fn profile(&self, doctor_id: &DoctorId) -> DomainResult<Doctor> {
        self.require_doctor(doctor_id).await
    }

    /// Apply a partial profile update.
    pub async fn update_profile(
        &self,
        doctor_id: &DoctorId,
        update: DoctorProfileUpdate,
    ) -> DomainResult<()> {
        let updated = self
            .doctors
            .update_profile(doctor_id, update)
            .await
            .map_err(repo_error)?;
        if !updated {
            return Err(DomainError::not_found("Doctor not found"));
        }
        Ok(())
    }

    /// Flip whether the doctor takes bookings; returns the new value.
    pub async fn toggle_availability(&self, doctor_id: &DoctorId) -> DomainResult<bool> {
        self.doctors
            .toggle_availability(doctor_id)
            .await
            .map_err(repo_error)?
            .ok_or_else(|| DomainError::not_found("Doctor not found"))
    }

    /// Block a time in the doctor's own ledger so patients cannot book it.
    pub async fn block_slot(
        &self,
        doctor_id: &DoctorId,
        date: &SlotDate,
        time: &SlotTime,
    ) -> DomainResult<()> {
        match self
            .doctors
            .reserve_slot(doctor_id, date, time)
            .await
            .map_err(repo_error)?
        {
            ReserveOutcome::Reserved => Ok(()),
            ReserveOutcome::UnknownDoctor => Err(DomainError::not_found("Doctor not found")),
            ReserveOutcome::DoctorUnavailable => {
                Err(DomainError::conflict("Doctor not available"))
            }
            ReserveOutcome::SlotTaken => Err(DomainError::conflict("Slot not available")),
        }
    }

    /// Move a blocked time to another time on the same date.
    pub async fn move_slot(
        &self,
        doctor_id: &DoctorId,
        date: &SlotDate,
        from: &SlotTime,
        to: &SlotTime,
    ) -> DomainResult<()> {
        match self
            .doctors
            .move_slot(doctor_id, date, from, to)
            .await
            .map_err(repo_error)?
        {
            MoveOutcome::Moved => Ok(()),
            MoveOutcome::UnknownDoctor => Err(DomainError::not_found("Doctor not found")),
            MoveOutcome::SourceMissing => Err(DomainError::conflict("Slot not reserved")),
            MoveOutcome::TargetTaken => Err(DomainError::conflict("Slot not available")),
        }
    }

    /// The doctor's booked-slot ledger.
    pub async fn slots(&self, doctor_id: &DoctorId) -> DomainResult<SlotLedger> {
        Ok(self.require_doctor(doctor_id).await?.slots_booked)
    }

    async fn require_doctor(&self, doctor_id: &DoctorId) -> DomainResult<Doctor> {
        self.doctors
            .find_by_id(doctor_id)
            .await
            .map_err(repo_error)?
            .ok_or_else(|| DomainError::not_found("Doctor not found"))
    }
}

fn repo_error(error: DoctorRepositoryError) -> DomainError {
    tracing::error!(%error, "doctor repository failure");
    DomainError::internal("storage unavailable")
}
