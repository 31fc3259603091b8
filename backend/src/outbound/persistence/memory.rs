//! In-memory document store implementing the three repository ports.
//!
//! One `RwLock` guards all collections, so the conditional slot operations
//! (`reserve_slot`, `release_slot`, `move_slot`) execute as single critical
//! sections: two concurrent bookings of the same slot serialise on the lock
//! and exactly one observes the slot free.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::appointment::{Appointment, AppointmentId};
use crate::domain::contact::EmailAddress;
use crate::domain::doctor::{Doctor, DoctorId, SlotDate, SlotTime};
use crate::domain::patient::{Patient, PatientId};
use crate::domain::ports::{
    AppointmentRepository, AppointmentRepositoryError, DoctorProfileUpdate, DoctorRepository,
    DoctorRepositoryError, MoveOutcome, PatientRepository, PatientRepositoryError,
    ReserveOutcome,
};

#[derive(Default)]
struct Collections {
    patients: HashMap<PatientId, Patient>,
    doctors: HashMap<DoctorId, Doctor>,
    /// Insert order is booking order; listings rely on it.
    appointments: Vec<Appointment>,
}

/// All three repositories over a single in-process store.
#[derive(Default)]
pub struct MemoryDirectory {
    inner: RwLock<Collections>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientRepository for MemoryDirectory {
    async fn save(&self, patient: &Patient) -> Result<(), PatientRepositoryError> {
        self.inner
            .write()
            .await
            .patients
            .insert(patient.id, patient.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &PatientId,
    ) -> Result<Option<Patient>, PatientRepositoryError> {
        Ok(self.inner.read().await.patients.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Patient>, PatientRepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .patients
            .values()
            .find(|patient| patient.email == *email)
            .cloned())
    }

    async fn count(&self) -> Result<u64, PatientRepositoryError> {
        Ok(self.inner.read().await.patients.len() as u64)
    }
}

#[async_trait]
impl DoctorRepository for MemoryDirectory {
    async fn insert(&self, doctor: &Doctor) -> Result<(), DoctorRepositoryError> {
        self.inner
            .write()
            .await
            .doctors
            .insert(doctor.id, doctor.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &DoctorId) -> Result<Option<Doctor>, DoctorRepositoryError> {
        Ok(self.inner.read().await.doctors.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Doctor>, DoctorRepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .doctors
            .values()
            .find(|doctor| doctor.email == *email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Doctor>, DoctorRepositoryError> {
        let mut doctors: Vec<Doctor> =
            self.inner.read().await.doctors.values().cloned().collect();
        doctors.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(doctors)
    }

    async fn count(&self) -> Result<u64, DoctorRepositoryError> {
        Ok(self.inner.read().await.doctors.len() as u64)
    }

    async fn update_profile(
        &self,
        id: &DoctorId,
        update: DoctorProfileUpdate,
    ) -> Result<bool, DoctorRepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(doctor) = inner.doctors.get_mut(id) else {
            return Ok(false);
        };
        if let Some(fees) = update.fees {
            doctor.fees = fees;
        }
        if let Some(address) = update.address {
            doctor.address = address;
        }
        if let Some(about) = update.about {
            doctor.about = about;
        }
        if let Some(available) = update.available {
            doctor.available = available;
        }
        Ok(true)
    }

    async fn update_password(
        &self,
        id: &DoctorId,
        password_hash: &str,
    ) -> Result<bool, DoctorRepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(doctor) = inner.doctors.get_mut(id) else {
            return Ok(false);
        };
        doctor.password_hash = password_hash.to_owned();
        Ok(true)
    }

    async fn toggle_availability(
        &self,
        id: &DoctorId,
    ) -> Result<Option<bool>, DoctorRepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(doctor) = inner.doctors.get_mut(id) else {
            return Ok(None);
        };
        doctor.available = !doctor.available;
        Ok(Some(doctor.available))
    }

    async fn reserve_slot(
        &self,
        id: &DoctorId,
        date: &SlotDate,
        time: &SlotTime,
    ) -> Result<ReserveOutcome, DoctorRepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(doctor) = inner.doctors.get_mut(id) else {
            return Ok(ReserveOutcome::UnknownDoctor);
        };
        if !doctor.available {
            return Ok(ReserveOutcome::DoctorUnavailable);
        }
        if doctor.slots_booked.reserve(date.clone(), time.clone()) {
            Ok(ReserveOutcome::Reserved)
        } else {
            Ok(ReserveOutcome::SlotTaken)
        }
    }

    async fn release_slot(
        &self,
        id: &DoctorId,
        date: &SlotDate,
        time: &SlotTime,
    ) -> Result<(), DoctorRepositoryError> {
        let mut inner = self.inner.write().await;
        if let Some(doctor) = inner.doctors.get_mut(id) {
            doctor.slots_booked.release(date, time);
        }
        Ok(())
    }

    async fn move_slot(
        &self,
        id: &DoctorId,
        date: &SlotDate,
        from: &SlotTime,
        to: &SlotTime,
    ) -> Result<MoveOutcome, DoctorRepositoryError> {
        let mut inner = self.inner.write().await;
        let Some(doctor) = inner.doctors.get_mut(id) else {
            return Ok(MoveOutcome::UnknownDoctor);
        };
        if !doctor.slots_booked.is_booked(date, from) {
            return Ok(MoveOutcome::SourceMissing);
        }
        if doctor.slots_booked.is_booked(date, to) {
            return Ok(MoveOutcome::TargetTaken);
        }
        doctor.slots_booked.release(date, from);
        doctor.slots_booked.reserve(date.clone(), to.clone());
        Ok(MoveOutcome::Moved)
    }
}

#[async_trait]
impl AppointmentRepository for MemoryDirectory {
    async fn insert(&self, appointment: &Appointment) -> Result<(), AppointmentRepositoryError> {
        self.inner
            .write()
            .await
            .appointments
            .push(appointment.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &AppointmentId,
    ) -> Result<Option<Appointment>, AppointmentRepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .appointments
            .iter()
            .find(|appointment| appointment.id == *id)
            .cloned())
    }

    async fn mark_cancelled(
        &self,
        id: &AppointmentId,
    ) -> Result<bool, AppointmentRepositoryError> {
        self.set_flag(id, |appointment| appointment.cancelled = true)
            .await
    }

    async fn mark_completed(
        &self,
        id: &AppointmentId,
    ) -> Result<bool, AppointmentRepositoryError> {
        self.set_flag(id, |appointment| appointment.is_completed = true)
            .await
    }

    async fn mark_paid(&self, id: &AppointmentId) -> Result<bool, AppointmentRepositoryError> {
        self.set_flag(id, |appointment| appointment.payment = true)
            .await
    }

    async fn list_for_patient(
        &self,
        patient_id: &PatientId,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .appointments
            .iter()
            .filter(|appointment| appointment.patient_id == *patient_id)
            .cloned()
            .collect())
    }

    async fn list_for_doctor(
        &self,
        doctor_id: &DoctorId,
    ) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .appointments
            .iter()
            .filter(|appointment| appointment.doctor_id == *doctor_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Appointment>, AppointmentRepositoryError> {
        Ok(self.inner.read().await.appointments.clone())
    }
}

impl MemoryDirectory {
    async fn set_flag(
        &self,
        id: &AppointmentId,
        apply: impl FnOnce(&mut Appointment) + Send,
    ) -> Result<bool, AppointmentRepositoryError> {
        let mut inner = self.inner.write().await;
        match inner
            .appointments
            .iter_mut()
            .find(|appointment| appointment.id == *id)
        {
            Some(appointment) => {
                apply(appointment);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
