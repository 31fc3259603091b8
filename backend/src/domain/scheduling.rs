//! Appointment workflow: booking against the slot ledger, cancellation,
//! lifecycle notifications, and the role dashboards.
//!
//! Booking reserves the slot atomically at the repository before any other
//! write; every later failure in the flow releases that reservation so an
//! aborted booking leaves no trace in the ledger.

use std::collections::HashSet;
use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;

use super::appointment::{Appointment, AppointmentId};
use super::doctor::{DoctorId, DoctorSnapshot, SlotDate, SlotTime};
use super::error::{DomainError, DomainResult};
use super::notify::{AppointmentEvent, NotificationDispatcher};
use super::patient::{PatientId, PatientSnapshot};
use super::ports::{
    AppointmentRepository, AppointmentRepositoryError, DoctorRepository, DoctorRepositoryError,
    PatientRepository, PatientRepositoryError, ReserveOutcome,
};

/// Who is asking for a cancellation or lifecycle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Patient(PatientId),
    Doctor(DoctorId),
    Admin,
}

/// Aggregate counts and the most recent bookings for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub doctors: u64,
    pub appointments: u64,
    pub patients: u64,
    /// Newest first.
    pub latest_appointments: Vec<Appointment>,
}

/// Earnings and caseload summary for a doctor's dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDashboard {
    /// Sum of fees over completed or paid appointments.
    pub earnings: u64,
    pub appointments: u64,
    /// Distinct patients seen.
    pub patients: u64,
    /// Newest first.
    pub latest_appointments: Vec<Appointment>,
}

/// Books, cancels, and reports on appointments.
pub struct SchedulingService {
    patients: Arc<dyn PatientRepository>,
    doctors: Arc<dyn DoctorRepository>,
    appointments: Arc<dyn AppointmentRepository>,
    notifier: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl SchedulingService {
    pub fn new(
        patients: Arc<dyn PatientRepository>,
        doctors: Arc<dyn DoctorRepository>,
        appointments: Arc<dyn AppointmentRepository>,
        notifier: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            patients,
            doctors,
            appointments,
            notifier,
            clock,
        }
    }

    /// Book a slot for a patient.
    ///
    /// The reservation happens first and is rolled back if any later step
    /// fails, so no appointment record can exist without its slot and no
    /// slot stays reserved for an appointment that was never written.
    pub async fn book(
        &self,
        patient_id: &PatientId,
        doctor_id: &DoctorId,
        slot_date: SlotDate,
        slot_time: SlotTime,
    ) -> DomainResult<Appointment> {
        match self
            .doctors
            .reserve_slot(doctor_id, &slot_date, &slot_time)
            .await
            .map_err(doctor_repo_error)?
        {
            ReserveOutcome::Reserved => {}
            ReserveOutcome::UnknownDoctor => {
                return Err(DomainError::not_found("Doctor not found"));
            }
            ReserveOutcome::DoctorUnavailable => {
                return Err(DomainError::conflict("Doctor not available"));
            }
            ReserveOutcome::SlotTaken => {
                return Err(DomainError::conflict("Slot not available"));
            }
        }

        match self
            .finish_booking(patient_id, doctor_id, &slot_date, &slot_time)
            .await
        {
            Ok(appointment) => Ok(appointment),
            Err(error) => {
                if let Err(release_error) = self
                    .doctors
                    .release_slot(doctor_id, &slot_date, &slot_time)
                    .await
                {
                    tracing::error!(
                        %doctor_id,
                        date = %slot_date,
                        time = %slot_time,
                        error = %release_error,
                        "failed to release slot after aborted booking"
                    );
                }
                Err(error)
            }
        }
    }

    async fn finish_booking(
        &self,
        patient_id: &PatientId,
        doctor_id: &DoctorId,
        slot_date: &SlotDate,
        slot_time: &SlotTime,
    ) -> DomainResult<Appointment> {
        let patient = self
            .patients
            .find_by_id(patient_id)
            .await
            .map_err(patient_repo_error)?
            .ok_or_else(|| DomainError::not_found("User not found"))?;
        let doctor = self
            .doctors
            .find_by_id(doctor_id)
            .await
            .map_err(doctor_repo_error)?
            .ok_or_else(|| DomainError::not_found("Doctor not found"))?;

        let appointment = Appointment::book(
            PatientSnapshot::from(&patient),
            DoctorSnapshot::from(&doctor),
            slot_date.clone(),
            slot_time.clone(),
            self.clock.utc(),
        );
        self.appointments
            .insert(&appointment)
            .await
            .map_err(appointment_repo_error)?;
        Ok(appointment)
    }

    /// Cancel an appointment and release its slot.
    ///
    /// Patients and doctors may only cancel their own appointments; the
    /// administrator may cancel any.
    pub async fn cancel(&self, actor: Actor, appointment_id: &AppointmentId) -> DomainResult<()> {
        let appointment = self.require_appointment(appointment_id).await?;
        ensure_party(&actor, &appointment)?;
        if appointment.cancelled {
            return Err(DomainError::conflict("Appointment already cancelled"));
        }

        self.appointments
            .mark_cancelled(appointment_id)
            .await
            .map_err(appointment_repo_error)?;
        self.doctors
            .release_slot(
                &appointment.doctor_id,
                &appointment.slot_date,
                &appointment.slot_time,
            )
            .await
            .map_err(doctor_repo_error)?;
        Ok(())
    }

    /// Confirm an appointment and notify both parties. No state changes;
    /// acceptance exists purely as a notification.
    pub async fn accept(&self, actor: Actor, appointment_id: &AppointmentId) -> DomainResult<()> {
        let appointment = self.require_active(appointment_id, &actor).await?;
        self.notifier
            .appointment_event(&appointment, &AppointmentEvent::Accepted)
            .await
    }

    /// Mark an appointment completed, then notify both parties.
    ///
    /// The completion write stands even when notification fails; the
    /// returned error then reports the delivery failure alone.
    pub async fn complete(&self, actor: Actor, appointment_id: &AppointmentId) -> DomainResult<()> {
        let appointment = self.require_active(appointment_id, &actor).await?;
        self.appointments
            .mark_completed(appointment_id)
            .await
            .map_err(appointment_repo_error)?;
        self.notifier
            .appointment_event(&appointment, &AppointmentEvent::Completed)
            .await
    }

    /// Email a meeting link to both parties.
    pub async fn send_meeting_link(
        &self,
        actor: Actor,
        appointment_id: &AppointmentId,
        link: &str,
    ) -> DomainResult<()> {
        if link.trim().is_empty() {
            return Err(DomainError::invalid_request("Missing meeting link"));
        }
        let appointment = self.require_active(appointment_id, &actor).await?;
        self.notifier
            .appointment_event(
                &appointment,
                &AppointmentEvent::MeetingLink(link.trim().to_owned()),
            )
            .await
    }

    /// A patient's appointments, newest first.
    pub async fn appointments_for_patient(
        &self,
        patient_id: &PatientId,
    ) -> DomainResult<Vec<Appointment>> {
        let mut appointments = self
            .appointments
            .list_for_patient(patient_id)
            .await
            .map_err(appointment_repo_error)?;
        appointments.reverse();
        Ok(appointments)
    }

    /// A doctor's appointments, newest first.
    pub async fn appointments_for_doctor(
        &self,
        doctor_id: &DoctorId,
    ) -> DomainResult<Vec<Appointment>> {
        let mut appointments = self
            .appointments
            .list_for_doctor(doctor_id)
            .await
            .map_err(appointment_repo_error)?;
        appointments.reverse();
        Ok(appointments)
    }

    /// Every appointment, newest first, for the admin listing.
    pub async fn all_appointments(&self) -> DomainResult<Vec<Appointment>> {
        let mut appointments = self
            .appointments
            .list_all()
            .await
            .map_err(appointment_repo_error)?;
        appointments.reverse();
        Ok(appointments)
    }

    /// Aggregate platform counts for the admin dashboard.
    pub async fn admin_dashboard(&self) -> DomainResult<AdminDashboard> {
        let doctors = self.doctors.count().await.map_err(doctor_repo_error)?;
        let patients = self.patients.count().await.map_err(patient_repo_error)?;
        let latest_appointments = self.all_appointments().await?;
        Ok(AdminDashboard {
            doctors,
            appointments: latest_appointments.len() as u64,
            patients,
            latest_appointments,
        })
    }

    /// Earnings and caseload summary for a doctor.
    pub async fn doctor_dashboard(&self, doctor_id: &DoctorId) -> DomainResult<DoctorDashboard> {
        let latest_appointments = self.appointments_for_doctor(doctor_id).await?;
        let earnings = latest_appointments
            .iter()
            .filter(|appointment| appointment.is_completed || appointment.payment)
            .map(|appointment| appointment.amount)
            .sum();
        let patients = latest_appointments
            .iter()
            .map(|appointment| appointment.patient_id)
            .collect::<HashSet<_>>()
            .len() as u64;
        Ok(DoctorDashboard {
            earnings,
            appointments: latest_appointments.len() as u64,
            patients,
            latest_appointments,
        })
    }

    async fn require_appointment(
        &self,
        appointment_id: &AppointmentId,
    ) -> DomainResult<Appointment> {
        self.appointments
            .find_by_id(appointment_id)
            .await
            .map_err(appointment_repo_error)?
            .ok_or_else(|| DomainError::not_found("Appointment not found"))
    }

    async fn require_active(
        &self,
        appointment_id: &AppointmentId,
        actor: &Actor,
    ) -> DomainResult<Appointment> {
        let appointment = self.require_appointment(appointment_id).await?;
        ensure_party(actor, &appointment)?;
        if appointment.cancelled {
            return Err(DomainError::conflict("Appointment cancelled"));
        }
        Ok(appointment)
    }
}

fn ensure_party(actor: &Actor, appointment: &Appointment) -> DomainResult<()> {
    let owns = match actor {
        Actor::Patient(id) => *id == appointment.patient_id,
        Actor::Doctor(id) => *id == appointment.doctor_id,
        Actor::Admin => true,
    };
    if owns {
        Ok(())
    } else {
        Err(DomainError::unauthorized("Unauthorized action"))
    }
}

fn patient_repo_error(error: PatientRepositoryError) -> DomainError {
    tracing::error!(%error, "patient repository failure");
    DomainError::internal("storage unavailable")
}

fn doctor_repo_error(error: DoctorRepositoryError) -> DomainError {
    tracing::error!(%error, "doctor repository failure");
    DomainError::internal("storage unavailable")
}

fn appointment_repo_error(error: AppointmentRepositoryError) -> DomainError {
    tracing::error!(%error, "appointment repository failure");
    DomainError::internal("storage unavailable")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::appointment::tests::{sample_doctor_snapshot, sample_patient_snapshot};
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{
        MockAppointmentRepository, MockDoctorRepository, MockMailer, MockPatientRepository,
        MockSmsSender,
    };
    use chrono::Utc;
    use mockall::predicate::eq;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(mockable::DefaultClock)
    }

    fn notifier() -> Arc<NotificationDispatcher> {
        Arc::new(NotificationDispatcher::new(
            Arc::new(MockMailer::new()),
            Arc::new(MockSmsSender::new()),
        ))
    }

    fn date(raw: &str) -> SlotDate {
        SlotDate::parse(raw).expect("valid date")
    }

    fn time(raw: &str) -> SlotTime {
        SlotTime::parse(raw).expect("valid time")
    }

    fn booked_appointment() -> Appointment {
        Appointment::book(
            sample_patient_snapshot(),
            sample_doctor_snapshot(),
            date("2025-01-10"),
            time("10:00 AM"),
            Utc::now(),
        )
    }

    fn service(
        patients: MockPatientRepository,
        doctors: MockDoctorRepository,
        appointments: MockAppointmentRepository,
    ) -> SchedulingService {
        SchedulingService::new(
            Arc::new(patients),
            Arc::new(doctors),
            Arc::new(appointments),
            notifier(),
            clock(),
        )
    }

    #[tokio::test]
    async fn taken_slot_rejects_the_booking() {
        let mut doctors = MockDoctorRepository::new();
        doctors
            .expect_reserve_slot()
            .times(1)
            .returning(|_, _, _| Ok(ReserveOutcome::SlotTaken));

        let service = service(
            MockPatientRepository::new(),
            doctors,
            MockAppointmentRepository::new(),
        );
        let error = service
            .book(
                &PatientId::random(),
                &DoctorId::random(),
                date("2025-01-10"),
                time("10:00 AM"),
            )
            .await
            .expect_err("slot already taken");
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(error.message(), "Slot not available");
    }

    #[tokio::test]
    async fn failed_booking_releases_the_reservation() {
        let patient_id = PatientId::random();
        let doctor_id = DoctorId::random();

        let mut doctors = MockDoctorRepository::new();
        doctors
            .expect_reserve_slot()
            .times(1)
            .returning(|_, _, _| Ok(ReserveOutcome::Reserved));
        doctors
            .expect_release_slot()
            .with(eq(doctor_id), eq(date("2025-01-10")), eq(time("10:00 AM")))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut patients = MockPatientRepository::new();
        patients
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(patients, doctors, MockAppointmentRepository::new());
        let error = service
            .book(&patient_id, &doctor_id, date("2025-01-10"), time("10:00 AM"))
            .await
            .expect_err("patient missing");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn cancel_by_another_patient_is_rejected() {
        let appointment = booked_appointment();
        let appointment_id = appointment.id;

        let mut appointments = MockAppointmentRepository::new();
        appointments
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(appointment.clone())));
        appointments.expect_mark_cancelled().times(0);

        let service = service(
            MockPatientRepository::new(),
            MockDoctorRepository::new(),
            appointments,
        );
        let error = service
            .cancel(Actor::Patient(PatientId::random()), &appointment_id)
            .await
            .expect_err("not the booking patient");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
        assert_eq!(error.message(), "Unauthorized action");
    }

    #[tokio::test]
    async fn cancel_releases_the_booked_slot() {
        let appointment = booked_appointment();
        let appointment_id = appointment.id;
        let doctor_id = appointment.doctor_id;
        let patient_id = appointment.patient_id;

        let mut appointments = MockAppointmentRepository::new();
        appointments
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(appointment.clone())));
        appointments
            .expect_mark_cancelled()
            .with(eq(appointment_id))
            .times(1)
            .returning(|_| Ok(true));

        let mut doctors = MockDoctorRepository::new();
        doctors
            .expect_release_slot()
            .with(eq(doctor_id), eq(date("2025-01-10")), eq(time("10:00 AM")))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = service(MockPatientRepository::new(), doctors, appointments);
        service
            .cancel(Actor::Patient(patient_id), &appointment_id)
            .await
            .expect("owner cancels");
    }

    #[tokio::test]
    async fn double_cancel_is_rejected() {
        let mut appointment = booked_appointment();
        appointment.cancelled = true;
        let appointment_id = appointment.id;
        let patient_id = appointment.patient_id;

        let mut appointments = MockAppointmentRepository::new();
        appointments
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(appointment.clone())));
        appointments.expect_mark_cancelled().times(0);

        let service = service(
            MockPatientRepository::new(),
            MockDoctorRepository::new(),
            appointments,
        );
        let error = service
            .cancel(Actor::Patient(patient_id), &appointment_id)
            .await
            .expect_err("already cancelled");
        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn completion_survives_a_notification_failure() {
        let appointment = booked_appointment();
        let appointment_id = appointment.id;
        let doctor_id = appointment.doctor_id;

        let mut appointments = MockAppointmentRepository::new();
        appointments
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(appointment.clone())));
        appointments
            .expect_mark_completed()
            .with(eq(appointment_id))
            .times(1)
            .returning(|_| Ok(true));

        let mut mailer = MockMailer::new();
        mailer.expect_send().times(2).returning(|_| {
            Err(crate::domain::ports::MailerError::Transport {
                message: "provider down".to_owned(),
            })
        });
        let service = SchedulingService::new(
            Arc::new(MockPatientRepository::new()),
            Arc::new(MockDoctorRepository::new()),
            Arc::new(appointments),
            Arc::new(NotificationDispatcher::new(
                Arc::new(mailer),
                Arc::new(MockSmsSender::new()),
            )),
            clock(),
        );

        let error = service
            .complete(Actor::Doctor(doctor_id), &appointment_id)
            .await
            .expect_err("emails failed");
        assert_eq!(error.code(), ErrorCode::Upstream);
    }

    #[tokio::test]
    async fn doctor_dashboard_counts_completed_and_paid_earnings() {
        let doctor_id = DoctorId::random();
        let mut completed = booked_appointment();
        completed.doctor_id = doctor_id;
        completed.is_completed = true;
        let mut paid = booked_appointment();
        paid.doctor_id = doctor_id;
        paid.payment = true;
        let mut pending = booked_appointment();
        pending.doctor_id = doctor_id;

        let rows = vec![completed, paid, pending];
        let mut appointments = MockAppointmentRepository::new();
        appointments
            .expect_list_for_doctor()
            .with(eq(doctor_id))
            .times(1)
            .returning(move |_| Ok(rows.clone()));

        let service = service(
            MockPatientRepository::new(),
            MockDoctorRepository::new(),
            appointments,
        );
        let dashboard = service
            .doctor_dashboard(&doctor_id)
            .await
            .expect("dashboard built");
        assert_eq!(dashboard.earnings, 1000);
        assert_eq!(dashboard.appointments, 3);
        assert_eq!(dashboard.patients, 3);
    }
}
