//! Account lifecycle: patient registration and verification, logins for
//! patients, doctors, and the administrator, and password resets.
//!
//! Doctor and admin logins are two-step: password first, then a login OTP
//! emailed to the account. Patients log in with password alone but only
//! once both registration codes have been confirmed.

use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use mockable::Clock;
use url::Url;

use super::contact::{EmailAddress, PhoneNumber};
use super::error::{DomainError, DomainResult};
use super::otp::{OtpChannel, OtpLedger, OtpPurpose, OtpRecipient};
use super::patient::{Address, Patient, PatientId};
use super::ports::{
    DoctorRepository, DoctorRepositoryError, ImageStore, PatientRepository,
    PatientRepositoryError, Principal, SessionStore, SessionStoreError, SessionToken,
};

/// Fixed OTP subject for the administrator account.
pub(crate) const ADMIN_SUBJECT: &str = "admin";

/// Shortest password accepted for any account.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Administrator credentials, supplied through configuration.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: EmailAddress,
    pub password: String,
}

/// Input for patient registration.
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Partial patient profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    /// Remote image to ingest into hosting.
    pub image_source: Option<Url>,
}

/// Account and session operations for every role.
pub struct AccountService {
    patients: Arc<dyn PatientRepository>,
    doctors: Arc<dyn DoctorRepository>,
    sessions: Arc<dyn SessionStore>,
    otp: Arc<OtpLedger>,
    images: Arc<dyn ImageStore>,
    clock: Arc<dyn Clock>,
    admin: AdminCredentials,
    default_country_code: String,
}

impl AccountService {
    #[expect(clippy::too_many_arguments, reason = "wired once at startup")]
    pub fn new(
        patients: Arc<dyn PatientRepository>,
        doctors: Arc<dyn DoctorRepository>,
        sessions: Arc<dyn SessionStore>,
        otp: Arc<OtpLedger>,
        images: Arc<dyn ImageStore>,
        clock: Arc<dyn Clock>,
        admin: AdminCredentials,
        default_country_code: String,
    ) -> Self {
        Self {
            patients,
            doctors,
            sessions,
            otp,
            images,
            clock,
            admin,
            default_country_code,
        }
    }

    /// Register a new, unverified patient and send registration codes to
    /// both contact channels.
    pub async fn register_patient(&self, input: NewPatient) -> DomainResult<PatientId> {
        if input.name.trim().is_empty()
            || input.email.trim().is_empty()
            || input.phone.trim().is_empty()
            || input.password.is_empty()
        {
            return Err(DomainError::invalid_request("Missing details"));
        }
        let email = EmailAddress::parse(&input.email)
            .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        let phone = PhoneNumber::parse(&input.phone, &self.default_country_code)
            .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        ensure_strong_password(&input.password)?;

        if self
            .patients
            .find_by_email(&email)
            .await
            .map_err(patient_repo_error)?
            .is_some()
        {
            return Err(DomainError::conflict("Email already exists"));
        }

        let password_hash = hash_password(&input.password)?;
        let patient = Patient::register(
            input.name.trim().to_owned(),
            email.clone(),
            phone.clone(),
            password_hash,
            self.clock.utc(),
        );
        self.patients
            .save(&patient)
            .await
            .map_err(patient_repo_error)?;

        let subject = patient.id.to_string();
        self.otp
            .issue(
                &subject,
                OtpPurpose::Registration,
                &OtpRecipient::Email(email),
            )
            .await?;
        self.otp
            .issue(&subject, OtpPurpose::Registration, &OtpRecipient::Sms(phone))
            .await?;
        Ok(patient.id)
    }

    /// Confirm both registration codes, mark the patient verified, and open
    /// a session.
    pub async fn verify_patient(
        &self,
        patient_id: &PatientId,
        email_code: &str,
        sms_code: &str,
    ) -> DomainResult<SessionToken> {
        let mut patient = self.require_patient(patient_id).await?;
        self.otp
            .verify_registration(&patient.id.to_string(), email_code, sms_code)
            .await?;

        patient.is_email_verified = true;
        patient.is_mobile_verified = true;
        self.patients
            .save(&patient)
            .await
            .map_err(patient_repo_error)?;
        self.issue_session(Principal::Patient(patient.id)).await
    }

    /// Password login for a verified patient.
    pub async fn login_patient(&self, email: &str, password: &str) -> DomainResult<SessionToken> {
        let email = EmailAddress::parse(email)
            .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        let patient = self
            .patients
            .find_by_email(&email)
            .await
            .map_err(patient_repo_error)?
            .ok_or_else(invalid_credentials)?;
        check_password(password, &patient.password_hash)?;
        if !patient.is_verified() {
            return Err(DomainError::unauthorized("Account not verified"));
        }
        self.issue_session(Principal::Patient(patient.id)).await
    }

    /// Email a password-reset code to a patient.
    pub async fn forgot_password_patient(&self, email: &str) -> DomainResult<()> {
        let email = EmailAddress::parse(email)
            .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        let patient = self
            .patients
            .find_by_email(&email)
            .await
            .map_err(patient_repo_error)?
            .ok_or_else(|| DomainError::not_found("User not found"))?;
        self.otp
            .issue(
                &patient.id.to_string(),
                OtpPurpose::PasswordReset,
                &OtpRecipient::Email(patient.email.clone()),
            )
            .await
    }

    /// Confirm a patient's reset code, opening a short password-change
    /// window.
    pub async fn verify_reset_otp_patient(&self, email: &str, code: &str) -> DomainResult<()> {
        let email = EmailAddress::parse(email)
            .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        let patient = self
            .patients
            .find_by_email(&email)
            .await
            .map_err(patient_repo_error)?
            .ok_or_else(|| DomainError::not_found("User not found"))?;
        let subject = patient.id.to_string();
        self.otp
            .verify(&subject, OtpPurpose::PasswordReset, OtpChannel::Email, code)
            .await?;
        self.otp.open_reset_gate(&subject).await
    }

    /// Set a new patient password. Requires a reset code confirmed within
    /// the gate window.
    pub async fn reset_password_patient(
        &self,
        email: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        let email = EmailAddress::parse(email)
            .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        let mut patient = self
            .patients
            .find_by_email(&email)
            .await
            .map_err(patient_repo_error)?
            .ok_or_else(|| DomainError::not_found("User not found"))?;
        self.otp.consume_reset_gate(&patient.id.to_string()).await?;
        ensure_strong_password(new_password)?;
        patient.password_hash = hash_password(new_password)?;
        self.patients
            .save(&patient)
            .await
            .map_err(patient_repo_error)
    }

    /// Fetch a patient for the profile endpoint.
    pub async fn patient_profile(&self, patient_id: &PatientId) -> DomainResult<Patient> {
        self.require_patient(patient_id).await
    }

    /// Apply a partial profile update, ingesting a new image when provided.
    pub async fn update_patient_profile(
        &self,
        patient_id: &PatientId,
        update: ProfileUpdate,
    ) -> DomainResult<Patient> {
        let mut patient = self.require_patient(patient_id).await?;
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(DomainError::invalid_request("Missing details"));
            }
            patient.name = name.trim().to_owned();
        }
        if let Some(phone) = update.phone {
            patient.phone = PhoneNumber::parse(&phone, &self.default_country_code)
                .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        }
        if let Some(address) = update.address {
            patient.address = Some(address);
        }
        if let Some(dob) = update.dob {
            patient.dob = Some(dob);
        }
        if let Some(gender) = update.gender {
            patient.gender = Some(gender);
        }
        if let Some(source) = update.image_source {
            let hosted = self.images.upload(&source).await.map_err(|error| {
                tracing::warn!(%error, "profile image upload failed");
                DomainError::upstream("failed to upload image")
            })?;
            patient.image = Some(hosted.to_string());
        }
        self.patients
            .save(&patient)
            .await
            .map_err(patient_repo_error)?;
        Ok(patient)
    }

    /// First step of doctor login: verify the password and email a login
    /// code.
    pub async fn login_doctor(&self, email: &str, password: &str) -> DomainResult<()> {
        let email = EmailAddress::parse(email)
            .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        let doctor = self
            .doctors
            .find_by_email(&email)
            .await
            .map_err(doctor_repo_error)?
            .ok_or_else(invalid_credentials)?;
        check_password(password, &doctor.password_hash)?;
        self.otp
            .issue(
                &doctor.id.to_string(),
                OtpPurpose::Login,
                &OtpRecipient::Email(doctor.email.clone()),
            )
            .await
    }

    /// Second step of doctor login: confirm the emailed code and open a
    /// session.
    pub async fn verify_doctor_login(&self, email: &str, code: &str) -> DomainResult<SessionToken> {
        let email = EmailAddress::parse(email)
            .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        let doctor = self
            .doctors
            .find_by_email(&email)
            .await
            .map_err(doctor_repo_error)?
            .ok_or_else(invalid_credentials)?;
        self.otp
            .verify(
                &doctor.id.to_string(),
                OtpPurpose::Login,
                OtpChannel::Email,
                code,
            )
            .await?;
        self.issue_session(Principal::Doctor(doctor.id)).await
    }

    /// Email a password-reset code to a doctor.
    pub async fn forgot_password_doctor(&self, email: &str) -> DomainResult<()> {
        let email = EmailAddress::parse(email)
            .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        let doctor = self
            .doctors
            .find_by_email(&email)
            .await
            .map_err(doctor_repo_error)?
            .ok_or_else(|| DomainError::not_found("Doctor not found"))?;
        self.otp
            .issue(
                &doctor.id.to_string(),
                OtpPurpose::PasswordReset,
                &OtpRecipient::Email(doctor.email.clone()),
            )
            .await
    }

    /// Confirm a doctor's reset code and set the new password in one step.
    pub async fn reset_password_doctor(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        let email = EmailAddress::parse(email)
            .map_err(|error| DomainError::invalid_request(error.to_string()))?;
        let doctor = self
            .doctors
            .find_by_email(&email)
            .await
            .map_err(doctor_repo_error)?
            .ok_or_else(|| DomainError::not_found("Doctor not found"))?;
        self.otp
            .verify(
                &doctor.id.to_string(),
                OtpPurpose::PasswordReset,
                OtpChannel::Email,
                code,
            )
            .await?;
        ensure_strong_password(new_password)?;
        let password_hash = hash_password(new_password)?;
        let updated = self
            .doctors
            .update_password(&doctor.id, &password_hash)
            .await
            .map_err(doctor_repo_error)?;
        if !updated {
            return Err(DomainError::not_found("Doctor not found"));
        }
        Ok(())
    }

    /// First step of admin login: check the configured credentials and email
    /// a login code to the admin address.
    pub async fn login_admin(&self, email: &str, password: &str) -> DomainResult<()> {
        if !self.admin_credentials_match(email, password) {
            return Err(invalid_credentials());
        }
        self.otp
            .issue(
                ADMIN_SUBJECT,
                OtpPurpose::Login,
                &OtpRecipient::Email(self.admin.email.clone()),
            )
            .await
    }

    /// Second step of admin login: confirm the emailed code.
    pub async fn verify_admin_login(&self, email: &str, code: &str) -> DomainResult<SessionToken> {
        let Ok(parsed) = EmailAddress::parse(email) else {
            return Err(invalid_credentials());
        };
        if parsed != self.admin.email {
            return Err(invalid_credentials());
        }
        self.otp
            .verify(ADMIN_SUBJECT, OtpPurpose::Login, OtpChannel::Email, code)
            .await?;
        self.issue_session(Principal::Admin).await
    }

    fn admin_credentials_match(&self, email: &str, password: &str) -> bool {
        EmailAddress::parse(email).is_ok_and(|parsed| parsed == self.admin.email)
            && password == self.admin.password
    }

    async fn require_patient(&self, patient_id: &PatientId) -> DomainResult<Patient> {
        self.patients
            .find_by_id(patient_id)
            .await
            .map_err(patient_repo_error)?
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    async fn issue_session(&self, principal: Principal) -> DomainResult<SessionToken> {
        self.sessions
            .issue(principal)
            .await
            .map_err(session_error)
    }
}

/// Shared password policy for every account kind.
pub(crate) fn ensure_strong_password(password: &str) -> DomainResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(DomainError::invalid_request(
            "Please enter a strong password (minimum 8 characters)",
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> DomainResult<String> {
    hash(password, DEFAULT_COST).map_err(|error| {
        tracing::error!(%error, "password hashing failed");
        DomainError::internal("failed to process credentials")
    })
}

fn check_password(password: &str, password_hash: &str) -> DomainResult<()> {
    let matches = verify(password, password_hash).map_err(|error| {
        tracing::error!(%error, "password verification failed");
        DomainError::internal("failed to process credentials")
    })?;
    if matches {
        Ok(())
    } else {
        Err(invalid_credentials())
    }
}

fn invalid_credentials() -> DomainError {
    DomainError::unauthorized("Invalid credentials")
}

fn patient_repo_error(error: PatientRepositoryError) -> DomainError {
    tracing::error!(%error, "patient repository failure");
    DomainError::internal("storage unavailable")
}

fn doctor_repo_error(error: DoctorRepositoryError) -> DomainError {
    tracing::error!(%error, "doctor repository failure");
    DomainError::internal("storage unavailable")
}

fn session_error(error: SessionStoreError) -> DomainError {
    tracing::error!(%error, "session store failure");
    DomainError::internal("session store unavailable")
}
