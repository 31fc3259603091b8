//! Port abstraction for patient persistence adapters.

use async_trait::async_trait;

use crate::domain::contact::EmailAddress;
use crate::domain::patient::{Patient, PatientId};

/// Persistence errors raised by patient repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatientRepositoryError {
    /// Repository connection could not be established.
    #[error("patient repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("patient repository query failed: {message}")]
    Query { message: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Insert or update a patient document.
    async fn save(&self, patient: &Patient) -> Result<(), PatientRepositoryError>;

    /// Fetch a patient by identifier.
    async fn find_by_id(&self, id: &PatientId)
        -> Result<Option<Patient>, PatientRepositoryError>;

    /// Fetch a patient by normalised email address.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Patient>, PatientRepositoryError>;

    /// Number of registered patients.
    async fn count(&self) -> Result<u64, PatientRepositoryError>;
}
