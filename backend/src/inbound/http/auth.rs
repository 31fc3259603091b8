//! Session extractors for the three caller roles.
//!
//! Clients present their session token in a role-specific header: `token`
//! for patients, `dtoken` for doctors, and `atoken` for the administrator.
//! Each extractor resolves the token against the session store and rejects
//! tokens that resolve to a different role.

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::domain::ports::{Principal, SessionToken};
use crate::domain::{DoctorId, DomainError, PatientId};

use super::state::HttpState;

/// Header carrying the patient session token.
pub const PATIENT_TOKEN_HEADER: &str = "token";
/// Header carrying the doctor session token.
pub const DOCTOR_TOKEN_HEADER: &str = "dtoken";
/// Header carrying the admin session token.
pub const ADMIN_TOKEN_HEADER: &str = "atoken";

/// The patient authenticated by the `token` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthedPatient(pub PatientId);

/// The doctor authenticated by the `dtoken` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthedDoctor(pub DoctorId);

/// Proof that the `atoken` header resolved to the administrator.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

fn not_authorized() -> DomainError {
    DomainError::unauthorized("Not authorized, login again")
}

async fn resolve_principal(
    state: Option<web::Data<HttpState>>,
    raw_token: Option<String>,
) -> Result<Principal, DomainError> {
    let state = state.ok_or_else(|| DomainError::internal("http state not configured"))?;
    let raw = raw_token.ok_or_else(not_authorized)?;
    state
        .sessions
        .resolve(&SessionToken::new(raw))
        .await
        .map_err(|error| {
            tracing::error!(%error, "session store failure");
            DomainError::internal("session store unavailable")
        })?
        .ok_or_else(not_authorized)
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn state_of(req: &HttpRequest) -> Option<web::Data<HttpState>> {
    req.app_data::<web::Data<HttpState>>().cloned()
}

impl FromRequest for AuthedPatient {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = state_of(req);
        let token = header_value(req, PATIENT_TOKEN_HEADER);
        Box::pin(async move {
            match resolve_principal(state, token).await? {
                Principal::Patient(id) => Ok(Self(id)),
                Principal::Doctor(_) | Principal::Admin => Err(not_authorized().into()),
            }
        })
    }
}

impl FromRequest for AuthedDoctor {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = state_of(req);
        let token = header_value(req, DOCTOR_TOKEN_HEADER);
        Box::pin(async move {
            match resolve_principal(state, token).await? {
                Principal::Doctor(id) => Ok(Self(id)),
                Principal::Patient(_) | Principal::Admin => Err(not_authorized().into()),
            }
        })
    }
}

impl FromRequest for AdminSession {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = state_of(req);
        let token = header_value(req, ADMIN_TOKEN_HEADER);
        Box::pin(async move {
            match resolve_principal(state, token).await? {
                Principal::Admin => Ok(Self),
                Principal::Patient(_) | Principal::Doctor(_) => Err(not_authorized().into()),
            }
        })
    }
}
