//! HTTP inbound adapter exposing the REST endpoints.
//!
//! Handlers are grouped by caller: `patients` under `/api/user`, `doctors`
//! under `/api/doctor`, and `admin` under `/api/admin`. All responses ride
//! the uniform envelope: `success` plus endpoint-specific fields, with
//! failures reported as `success: false` and a stable `code`.

use serde::Serialize;

pub mod admin;
pub mod auth;
pub mod doctors;
pub mod error;
pub mod health;
pub mod patients;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod views;

pub use error::ApiResult;

/// Envelope for endpoints that return only an outcome message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

impl MessageResponse {
    pub fn ok(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}
