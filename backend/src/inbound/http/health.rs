//! Liveness probe.

use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Report process liveness. No dependencies are touched.
#[get("/healthz")]
pub async fn healthz() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse { status: "ok" })
}

/// Register the probe outside the API scopes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz);
}
