//! Admin panel handlers.
//!
//! The administrator is a single configured account; login is two-step
//! like the doctor flow, and the session token rides the `atoken` header.

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{
    Actor, Address, AdminDashboard, Appointment, AppointmentId, NewDoctor,
};
use crate::inbound::http::auth::AdminSession;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::views::DoctorView;
use crate::inbound::http::{ApiResult, MessageResponse};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Check the configured credentials and email a login code.
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .accounts
        .login_admin(&payload.email, &payload.password)
        .await?;
    Ok(web::Json(MessageResponse::ok("OTP sent to email")))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyLoginRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub success: bool,
    pub atoken: String,
}

/// Exchange the emailed code for a session token.
#[post("/verify-login-otp")]
pub async fn verify_login_otp(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyLoginRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let token = state
        .accounts
        .verify_admin_login(&payload.email, &payload.otp)
        .await?;
    Ok(web::Json(TokenResponse {
        success: true,
        atoken: token.as_str().to_owned(),
    }))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDoctorRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Remote image URL to ingest into hosting.
    pub image: Url,
    pub speciality: String,
    #[serde(default)]
    pub speciality_list: Vec<String>,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: u64,
    pub address: Address,
    #[serde(default)]
    pub languages: Vec<String>,
}

/// Onboard a doctor.
#[post("/add-doctor")]
pub async fn add_doctor(
    state: web::Data<HttpState>,
    _admin: AdminSession,
    payload: web::Json<AddDoctorRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let payload = payload.into_inner();
    state
        .directory
        .add_doctor(NewDoctor {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            image_source: payload.image,
            speciality: payload.speciality,
            speciality_list: payload.speciality_list,
            degree: payload.degree,
            experience: payload.experience,
            about: payload.about,
            fees: payload.fees,
            address: payload.address,
            languages: payload.languages,
        })
        .await?;
    Ok(web::Json(MessageResponse::ok("Doctor added")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllDoctorsResponse {
    pub success: bool,
    pub doctors: Vec<DoctorView>,
}

/// Full roster with email addresses and ledgers.
#[get("/all-doctors")]
pub async fn all_doctors(
    state: web::Data<HttpState>,
    _admin: AdminSession,
) -> ApiResult<web::Json<AllDoctorsResponse>> {
    let doctors = state.directory.list().await?;
    Ok(web::Json(AllDoctorsResponse {
        success: true,
        doctors: doctors.into_iter().map(DoctorView::from).collect(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentsResponse {
    pub success: bool,
    pub appointments: Vec<Appointment>,
}

/// Every appointment in the system, newest first.
#[get("/appointments")]
pub async fn appointments(
    state: web::Data<HttpState>,
    _admin: AdminSession,
) -> ApiResult<web::Json<AppointmentsResponse>> {
    let appointments = state.scheduling.all_appointments().await?;
    Ok(web::Json(AppointmentsResponse {
        success: true,
        appointments,
    }))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub appointment_id: AppointmentId,
}

/// Cancel any appointment.
#[post("/cancel-appointment")]
pub async fn cancel_appointment(
    state: web::Data<HttpState>,
    _admin: AdminSession,
    payload: web::Json<AppointmentRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .scheduling
        .cancel(Actor::Admin, &payload.appointment_id)
        .await?;
    Ok(web::Json(MessageResponse::ok("Appointment cancelled")))
}

/// Notify both parties that the appointment is accepted.
#[post("/accept-appointment")]
pub async fn accept_appointment(
    state: web::Data<HttpState>,
    _admin: AdminSession,
    payload: web::Json<AppointmentRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .scheduling
        .accept(Actor::Admin, &payload.appointment_id)
        .await?;
    Ok(web::Json(MessageResponse::ok("Appointment accepted")))
}

/// Mark any appointment completed.
#[post("/complete-appointment")]
pub async fn complete_appointment(
    state: web::Data<HttpState>,
    _admin: AdminSession,
    payload: web::Json<AppointmentRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .scheduling
        .complete(Actor::Admin, &payload.appointment_id)
        .await?;
    Ok(web::Json(MessageResponse::ok("Appointment completed")))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingLinkRequest {
    pub appointment_id: AppointmentId,
    pub link: String,
}

/// Email a meeting link to both parties.
#[post("/send-meeting-link")]
pub async fn send_meeting_link(
    state: web::Data<HttpState>,
    _admin: AdminSession,
    payload: web::Json<MeetingLinkRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .scheduling
        .send_meeting_link(Actor::Admin, &payload.appointment_id, &payload.link)
        .await?;
    Ok(web::Json(MessageResponse::ok("Meeting link sent")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub success: bool,
    pub dash_data: AdminDashboard,
}

/// Aggregate counts and the latest bookings.
#[get("/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    _admin: AdminSession,
) -> ApiResult<web::Json<DashboardResponse>> {
    let dash_data = state.scheduling.admin_dashboard().await?;
    Ok(web::Json(DashboardResponse {
        success: true,
        dash_data,
    }))
}

/// Register the admin endpoints on a scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(verify_login_otp)
        .service(add_doctor)
        .service(all_doctors)
        .service(appointments)
        .service(cancel_appointment)
        .service(accept_appointment)
        .service(complete_appointment)
        .service(send_meeting_link)
        .service(dashboard);
}
