//! Patient API handlers.
//!
//! ```text
//! POST /api/user/register {"name":"Asha","email":"a@x.com","phone":"98765...","password":"..."}
//! POST /api/user/verify {"userId":"...","emailOtp":"123456","mobileOtp":"654321"}
//! POST /api/user/login {"email":"a@x.com","password":"..."}
//! GET  /api/user/appointments            (token header)
//! POST /api/user/book-appointment        (token header)
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::ports::PaymentOrder;
use crate::domain::{
    Actor, Address, Appointment, AppointmentId, DoctorId, NewPatient, PatientId, ProfileUpdate,
    SlotDate, SlotTime,
};
use crate::inbound::http::auth::AuthedPatient;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::views::PatientView;
use crate::inbound::http::{ApiResult, MessageResponse};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub message: &'static str,
    pub user_id: PatientId,
}

/// Register a patient and send verification codes to both channels.
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<web::Json<RegisterResponse>> {
    let payload = payload.into_inner();
    let user_id = state
        .accounts
        .register_patient(NewPatient {
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            password: payload.password,
        })
        .await?;
    Ok(web::Json(RegisterResponse {
        success: true,
        message: "OTP sent to email and mobile",
        user_id,
    }))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub user_id: PatientId,
    pub email_otp: String,
    pub mobile_otp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

/// Confirm both registration codes and open a session.
#[post("/verify")]
pub async fn verify(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let token = state
        .accounts
        .verify_patient(&payload.user_id, &payload.email_otp, &payload.mobile_otp)
        .await?;
    Ok(web::Json(TokenResponse {
        success: true,
        token: token.as_str().to_owned(),
    }))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password login for a verified patient.
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let token = state
        .accounts
        .login_patient(&payload.email, &payload.password)
        .await?;
    Ok(web::Json(TokenResponse {
        success: true,
        token: token.as_str().to_owned(),
    }))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Email a password-reset code.
#[post("/forgot-password")]
pub async fn forgot_password(
    state: web::Data<HttpState>,
    payload: web::Json<ForgotPasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state.accounts.forgot_password_patient(&payload.email).await?;
    Ok(web::Json(MessageResponse::ok("Reset OTP sent")))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResetOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Confirm the reset code, opening the password-change window.
#[post("/verify-reset-otp")]
pub async fn verify_reset_otp(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyResetOtpRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .accounts
        .verify_reset_otp_patient(&payload.email, &payload.otp)
        .await?;
    Ok(web::Json(MessageResponse::ok("OTP verified")))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

/// Set a new password inside the reset window.
#[post("/reset-password")]
pub async fn reset_password(
    state: web::Data<HttpState>,
    payload: web::Json<ResetPasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .accounts
        .reset_password_patient(&payload.email, &payload.new_password)
        .await?;
    Ok(web::Json(MessageResponse::ok("Password reset")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub success: bool,
    pub user_data: PatientView,
}

/// The caller's profile.
#[get("/get-profile")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    patient: AuthedPatient,
) -> ApiResult<web::Json<ProfileResponse>> {
    let profile = state.accounts.patient_profile(&patient.0).await?;
    Ok(web::Json(ProfileResponse {
        success: true,
        user_data: profile.into(),
    }))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    /// Remote image URL to ingest into hosting.
    pub image: Option<Url>,
}

/// Apply a partial profile update.
#[post("/update-profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    patient: AuthedPatient,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let payload = payload.into_inner();
    state
        .accounts
        .update_patient_profile(
            &patient.0,
            ProfileUpdate {
                name: payload.name,
                phone: payload.phone,
                address: payload.address,
                dob: payload.dob,
                gender: payload.gender,
                image_source: payload.image,
            },
        )
        .await?;
    Ok(web::Json(MessageResponse::ok("Profile updated")))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub doc_id: DoctorId,
    pub slot_date: SlotDate,
    pub slot_time: SlotTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentResponse {
    pub success: bool,
    pub message: &'static str,
    pub appointment_id: AppointmentId,
}

/// Book a slot with a doctor.
#[post("/book-appointment")]
pub async fn book_appointment(
    state: web::Data<HttpState>,
    patient: AuthedPatient,
    payload: web::Json<BookAppointmentRequest>,
) -> ApiResult<web::Json<BookAppointmentResponse>> {
    let payload = payload.into_inner();
    let appointment = state
        .scheduling
        .book(&patient.0, &payload.doc_id, payload.slot_date, payload.slot_time)
        .await?;
    Ok(web::Json(BookAppointmentResponse {
        success: true,
        message: "Appointment booked",
        appointment_id: appointment.id,
    }))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointmentRequest {
    pub appointment_id: AppointmentId,
}

/// Cancel one of the caller's appointments, releasing its slot.
#[post("/cancel-appointment")]
pub async fn cancel_appointment(
    state: web::Data<HttpState>,
    patient: AuthedPatient,
    payload: web::Json<CancelAppointmentRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .scheduling
        .cancel(Actor::Patient(patient.0), &payload.appointment_id)
        .await?;
    Ok(web::Json(MessageResponse::ok("Appointment cancelled")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentsResponse {
    pub success: bool,
    pub appointments: Vec<Appointment>,
}

/// The caller's appointments, newest first.
#[get("/appointments")]
pub async fn appointments(
    state: web::Data<HttpState>,
    patient: AuthedPatient,
) -> ApiResult<web::Json<AppointmentsResponse>> {
    let appointments = state.scheduling.appointments_for_patient(&patient.0).await?;
    Ok(web::Json(AppointmentsResponse {
        success: true,
        appointments,
    }))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreateRequest {
    pub appointment_id: AppointmentId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreateResponse {
    pub success: bool,
    pub order: PaymentOrder,
}

/// Open a gateway order for an appointment.
#[post("/payment-create")]
pub async fn payment_create(
    state: web::Data<HttpState>,
    patient: AuthedPatient,
    payload: web::Json<PaymentCreateRequest>,
) -> ApiResult<web::Json<PaymentCreateResponse>> {
    let order = state
        .payments
        .create_order(&patient.0, &payload.appointment_id)
        .await?;
    Ok(web::Json(PaymentCreateResponse {
        success: true,
        order,
    }))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerifyRequest {
    pub order_id: String,
}

/// Confirm a settled order against the gateway.
#[post("/payment-verify")]
pub async fn payment_verify(
    state: web::Data<HttpState>,
    _patient: AuthedPatient,
    payload: web::Json<PaymentVerifyRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state.payments.verify_order(&payload.order_id).await?;
    Ok(web::Json(MessageResponse::ok("Payment recorded")))
}

/// Register the patient endpoints on a scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(verify)
        .service(login)
        .service(forgot_password)
        .service(verify_reset_otp)
        .service(reset_password)
        .service(get_profile)
        .service(update_profile)
        .service(book_appointment)
        .service(cancel_appointment)
        .service(appointments)
        .service(payment_create)
        .service(payment_verify);
}
