//! Doctor API handlers.
//!
//! Login is two-step: a password check emails a one-time code, and the
//! code exchange returns the session token carried in the `dtoken` header.

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::DoctorProfileUpdate;
use crate::domain::{
    Actor, Address, Appointment, AppointmentId, DoctorDashboard, SlotDate, SlotLedger, SlotTime,
};
use crate::inbound::http::auth::AuthedDoctor;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::views::{DoctorView, PublicDoctorView};
use crate::inbound::http::{ApiResult, MessageResponse};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Check the password and email a login code.
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .accounts
        .login_doctor(&payload.email, &payload.password)
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
    pub dtoken: String,
}

/// Exchange the emailed code for a session token.
#[post("/verify-login-otp")]
pub async fn verify_login_otp(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyLoginRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let token = state
        .accounts
        .verify_doctor_login(&payload.email, &payload.otp)
        .await?;
    Ok(web::Json(TokenResponse {
        success: true,
        dtoken: token.as_str().to_owned(),
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
    state.accounts.forgot_password_doctor(&payload.email).await?;
    Ok(web::Json(MessageResponse::ok("Reset OTP sent")))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

/// Confirm the reset code and set the new password in one step.
#[post("/reset-password")]
pub async fn reset_password(
    state: web::Data<HttpState>,
    payload: web::Json<ResetPasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .accounts
        .reset_password_doctor(&payload.email, &payload.otp, &payload.new_password)
        .await?;
    Ok(web::Json(MessageResponse::ok("Password reset")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub success: bool,
    pub doctors: Vec<PublicDoctorView>,
}

/// Public roster. No authentication, no email addresses.
#[get("/list")]
pub async fn list(state: web::Data<HttpState>) -> ApiResult<web::Json<ListResponse>> {
    let doctors = state.directory.list().await?;
    Ok(web::Json(ListResponse {
        success: true,
        doctors: doctors.into_iter().map(PublicDoctorView::from).collect(),
    }))
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
    doctor: AuthedDoctor,
) -> ApiResult<web::Json<AppointmentsResponse>> {
    let appointments = state.scheduling.appointments_for_doctor(&doctor.0).await?;
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

/// Cancel one of the caller's appointments.
#[post("/cancel-appointment")]
pub async fn cancel_appointment(
    state: web::Data<HttpState>,
    doctor: AuthedDoctor,
    payload: web::Json<AppointmentRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .scheduling
        .cancel(Actor::Doctor(doctor.0), &payload.appointment_id)
        .await?;
    Ok(web::Json(MessageResponse::ok("Appointment cancelled")))
}

/// Notify both parties that the appointment is accepted.
#[post("/accept-appointment")]
pub async fn accept_appointment(
    state: web::Data<HttpState>,
    doctor: AuthedDoctor,
    payload: web::Json<AppointmentRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .scheduling
        .accept(Actor::Doctor(doctor.0), &payload.appointment_id)
        .await?;
    Ok(web::Json(MessageResponse::ok("Appointment accepted")))
}

/// Mark an appointment completed.
#[post("/complete-appointment")]
pub async fn complete_appointment(
    state: web::Data<HttpState>,
    doctor: AuthedDoctor,
    payload: web::Json<AppointmentRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .scheduling
        .complete(Actor::Doctor(doctor.0), &payload.appointment_id)
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
    doctor: AuthedDoctor,
    payload: web::Json<MeetingLinkRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .scheduling
        .send_meeting_link(Actor::Doctor(doctor.0), &payload.appointment_id, &payload.link)
        .await?;
    Ok(web::Json(MessageResponse::ok("Meeting link sent")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub success: bool,
    pub available: bool,
}

/// Flip whether the caller takes bookings; reports the new value.
#[post("/change-availability")]
pub async fn change_availability(
    state: web::Data<HttpState>,
    doctor: AuthedDoctor,
) -> ApiResult<web::Json<AvailabilityResponse>> {
    let available = state.directory.toggle_availability(&doctor.0).await?;
    Ok(web::Json(AvailabilityResponse {
        success: true,
        available,
    }))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub slot_date: SlotDate,
    pub slot_time: SlotTime,
}

/// Block a time so patients cannot book it.
#[post("/create-slot")]
pub async fn create_slot(
    state: web::Data<HttpState>,
    doctor: AuthedDoctor,
    payload: web::Json<CreateSlotRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .directory
        .block_slot(&doctor.0, &payload.slot_date, &payload.slot_time)
        .await?;
    Ok(web::Json(MessageResponse::ok("Slot created")))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSlotRequest {
    pub slot_date: SlotDate,
    pub old_slot_time: SlotTime,
    pub new_slot_time: SlotTime,
}

/// Move a blocked time to another time on the same date.
#[post("/update-slot")]
pub async fn update_slot(
    state: web::Data<HttpState>,
    doctor: AuthedDoctor,
    payload: web::Json<UpdateSlotRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    state
        .directory
        .move_slot(
            &doctor.0,
            &payload.slot_date,
            &payload.old_slot_time,
            &payload.new_slot_time,
        )
        .await?;
    Ok(web::Json(MessageResponse::ok("Slot updated")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsResponse {
    pub success: bool,
    pub slots_booked: SlotLedger,
}

/// The caller's booked-slot ledger.
#[get("/slots")]
pub async fn slots(
    state: web::Data<HttpState>,
    doctor: AuthedDoctor,
) -> ApiResult<web::Json<SlotsResponse>> {
    let slots_booked = state.directory.slots(&doctor.0).await?;
    Ok(web::Json(SlotsResponse {
        success: true,
        slots_booked,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub success: bool,
    pub dash_data: DoctorDashboard,
}

/// Earnings and caseload summary.
#[get("/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    doctor: AuthedDoctor,
) -> ApiResult<web::Json<DashboardResponse>> {
    let dash_data = state.scheduling.doctor_dashboard(&doctor.0).await?;
    Ok(web::Json(DashboardResponse {
        success: true,
        dash_data,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub success: bool,
    pub profile_data: DoctorView,
}

/// The caller's own profile, email included.
#[get("/profile")]
pub async fn profile(
    state: web::Data<HttpState>,
    doctor: AuthedDoctor,
) -> ApiResult<web::Json<ProfileResponse>> {
    let profile_data = state.directory.profile(&doctor.0).await?;
    Ok(web::Json(ProfileResponse {
        success: true,
        profile_data: profile_data.into(),
    }))
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub fees: Option<u64>,
    pub address: Option<Address>,
    pub about: Option<String>,
    pub available: Option<bool>,
}

/// Apply a partial profile update.
#[post("/update-profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    doctor: AuthedDoctor,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let payload = payload.into_inner();
    state
        .directory
        .update_profile(
            &doctor.0,
            DoctorProfileUpdate {
                fees: payload.fees,
                address: payload.address,
                about: payload.about,
                available: payload.available,
            },
        )
        .await?;
    Ok(web::Json(MessageResponse::ok("Profile updated")))
}

/// Register the doctor endpoints on a scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(verify_login_otp)
        .service(forgot_password)
        .service(reset_password)
        .service(list)
        .service(appointments)
        .service(cancel_appointment)
        .service(accept_appointment)
        .service(complete_appointment)
        .service(send_meeting_link)
        .service(change_availability)
        .service(create_slot)
        .service(update_slot)
        .service(slots)
        .service(dashboard)
        .service(profile)
        .service(update_profile);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::otp::{OtpChannel, OtpPurpose};
    use crate::domain::NewDoctor;
    use crate::inbound::http::test_utils::TestHarness;
    use actix_web::{test as actix_test, App};
    use serde_json::Value;
    use url::Url;

    fn test_app(
        harness: &TestHarness,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(harness.state.clone()))
            .service(web::scope("/api/doctor").configure(configure))
    }

    fn sample_doctor(email: &str) -> NewDoctor {
        NewDoctor {
            name: "Dr. Meera Iyer".into(),
            email: email.into(),
            password: "a-strong-password".into(),
            image_source: Url::parse("https://cdn.test/meera.png").expect("url"),
            speciality: "Dermatologist".into(),
            speciality_list: vec!["Dermatologist".into()],
            degree: "MBBS, MD".into(),
            experience: "6 Years".into(),
            about: "Skin and allergy care.".into(),
            fees: 400,
            address: crate::domain::Address {
                line1: "12 Marine Drive".into(),
                line2: "Mumbai".into(),
            },
            languages: vec!["English".into(), "Hindi".into()],
        }
    }

    async fn login_doctor<S, B>(app: &S, harness: &TestHarness, email: &str) -> String
    where
        S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
        B: actix_web::body::MessageBody,
    {
        let doctor_id = harness
            .state
            .directory
            .add_doctor(sample_doctor(email))
            .await
            .expect("doctor added");

        let request = actix_test::TestRequest::post()
            .uri("/api/doctor/login")
            .set_json(LoginRequest {
                email: email.into(),
                password: "a-strong-password".into(),
            })
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(app, request).await;
        assert_eq!(body["success"], true, "login failed: {body}");

        let otp = harness
            .otp_code(&doctor_id.to_string(), OtpPurpose::Login, OtpChannel::Email)
            .await;
        let request = actix_test::TestRequest::post()
            .uri("/api/doctor/verify-login-otp")
            .set_json(VerifyLoginRequest {
                email: email.into(),
                otp,
            })
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(app, request).await;
        assert_eq!(body["success"], true, "otp exchange failed: {body}");
        body["dtoken"].as_str().expect("dtoken present").to_owned()
    }

    #[actix_web::test]
    async fn two_step_login_yields_a_working_token() {
        let harness = TestHarness::new();
        let app = actix_test::init_service(test_app(&harness)).await;
        let dtoken = login_doctor(&app, &harness, "meera@clinic.test").await;

        let request = actix_test::TestRequest::get()
            .uri("/api/doctor/profile")
            .insert_header(("dtoken", dtoken))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["profileData"]["email"], "meera@clinic.test");
        assert!(body["profileData"].get("passwordHash").is_none());
    }

    #[actix_web::test]
    async fn public_list_omits_email_addresses() {
        let harness = TestHarness::new();
        let app = actix_test::init_service(test_app(&harness)).await;
        harness
            .state
            .directory
            .add_doctor(sample_doctor("meera@clinic.test"))
            .await
            .expect("doctor added");

        let request = actix_test::TestRequest::get()
            .uri("/api/doctor/list")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["success"], true);
        let roster = body["doctors"].as_array().expect("array");
        assert_eq!(roster.len(), 1);
        assert!(roster[0].get("email").is_none());
        assert_eq!(roster[0]["available"], true);
    }

    #[actix_web::test]
    async fn availability_toggle_reports_the_new_value() {
        let harness = TestHarness::new();
        let app = actix_test::init_service(test_app(&harness)).await;
        let dtoken = login_doctor(&app, &harness, "meera@clinic.test").await;

        let request = actix_test::TestRequest::post()
            .uri("/api/doctor/change-availability")
            .insert_header(("dtoken", dtoken.clone()))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["available"], false);

        let request = actix_test::TestRequest::post()
            .uri("/api/doctor/change-availability")
            .insert_header(("dtoken", dtoken))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["available"], true);
    }

    #[actix_web::test]
    async fn blocked_slot_shows_in_the_ledger_and_moves() {
        let harness = TestHarness::new();
        let app = actix_test::init_service(test_app(&harness)).await;
        let dtoken = login_doctor(&app, &harness, "meera@clinic.test").await;

        let request = actix_test::TestRequest::post()
            .uri("/api/doctor/create-slot")
            .insert_header(("dtoken", dtoken.clone()))
            .set_json(serde_json::json!({
                "slotDate": "2025-01-10",
                "slotTime": "10:00 AM",
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["success"], true);

        let request = actix_test::TestRequest::post()
            .uri("/api/doctor/update-slot")
            .insert_header(("dtoken", dtoken.clone()))
            .set_json(serde_json::json!({
                "slotDate": "2025-01-10",
                "oldSlotTime": "10:00 AM",
                "newSlotTime": "11:00 AM",
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["success"], true);

        let request = actix_test::TestRequest::get()
            .uri("/api/doctor/slots")
            .insert_header(("dtoken", dtoken))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(
            body["slotsBooked"],
            serde_json::json!({ "2025-01-10": ["11:00 AM"] })
        );
    }

    #[actix_web::test]
    async fn patient_token_cannot_open_doctor_routes() {
        let harness = TestHarness::new();
        let app = actix_test::init_service(test_app(&harness)).await;

        let request = actix_test::TestRequest::get()
            .uri("/api/doctor/appointments")
            .insert_header(("dtoken", "not-a-session"))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "unauthorized");
        assert_eq!(body["message"], "Not authorized, login again");
    }

    #[actix_web::test]
    async fn reset_password_allows_a_fresh_login() {
        let harness = TestHarness::new();
        let app = actix_test::init_service(test_app(&harness)).await;
        let doctor_id = harness
            .state
            .directory
            .add_doctor(sample_doctor("meera@clinic.test"))
            .await
            .expect("doctor added");

        let request = actix_test::TestRequest::post()
            .uri("/api/doctor/forgot-password")
            .set_json(ForgotPasswordRequest {
                email: "meera@clinic.test".into(),
            })
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["success"], true);

        let otp = harness
            .otp_code(
                &doctor_id.to_string(),
                OtpPurpose::PasswordReset,
                OtpChannel::Email,
            )
            .await;
        let request = actix_test::TestRequest::post()
            .uri("/api/doctor/reset-password")
            .set_json(ResetPasswordRequest {
                email: "meera@clinic.test".into(),
                otp,
                new_password: "a-fresh-password".into(),
            })
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["success"], true);

        let request = actix_test::TestRequest::post()
            .uri("/api/doctor/login")
            .set_json(LoginRequest {
                email: "meera@clinic.test".into(),
                password: "a-fresh-password".into(),
            })
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["success"], true, "login with new password: {body}");
    }
}
