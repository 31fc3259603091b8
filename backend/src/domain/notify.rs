//! Outbound notification dispatch: OTP delivery and appointment lifecycle
//! emails.
//!
//! Dispatch failures surface as [`ErrorCode::Upstream`] errors naming the
//! recipients that failed; they never roll back domain state that was
//! already committed.

use std::sync::Arc;

use futures_util::future;

use super::appointment::Appointment;
use super::error::{DomainError, DomainResult};
use super::otp::{OtpPurpose, OtpRecipient};
use super::ports::{EmailMessage, Mailer, SmsMessage, SmsSender};

/// Appointment lifecycle changes that notify both parties by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentEvent {
    /// The doctor or an administrator confirmed the appointment.
    Accepted,
    /// The consultation took place.
    Completed,
    /// A meeting link for the consultation.
    MeetingLink(String),
}

impl AppointmentEvent {
    fn subject(&self) -> &'static str {
        match self {
            Self::Accepted => "Your appointment is confirmed",
            Self::Completed => "Your appointment is complete",
            Self::MeetingLink(_) => "Your appointment meeting link",
        }
    }
}

/// Fans notifications out to the mail and SMS providers.
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    sms: Arc<dyn SmsSender>,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, sms: Arc<dyn SmsSender>) -> Self {
        Self { mailer, sms }
    }

    /// Deliver a one-time code over the recipient's channel.
    pub async fn send_otp(
        &self,
        recipient: &OtpRecipient,
        purpose: OtpPurpose,
        code: &str,
    ) -> DomainResult<()> {
        match recipient {
            OtpRecipient::Email(address) => {
                let message = EmailMessage {
                    to: address.clone(),
                    subject: otp_subject(purpose).to_owned(),
                    html: format!(
                        "<p>Your verification code is <strong>{code}</strong>. \
                         It expires in 10 minutes.</p>"
                    ),
                };
                self.mailer.send(&message).await.map_err(|error| {
                    tracing::warn!(recipient = %address, %error, "otp email dispatch failed");
                    DomainError::upstream("failed to send verification email")
                })
            }
            OtpRecipient::Sms(number) => {
                let message = SmsMessage {
                    to: number.clone(),
                    body: format!("{code} is your verification code. Valid for 10 minutes."),
                };
                self.sms.send(&message).await.map_err(|error| {
                    tracing::warn!(recipient = %number, %error, "otp sms dispatch failed");
                    DomainError::upstream("failed to send verification sms")
                })
            }
        }
    }

    /// Email both appointment parties about a lifecycle event.
    ///
    /// The two sends run concurrently; if either fails the error names every
    /// recipient that did not get the message.
    pub async fn appointment_event(
        &self,
        appointment: &Appointment,
        event: &AppointmentEvent,
    ) -> DomainResult<()> {
        let patient_message = EmailMessage {
            to: appointment.patient_data.email.clone(),
            subject: event.subject().to_owned(),
            html: patient_body(appointment, event),
        };
        let doctor_message = EmailMessage {
            to: appointment.doctor_data.email.clone(),
            subject: event.subject().to_owned(),
            html: doctor_body(appointment, event),
        };

        let (patient_sent, doctor_sent) = future::join(
            self.mailer.send(&patient_message),
            self.mailer.send(&doctor_message),
        )
        .await;

        let mut failed = Vec::new();
        if let Err(error) = patient_sent {
            tracing::warn!(recipient = %patient_message.to, %error, "appointment email failed");
            failed.push(patient_message.to.to_string());
        }
        if let Err(error) = doctor_sent {
            tracing::warn!(recipient = %doctor_message.to, %error, "appointment email failed");
            failed.push(doctor_message.to.to_string());
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(DomainError::upstream(format!(
                "failed to notify: {}",
                failed.join(", ")
            )))
        }
    }
}

fn otp_subject(purpose: OtpPurpose) -> &'static str {
    match purpose {
        OtpPurpose::Registration => "Verify your account",
        OtpPurpose::Login => "Your login code",
        OtpPurpose::PasswordReset => "Reset your password",
    }
}

fn patient_body(appointment: &Appointment, event: &AppointmentEvent) -> String {
    let doctor = &appointment.doctor_data.name;
    let when = format!("{} at {}", appointment.slot_date, appointment.slot_time);
    match event {
        AppointmentEvent::Accepted => format!(
            "<p>Your appointment with {doctor} on {when} has been confirmed.</p>"
        ),
        AppointmentEvent::Completed => format!(
            "<p>Your appointment with {doctor} on {when} is complete. \
             Thank you for visiting.</p>"
        ),
        AppointmentEvent::MeetingLink(link) => format!(
            "<p>Join your appointment with {doctor} on {when} here: \
             <a href=\"{link}\">{link}</a></p>"
        ),
    }
}

fn doctor_body(appointment: &Appointment, event: &AppointmentEvent) -> String {
    let patient = &appointment.patient_data.name;
    let when = format!("{} at {}", appointment.slot_date, appointment.slot_time);
    match event {
        AppointmentEvent::Accepted => format!(
            "<p>Your appointment with {patient} on {when} has been confirmed.</p>"
        ),
        AppointmentEvent::Completed => format!(
            "<p>Your appointment with {patient} on {when} has been marked complete.</p>"
        ),
        AppointmentEvent::MeetingLink(link) => format!(
            "<p>Meeting link for your appointment with {patient} on {when}: \
             <a href=\"{link}\">{link}</a></p>"
        ),
    }
}
