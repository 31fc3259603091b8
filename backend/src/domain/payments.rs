//! Bridge between appointments and the hosted payment gateway.
//!
//! Orders are opened in minor currency units (fee × 100) with the
//! appointment id as the gateway receipt, which is how a verified payment
//! finds its way back to the appointment.

use std::sync::Arc;

use super::appointment::AppointmentId;
use super::error::{DomainError, DomainResult};
use super::patient::PatientId;
use super::ports::{
    AppointmentRepository, AppointmentRepositoryError, OrderRequest, OrderStatus, PaymentGateway,
    PaymentGatewayError, PaymentOrder,
};

/// Opens and settles payment orders for appointments.
pub struct PaymentService {
    appointments: Arc<dyn AppointmentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl PaymentService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        currency: String,
    ) -> Self {
        Self {
            appointments,
            gateway,
            currency,
        }
    }

    /// Open a gateway order for an unpaid appointment. The caller must be
    /// the booking patient.
    pub async fn create_order(
        &self,
        patient_id: &PatientId,
        appointment_id: &AppointmentId,
    ) -> DomainResult<PaymentOrder> {
        let appointment = self
            .appointments
            .find_by_id(appointment_id)
            .await
            .map_err(repo_error)?
            .filter(|appointment| !appointment.cancelled)
            .ok_or_else(|| DomainError::conflict("Appointment cancelled or not found"))?;
        if appointment.patient_id != *patient_id {
            return Err(DomainError::unauthorized("Unauthorized action"));
        }
        if appointment.payment {
            return Err(DomainError::conflict("Appointment already paid"));
        }

        let request = OrderRequest {
            amount_minor: appointment.amount * 100,
            currency: self.currency.clone(),
            receipt: appointment.id.to_string(),
        };
        self.gateway
            .create_order(&request)
            .await
            .map_err(gateway_error)
    }

    /// Check an order with the gateway and, when it reports paid, flag the
    /// appointment named in the receipt.
    pub async fn verify_order(&self, order_id: &str) -> DomainResult<()> {
        let order = self
            .gateway
            .fetch_order(order_id)
            .await
            .map_err(gateway_error)?;
        if order.status != OrderStatus::Paid {
            return Err(DomainError::conflict("Payment not completed"));
        }
        let appointment_id: AppointmentId = order
            .receipt
            .parse()
            .map_err(|_| DomainError::internal("gateway receipt is not an appointment id"))?;
        let updated = self
            .appointments
            .mark_paid(&appointment_id)
            .await
            .map_err(repo_error)?;
        if !updated {
            return Err(DomainError::not_found("Appointment not found"));
        }
        Ok(())
    }
}

fn repo_error(error: AppointmentRepositoryError) -> DomainError {
    tracing::error!(%error, "appointment repository failure");
    DomainError::internal("storage unavailable")
}

fn gateway_error(error: PaymentGatewayError) -> DomainError {
    tracing::warn!(%error, "payment gateway call failed");
    match error {
        PaymentGatewayError::UnknownOrder { .. } => DomainError::not_found("Order not found"),
        PaymentGatewayError::Transport { .. } | PaymentGatewayError::Rejected { .. } => {
            DomainError::upstream("payment gateway unavailable")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::appointment::tests::{sample_doctor_snapshot, sample_patient_snapshot};
    use crate::domain::appointment::Appointment;
    use crate::domain::doctor::{SlotDate, SlotTime};
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{MockAppointmentRepository, MockPaymentGateway};
    use chrono::Utc;
    use mockall::predicate::eq;

    fn appointment() -> Appointment {
        Appointment::book(
            sample_patient_snapshot(),
            sample_doctor_snapshot(),
            SlotDate::parse("2025-01-10").expect("valid date"),
            SlotTime::parse("10:00 AM").expect("valid time"),
            Utc::now(),
        )
    }

    fn service(
        appointments: MockAppointmentRepository,
        gateway: MockPaymentGateway,
    ) -> PaymentService {
        PaymentService::new(Arc::new(appointments), Arc::new(gateway), "INR".to_owned())
    }

    #[tokio::test]
    async fn order_amount_is_fee_in_minor_units() {
        let appointment = appointment();
        let patient_id = appointment.patient_id;
        let receipt = appointment.id.to_string();
        let expected_receipt = receipt.clone();
        let appointment_id = appointment.id;

        let mut appointments = MockAppointmentRepository::new();
        appointments
            .expect_find_by_id()
            .with(eq(appointment_id))
            .times(1)
            .returning(move |_| Ok(Some(appointment.clone())));

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_order()
            .withf(move |request| {
                request.amount_minor == 50_000
                    && request.currency == "INR"
                    && request.receipt == expected_receipt
            })
            .times(1)
            .returning(move |request| {
                Ok(PaymentOrder {
                    id: "order_1".to_owned(),
                    status: OrderStatus::Created,
                    receipt: request.receipt.clone(),
                    amount_minor: request.amount_minor,
                    currency: request.currency.clone(),
                })
            });

        let order = service(appointments, gateway)
            .create_order(&patient_id, &appointment_id)
            .await
            .expect("order opened");
        assert_eq!(order.receipt, receipt);
    }

    #[tokio::test]
    async fn cancelled_appointment_cannot_open_an_order() {
        let mut appointment = appointment();
        appointment.cancelled = true;
        let patient_id = appointment.patient_id;
        let appointment_id = appointment.id;

        let mut appointments = MockAppointmentRepository::new();
        appointments
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(appointment.clone())));

        let error = service(appointments, MockPaymentGateway::new())
            .create_order(&patient_id, &appointment_id)
            .await
            .expect_err("cancelled appointment");
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(error.message(), "Appointment cancelled or not found");
    }

    #[tokio::test]
    async fn unpaid_order_does_not_mark_the_appointment() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_fetch_order().times(1).returning(|order_id| {
            Ok(PaymentOrder {
                id: order_id.to_owned(),
                status: OrderStatus::Created,
                receipt: AppointmentId::random().to_string(),
                amount_minor: 50_000,
                currency: "INR".to_owned(),
            })
        });

        let mut appointments = MockAppointmentRepository::new();
        appointments.expect_mark_paid().times(0);

        let error = service(appointments, gateway)
            .verify_order("order_1")
            .await
            .expect_err("order not paid");
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(error.message(), "Payment not completed");
    }

    #[tokio::test]
    async fn paid_order_marks_the_receipt_appointment() {
        let appointment_id = AppointmentId::random();
        let receipt = appointment_id.to_string();

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_fetch_order()
            .with(eq("order_1"))
            .times(1)
            .returning(move |order_id| {
                Ok(PaymentOrder {
                    id: order_id.to_owned(),
                    status: OrderStatus::Paid,
                    receipt: receipt.clone(),
                    amount_minor: 50_000,
                    currency: "INR".to_owned(),
                })
            });

        let mut appointments = MockAppointmentRepository::new();
        appointments
            .expect_mark_paid()
            .with(eq(appointment_id))
            .times(1)
            .returning(|_| Ok(true));

        service(appointments, gateway)
            .verify_order("order_1")
            .await
            .expect("payment recorded");
    }
}
