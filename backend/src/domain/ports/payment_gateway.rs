//! Port for the externally hosted payment gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors raised by payment gateway adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentGatewayError {
    /// The gateway could not be reached.
    #[error("payment gateway transport failed: {message}")]
    Transport { message: String },
    /// The gateway rejected the request.
    #[error("payment gateway rejected the request: {message}")]
    Rejected { message: String },
    /// The referenced order does not exist at the gateway.
    #[error("payment order {order_id} not found")]
    UnknownOrder { order_id: String },
}

/// Status reported by the gateway for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Attempted,
    Paid,
    #[serde(other)]
    Unknown,
}

/// Request to open a hosted payment order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Amount in minor currency units (fee × 100).
    pub amount_minor: u64,
    /// ISO currency code, e.g. `INR`.
    pub currency: String,
    /// Opaque receipt tag; this system uses the appointment id.
    pub receipt: String,
}

/// A hosted payment order as known to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub id: String,
    pub status: OrderStatus,
    pub receipt: String,
    pub amount_minor: u64,
    pub currency: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted order the client checkout can settle.
    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<PaymentOrder, PaymentGatewayError>;

    /// Fetch an order's current state from the gateway.
    async fn fetch_order(&self, order_id: &str) -> Result<PaymentOrder, PaymentGatewayError>;
}
