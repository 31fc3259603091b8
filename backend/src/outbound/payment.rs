//! Reqwest-backed adapter for the hosted payment gateway.
//!
//! Orders are created and fetched over the gateway's JSON orders API with
//! basic authentication against the key pair. Wire amounts are already in
//! minor units, matching the domain's `amount_minor`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{
    OrderRequest, OrderStatus, PaymentGateway, PaymentGatewayError, PaymentOrder,
};

use super::mail::body_preview;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Serialize)]
struct CreateOrderDto<'a> {
    amount: u64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Deserialize)]
struct OrderDto {
    id: String,
    status: OrderStatus,
    receipt: String,
    amount: u64,
    currency: String,
}

impl From<OrderDto> for PaymentOrder {
    fn from(dto: OrderDto) -> Self {
        Self {
            id: dto.id,
            status: dto.status,
            receipt: dto.receipt,
            amount_minor: dto.amount,
            currency: dto.currency,
        }
    }
}

/// Payment gateway adapter over the hosted orders API.
pub struct HttpPaymentGateway {
    client: Client,
    orders_url: Url,
    key_id: String,
    key_secret: String,
}

impl HttpPaymentGateway {
    /// Build an adapter with the default request timeout. `base` is the
    /// gateway API root.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be constructed or the orders
    /// URL cannot be derived from `base`.
    pub fn new(
        base: &Url,
        key_id: String,
        key_secret: String,
    ) -> Result<Self, PaymentAdapterError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(PaymentAdapterError::Client)?;
        let orders_url = base.join("orders/").map_err(PaymentAdapterError::Endpoint)?;
        Ok(Self {
            client,
            orders_url,
            key_id,
            key_secret,
        })
    }

    async fn decode_order(
        response: reqwest::Response,
    ) -> Result<PaymentOrder, PaymentGatewayError> {
        let body = response
            .bytes()
            .await
            .map_err(|error| PaymentGatewayError::Transport {
                message: error.to_string(),
            })?;
        let dto: OrderDto =
            serde_json::from_slice(&body).map_err(|error| PaymentGatewayError::Rejected {
                message: format!("unexpected gateway payload: {error}"),
            })?;
        Ok(dto.into())
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<PaymentOrder, PaymentGatewayError> {
        let payload = CreateOrderDto {
            amount: request.amount_minor,
            currency: &request.currency,
            receipt: &request.receipt,
        };
        let response = self
            .client
            .post(self.orders_url.clone())
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&payload)
            .send()
            .await
            .map_err(|error| PaymentGatewayError::Transport {
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body, None));
        }
        Self::decode_order(response).await
    }

    async fn fetch_order(&self, order_id: &str) -> Result<PaymentOrder, PaymentGatewayError> {
        let url = self
            .orders_url
            .join(order_id)
            .map_err(|error| PaymentGatewayError::Rejected {
                message: format!("invalid order id: {error}"),
            })?;
        let response = self
            .client
            .get(url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|error| PaymentGatewayError::Transport {
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body, Some(order_id)));
        }
        Self::decode_order(response).await
    }
}

/// Construction failures for [`HttpPaymentGateway`].
#[derive(Debug, thiserror::Error)]
pub enum PaymentAdapterError {
    #[error("failed to construct http client: {0}")]
    Client(reqwest::Error),
    #[error("failed to derive orders endpoint: {0}")]
    Endpoint(url::ParseError),
}

fn map_status(status: StatusCode, body: &str, order_id: Option<&str>) -> PaymentGatewayError {
    if status == StatusCode::NOT_FOUND {
        if let Some(order_id) = order_id {
            return PaymentGatewayError::UnknownOrder {
                order_id: order_id.to_owned(),
            };
        }
    }
    let preview = body_preview(body);
    if status.is_client_error() {
        PaymentGatewayError::Rejected {
            message: format!("{status}: {preview}"),
        }
    } else {
        PaymentGatewayError::Transport {
            message: format!("{status}: {preview}"),
        }
    }
}
