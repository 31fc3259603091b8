//! Reqwest-backed adapter for the hosted SMS provider.
//!
//! Speaks the provider's form-encoded messages API with basic authentication
//! against the account identifier and token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::domain::ports::{SmsError, SmsMessage, SmsSender};

use super::mail::body_preview;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// SMS adapter posting to the provider's messages endpoint.
pub struct HttpSmsSender {
    client: Client,
    endpoint: Url,
    account_sid: String,
    auth_token: String,
    sender: String,
}

impl HttpSmsSender {
    /// Build an adapter with the default request timeout. `base` is the
    /// provider API root; the account-scoped messages path is derived from
    /// it.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be constructed or the
    /// messages URL cannot be derived from `base`.
    pub fn new(
        base: &Url,
        account_sid: String,
        auth_token: String,
        sender: String,
    ) -> Result<Self, SmsAdapterError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(SmsAdapterError::Client)?;
        let endpoint = base
            .join(&format!("Accounts/{account_sid}/Messages.json"))
            .map_err(SmsAdapterError::Endpoint)?;
        Ok(Self {
            client,
            endpoint,
            account_sid,
            auth_token,
            sender,
        })
    }
}

/// Construction failures for [`HttpSmsSender`].
#[derive(Debug, thiserror::Error)]
pub enum SmsAdapterError {
    #[error("failed to construct http client: {0}")]
    Client(reqwest::Error),
    #[error("failed to derive messages endpoint: {0}")]
    Endpoint(url::ParseError),
}

#[async_trait]
impl SmsSender for HttpSmsSender {
    async fn send(&self, message: &SmsMessage) -> Result<(), SmsError> {
        let form = [
            ("To", message.to.as_str()),
            ("From", self.sender.as_str()),
            ("Body", message.body.as_str()),
        ];
        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|error| SmsError::Transport {
                message: error.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_status(status, &body))
    }
}

fn map_status(status: StatusCode, body: &str) -> SmsError {
    let preview = body_preview(body);
    if status.is_client_error() {
        SmsError::Rejected {
            message: format!("{status}: {preview}"),
        }
    } else {
        SmsError::Transport {
            message: format!("{status}: {preview}"),
        }
    }
}
