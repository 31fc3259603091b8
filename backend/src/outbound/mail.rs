//! Reqwest-backed adapter for the hosted transactional-mail API.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping. Message content is rendered by the domain.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;

use crate::domain::ports::{EmailMessage, Mailer, MailerError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SendMailDto<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Mail adapter posting to a single provider endpoint.
pub struct HttpMailer {
    client: Client,
    endpoint: Url,
    api_key: String,
    sender: String,
}

impl HttpMailer {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, api_key: String, sender: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            sender,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        let payload = SendMailDto {
            from: &self.sender,
            to: message.to.as_str(),
            subject: &message.subject,
            html: &message.html,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| MailerError::Transport {
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

fn map_status(status: StatusCode, body: &str) -> MailerError {
    let preview = body_preview(body);
    if status.is_client_error() {
        MailerError::Rejected {
            message: format!("{status}: {preview}"),
        }
    } else {
        MailerError::Transport {
            message: format!("{status}: {preview}"),
        }
    }
}

pub(crate) fn body_preview(body: &str) -> String {
    const LIMIT: usize = 256;
    if body.len() <= LIMIT {
        body.to_owned()
    } else {
        let mut end = LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_and_transport_split_on_status_class() {
        assert!(matches!(
            map_status(StatusCode::UNPROCESSABLE_ENTITY, "bad address"),
            MailerError::Rejected { .. }
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, "upstream sad"),
            MailerError::Transport { .. }
        ));
    }

    #[test]
    fn long_bodies_are_truncated_in_errors() {
        let preview = body_preview(&"x".repeat(1000));
        assert!(preview.chars().count() <= 257);
        assert!(preview.ends_with('…'));
    }
}
