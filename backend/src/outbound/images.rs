//! Reqwest-backed adapter for the image-hosting service.
//!
//! Profile images arrive as remote URLs; the service ingests the source and
//! returns a stable hosted URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{ImageStore, ImageStoreError};

use super::mail::body_preview;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct UploadDto<'a> {
    source: &'a str,
}

#[derive(Deserialize)]
struct HostedDto {
    url: Url,
}

/// Image store adapter posting ingest requests to the hosting endpoint.
pub struct HttpImageStore {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl HttpImageStore {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, api_key: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn upload(&self, source: &Url) -> Result<Url, ImageStoreError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&UploadDto {
                source: source.as_str(),
            })
            .send()
            .await
            .map_err(|error| ImageStoreError::Transport {
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body));
        }
        let hosted: HostedDto =
            response
                .json()
                .await
                .map_err(|error| ImageStoreError::Rejected {
                    message: format!("unexpected hosting payload: {error}"),
                })?;
        Ok(hosted.url)
    }
}

fn map_status(status: StatusCode, body: &str) -> ImageStoreError {
    let preview = body_preview(body);
    if status.is_client_error() {
        ImageStoreError::Rejected {
            message: format!("{status}: {preview}"),
        }
    } else {
        ImageStoreError::Transport {
            message: format!("{status}: {preview}"),
        }
    }
}
