//! Port for hosting profile images.

use async_trait::async_trait;
use url::Url;

/// Errors raised by image store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageStoreError {
    /// The store could not be reached.
    #[error("image store transport failed: {message}")]
    Transport { message: String },
    /// The store refused the upload.
    #[error("image store rejected the upload: {message}")]
    Rejected { message: String },
}

/// Hosts profile images and returns a public URL for each upload.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Ingest the image at `source` and return its hosted URL.
    async fn upload(&self, source: &Url) -> Result<Url, ImageStoreError>;
}
