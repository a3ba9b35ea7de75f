use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::ImageLocator;
use reqwest::Client;
use tracing::debug;

use crate::error::ImageFetchError;

/// Fetches poster bytes. Must be safe to call repeatedly for the same locator.
#[async_trait]
pub trait ImageLoading: Send + Sync {
    /// # Errors
    ///
    /// Returns `ImageFetchError` when the poster cannot be fetched.
    async fn fetch_bytes(&self, locator: &ImageLocator) -> Result<Vec<u8>, ImageFetchError>;
}

#[derive(Clone)]
pub struct HttpImageLoader {
    client: Client,
    timeout: Duration,
}

impl Default for HttpImageLoader {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl HttpImageLoader {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl ImageLoading for HttpImageLoader {
    async fn fetch_bytes(&self, locator: &ImageLocator) -> Result<Vec<u8>, ImageFetchError> {
        debug!(%locator, "fetching poster");
        let url = locator
            .to_url()
            .map_err(|err| ImageFetchError::InvalidLocator {
                locator: locator.to_string(),
                reason: err.to_string(),
            })?;

        let response = self.client.get(url).timeout(self.timeout).send().await?;
        if !response.status().is_success() {
            return Err(ImageFetchError::HttpStatus(response.status()));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ImageFetchError::Empty);
        }
        Ok(bytes.to_vec())
    }
}
