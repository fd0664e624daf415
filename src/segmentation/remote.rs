//! Remote background removal service client

use crate::config::SegmenterConfig;
use crate::error::{PosterError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, instrument};

/// A service that returns the subject of a photo as a transparent PNG
///
/// Implementations only perform the transport. Response validation, retries
/// and fallback belong to [`crate::segmentation::BackgroundSegmenter`].
#[async_trait]
pub trait RemoteSegmentationService: Send + Sync {
    /// Submit the photo and return the raw response body
    async fn remove_background(&self, image_bytes: &[u8]) -> Result<Vec<u8>>;

    /// Human readable service name for logs
    fn name(&self) -> &str;
}

/// Client for a remove.bg style multipart endpoint
pub struct RemoveBgClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for RemoveBgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoveBgClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl RemoveBgClient {
    /// Create a client from segmenter configuration
    ///
    /// # Errors
    /// - No API key configured
    /// - Failed to create HTTP client
    pub fn new(config: &SegmenterConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PosterError::invalid_config("Remote segmentation requires an API key"))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PosterError::network_error("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteSegmentationService for RemoveBgClient {
    #[instrument(skip(self, image_bytes), fields(endpoint = %self.endpoint, input_bytes = image_bytes.len()))]
    async fn remove_background(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        let part = Part::bytes(image_bytes.to_vec())
            .file_name("photo")
            .mime_str("application/octet-stream")
            .map_err(|e| PosterError::network_error("Failed to build multipart body", e))?;

        let form = Form::new()
            .part("image_file", part)
            .text("size", "auto")
            .text("format", "png");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PosterError::timeout(format!("Segmentation request timed out: {}", e))
                } else {
                    PosterError::network_error("Segmentation request failed", e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PosterError::Network(format!(
                "Segmentation service returned HTTP {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PosterError::network_error("Failed to read segmentation response", e))?;

        debug!(response_bytes = body.len(), "Segmentation response received");
        Ok(body.to_vec())
    }

    fn name(&self) -> &str {
        "remove.bg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let err = RemoveBgClient::new(&SegmenterConfig::default()).unwrap_err();
        assert!(matches!(err, PosterError::InvalidConfig(_)));

        let config = SegmenterConfig {
            api_key: Some("   ".to_string()),
            ..SegmenterConfig::default()
        };
        assert!(RemoveBgClient::new(&config).is_err());
    }

    #[test]
    fn test_client_debug_hides_key() {
        let config = SegmenterConfig::builder()
            .api_key("super-secret")
            .endpoint("http://127.0.0.1:9/removebg")
            .build()
            .unwrap();
        let client = RemoveBgClient::new(&config).unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("127.0.0.1"));
        assert!(!debug.contains("super-secret"));
        assert_eq!(client.name(), "remove.bg");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let config = SegmenterConfig::builder()
            .api_key("key")
            .endpoint("http://127.0.0.1:9/removebg")
            .timeout_secs(2)
            .build()
            .unwrap();
        let client = RemoveBgClient::new(&config).unwrap();
        let err = client.remove_background(b"bytes").await.unwrap_err();
        assert!(matches!(
            err,
            PosterError::Network(_) | PosterError::Timeout(_)
        ));
    }
}
