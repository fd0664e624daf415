//! Background segmentation with remote service and local fallback
//!
//! [`BackgroundSegmenter`] tries the remote service a bounded number of times
//! and falls back to the local heuristic on any failure. Callers always get a
//! [`SegmentationResult`]; only undecodable input produces `success: false`.

pub mod heuristic;
pub mod remote;
pub mod test_utils;

pub use heuristic::{HeuristicOutcome, HeuristicParams};
pub use remote::{RemoteSegmentationService, RemoveBgClient};

use crate::config::SegmenterConfig;
use crate::error::{PosterError, Result};
use crate::services::ImageIOService;
use crate::tracing_config::{events, spans};
use crate::types::{SegmentationResult, SegmentationSource};
use image::RgbaImage;
use instant::Instant;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn, Instrument};

/// Orchestrates remote attempts and the local fallback
pub struct BackgroundSegmenter {
    config: SegmenterConfig,
    remote: Option<Arc<dyn RemoteSegmentationService>>,
}

impl std::fmt::Debug for BackgroundSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundSegmenter")
            .field("config", &self.config)
            .field("remote", &self.remote.as_ref().map(|service| service.name()))
            .finish()
    }
}

impl BackgroundSegmenter {
    /// Create a segmenter, wiring the HTTP client when an API key is configured
    ///
    /// # Errors
    /// - Invalid configuration
    /// - HTTP client construction failure
    pub fn new(config: SegmenterConfig) -> Result<Self> {
        config.validate()?;

        let remote: Option<Arc<dyn RemoteSegmentationService>> = if config.remote_enabled() {
            Some(Arc::new(RemoveBgClient::new(&config)?))
        } else {
            debug!("No API key configured, remote segmentation disabled");
            None
        };

        Ok(Self { config, remote })
    }

    /// Create a segmenter backed by a caller-supplied remote service
    ///
    /// The service is used regardless of `api_key`; `max_attempts = 0` still
    /// disables it.
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid
    pub fn with_remote_service(
        config: SegmenterConfig,
        service: Arc<dyn RemoteSegmentationService>,
    ) -> Result<Self> {
        config.validate()?;
        let remote = (config.max_attempts > 0).then_some(service);
        Ok(Self { config, remote })
    }

    /// Create a segmenter that never touches the network
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid
    pub fn local_only(config: SegmenterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            remote: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Segment encoded photo bytes
    pub async fn segment(&self, image_bytes: &[u8]) -> SegmentationResult {
        self.segment_with_cancellation(image_bytes, &CancellationToken::new())
            .await
    }

    /// Segment encoded photo bytes, abandoning remote work when `cancel` fires
    ///
    /// Cancellation skips straight to the local fallback; it never leaves the
    /// caller without a result.
    #[instrument(
        skip(self, image_bytes, cancel),
        fields(input_bytes = image_bytes.len(), remote = self.remote.is_some())
    )]
    pub async fn segment_with_cancellation(
        &self,
        image_bytes: &[u8],
        cancel: &CancellationToken,
    ) -> SegmentationResult {
        let start = Instant::now();
        let elapsed_ms = || start.elapsed().as_millis() as u64;

        if image_bytes.is_empty() {
            return SegmentationResult::failed("input image is empty", 0).with_elapsed_ms(elapsed_ms());
        }

        let mut remote_attempts = 0;
        if let Some(service) = &self.remote {
            let (image, attempts) = self.run_remote(service.as_ref(), image_bytes, cancel).await;
            remote_attempts = attempts;

            if let Some(image) = image {
                info!(
                    attempts,
                    width = image.width(),
                    height = image.height(),
                    "Remote segmentation succeeded"
                );
                return SegmentationResult::succeeded(image, SegmentationSource::Remote, attempts)
                    .with_elapsed_ms(elapsed_ms());
            }

            events::fallback_engaged("remote attempts exhausted", attempts);
        } else {
            events::fallback_engaged("remote service not configured", 0);
        }

        let result = match self.run_local(image_bytes.to_vec()).await {
            Ok(outcome) => {
                debug!(source = %outcome.source, "Local segmentation finished");
                SegmentationResult::succeeded(outcome.image, outcome.source, remote_attempts)
            },
            Err(e) => {
                warn!(error = %e, "Segmentation failed");
                SegmentationResult::failed(e.to_string(), remote_attempts)
            },
        };

        result.with_elapsed_ms(elapsed_ms())
    }

    /// Bounded retry loop; returns the image (if any) and attempts made
    async fn run_remote(
        &self,
        service: &dyn RemoteSegmentationService,
        image_bytes: &[u8],
        cancel: &CancellationToken,
    ) -> (Option<RgbaImage>, u32) {
        let max_attempts = self.config.max_attempts;
        let mut attempts = 0;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                debug!("Remote segmentation cancelled before attempt {}", attempt);
                break;
            }
            attempts = attempt;

            let outcome = self
                .attempt_remote(service, image_bytes, cancel)
                .instrument(spans::remote_attempt(service.name(), attempt, max_attempts))
                .await;
            match outcome {
                Ok(image) => return (Some(image), attempts),
                Err(e) => events::remote_attempt_failed(service.name(), attempt, max_attempts, &e),
            }

            if attempt < max_attempts {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.config.retry_backoff()) => {},
                }
            }
        }

        (None, attempts)
    }

    /// One remote call under the per-attempt timeout
    async fn attempt_remote(
        &self,
        service: &dyn RemoteSegmentationService,
        image_bytes: &[u8],
        cancel: &CancellationToken,
    ) -> Result<RgbaImage> {
        let body = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(PosterError::timeout("remote segmentation cancelled"));
            },
            outcome = tokio::time::timeout(self.config.timeout(), service.remove_background(image_bytes)) => {
                outcome.map_err(|_| {
                    PosterError::timeout(format!(
                        "no response within {}s",
                        self.config.timeout_secs
                    ))
                })??
            },
        };

        decode_remote_response(&body, self.config.min_response_bytes)
    }

    /// Decode and run the heuristic off the async runtime
    async fn run_local(&self, image_bytes: Vec<u8>) -> Result<HeuristicOutcome> {
        let params = HeuristicParams::from(&self.config);

        tokio::task::spawn_blocking(move || {
            let image = ImageIOService::load_from_bytes(&image_bytes)?.to_rgba8();
            Ok(heuristic::segment(&image, &params))
        })
        .await
        .map_err(|e| PosterError::internal(format!("Local segmentation task failed: {}", e)))?
    }
}

/// Validate a remote response body and decode it
///
/// # Errors
/// - Body shorter than `min_bytes`
/// - Body that does not decode or decodes to a zero-size image
/// - Image whose every pixel is fully transparent
pub fn decode_remote_response(body: &[u8], min_bytes: usize) -> Result<RgbaImage> {
    if body.len() < min_bytes {
        return Err(PosterError::decode(format!(
            "response of {} bytes is below the {} byte minimum",
            body.len(),
            min_bytes
        )));
    }

    let image = ImageIOService::load_from_bytes(body)?.to_rgba8();
    if !image.pixels().any(|p| p[3] > 0) {
        return Err(PosterError::decode("remote cutout has no opaque pixels"));
    }

    Ok(image)
}
