//! Test utilities and mock remote services
//!
//! [`MockRemoteService`] implements [`RemoteSegmentationService`] without any
//! network access so retry, timeout and fallback paths can be exercised
//! deterministically.

use crate::error::{PosterError, Result};
use crate::segmentation::remote::RemoteSegmentationService;
use crate::services::ImageIOService;
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::sync::{Arc, Mutex};

/// What a mock attempt does
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return these bytes as the response body
    Respond(Vec<u8>),
    /// Fail with a non-2xx status
    HttpStatus(u16),
    /// Never answer
    Hang,
}

/// Mock remote service that replays a script of behaviours
///
/// Once the script runs out the last behaviour repeats.
#[derive(Debug, Clone)]
pub struct MockRemoteService {
    script: Vec<MockBehavior>,
    /// Call history for verification in tests
    call_history: Arc<Mutex<Vec<usize>>>,
}

impl MockRemoteService {
    #[must_use]
    pub fn new(script: Vec<MockBehavior>) -> Self {
        Self {
            script,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Service that returns a valid cut-out PNG
    #[must_use]
    pub fn new_succeeding() -> Self {
        Self::new(vec![MockBehavior::Respond(Self::cutout_png(64, 64))])
    }

    /// Service that always fails with HTTP 500
    #[must_use]
    pub fn new_failing_status() -> Self {
        Self::new(vec![MockBehavior::HttpStatus(500)])
    }

    /// Service that never answers
    #[must_use]
    pub fn new_hanging() -> Self {
        Self::new(vec![MockBehavior::Hang])
    }

    /// Service that returns a body too small to be an image
    #[must_use]
    pub fn new_short_body() -> Self {
        Self::new(vec![MockBehavior::Respond(vec![0x89, b'P', b'N', b'G'])])
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.call_history.lock().map_or(0, |history| history.len())
    }

    /// Input sizes of every call made so far
    pub fn get_call_history(&self) -> Vec<usize> {
        self.call_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// A transparent-background PNG with an opaque centre square
    #[must_use]
    pub fn cutout_png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            let inside = x >= width / 4 && x < width * 3 / 4 && y >= height / 4 && y < height * 3 / 4;
            if inside {
                Rgba([200, 120, 80, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        ImageIOService::encode_png(&image).unwrap_or_default()
    }

    fn record_call(&self, input_len: usize) -> usize {
        match self.call_history.lock() {
            Ok(mut history) => {
                history.push(input_len);
                history.len() - 1
            },
            Err(_) => 0,
        }
    }
}

#[async_trait]
impl RemoteSegmentationService for MockRemoteService {
    async fn remove_background(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        let call = self.record_call(image_bytes.len());
        let behavior = self
            .script
            .get(call)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or(MockBehavior::HttpStatus(500));

        match behavior {
            MockBehavior::Respond(body) => Ok(body),
            MockBehavior::HttpStatus(status) => Err(PosterError::Network(format!(
                "Segmentation service returned HTTP {}",
                status
            ))),
            MockBehavior::Hang => {
                std::future::pending::<()>().await;
                Err(PosterError::internal("unreachable"))
            },
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
