//! Integration tests for the remote-then-local segmentation workflow
//!
//! Every remote path runs against `MockRemoteService`, so no network access is
//! needed. Timeout tests use paused tokio time and finish instantly.

use bizposter::{
    segmentation::test_utils::{MockBehavior, MockRemoteService},
    BackgroundSegmenter, ImageIOService, SegmentationSource, SegmenterConfig,
};
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Dark subject block on a light, flat backdrop
fn studio_photo(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let subject = x > width / 3 && x < width * 2 / 3 && y > height / 4 && y < height * 9 / 10;
        if subject {
            Rgba([40, 30, 25, 255])
        } else {
            Rgba([235, 235, 240, 255])
        }
    });
    ImageIOService::encode_png(&image).unwrap()
}

fn segmenter_with(mock: &MockRemoteService) -> BackgroundSegmenter {
    BackgroundSegmenter::with_remote_service(SegmenterConfig::default(), Arc::new(mock.clone())).unwrap()
}

#[tokio::test]
async fn test_remote_success_returns_service_image() {
    let mock = MockRemoteService::new_succeeding();
    let segmenter = segmenter_with(&mock);

    let result = segmenter.segment(&studio_photo(120, 90)).await;

    assert!(result.success);
    assert_eq!(result.source, Some(SegmentationSource::Remote));
    assert_eq!(result.remote_attempts, 1);
    assert_eq!(mock.call_count(), 1);

    let image = result.into_image().unwrap();
    assert_eq!(image.dimensions(), (64, 64));
    assert_eq!(image.get_pixel(0, 0)[3], 0);
    assert_eq!(image.get_pixel(32, 32)[3], 255);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_server_error() {
    let mock = MockRemoteService::new(vec![
        MockBehavior::HttpStatus(500),
        MockBehavior::Respond(MockRemoteService::cutout_png(40, 40)),
    ]);
    let segmenter = segmenter_with(&mock);

    let result = segmenter.segment(&studio_photo(120, 90)).await;

    assert_eq!(result.source, Some(SegmentationSource::Remote));
    assert_eq!(result.remote_attempts, 2);
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_persistent_server_error_falls_back_locally() {
    let mock = MockRemoteService::new_failing_status();
    let segmenter = segmenter_with(&mock);
    let photo = studio_photo(120, 90);

    let result = segmenter.segment(&photo).await;

    assert!(result.success);
    assert_eq!(result.source, Some(SegmentationSource::EdgeFloodFill));
    assert_eq!(result.remote_attempts, 2);
    assert_eq!(mock.call_count(), 2);
    assert_eq!(mock.get_call_history(), vec![photo.len(), photo.len()]);

    let image = result.into_image().unwrap();
    assert_eq!(image.dimensions(), (120, 90));
    assert_eq!(image.get_pixel(0, 0)[3], 0);
    assert_eq!(image.get_pixel(60, 60)[3], 255);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_service_times_out_then_falls_back() {
    let mock = MockRemoteService::new_hanging();
    let segmenter = segmenter_with(&mock);

    let start = tokio::time::Instant::now();
    let result = segmenter.segment(&studio_photo(80, 80)).await;

    assert!(result.success);
    assert_eq!(result.source, Some(SegmentationSource::EdgeFloodFill));
    assert_eq!(result.remote_attempts, 2);
    // Two 15 s timeouts plus one 1 s pause
    assert!(start.elapsed() >= Duration::from_secs(31));
    assert!(start.elapsed() < Duration::from_secs(40));
}

#[tokio::test]
async fn test_short_body_is_rejected_and_falls_back() {
    let config = SegmenterConfig::builder().max_attempts(1).build().unwrap();
    let mock = MockRemoteService::new_short_body();
    let segmenter = BackgroundSegmenter::with_remote_service(config, Arc::new(mock.clone())).unwrap();

    let result = segmenter.segment(&studio_photo(60, 60)).await;

    assert_eq!(result.source, Some(SegmentationSource::EdgeFloodFill));
    assert_eq!(result.remote_attempts, 1);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_undecodable_remote_body_falls_back() {
    let config = SegmenterConfig::builder().max_attempts(1).build().unwrap();
    let mock = MockRemoteService::new(vec![MockBehavior::Respond(vec![0xAB; 4096])]);
    let segmenter = BackgroundSegmenter::with_remote_service(config, Arc::new(mock)).unwrap();

    let result = segmenter.segment(&studio_photo(60, 60)).await;

    assert!(result.success);
    assert_eq!(result.source, Some(SegmentationSource::EdgeFloodFill));
}

#[tokio::test(start_paused = true)]
async fn test_fully_transparent_remote_cutout_falls_back() {
    // Varied colour keeps the body well above the minimum size
    let invisible = RgbaImage::from_fn(64, 64, |x, y| Rgba([(x * 4) as u8, (y * 4) as u8, ((x * y) % 256) as u8, 0]));
    let body = ImageIOService::encode_png(&invisible).unwrap();
    assert!(body.len() >= 100);

    let mock = MockRemoteService::new(vec![MockBehavior::Respond(body)]);
    let segmenter = segmenter_with(&mock);

    let result = segmenter.segment(&studio_photo(60, 60)).await;

    assert!(result.success);
    assert_eq!(result.source, Some(SegmentationSource::EdgeFloodFill));
    assert_eq!(result.remote_attempts, 2);
    assert_eq!(mock.call_count(), 2);
    assert!(result.opaque_pixel_count() > 0);
}

#[tokio::test]
async fn test_cancelled_before_start_skips_remote() {
    let mock = MockRemoteService::new_succeeding();
    let segmenter = segmenter_with(&mock);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = segmenter
        .segment_with_cancellation(&studio_photo(60, 60), &cancel)
        .await;

    assert!(result.success);
    assert_eq!(result.remote_attempts, 0);
    assert_eq!(mock.call_count(), 0);
    assert_ne!(result.source, Some(SegmentationSource::Remote));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_hanging_attempt() {
    let mock = MockRemoteService::new_hanging();
    let segmenter = segmenter_with(&mock);
    let cancel = CancellationToken::new();
    let photo = studio_photo(60, 60);

    let start = tokio::time::Instant::now();
    let (result, ()) = tokio::join!(segmenter.segment_with_cancellation(&photo, &cancel), async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        cancel.cancel();
    });

    assert!(result.success);
    assert_eq!(result.remote_attempts, 1);
    assert_eq!(mock.call_count(), 1);
    assert!(start.elapsed() < Duration::from_secs(15));
}

#[tokio::test]
async fn test_zero_attempts_disables_remote() {
    let config = SegmenterConfig::builder().max_attempts(0).build().unwrap();
    let mock = MockRemoteService::new_succeeding();
    let segmenter = BackgroundSegmenter::with_remote_service(config, Arc::new(mock.clone())).unwrap();

    assert!(!segmenter.has_remote());
    let result = segmenter.segment(&studio_photo(60, 60)).await;
    assert!(result.success);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_uniform_photo_uses_radial_fallback() {
    let image = RgbaImage::from_pixel(50, 50, Rgba([128, 128, 128, 255]));
    let bytes = ImageIOService::encode_png(&image).unwrap();
    let segmenter = BackgroundSegmenter::local_only(SegmenterConfig::default()).unwrap();

    let result = segmenter.segment(&bytes).await;

    assert_eq!(result.source, Some(SegmentationSource::RadialFallback));
    let cutout = result.into_image().unwrap();
    assert_eq!(cutout.get_pixel(25, 25)[3], 255);
    assert_eq!(cutout.get_pixel(0, 0)[3], 0);
}

#[tokio::test]
async fn test_local_segmentation_is_deterministic() {
    let segmenter = BackgroundSegmenter::local_only(SegmenterConfig::default()).unwrap();
    let photo = studio_photo(90, 70);

    let first = segmenter.segment(&photo).await.into_image().unwrap();
    let second = segmenter.segment(&photo).await.into_image().unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failed_decode_reports_failure_after_remote_failure() {
    let mock = MockRemoteService::new(vec![MockBehavior::HttpStatus(503)]);
    let config = SegmenterConfig::builder().max_attempts(1).build().unwrap();
    let segmenter = BackgroundSegmenter::with_remote_service(config, Arc::new(mock)).unwrap();

    let result = segmenter.segment(b"definitely not an image").await;

    assert!(!result.success);
    assert!(result.image.is_none());
    assert!(result.reason.is_some());
    assert_eq!(result.remote_attempts, 1);
}
