#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Bizposter
//!
//! Turns a business owner's photo into a promotional poster: the subject is
//! cut out of the photo, scaled onto template artwork, and annotated with the
//! business's tagline and contact details.
//!
//! ## Features
//!
//! - **Remote segmentation**: remove.bg style multipart API with a hard
//!   timeout and bounded retries
//! - **Local fallback**: deterministic edge detection plus border-seeded flood
//!   fill, with a radial vignette when the fill swallows the whole frame
//! - **Poster compositing**: fixed 1040x1200 layout with tagline wrapping and a
//!   contact block that moves clear of long taglines
//! - **CLI Integration**: optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bizposter::{
//!     generate_poster, BackgroundSegmenter, CompositorConfig, FontTextRenderer,
//!     ImageIOService, PosterCompositor, PosterText, SegmenterConfig,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let segmenter = BackgroundSegmenter::new(SegmenterConfig::from_env())?;
//! let compositor = PosterCompositor::new(
//!     CompositorConfig::default(),
//!     Arc::new(FontTextRenderer::from_file("fonts/Poppins-Bold.ttf")?),
//! )?;
//!
//! let photo = std::fs::read("owner.jpg")?;
//! let template = ImageIOService::load_asset("template.png")?;
//! let text = PosterText::resolve("Sharma Sweets", "Bakery", "+91 98765 43210", "");
//!
//! let generated = generate_poster(&photo, template, &text, &segmenter, &compositor).await?;
//! generated.poster.save_png("poster.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line interface, progress spinner and subscriber setup
//! - `webp-support` (default): WebP input decoding
//! - `tracing-json`: JSON log output for the CLI

#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod error;
pub mod profile;
pub mod segmentation;
pub mod services;
pub mod tracing_config;
pub mod types;
pub mod utils;

use image::DynamicImage;
use std::sync::Arc;
use tracing::instrument;

// Public API exports
pub use compositor::{
    wrap_tagline, FontTextRenderer, PosterCompositor, PosterLayout, RecordingTextRenderer,
    TextRenderer, TextStyle,
};
pub use config::{CompositorConfig, SegmenterConfig};
pub use error::{PosterError, Result};
pub use profile::{CompanyProfile, PosterText};
pub use segmentation::{
    BackgroundSegmenter, HeuristicParams, RemoteSegmentationService, RemoveBgClient,
};
pub use services::ImageIOService;
pub use types::{
    BackgroundMask, ComposedPoster, GeneratedPoster, MaskStatistics, PosterSpec,
    SegmentationResult, SegmentationSource,
};
pub use utils::{UploadLimits, UploadValidator};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};
pub use tracing_config::{events, spans};

/// Segment encoded photo bytes with a one-off segmenter
///
/// Remote failures never surface here; they fall back to local segmentation.
/// The result is unsuccessful only when the bytes cannot be decoded.
///
/// # Errors
/// Only for invalid configuration or HTTP client construction failure
///
/// # Examples
/// ```rust,no_run
/// use bizposter::{segment_foreground, SegmenterConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let bytes = std::fs::read("owner.jpg")?;
/// let result = segment_foreground(&bytes, &SegmenterConfig::from_env()).await?;
/// if result.success {
///     std::fs::write("cutout.png", result.to_png_bytes()?)?;
/// }
/// # Ok(())
/// # }
/// ```
pub async fn segment_foreground(image_bytes: &[u8], config: &SegmenterConfig) -> Result<SegmentationResult> {
    let segmenter = BackgroundSegmenter::new(config.clone())?;
    Ok(segmenter.segment(image_bytes).await)
}

/// Render a poster with a one-off compositor
///
/// # Errors
/// - Invalid configuration
/// - `AssetLoad` for unusable template or foreground
/// - Text drawing or PNG encoding failures
pub fn compose_poster(
    spec: &PosterSpec,
    config: &CompositorConfig,
    renderer: Arc<dyn TextRenderer>,
) -> Result<ComposedPoster> {
    PosterCompositor::new(config.clone(), renderer)?.compose(spec)
}

/// Segment a photo and compose it onto a template
///
/// Compositing runs on the blocking pool.
///
/// # Errors
/// - `Decode` when the photo cannot be decoded
/// - Everything [`PosterCompositor::compose`] can return
#[instrument(skip_all, fields(photo_bytes = photo_bytes.len()))]
pub async fn generate_poster(
    photo_bytes: &[u8],
    template: DynamicImage,
    text: &PosterText,
    segmenter: &BackgroundSegmenter,
    compositor: &PosterCompositor,
) -> Result<GeneratedPoster> {
    let segmentation = segmenter.segment(photo_bytes).await;
    let source = segmentation.source;
    let remote_attempts = segmentation.remote_attempts;
    let cutout = segmentation.into_image()?;
    let segmentation_source =
        source.ok_or_else(|| PosterError::internal("successful segmentation without a source"))?;

    let spec = PosterSpec {
        company_name: text.company_name.clone(),
        business_type: text.business_type.clone(),
        phone_number: text.phone_number.clone(),
        tagline: text.tagline.clone(),
        foreground: DynamicImage::ImageRgba8(cutout.clone()),
        template,
    };

    let compositor = compositor.clone();
    let poster = tokio::task::spawn_blocking(move || compositor.compose(&spec))
        .await
        .map_err(|e| PosterError::internal(format!("Compositing task failed: {}", e)))??;

    Ok(GeneratedPoster {
        poster,
        cutout,
        segmentation_source,
        remote_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[tokio::test]
    async fn test_segment_foreground_without_key_runs_locally() {
        let photo = RgbaImage::from_fn(60, 60, |x, y| {
            if (20..40).contains(&x) && (15..50).contains(&y) {
                Rgba([20, 20, 20, 255])
            } else {
                Rgba([240, 240, 240, 255])
            }
        });
        let bytes = ImageIOService::encode_png(&photo).unwrap();
        let config = SegmenterConfig::default();

        let result = segment_foreground(&bytes, &config).await.unwrap();
        assert!(result.success);
        assert_eq!(result.remote_attempts, 0);
        assert!(result.opaque_pixel_count() > 0);
    }

    #[tokio::test]
    async fn test_segment_foreground_invalid_config() {
        let config = SegmenterConfig {
            timeout_secs: 0,
            ..SegmenterConfig::default()
        };
        assert!(segment_foreground(b"bytes", &config).await.is_err());
    }

    #[test]
    fn test_compose_poster_dimensions() {
        let spec = PosterSpec {
            company_name: String::new(),
            business_type: String::new(),
            phone_number: String::new(),
            tagline: String::new(),
            foreground: DynamicImage::new_rgba8(300, 500),
            template: DynamicImage::new_rgba8(100, 100),
        };
        let poster = compose_poster(
            &spec,
            &CompositorConfig::default(),
            Arc::new(RecordingTextRenderer::new()),
        )
        .unwrap();
        assert_eq!(poster.dimensions(), (1040, 1200));
    }
}
