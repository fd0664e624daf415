//! Core types for segmentation and poster compositing

use crate::error::{PosterError, Result};
use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which path produced a segmentation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentationSource {
    /// Remote background removal service
    Remote,
    /// Local edge detection + border-seeded flood fill
    EdgeFloodFill,
    /// Local centre-weighted vignette after the flood fill swallowed everything
    RadialFallback,
}

impl std::fmt::Display for SegmentationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::EdgeFloodFill => write!(f, "edge-flood-fill"),
            Self::RadialFallback => write!(f, "radial-fallback"),
        }
    }
}

/// Outcome of one segmentation attempt
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    /// `true` whenever a usable image was produced
    pub success: bool,

    /// RGBA image with background pixels at alpha 0
    pub image: Option<RgbaImage>,

    /// Human-readable failure reason when `success` is false
    pub reason: Option<String>,

    /// Path that produced `image`
    pub source: Option<SegmentationSource>,

    /// Remote attempts made before the result was produced
    pub remote_attempts: u32,

    /// Wall-clock time of the whole call
    pub elapsed_ms: u64,
}

impl SegmentationResult {
    /// Create a successful result
    #[must_use]
    pub fn succeeded(image: RgbaImage, source: SegmentationSource, remote_attempts: u32) -> Self {
        Self {
            success: true,
            image: Some(image),
            reason: None,
            source: Some(source),
            remote_attempts,
            elapsed_ms: 0,
        }
    }

    /// Create a failed result with a reason
    #[must_use]
    pub fn failed<S: Into<String>>(reason: S, remote_attempts: u32) -> Self {
        Self {
            success: false,
            image: None,
            reason: Some(reason.into()),
            source: None,
            remote_attempts,
            elapsed_ms: 0,
        }
    }

    #[must_use]
    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Take the segmented image, turning a failed result into an error
    ///
    /// # Errors
    /// Returns `PosterError::Decode` carrying the failure reason
    pub fn into_image(self) -> Result<RgbaImage> {
        match self.image {
            Some(image) if self.success => Ok(image),
            _ => Err(PosterError::decode(
                self.reason
                    .unwrap_or_else(|| "segmentation produced no image".to_string()),
            )),
        }
    }

    /// Number of pixels with non-zero alpha
    #[must_use]
    pub fn opaque_pixel_count(&self) -> usize {
        self.image
            .as_ref()
            .map_or(0, |image| image.pixels().filter(|p| p[3] > 0).count())
    }

    /// Encode the segmented image as PNG
    ///
    /// # Errors
    /// - Failed result (no image)
    /// - PNG encoding failure
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| PosterError::processing("No segmented image to encode"))?;
        crate::services::ImageIOService::encode_png(image)
    }
}

/// Per-pixel background mask produced by the flood fill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundMask {
    /// `true` marks a background pixel, row-major
    pub data: Vec<bool>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl BackgroundMask {
    /// Create an all-foreground mask
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![false; width as usize * height as usize],
            dimensions: (width, height),
        }
    }

    #[must_use]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.dimensions.0 as usize + x as usize
    }

    #[must_use]
    pub fn is_background(&self, x: u32, y: u32) -> bool {
        self.data.get(self.index(x, y)).copied().unwrap_or(false)
    }

    pub fn mark_background(&mut self, x: u32, y: u32) {
        let index = self.index(x, y);
        if let Some(cell) = self.data.get_mut(index) {
            *cell = true;
        }
    }

    /// Whether the mask covers every pixel
    #[must_use]
    pub fn covers_everything(&self) -> bool {
        self.data.iter().all(|&bg| bg)
    }

    /// Set alpha to zero under the mask, leaving other pixels untouched
    ///
    /// # Errors
    /// Returns an error when image and mask dimensions differ
    pub fn apply_to_image(&self, image: &mut RgbaImage) -> Result<()> {
        if image.dimensions() != self.dimensions {
            return Err(PosterError::processing(format!(
                "Image {:?} and mask {:?} dimensions do not match",
                image.dimensions(),
                self.dimensions
            )));
        }

        for (pixel, &background) in image.pixels_mut().zip(self.data.iter()) {
            if background {
                pixel[3] = 0;
            }
        }

        Ok(())
    }

    /// Convert to a grayscale image (background black, foreground white)
    #[must_use]
    pub fn to_image(&self) -> GrayImage {
        let (width, height) = self.dimensions;
        GrayImage::from_fn(width, height, |x, y| {
            if self.is_background(x, y) {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    /// Get mask statistics
    #[must_use]
    pub fn statistics(&self) -> MaskStatistics {
        let total_pixels = self.data.len();
        let background_pixels = self.data.iter().filter(|&&bg| bg).count();
        let foreground_pixels = total_pixels - background_pixels;
        let ratio = |n: usize| {
            if total_pixels == 0 {
                0.0
            } else {
                n as f32 / total_pixels as f32
            }
        };

        MaskStatistics {
            total_pixels,
            foreground_pixels,
            background_pixels,
            foreground_ratio: ratio(foreground_pixels),
            background_ratio: ratio(background_pixels),
        }
    }

    /// Save mask as PNG
    ///
    /// # Errors
    /// File creation or encoding failures
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_image()
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Statistics about a background mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskStatistics {
    pub total_pixels: usize,
    pub foreground_pixels: usize,
    pub background_pixels: usize,
    pub foreground_ratio: f32,
    pub background_ratio: f32,
}

/// Text and images for one poster render
#[derive(Debug, Clone)]
pub struct PosterSpec {
    pub company_name: String,
    pub business_type: String,
    pub phone_number: String,
    pub tagline: String,

    /// Segmented subject (transparent background)
    pub foreground: DynamicImage,

    /// Template art, stretched to the canvas
    pub template: DynamicImage,
}

/// Final flattened poster
#[derive(Debug, Clone)]
pub struct ComposedPoster {
    /// Canvas pixels
    pub image: RgbaImage,

    /// PNG encoding of `image`
    pub png_bytes: Vec<u8>,
}

impl ComposedPoster {
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Write the PNG bytes to disk
    ///
    /// # Errors
    /// File creation or write failures
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        std::fs::write(path_ref, &self.png_bytes)
            .map_err(|e| PosterError::file_io_error("write poster", path_ref, &e))
    }
}

/// Output of the full photo-to-poster pipeline
#[derive(Debug, Clone)]
pub struct GeneratedPoster {
    pub poster: ComposedPoster,

    /// Segmented subject that was placed on the poster
    pub cutout: RgbaImage,

    /// Path that produced `cutout`
    pub segmentation_source: SegmentationSource,

    pub remote_attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_mask_apply_only_touches_background_alpha() {
        let mut image = RgbaImage::from_pixel(3, 1, Rgba([10, 20, 30, 200]));
        let mut mask = BackgroundMask::new(3, 1);
        mask.mark_background(0, 0);

        mask.apply_to_image(&mut image).unwrap();

        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [10, 20, 30, 200]);
        assert_eq!(image.get_pixel(2, 0).0, [10, 20, 30, 200]);
    }

    #[test]
    fn test_mask_dimension_mismatch() {
        let mut image = RgbaImage::new(4, 4);
        let mask = BackgroundMask::new(3, 3);
        assert!(mask.apply_to_image(&mut image).is_err());
    }

    #[test]
    fn test_mask_statistics() {
        let mut mask = BackgroundMask::new(2, 2);
        mask.mark_background(0, 0);
        mask.mark_background(1, 1);
        let stats = mask.statistics();
        assert_eq!(stats.total_pixels, 4);
        assert_eq!(stats.background_pixels, 2);
        assert_eq!(stats.foreground_pixels, 2);
        assert!((stats.background_ratio - 0.5).abs() < f32::EPSILON);
        assert!(!mask.covers_everything());
    }

    #[test]
    fn test_failed_result_into_image() {
        let result = SegmentationResult::failed("corrupt bytes", 0);
        assert!(!result.success);
        assert_eq!(result.opaque_pixel_count(), 0);
        let err = result.into_image().unwrap_err();
        assert!(err.to_string().contains("corrupt bytes"));
    }

    #[test]
    fn test_source_display() {
        assert_eq!(SegmentationSource::Remote.to_string(), "remote");
        assert_eq!(SegmentationSource::RadialFallback.to_string(), "radial-fallback");
    }
}
