//! Upload gating for user photos
//!
//! Applied before any segmentation work so oversized or undersized photos are
//! rejected without touching the network.

use crate::error::{PosterError, Result};
use crate::services::ImageIOService;
use serde::{Deserialize, Serialize};

/// Size and dimension limits for uploaded photos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLimits {
    /// Maximum encoded size in bytes
    pub max_bytes: usize,
    /// Minimum width and height in pixels
    pub min_dimension: u32,
    /// Maximum width and height in pixels
    pub max_dimension: u32,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            min_dimension: 100,
            max_dimension: 4000,
        }
    }
}

/// Validator for uploaded photo bytes
pub struct UploadValidator;

impl UploadValidator {
    /// Check the encoded size
    pub fn validate_size(len: usize, limits: &UploadLimits) -> Result<()> {
        if len == 0 {
            return Err(PosterError::validation("Upload is empty"));
        }
        if len > limits.max_bytes {
            return Err(PosterError::validation(format!(
                "Upload is {} bytes, limit is {} bytes",
                len, limits.max_bytes
            )));
        }
        Ok(())
    }

    /// Check both sides against the dimension bounds
    pub fn validate_dimensions(width: u32, height: u32, limits: &UploadLimits) -> Result<()> {
        let range = limits.min_dimension..=limits.max_dimension;
        if !range.contains(&width) || !range.contains(&height) {
            return Err(PosterError::validation(format!(
                "Image is {}x{}, each side must be between {} and {} pixels",
                width, height, limits.min_dimension, limits.max_dimension
            )));
        }
        Ok(())
    }

    /// Validate encoded bytes and return the probed dimensions
    pub fn validate_bytes(bytes: &[u8], limits: &UploadLimits) -> Result<(u32, u32)> {
        Self::validate_size(bytes.len(), limits)?;
        let (width, height) = ImageIOService::probe_dimensions(bytes)
            .map_err(|e| PosterError::validation(format!("Unreadable upload: {}", e)))?;
        Self::validate_dimensions(width, height, limits)?;
        Ok((width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        ImageIOService::encode_png(&RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])))
            .unwrap()
    }

    #[test]
    fn test_default_limits() {
        let limits = UploadLimits::default();
        assert_eq!(limits.max_bytes, 10_485_760);
        assert_eq!(limits.min_dimension, 100);
        assert_eq!(limits.max_dimension, 4000);
    }

    #[test]
    fn test_size_gate() {
        let limits = UploadLimits::default();
        assert!(UploadValidator::validate_size(10 * 1024 * 1024, &limits).is_ok());
        assert!(UploadValidator::validate_size(10 * 1024 * 1024 + 1, &limits).is_err());
        assert!(UploadValidator::validate_size(0, &limits).is_err());
    }

    #[test]
    fn test_dimension_gate_bounds_inclusive() {
        let limits = UploadLimits::default();
        assert!(UploadValidator::validate_dimensions(100, 4000, &limits).is_ok());
        assert!(UploadValidator::validate_dimensions(99, 500, &limits).is_err());
        assert!(UploadValidator::validate_dimensions(500, 4001, &limits).is_err());
    }

    #[test]
    fn test_validate_bytes() {
        let limits = UploadLimits::default();
        assert_eq!(
            UploadValidator::validate_bytes(&png(200, 300), &limits).unwrap(),
            (200, 300)
        );

        let err = UploadValidator::validate_bytes(&png(50, 300), &limits).unwrap_err();
        assert!(matches!(err, PosterError::Validation(_)));

        let err = UploadValidator::validate_bytes(b"not an image", &limits).unwrap_err();
        assert!(matches!(err, PosterError::Validation(_)));
    }
}
