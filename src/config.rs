//! Configuration types for segmentation and poster compositing

use crate::error::{PosterError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default remote background removal endpoint
pub const DEFAULT_REMOVE_BG_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

/// Environment variable holding the remote service API key
pub const API_KEY_ENV: &str = "BIZPOSTER_REMOVE_BG_API_KEY";

/// Environment variable overriding the remote service endpoint
pub const ENDPOINT_ENV: &str = "BIZPOSTER_REMOVE_BG_ENDPOINT";

/// Configuration for background segmentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Remote segmentation endpoint (multipart POST)
    pub endpoint: String,

    /// API key sent as `X-Api-Key`; the remote path is skipped when absent
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Hard timeout for one remote attempt, in seconds (1-60)
    pub timeout_secs: u64,

    /// Total remote attempts before falling back to the local algorithm
    pub max_attempts: u32,

    /// Pause between remote attempts, in milliseconds
    pub retry_backoff_ms: u64,

    /// Responses smaller than this are treated as corrupt
    pub min_response_bytes: usize,

    /// Channel-sum difference above which a pixel is an edge
    pub edge_threshold: u32,

    /// Channel-sum difference below which a neighbour joins the background
    pub background_tolerance: u32,

    /// Normalized distance where the radial fallback starts fading
    pub radial_fade_start: f64,

    /// Alpha lost per unit of distance beyond `radial_fade_start`
    pub radial_fade_rate: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_REMOVE_BG_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 15,
            max_attempts: 2,
            retry_backoff_ms: 1000,
            min_response_bytes: 100,
            edge_threshold: 20,
            background_tolerance: 30,
            radial_fade_start: 0.7,
            radial_fade_rate: 3.0,
        }
    }
}

impl SegmenterConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    /// ```rust
    /// use bizposter::SegmenterConfig;
    ///
    /// let config = SegmenterConfig::builder()
    ///     .api_key("secret")
    ///     .timeout_secs(10)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.timeout_secs, 10);
    /// ```
    #[must_use]
    pub fn builder() -> SegmenterConfigBuilder {
        SegmenterConfigBuilder::default()
    }

    /// Build a configuration from the process environment
    ///
    /// Reads `BIZPOSTER_REMOVE_BG_API_KEY` and `BIZPOSTER_REMOVE_BG_ENDPOINT`;
    /// everything else keeps its default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                config.endpoint = endpoint.trim().to_string();
            }
        }
        config
    }

    /// Whether the remote service should be tried at all
    #[must_use]
    pub fn remote_enabled(&self) -> bool {
        self.api_key.is_some() && self.max_attempts > 0
    }

    /// Timeout for one remote attempt
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause between remote attempts
    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Timeout outside 1-60 seconds
    /// - More than 5 remote attempts
    /// - Thresholds outside the 0-765 channel-sum range
    /// - Non-finite or negative radial parameters
    pub fn validate(&self) -> Result<()> {
        if !(1..=60).contains(&self.timeout_secs) {
            return Err(PosterError::config_value_error(
                "timeout_secs",
                self.timeout_secs,
                "1-60",
                Some(15),
            ));
        }

        if self.max_attempts > 5 {
            return Err(PosterError::config_value_error(
                "max_attempts",
                self.max_attempts,
                "0-5",
                Some(2),
            ));
        }

        if self.edge_threshold > 765 {
            return Err(PosterError::config_value_error(
                "edge_threshold",
                self.edge_threshold,
                "0-765",
                Some(20),
            ));
        }

        if self.background_tolerance > 765 {
            return Err(PosterError::config_value_error(
                "background_tolerance",
                self.background_tolerance,
                "0-765",
                Some(30),
            ));
        }

        if !self.radial_fade_start.is_finite() || self.radial_fade_start < 0.0 {
            return Err(PosterError::invalid_config(format!(
                "radial_fade_start must be a non-negative number, got {}",
                self.radial_fade_start
            )));
        }

        if !self.radial_fade_rate.is_finite() || self.radial_fade_rate <= 0.0 {
            return Err(PosterError::invalid_config(format!(
                "radial_fade_rate must be positive, got {}",
                self.radial_fade_rate
            )));
        }

        if self.endpoint.trim().is_empty() {
            return Err(PosterError::invalid_config("endpoint must not be empty"));
        }

        Ok(())
    }
}

/// Builder for `SegmenterConfig`
#[derive(Debug, Default)]
pub struct SegmenterConfigBuilder {
    config: SegmenterConfig,
}

impl SegmenterConfigBuilder {
    #[must_use]
    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn retry_backoff_ms(mut self, millis: u64) -> Self {
        self.config.retry_backoff_ms = millis;
        self
    }

    #[must_use]
    pub fn min_response_bytes(mut self, bytes: usize) -> Self {
        self.config.min_response_bytes = bytes;
        self
    }

    #[must_use]
    pub fn edge_threshold(mut self, threshold: u32) -> Self {
        self.config.edge_threshold = threshold;
        self
    }

    #[must_use]
    pub fn background_tolerance(mut self, tolerance: u32) -> Self {
        self.config.background_tolerance = tolerance;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// Any rule checked by [`SegmenterConfig::validate`]
    pub fn build(self) -> Result<SegmenterConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Layout constants for the poster compositor
///
/// Positions are fractions of the canvas plus pixel offsets tuned to the
/// bundled template art. A replacement template may need new offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositorConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,

    /// Subject may not exceed this share of the canvas width
    pub subject_max_width_ratio: f32,
    /// Subject may not exceed this share of the canvas height
    pub subject_max_height_ratio: f32,
    pub subject_x_ratio: f32,
    pub subject_x_offset: f32,
    /// Share of the scaled subject height that sits above the bottom anchor
    pub subject_visible_ratio: f32,
    pub subject_bottom_offset: f32,

    /// Taglines up to this many characters are never wrapped
    pub tagline_wrap_threshold: usize,
    /// Wrapped lines stay strictly shorter than this many characters
    pub tagline_line_budget: usize,
    pub tagline_x: f32,
    pub tagline_top_ratio: f32,
    pub tagline_line_height: f32,
    pub tagline_font_px: f32,

    pub contact_top_ratio: f32,
    pub contact_top_offset: f32,
    pub icon_radius: f32,
    pub icon_center_x: f32,
    pub icon_spacing: f32,
    /// Minimum gap between the tagline block and the contact block
    pub contact_min_clearance: f32,
    pub contact_text_gap: f32,
    pub contact_font_px: f32,

    pub text_color: [u8; 4],
    pub icon_color: [u8; 4],
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1040,
            canvas_height: 1200,
            subject_max_width_ratio: 0.55,
            subject_max_height_ratio: 0.65,
            subject_x_ratio: 0.06,
            subject_x_offset: -40.0,
            subject_visible_ratio: 0.80,
            subject_bottom_offset: 60.0,
            tagline_wrap_threshold: 35,
            tagline_line_budget: 40,
            tagline_x: 60.0,
            tagline_top_ratio: 0.12,
            tagline_line_height: 60.0,
            tagline_font_px: 48.0,
            contact_top_ratio: 0.42,
            contact_top_offset: 45.0,
            icon_radius: 30.0,
            icon_center_x: 80.0,
            icon_spacing: 85.0,
            contact_min_clearance: 50.0,
            contact_text_gap: 30.0,
            contact_font_px: 36.0,
            text_color: [255, 255, 255, 255],
            icon_color: [255, 193, 7, 255],
        }
    }
}

impl CompositorConfig {
    #[must_use]
    pub fn builder() -> CompositorConfigBuilder {
        CompositorConfigBuilder::default()
    }

    /// Validate layout parameters
    ///
    /// # Errors
    /// - Zero-sized or oversized canvas
    /// - Subject ratios outside (0, 1]
    /// - Non-positive font sizes or line height
    /// - Line budget not greater than one character
    pub fn validate(&self) -> Result<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(PosterError::invalid_config(format!(
                "Canvas must be non-empty, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }

        if self.canvas_width > 8000 || self.canvas_height > 8000 {
            return Err(PosterError::invalid_config(format!(
                "Canvas {}x{} exceeds 8000x8000",
                self.canvas_width, self.canvas_height
            )));
        }

        for (name, value) in [
            ("subject_max_width_ratio", self.subject_max_width_ratio),
            ("subject_max_height_ratio", self.subject_max_height_ratio),
            ("subject_visible_ratio", self.subject_visible_ratio),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(PosterError::invalid_config(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("tagline_font_px", self.tagline_font_px),
            ("contact_font_px", self.contact_font_px),
            ("tagline_line_height", self.tagline_line_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(PosterError::invalid_config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if self.tagline_line_budget < 2 {
            return Err(PosterError::config_value_error(
                "tagline_line_budget",
                self.tagline_line_budget,
                ">= 2",
                Some(40),
            ));
        }

        Ok(())
    }
}

/// Builder for `CompositorConfig`
#[derive(Debug, Default)]
pub struct CompositorConfigBuilder {
    config: CompositorConfig,
}

impl CompositorConfigBuilder {
    #[must_use]
    pub fn canvas_size(mut self, width: u32, height: u32) -> Self {
        self.config.canvas_width = width;
        self.config.canvas_height = height;
        self
    }

    #[must_use]
    pub fn tagline_font_px(mut self, px: f32) -> Self {
        self.config.tagline_font_px = px;
        self
    }

    #[must_use]
    pub fn contact_font_px(mut self, px: f32) -> Self {
        self.config.contact_font_px = px;
        self
    }

    #[must_use]
    pub fn text_color(mut self, rgba: [u8; 4]) -> Self {
        self.config.text_color = rgba;
        self
    }

    #[must_use]
    pub fn icon_color(mut self, rgba: [u8; 4]) -> Self {
        self.config.icon_color = rgba;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// Any rule checked by [`CompositorConfig::validate`]
    pub fn build(self) -> Result<CompositorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segmenter_defaults() {
        let config = SegmenterConfig::default();
        assert_eq!(config.endpoint, DEFAULT_REMOVE_BG_ENDPOINT);
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.retry_backoff(), Duration::from_secs(1));
        assert_eq!(config.min_response_bytes, 100);
        assert_eq!(config.edge_threshold, 20);
        assert_eq!(config.background_tolerance, 30);
        assert!(!config.remote_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_segmenter_builder_validation() {
        let config = SegmenterConfig::builder().api_key("k").build().unwrap();
        assert!(config.remote_enabled());

        let err = SegmenterConfig::builder().timeout_secs(0).build().unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));

        let err = SegmenterConfig::builder().max_attempts(9).build().unwrap_err();
        assert!(err.to_string().contains("max_attempts"));

        let err = SegmenterConfig::builder().endpoint("  ").build().unwrap_err();
        assert!(matches!(err, PosterError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_attempts_disables_remote() {
        let config = SegmenterConfig::builder()
            .api_key("k")
            .max_attempts(0)
            .build()
            .unwrap();
        assert!(!config.remote_enabled());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = SegmenterConfig::builder().api_key("secret").build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_compositor_defaults() {
        let config = CompositorConfig::default();
        assert_eq!((config.canvas_width, config.canvas_height), (1040, 1200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_compositor_validation() {
        assert!(CompositorConfig::builder().canvas_size(0, 100).build().is_err());
        assert!(CompositorConfig::builder().tagline_font_px(0.0).build().is_err());

        let mut config = CompositorConfig::default();
        config.subject_max_width_ratio = 1.5;
        assert!(config.validate().is_err());
    }
}
