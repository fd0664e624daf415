//! Error types for segmentation and poster compositing

use thiserror::Error;

/// Result type alias for poster operations
pub type Result<T> = std::result::Result<T, PosterError>;

/// Error types for segmentation and compositing operations
///
/// Only conditions without a recovery path reach callers. Remote service
/// failures and degenerate masks are absorbed inside the segmenter, so
/// `Network` and `Timeout` normally only surface from the remote client itself.
#[derive(Error, Debug)]
pub enum PosterError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image codec errors raised while encoding output
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Input bytes are not a usable image
    #[error("Decode error: {0}")]
    Decode(String),

    /// Template or foreground asset could not be loaded while compositing
    #[error("Asset load error: {0}")]
    AssetLoad(String),

    /// Remote segmentation service transport or status errors
    #[error("Network error: {0}")]
    Network(String),

    /// Remote call exceeded its time budget or was cancelled
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Upload gating failures (size or dimension limits)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Font loading or glyph rendering errors
    #[error("Font error: {0}")]
    Font(String),

    /// Pixel processing errors
    #[error("Processing error: {0}")]
    Processing(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PosterError {
    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new asset load error
    pub fn asset_load<S: Into<String>>(msg: S) -> Self {
        Self::AssetLoad(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new font error
    pub fn font<S: Into<String>>(msg: S) -> Self {
        Self::Font(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a network error from an underlying transport error
    pub fn network_error<E: std::fmt::Display>(context: &str, error: E) -> Self {
        Self::Network(format!("{}: {}", context, error))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Whether re-invoking the whole operation may succeed
    ///
    /// Asset loads, transport errors and timeouts depend on the environment.
    /// Bad input bytes, bad configuration and failed validation will fail the
    /// same way every time.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io(_) | Self::AssetLoad(_) | Self::Network(_) | Self::Timeout(_) => true,
            Self::Image(_)
            | Self::Decode(_)
            | Self::InvalidConfig(_)
            | Self::Validation(_)
            | Self::Font(_)
            | Self::Processing(_)
            | Self::Internal(_) => false,
        }
    }
}
