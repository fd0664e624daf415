//! Image I/O operations service
//!
//! Keeps file access and codec handling out of the segmentation and
//! compositing code so both can be driven from memory in tests.

use crate::error::{PosterError, Result};
use image::{DynamicImage, ImageFormat, ImageReader, Limits, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Hard cap on decoded dimensions for any input, independent of upload gating
pub const MAX_DECODE_DIMENSION: u32 = 16_384;

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// Tries extension-based detection first, then falls back to sniffing the
    /// file contents.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use bizposter::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("portrait.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(PosterError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        let data = std::fs::read(path_ref)
            .map_err(|e| PosterError::file_io_error("read image data", path_ref, &e))?;

        let Ok(format) = ImageFormat::from_path(path_ref) else {
            return Self::load_from_bytes(&data);
        };

        match Self::decode_limited(&data, Some(format)) {
            Ok(img) => Ok(img),
            Err(e) => {
                debug!(
                    path = %path_ref.display(),
                    error = %e,
                    "Extension-based loading failed, attempting content-based detection"
                );

                Self::load_from_bytes(&data).map_err(|content_err| {
                    PosterError::decode(format!(
                        "Failed to load '{}' ({} bytes). Extension error: {}. Content error: {}",
                        path_ref.display(),
                        data.len(),
                        e,
                        content_err
                    ))
                })
            },
        }
    }

    /// Load a compositing asset (template or foreground)
    ///
    /// Any failure is reported as `PosterError::AssetLoad`.
    pub fn load_asset<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();
        Self::load_image(path_ref).map_err(|e| {
            PosterError::asset_load(format!("'{}': {}", path_ref.display(), e))
        })
    }

    /// Decode a compositing asset held in memory
    pub fn load_asset_from_bytes(bytes: &[u8], label: &str) -> Result<DynamicImage> {
        Self::load_from_bytes(bytes)
            .map_err(|e| PosterError::asset_load(format!("{}: {}", label, e)))
    }

    /// Decode image bytes, sniffing the format from content
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(PosterError::decode("image data is empty"));
        }

        Self::decode_limited(bytes, None)
    }

    /// Decode under the `MAX_DECODE_DIMENSION` limits, sniffing when no format is given
    fn decode_limited(bytes: &[u8], format: Option<ImageFormat>) -> Result<DynamicImage> {
        let mut reader = match format {
            Some(format) => ImageReader::with_format(Cursor::new(bytes), format),
            None => ImageReader::new(Cursor::new(bytes))
                .with_guessed_format()
                .map_err(|e| PosterError::decode(format!("Failed to read image header: {}", e)))?,
        };

        let mut limits = Limits::default();
        limits.max_image_width = Some(MAX_DECODE_DIMENSION);
        limits.max_image_height = Some(MAX_DECODE_DIMENSION);
        reader.limits(limits);

        let image = reader
            .decode()
            .map_err(|e| PosterError::decode(format!("Failed to decode image from bytes: {}", e)))?;

        if image.width() == 0 || image.height() == 0 {
            return Err(PosterError::decode("decoded image has zero size"));
        }

        Ok(image)
    }

    /// Read width and height without decoding pixel data
    pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PosterError::decode(format!("Failed to read image header: {}", e)))?
            .into_dimensions()
            .map_err(|e| PosterError::decode(format!("Failed to read image dimensions: {}", e)))
    }

    /// Encode RGBA pixels as PNG
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| PosterError::processing(format!("Failed to encode PNG: {}", e)))?;
        Ok(buffer)
    }

    /// Save an image as PNG, creating parent directories as needed
    pub fn save_png<P: AsRef<Path>>(image: &RgbaImage, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let bytes = Self::encode_png(image)?;
        Self::write_bytes(&bytes, path_ref)
    }

    /// Write already-encoded bytes, creating parent directories as needed
    pub fn write_bytes<P: AsRef<Path>>(bytes: &[u8], path: P) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| PosterError::file_io_error("create output directory", parent, &e))?;
        }

        std::fs::write(path_ref, bytes)
            .map_err(|e| PosterError::file_io_error("write output file", path_ref, &e))
    }

    /// Read a file into memory asynchronously
    pub async fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        let path_ref = path.as_ref();
        tokio::fs::read(path_ref)
            .await
            .map_err(|e| PosterError::file_io_error("read input file", path_ref, &e))
    }

    /// Check if a file path has a supported image extension
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "webp"))
    }
}
