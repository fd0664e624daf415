//! Text rasterisation
//!
//! Compositing talks to a [`TextRenderer`] so layout and drawing can be tested
//! without a font file. [`FontTextRenderer`] is the real implementation.

use crate::compositor::draw::blend_pixel;
use crate::error::{PosterError, Result};
use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Bold sans fonts commonly present on Linux and macOS
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
];

/// How a run of text is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub px: f32,
    pub color: Rgba<u8>,
    /// Thicken strokes by overdrawing with a small horizontal offset
    pub bold: bool,
}

/// Draws single lines of text onto a canvas
pub trait TextRenderer: Send + Sync {
    /// Draw `text` with its left edge at `x` and baseline at `baseline_y`
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: f32,
        baseline_y: f32,
        style: &TextStyle,
    ) -> Result<()>;

    /// Advance width of `text` at `px`
    fn measure_width(&self, text: &str, px: f32) -> f32;
}

/// TrueType renderer backed by rusttype
pub struct FontTextRenderer {
    font: Font<'static>,
}

impl std::fmt::Debug for FontTextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontTextRenderer")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl FontTextRenderer {
    /// Parse a TTF/OTF font held in memory
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| PosterError::font("Font data could not be parsed"))?;
        Ok(Self { font })
    }

    /// Load a font file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let bytes = std::fs::read(path_ref)
            .map_err(|e| PosterError::file_io_error("read font", path_ref, &e))?;
        Self::from_bytes(bytes)
            .map_err(|e| PosterError::font(format!("'{}': {}", path_ref.display(), e)))
    }

    /// Load the first available font from [`SYSTEM_FONT_CANDIDATES`]
    pub fn discover() -> Result<Self> {
        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(renderer) => {
                    debug!(font = %path.display(), "Using system font");
                    return Ok(renderer);
                },
                Err(e) => debug!(font = %path.display(), error = %e, "Skipping unusable font"),
            }
        }

        Err(PosterError::font(format!(
            "No usable font found; pass one explicitly (tried {})",
            SYSTEM_FONT_CANDIDATES.join(", ")
        )))
    }

    fn draw_pass(&self, canvas: &mut RgbaImage, text: &str, x: f32, baseline_y: f32, style: &TextStyle) {
        let (canvas_w, canvas_h) = canvas.dimensions();
        let scale = Scale::uniform(style.px);

        for glyph in self.font.layout(text, scale, point(x, baseline_y)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 || px as u32 >= canvas_w || py as u32 >= canvas_h {
                    return;
                }
                blend_pixel(canvas.get_pixel_mut(px as u32, py as u32), style.color, coverage);
            });
        }
    }
}

impl TextRenderer for FontTextRenderer {
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: f32,
        baseline_y: f32,
        style: &TextStyle,
    ) -> Result<()> {
        if !(style.px.is_finite() && style.px > 0.0) {
            return Err(PosterError::font(format!("Invalid font size {}", style.px)));
        }

        self.draw_pass(canvas, text, x, baseline_y, style);
        if style.bold {
            let offset = (style.px / 32.0).max(1.0);
            self.draw_pass(canvas, text, x + offset, baseline_y, style);
        }
        Ok(())
    }

    fn measure_width(&self, text: &str, px: f32) -> f32 {
        let scale = Scale::uniform(px);
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map_or(0.0, |glyph| {
                glyph.position().x + glyph.unpositioned().h_metrics().advance_width
            })
    }
}

/// One recorded `draw_text` call
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub text: String,
    pub x: f32,
    pub baseline_y: f32,
    pub style: TextStyle,
}

/// Renderer that records calls and paints a marker pixel at each anchor
///
/// Useful for checking what text went where without a font file.
#[derive(Debug, Clone, Default)]
pub struct RecordingTextRenderer {
    calls: Arc<Mutex<Vec<DrawCall>>>,
}

impl RecordingTextRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every call so far
    pub fn calls(&self) -> Vec<DrawCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Texts drawn so far, in order
    pub fn texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.text).collect()
    }
}

impl TextRenderer for RecordingTextRenderer {
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: f32,
        baseline_y: f32,
        style: &TextStyle,
    ) -> Result<()> {
        let (px, py) = (x.round(), baseline_y.round());
        if px >= 0.0 && py >= 0.0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
            blend_pixel(canvas.get_pixel_mut(px as u32, py as u32), style.color, 1.0);
        }

        let mut calls = self
            .calls
            .lock()
            .map_err(|_| PosterError::internal("recording renderer lock poisoned"))?;
        calls.push(DrawCall {
            text: text.to_string(),
            x,
            baseline_y,
            style: *style,
        });
        Ok(())
    }

    fn measure_width(&self, text: &str, px: f32) -> f32 {
        text.chars().count() as f32 * px * 0.5
    }
}
