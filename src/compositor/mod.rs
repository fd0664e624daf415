//! Poster compositing
//!
//! [`PosterCompositor`] flattens a template, a segmented subject and the
//! business text into one PNG. The geometry comes from [`PosterLayout`];
//! pixels are only touched after the layout is known.

pub mod draw;
pub mod layout;
pub mod text;

pub use layout::{wrap_tagline, ContactLayout, PosterLayout, SubjectPlacement, TextLine};
pub use text::{FontTextRenderer, RecordingTextRenderer, TextRenderer, TextStyle};

use crate::config::CompositorConfig;
use crate::error::{PosterError, Result};
use crate::profile::PosterText;
use crate::services::ImageIOService;
use crate::types::{ComposedPoster, PosterSpec};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use instant::Instant;
use std::sync::Arc;
use tracing::{debug, info, instrument, span, Level};

/// Business type is drawn at this share of the contact font size
const BUSINESS_TYPE_SCALE: f32 = 0.6;

/// Renders posters from a [`PosterSpec`]
#[derive(Clone)]
pub struct PosterCompositor {
    config: CompositorConfig,
    renderer: Arc<dyn TextRenderer>,
}

impl std::fmt::Debug for PosterCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosterCompositor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PosterCompositor {
    /// Create a compositor
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid
    pub fn new(config: CompositorConfig, renderer: Arc<dyn TextRenderer>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, renderer })
    }

    #[must_use]
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Compute the layout a spec would be drawn with
    ///
    /// # Errors
    /// Returns `AssetLoad` for a zero-sized foreground
    pub fn layout(&self, spec: &PosterSpec) -> Result<PosterLayout> {
        let text = PosterText::from_spec(spec);
        PosterLayout::compute(
            &self.config,
            (spec.foreground.width(), spec.foreground.height()),
            &text.tagline,
        )
    }

    /// Render and PNG-encode a poster
    ///
    /// Template and foreground are only read. Nothing is encoded unless every
    /// drawing step succeeded.
    ///
    /// # Errors
    /// - `AssetLoad` for zero-sized template or foreground
    /// - `Font` when text cannot be drawn
    /// - `Processing` when PNG encoding fails
    #[instrument(
        skip(self, spec),
        fields(
            canvas = %format!("{}x{}", self.config.canvas_width, self.config.canvas_height),
            foreground = %format!("{}x{}", spec.foreground.width(), spec.foreground.height())
        )
    )]
    pub fn compose(&self, spec: &PosterSpec) -> Result<ComposedPoster> {
        let start = Instant::now();

        let image = self.render(spec)?;
        let png_bytes = {
            let _span = span!(Level::DEBUG, "encode_png").entered();
            ImageIOService::encode_png(&image)?
        };

        info!(
            png_bytes = png_bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Poster composed"
        );

        Ok(ComposedPoster { image, png_bytes })
    }

    /// Decode template and foreground bytes, then compose
    ///
    /// # Errors
    /// `AssetLoad` when either image fails to decode, plus everything
    /// [`Self::compose`] can return
    pub fn compose_from_bytes(
        &self,
        template_bytes: &[u8],
        foreground_bytes: &[u8],
        text: &PosterText,
    ) -> Result<ComposedPoster> {
        let template = ImageIOService::load_asset_from_bytes(template_bytes, "template")?;
        let foreground = ImageIOService::load_asset_from_bytes(foreground_bytes, "foreground")?;

        self.compose(&PosterSpec {
            company_name: text.company_name.clone(),
            business_type: text.business_type.clone(),
            phone_number: text.phone_number.clone(),
            tagline: text.tagline.clone(),
            foreground,
            template,
        })
    }

    /// Render a poster without encoding it
    ///
    /// # Errors
    /// Same as [`Self::compose`] minus encoding
    pub fn render(&self, spec: &PosterSpec) -> Result<RgbaImage> {
        ensure_non_empty(&spec.template, "template")?;
        ensure_non_empty(&spec.foreground, "foreground")?;

        let text = PosterText::from_spec(spec);
        let layout = PosterLayout::compute(
            &self.config,
            (spec.foreground.width(), spec.foreground.height()),
            &text.tagline,
        )?;
        debug!(
            scale = layout.subject.scale,
            tagline_lines = layout.tagline_lines.len(),
            contact_top = layout.contact.top,
            "Poster layout computed"
        );

        let mut canvas = self.draw_template(&spec.template);
        Self::draw_subject(&mut canvas, &spec.foreground, &layout.subject);
        self.draw_tagline(&mut canvas, &layout)?;
        self.draw_contact(&mut canvas, &layout.contact, &text)?;

        Ok(canvas)
    }

    fn draw_template(&self, template: &DynamicImage) -> RgbaImage {
        let _span = span!(Level::DEBUG, "draw_template").entered();
        let (width, height) = (self.config.canvas_width, self.config.canvas_height);

        if template.width() == width && template.height() == height {
            template.to_rgba8()
        } else {
            template.resize_exact(width, height, FilterType::Lanczos3).to_rgba8()
        }
    }

    fn draw_subject(canvas: &mut RgbaImage, foreground: &DynamicImage, placement: &SubjectPlacement) {
        let _span = span!(Level::DEBUG, "draw_subject", width = placement.width, height = placement.height).entered();

        let subject = if foreground.width() == placement.width && foreground.height() == placement.height {
            foreground.to_rgba8()
        } else {
            foreground
                .resize_exact(placement.width, placement.height, FilterType::Lanczos3)
                .to_rgba8()
        };

        imageops::overlay(
            canvas,
            &subject,
            placement.x.round() as i64,
            placement.y.round() as i64,
        );
    }

    fn draw_tagline(&self, canvas: &mut RgbaImage, layout: &PosterLayout) -> Result<()> {
        let _span = span!(Level::DEBUG, "draw_tagline", lines = layout.tagline_lines.len()).entered();
        let style = TextStyle {
            px: self.config.tagline_font_px,
            color: Rgba(self.config.text_color),
            bold: true,
        };

        for line in &layout.tagline_lines {
            self.renderer
                .draw_text(canvas, &line.text, line.x as f32, line.baseline_y as f32, &style)?;
        }
        Ok(())
    }

    fn draw_contact(&self, canvas: &mut RgbaImage, contact: &ContactLayout, text: &PosterText) -> Result<()> {
        let _span = span!(Level::DEBUG, "draw_contact", top = contact.top).entered();
        let icon_color = Rgba(self.config.icon_color);
        let radius = contact.icon_radius as f32;

        for (cx, cy) in [contact.first_icon, contact.second_icon] {
            draw::fill_circle(canvas, cx as f32, cy as f32, radius, icon_color);
        }

        let primary = TextStyle {
            px: self.config.contact_font_px,
            color: Rgba(self.config.text_color),
            bold: true,
        };
        let secondary = TextStyle {
            px: self.config.contact_font_px * BUSINESS_TYPE_SCALE,
            bold: false,
            ..primary
        };
        let text_x = contact.text_x as f32;

        self.renderer
            .draw_text(canvas, &text.company_name, text_x, contact.name_baseline as f32, &primary)?;
        self.renderer.draw_text(
            canvas,
            &text.business_type,
            text_x,
            contact.business_baseline as f32,
            &secondary,
        )?;
        self.renderer
            .draw_text(canvas, &text.phone_number, text_x, contact.phone_baseline as f32, &primary)?;

        Ok(())
    }
}

fn ensure_non_empty(image: &DynamicImage, label: &str) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PosterError::asset_load(format!(
            "{} image has zero size ({}x{})",
            label,
            image.width(),
            image.height()
        )));
    }
    Ok(())
}
