//! Poster geometry
//!
//! Everything here is pure arithmetic over [`CompositorConfig`], so placement
//! can be checked without fonts or pixels.

use crate::config::CompositorConfig;
use crate::error::{PosterError, Result};
use serde::Serialize;

/// Split a tagline into display lines
///
/// Taglines of at most `wrap_threshold` characters stay on one line. Longer
/// ones are wrapped greedily at word boundaries, flushing whenever the next
/// word would bring the line to `line_budget` characters. If the greedy pass
/// still leaves a single line, it is split at the word boundary nearest the
/// middle. A single word longer than the budget keeps its own line.
#[must_use]
pub fn wrap_tagline(tagline: &str, wrap_threshold: usize, line_budget: usize) -> Vec<String> {
    let trimmed = tagline.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed.chars().count() <= wrap_threshold {
        return vec![trimmed.to_string()];
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in &words {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate_len = current.chars().count() + 1 + word.chars().count();
        if candidate_len < line_budget {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() == 1 && words.len() > 1 {
        return split_near_middle(&words);
    }

    lines
}

fn split_near_middle(words: &[&str]) -> Vec<String> {
    let total = words.join(" ").chars().count();
    let mut best_split = 1;
    let mut best_distance = usize::MAX;
    let mut prefix_len = 0;

    for (index, word) in words.iter().enumerate().take(words.len() - 1) {
        prefix_len += word.chars().count() + usize::from(index > 0);
        let distance = prefix_len.abs_diff(total / 2);
        if distance < best_distance {
            best_distance = distance;
            best_split = index + 1;
        }
    }

    let (head, tail) = words.split_at(best_split);
    vec![head.join(" "), tail.join(" ")]
}

/// Where the scaled subject lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubjectPlacement {
    /// Uniform scale applied to the subject
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    /// Top-left corner; may be negative or push past the canvas edge
    pub x: f64,
    pub y: f64,
}

impl SubjectPlacement {
    /// Compute placement for a subject of the given size
    ///
    /// # Errors
    /// Returns `AssetLoad` for a zero-sized subject
    pub fn compute(config: &CompositorConfig, subject_width: u32, subject_height: u32) -> Result<Self> {
        if subject_width == 0 || subject_height == 0 {
            return Err(PosterError::asset_load(format!(
                "foreground image has zero size ({}x{})",
                subject_width, subject_height
            )));
        }

        let canvas_w = f64::from(config.canvas_width);
        let canvas_h = f64::from(config.canvas_height);

        let max_w = canvas_w * f64::from(config.subject_max_width_ratio);
        let max_h = canvas_h * f64::from(config.subject_max_height_ratio);
        let scale = (max_w / f64::from(subject_width)).min(max_h / f64::from(subject_height));

        let width = (f64::from(subject_width) * scale).round().max(1.0) as u32;
        let height = (f64::from(subject_height) * scale).round().max(1.0) as u32;

        let x = canvas_w * f64::from(config.subject_x_ratio) + f64::from(config.subject_x_offset);
        let y = canvas_h
            - f64::from(height) * f64::from(config.subject_visible_ratio)
            - f64::from(config.subject_bottom_offset);

        Ok(Self {
            scale,
            width,
            height,
            x,
            y,
        })
    }
}

/// One line of tagline text, positioned by its baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub x: f64,
    pub baseline_y: f64,
}

/// Icon circles and the text beside them
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContactLayout {
    /// Centre line of the first icon; the top of the block
    pub top: f64,
    pub icon_radius: f64,
    pub first_icon: (f64, f64),
    pub second_icon: (f64, f64),
    /// Left edge of the text next to each icon
    pub text_x: f64,
    /// Company name sits just above the first icon's centre line
    pub name_baseline: f64,
    /// Business type sits just below it, in smaller type
    pub business_baseline: f64,
    /// Phone number is vertically centred on the second icon
    pub phone_baseline: f64,
}

/// Complete placement of every poster element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PosterLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub subject: SubjectPlacement,
    pub tagline_lines: Vec<TextLine>,
    pub tagline_top: f64,
    /// First y below the last tagline line
    pub tagline_bottom: f64,
    pub contact: ContactLayout,
}

impl PosterLayout {
    /// Lay out a poster for a subject of the given size and a tagline
    ///
    /// The contact block sits at its default height unless the tagline block
    /// would come within `contact_min_clearance` of it, in which case it is
    /// pushed down.
    ///
    /// # Errors
    /// Returns `AssetLoad` for a zero-sized subject
    pub fn compute(
        config: &CompositorConfig,
        subject_dimensions: (u32, u32),
        tagline: &str,
    ) -> Result<Self> {
        let subject = SubjectPlacement::compute(config, subject_dimensions.0, subject_dimensions.1)?;

        let canvas_h = f64::from(config.canvas_height);
        let line_height = f64::from(config.tagline_line_height);
        let tagline_top = canvas_h * f64::from(config.tagline_top_ratio);

        let tagline_lines: Vec<TextLine> =
            wrap_tagline(tagline, config.tagline_wrap_threshold, config.tagline_line_budget)
                .into_iter()
                .enumerate()
                .map(|(index, text)| TextLine {
                    text,
                    x: f64::from(config.tagline_x),
                    baseline_y: tagline_top + index as f64 * line_height,
                })
                .collect();

        let tagline_bottom = tagline_top + tagline_lines.len() as f64 * line_height;

        let default_top =
            canvas_h * f64::from(config.contact_top_ratio) - f64::from(config.contact_top_offset);
        let clearance = f64::from(config.contact_min_clearance);
        let top = if tagline_bottom + clearance > default_top {
            tagline_bottom + clearance
        } else {
            default_top
        };

        let icon_x = f64::from(config.icon_center_x);
        let icon_radius = f64::from(config.icon_radius);
        let contact_px = f64::from(config.contact_font_px);
        let second_y = top + f64::from(config.icon_spacing);
        let contact = ContactLayout {
            top,
            icon_radius,
            first_icon: (icon_x, top),
            second_icon: (icon_x, second_y),
            text_x: icon_x + icon_radius + f64::from(config.contact_text_gap),
            name_baseline: top - 4.0,
            business_baseline: top + contact_px * 0.7,
            phone_baseline: second_y + contact_px * 0.35,
        };

        Ok(Self {
            canvas_width: config.canvas_width,
            canvas_height: config.canvas_height,
            subject,
            tagline_lines,
            tagline_top,
            tagline_bottom,
            contact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(text: &str) -> Vec<String> {
        wrap_tagline(text, 35, 40)
    }

    #[test]
    fn test_short_tagline_single_line() {
        let tagline = "Quality service since 1998 for you"; // 34 chars
        assert_eq!(tagline.len(), 34);
        assert_eq!(wrap(tagline), vec![tagline.to_string()]);

        let tagline = "Quality service since 1998 for you!"; // 35 chars
        assert_eq!(wrap(tagline).len(), 1);
    }

    #[test]
    fn test_36_chars_wraps_to_two_lines() {
        let tagline = "Quality service since 1998 for you!!"; // 36 chars
        assert_eq!(tagline.len(), 36);
        let lines = wrap(tagline);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.chars().count() < 40));
        assert_eq!(lines.join(" "), tagline);
    }

    #[test]
    fn test_long_tagline_greedy_wrap() {
        let tagline = "Believed in myself, took the right steps, and success followed";
        let lines = wrap(tagline);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Believed in myself, took the"));
        assert_eq!(lines[0], "Believed in myself, took the right");
        assert_eq!(lines[1], "steps, and success followed");
        assert!(lines.iter().all(|l| l.chars().count() < 40));
    }

    #[test]
    fn test_very_long_tagline_many_lines() {
        let tagline = "We deliver fresh groceries to every doorstep in the city \
                       within thirty minutes, every single day of the year, rain or shine";
        let lines = wrap(tagline);
        assert!(lines.len() >= 3);
        assert!(lines.iter().all(|l| l.chars().count() < 40));
        assert_eq!(lines.join(" "), tagline.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_unbreakable_word() {
        let word = "a".repeat(45);
        assert_eq!(wrap(&word), vec![word.clone()]);
    }

    #[test]
    fn test_empty_tagline() {
        assert!(wrap("").is_empty());
        assert!(wrap("   ").is_empty());
    }

    #[test]
    fn test_subject_scale_tall_portrait() {
        let config = CompositorConfig::default();
        let placement = SubjectPlacement::compute(&config, 800, 1600).unwrap();

        assert!((placement.scale - 0.4875).abs() < 1e-4);
        assert_eq!((placement.width, placement.height), (390, 780));
        assert!((placement.x - 22.4).abs() < 1e-3);
        assert!((placement.y - 516.0).abs() < 1e-3);
    }

    #[test]
    fn test_subject_scale_wide_image() {
        let config = CompositorConfig::default();
        let placement = SubjectPlacement::compute(&config, 2000, 1000).unwrap();
        // Width bound: 572 / 2000
        assert!((placement.scale - 0.286).abs() < 1e-4);
        assert_eq!((placement.width, placement.height), (572, 286));
    }

    #[test]
    fn test_zero_subject_rejected() {
        let config = CompositorConfig::default();
        assert!(matches!(
            SubjectPlacement::compute(&config, 0, 10),
            Err(PosterError::AssetLoad(_))
        ));
    }

    #[test]
    fn test_contact_default_position() {
        let config = CompositorConfig::default();
        let layout = PosterLayout::compute(&config, (500, 500), "Short tagline").unwrap();

        assert!((layout.tagline_top - 144.0).abs() < 1e-3);
        assert!((layout.contact.top - 459.0).abs() < 1e-3);
        assert!((layout.contact.second_icon.1 - layout.contact.first_icon.1 - 85.0).abs() < 1e-6);
        assert!((layout.contact.first_icon.0 - 80.0).abs() < 1e-6);
        assert!((layout.contact.text_x - 140.0).abs() < 1e-6);
        assert!(layout.contact.name_baseline < layout.contact.business_baseline);
        assert!(layout.contact.business_baseline < layout.contact.second_icon.1);
    }

    #[test]
    fn test_contact_clears_four_line_tagline() {
        let config = CompositorConfig::default();
        let tagline = "Fresh flowers for weddings, birthdays and every celebration \
                       delivered across town with a smile from our family business";
        let layout = PosterLayout::compute(&config, (500, 500), tagline).unwrap();
        assert!(layout.tagline_lines.len() >= 4);

        let required = layout.tagline_top + 4.0 * 60.0 + 50.0;
        assert!(layout.contact.top >= required);
    }

    #[test]
    fn test_contact_pushed_down_by_tall_tagline() {
        let config = CompositorConfig::default();
        let tagline = "one two three four five six seven eight nine ten eleven twelve \
                       thirteen fourteen fifteen sixteen seventeen eighteen nineteen twenty \
                       twentyone twentytwo twentythree twentyfour";
        let layout = PosterLayout::compute(&config, (500, 500), tagline).unwrap();
        assert!(layout.tagline_lines.len() >= 5);

        let expected = layout.tagline_bottom + 50.0;
        assert!((layout.contact.top - expected).abs() < 1e-6);
        assert!(layout.contact.top > 459.0);
    }

    #[test]
    fn test_tagline_line_positions() {
        let config = CompositorConfig::default();
        let layout = PosterLayout::compute(
            &config,
            (100, 100),
            "Believed in myself, took the right steps, and success followed",
        )
        .unwrap();

        assert_eq!(layout.tagline_lines.len(), 2);
        assert!((layout.tagline_lines[0].baseline_y - 144.0).abs() < 1e-3);
        assert!((layout.tagline_lines[1].baseline_y - 204.0).abs() < 1e-3);
        assert!((layout.tagline_lines[0].x - 60.0).abs() < 1e-6);
        assert!((layout.tagline_bottom - 264.0).abs() < 1e-3);
    }
}
