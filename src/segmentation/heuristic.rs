//! Local background segmentation used when the remote service is unavailable
//!
//! The algorithm grows a background region inward from the frame border:
//!
//! 1. an edge map marks interior pixels whose colour jumps against the right or
//!    lower neighbour,
//! 2. every border pixel seeds the background,
//! 3. a 4-connected breadth-first fill absorbs neighbours that are not edges and
//!    whose colour is close to the pixel being expanded,
//! 4. absorbed pixels get alpha 0.
//!
//! When the fill swallows the whole frame (typical for flat, low-contrast
//! photos) the mask is discarded and a centred radial falloff is used instead.
//!
//! Every step is a pure function of the input pixels. Membership in the fill is
//! reachability over a fixed pairwise predicate, so the mask does not depend on
//! queue order.

use crate::config::SegmenterConfig;
use crate::types::{BackgroundMask, MaskStatistics, SegmentationSource};
use image::{Rgba, RgbaImage};
use std::collections::VecDeque;
use tracing::{debug, span, Level};

/// Tunables for the local algorithm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicParams {
    pub edge_threshold: u32,
    pub background_tolerance: u32,
    pub radial_fade_start: f64,
    pub radial_fade_rate: f64,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self::from(&SegmenterConfig::default())
    }
}

impl From<&SegmenterConfig> for HeuristicParams {
    fn from(config: &SegmenterConfig) -> Self {
        Self {
            edge_threshold: config.edge_threshold,
            background_tolerance: config.background_tolerance,
            radial_fade_start: config.radial_fade_start,
            radial_fade_rate: config.radial_fade_rate,
        }
    }
}

/// Output of the local algorithm
#[derive(Debug, Clone)]
pub struct HeuristicOutcome {
    /// Copy of the input with background alpha cleared
    pub image: RgbaImage,
    /// Which branch produced `image`
    pub source: SegmentationSource,
    /// Statistics of the flood-fill mask (before any radial fallback)
    pub mask_statistics: MaskStatistics,
}

/// Interior pixels with a strong colour gradient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMap {
    data: Vec<bool>,
    width: u32,
    height: u32,
}

impl EdgeMap {
    #[must_use]
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .unwrap_or(false)
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.data.iter().filter(|&&e| e).count()
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Sum of absolute RGB channel differences (alpha ignored)
#[must_use]
pub fn channel_sum_diff(a: &Rgba<u8>, b: &Rgba<u8>) -> u32 {
    a.0.iter()
        .zip(b.0.iter())
        .take(3)
        .map(|(&p, &q)| u32::from(p.abs_diff(q)))
        .sum()
}

/// Build the edge map
///
/// Only interior pixels are examined; the frame border is never an edge.
#[must_use]
pub fn detect_edges(image: &RgbaImage, threshold: u32) -> EdgeMap {
    let (width, height) = image.dimensions();
    let mut data = vec![false; width as usize * height as usize];

    if width >= 3 && height >= 3 {
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let current = image.get_pixel(x, y);
                let diff_right = channel_sum_diff(current, image.get_pixel(x + 1, y));
                let diff_below = channel_sum_diff(current, image.get_pixel(x, y + 1));

                if diff_right > threshold || diff_below > threshold {
                    if let Some(cell) = data.get_mut(y as usize * width as usize + x as usize) {
                        *cell = true;
                    }
                }
            }
        }
    }

    EdgeMap {
        data,
        width,
        height,
    }
}

/// Every pixel on the outer frame, each listed once
fn border_pixels(width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let top = (0..width).map(|x| (x, 0));
    let bottom = (0..width)
        .filter(move |_| height > 1)
        .map(move |x| (x, height - 1));
    let sides = (1..height.saturating_sub(1)).flat_map(move |y| {
        std::iter::once((0, y)).chain(std::iter::once((width - 1, y)).filter(move |_| width > 1))
    });
    top.chain(bottom).chain(sides)
}

/// In-bounds 4-connected neighbours
fn neighbours(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let left = x.checked_sub(1).map(|nx| (nx, y));
    let right = (x + 1 < width).then_some((x + 1, y));
    let up = y.checked_sub(1).map(|ny| (x, ny));
    let down = (y + 1 < height).then_some((x, y + 1));
    [left, right, up, down].into_iter().flatten()
}

/// Breadth-first frontier over a visited set
///
/// The visited set doubles as the background mask: a pixel is pushed at most
/// once, at the moment it joins the background.
struct FloodFrontier {
    visited: BackgroundMask,
    queue: VecDeque<(u32, u32)>,
}

impl FloodFrontier {
    fn new(width: u32, height: u32) -> Self {
        Self {
            visited: BackgroundMask::new(width, height),
            queue: VecDeque::new(),
        }
    }

    /// Mark and enqueue; returns false when the pixel was already visited
    fn visit(&mut self, x: u32, y: u32) -> bool {
        if self.visited.is_background(x, y) {
            return false;
        }
        self.visited.mark_background(x, y);
        self.queue.push_back((x, y));
        true
    }

    fn next(&mut self) -> Option<(u32, u32)> {
        self.queue.pop_front()
    }

    fn is_visited(&self, x: u32, y: u32) -> bool {
        self.visited.is_background(x, y)
    }

    fn into_mask(self) -> BackgroundMask {
        self.visited
    }
}

/// Grow the background region from the frame border
#[must_use]
pub fn flood_fill_background(image: &RgbaImage, edges: &EdgeMap, tolerance: u32) -> BackgroundMask {
    let (width, height) = image.dimensions();
    let mut frontier = FloodFrontier::new(width, height);

    for (x, y) in border_pixels(width, height) {
        frontier.visit(x, y);
    }

    while let Some((cx, cy)) = frontier.next() {
        let current = image.get_pixel(cx, cy);

        for (nx, ny) in neighbours(cx, cy, width, height) {
            if frontier.is_visited(nx, ny) || edges.is_edge(nx, ny) {
                continue;
            }
            if channel_sum_diff(current, image.get_pixel(nx, ny)) < tolerance {
                frontier.visit(nx, ny);
            }
        }
    }

    frontier.into_mask()
}

/// Replace all alpha with a centred radial falloff
///
/// Distance is normalized per axis so the frame midpoints sit at 1.0. Pixels
/// beyond `fade_start` lose `fade_rate` alpha per unit distance.
pub fn apply_radial_falloff(image: &mut RgbaImage, fade_start: f64, fade_rate: f64) {
    let (width, height) = image.dimensions();
    let half_w = f64::from(width) / 2.0;
    let half_h = f64::from(height) / 2.0;

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dist_x = (f64::from(x) - half_w) / half_w;
        let dist_y = (f64::from(y) - half_h) / half_h;
        let dist = (dist_x * dist_x + dist_y * dist_y).sqrt();

        pixel[3] = if dist > fade_start {
            let alpha = (1.0 - (dist - fade_start) * fade_rate).max(0.0);
            (255.0 * alpha).round() as u8
        } else {
            255
        };
    }
}

fn has_opaque_pixel(image: &RgbaImage) -> bool {
    image.pixels().any(|p| p[3] > 0)
}

/// Run the full local algorithm on a copy of `image`
#[must_use]
pub fn segment(image: &RgbaImage, params: &HeuristicParams) -> HeuristicOutcome {
    let (width, height) = image.dimensions();
    let _span = span!(Level::DEBUG, "heuristic_segmentation", width, height).entered();

    let edges = detect_edges(image, params.edge_threshold);
    let mask = flood_fill_background(image, &edges, params.background_tolerance);
    let mask_statistics = mask.statistics();

    debug!(
        edges = edges.edge_count(),
        background_pixels = mask_statistics.background_pixels,
        background_ratio = mask_statistics.background_ratio,
        "Flood fill finished"
    );

    let mut output = image.clone();
    // Dimensions match by construction.
    let _ = mask.apply_to_image(&mut output);

    if has_opaque_pixel(&output) {
        return HeuristicOutcome {
            image: output,
            source: SegmentationSource::EdgeFloodFill,
            mask_statistics,
        };
    }

    debug!("Flood fill consumed the whole frame, using radial fallback");
    let mut output = image.clone();
    apply_radial_falloff(&mut output, params.radial_fade_start, params.radial_fade_rate);

    // A 1x1 frame puts its only pixel at the corner distance.
    if !has_opaque_pixel(&output) {
        for pixel in output.pixels_mut() {
            pixel[3] = 255;
        }
    }

    HeuristicOutcome {
        image: output,
        source: SegmentationSource::RadialFallback,
        mask_statistics,
    }
}
