//! Raster primitives: coverage-weighted blending and filled circles

use image::{Rgba, RgbaImage};

/// Blend `src` over `dst` with an extra coverage factor in [0, 1]
pub fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let src_alpha = f32::from(src[3]) / 255.0 * coverage.clamp(0.0, 1.0);
    if src_alpha <= 0.0 {
        return;
    }

    let dst_alpha = f32::from(dst[3]) / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }

    for channel in 0..3 {
        let s = f32::from(src[channel]);
        let d = f32::from(dst[channel]);
        let value = (s * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        dst[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Draw an anti-aliased filled circle
pub fn fill_circle(canvas: &mut RgbaImage, center_x: f32, center_y: f32, radius: f32, color: Rgba<u8>) {
    if radius <= 0.0 {
        return;
    }
    let (canvas_w, canvas_h) = canvas.dimensions();

    let min_x = (center_x - radius - 1.0).floor().max(0.0) as u32;
    let min_y = (center_y - radius - 1.0).floor().max(0.0) as u32;
    let max_x = ((center_x + radius + 1.0).ceil().max(0.0) as u32).min(canvas_w);
    let max_y = ((center_y + radius + 1.0).ceil().max(0.0) as u32).min(canvas_h);

    for py in min_y..max_y {
        for px in min_x..max_x {
            let dx = px as f32 + 0.5 - center_x;
            let dy = py as f32 + 0.5 - center_y;
            let distance = (dx * dx + dy * dy).sqrt();
            let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend_pixel(canvas.get_pixel_mut(px, py), color, coverage);
            }
        }
    }
}
