//! Inspection helpers: mask overlay compositing and label color packing.
//!
//! Figure/legend rendering stays outside this crate; these helpers produce
//! plain image buffers a viewer can display directly.

use crate::common::*;
use image::{Rgb, RgbImage};

/// Pack a wide label value into an RGB triple: `value = r * 256^2 + g * 256
/// + b`.
pub fn int_to_rgb(value: u32) -> [u8; 3] {
    let b = (value % 256) as u8;
    let g = ((value / 256) % 256) as u8;
    let r = ((value / (256 * 256)) % 256) as u8;
    [r, g, b]
}

/// Inverse of [`int_to_rgb`].
pub fn rgb_to_int([r, g, b]: [u8; 3]) -> u32 {
    256 * 256 * r as u32 + 256 * g as u32 + b as u32
}

/// `n` visually distinct colors, stepped around the hue wheel at full
/// saturation.
pub fn class_palette(n: usize) -> Vec<Rgb<u8>> {
    (0..n)
        .map(|index| {
            let hue = index as f32 / n.max(1) as f32 * 360.0;
            hsv_to_rgb(hue, 1.0, 1.0)
        })
        .collect()
}

/// Blend a categorical mask over its image.
///
/// Per pixel, the highest populated non-background channel wins; its palette
/// color is alpha-blended over the image. Background pixels are left
/// untouched so the image shows through.
pub fn overlay_mask(image: &RgbImage, mask: &Array3<f32>, alpha: f32) -> Result<RgbImage> {
    let (h, w, n_classes) = mask.dim();
    ensure!(
        image.width() as usize == w && image.height() as usize == h,
        "image size {}x{} does not match mask size {}x{}",
        image.height(),
        image.width(),
        h,
        w
    );
    ensure!(
        (0.0..=1.0).contains(&alpha),
        "alpha must be in [0, 1], got {}",
        alpha
    );

    let palette = class_palette(n_classes);
    let mut out = image.clone();

    for row in 0..h {
        for col in 0..w {
            let class = (1..n_classes)
                .rev()
                .find(|&channel| mask[(row, col, channel)] >= 0.5);
            if let Some(class) = class {
                let color = palette[class];
                let pixel = out.get_pixel_mut(col as u32, row as u32);
                for channel in 0..3 {
                    let blended = (1.0 - alpha) * pixel[channel] as f32
                        + alpha * color[channel] as f32;
                    pixel[channel] = blended.round() as u8;
                }
            }
        }
    }

    Ok(out)
}

fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Rgb<u8> {
    let c = value * saturation;
    let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let m = value - c;

    let (r, g, b) = match hue {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgb([
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ])
}
