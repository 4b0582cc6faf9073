use crate::common::*;

/// Decode an uncompressed RLE into a row-major binary mask.
///
/// Counts follow the COCO convention: column-major pixel order, first run is
/// background. Runs past `height * width` are truncated.
pub fn decode_rle(counts: &[u32], height: u32, width: u32) -> Array2<u8> {
    let (h, w) = (height as usize, width as usize);
    let total = h * w;
    let mut mask = Array2::<u8>::zeros((h, w));

    let mut start = 0usize;
    let mut value = 0u8;
    for &run in counts {
        let end = (start + run as usize).min(total);
        if value != 0 {
            for flat in start..end {
                // column-major: pixel k sits at (k % h, k / h)
                mask[(flat % h, flat / h)] = 1;
            }
        }
        start += run as usize;
        value = 1 - value;
    }

    mask
}

/// Rasterize one polygon ring into a row-major binary mask with the maskApi
/// scan-line algorithm: toggle the boundary crossings of every edge along its
/// longer axis, then prefix-XOR down each column to fill the interior.
///
/// `xy` is a flat `[x0, y0, x1, y1, ..]` ring; fewer than three vertices
/// rasterize to an empty mask.
pub fn polygon_mask(xy: &[f64], height: u32, width: u32) -> Array2<u8> {
    let (h, w) = (height as usize, width as usize);
    let mut mask = Array2::<u8>::zeros((h, w));

    let k = xy.len() / 2;
    if k < 3 {
        return mask;
    }

    let h_f = height as f64;
    let w_f = width as f64;
    let px: Vec<f64> = (0..k).map(|j| xy[2 * j].max(0.0)).collect();
    let py: Vec<f64> = (0..k).map(|j| xy[2 * j + 1].max(0.0).min(h_f)).collect();

    let mut toggles = Array2::<u8>::zeros((h, w));
    for j in 0..k {
        let jn = (j + 1) % k;
        let (mut xs, mut xe) = (px[j], px[jn]);
        let (mut ys, mut ye) = (py[j], py[jn]);

        // walk the longer axis of the edge
        let flipped = if (xe - xs).abs() >= (ye - ys).abs() {
            if xs > xe {
                std::mem::swap(&mut xs, &mut xe);
                std::mem::swap(&mut ys, &mut ye);
            }
            false
        } else {
            std::mem::swap(&mut xs, &mut ys);
            std::mem::swap(&mut xe, &mut ye);
            if xs > xe {
                std::mem::swap(&mut xs, &mut xe);
                std::mem::swap(&mut ys, &mut ye);
            }
            true
        };

        let slope = if xe == xs { 0.0 } else { (ye - ys) / (xe - xs) };
        let (primary, secondary) = if flipped { (h_f, w_f) } else { (w_f, h_f) };

        let d0 = ((xs + 1.0).floor() as i64).max(0) as usize;
        let d1 = ((xe + 1.0).floor() as i64).min(primary as i64).max(0) as usize;

        for d in d0..d1 {
            let t = ys + slope * (d as f64 - xs);
            let t = if t < 0.0 {
                0
            } else if t >= secondary {
                secondary as usize - 1
            } else {
                t as usize
            };

            let (row, col) = if flipped { (d, t) } else { (t, d) };
            if row < h && col < w {
                toggles[(row, col)] ^= 1;
            }
        }
    }

    // crossings become filled spans
    for col in 0..w {
        let mut inside = 0u8;
        for row in 0..h {
            inside ^= toggles[(row, col)];
            mask[(row, col)] = inside;
        }
    }

    mask
}
