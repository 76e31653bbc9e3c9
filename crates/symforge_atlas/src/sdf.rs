//! Signed distance fields from rasterized coverage.
//!
//! The shape is `alpha > 127`. Distances are exact Euclidean distances
//! between pixel centres (Felzenszwalb-Huttenlocher, separable), shifted by
//! half a pixel so that the boundary between an inside and an outside pixel
//! decodes to exactly 0.5.

use image::{Rgba, RgbaImage};

/// Binary mask of the bitmap's alpha channel, row-major.
pub fn inside_mask(bitmap: &RgbaImage) -> Vec<bool> {
    bitmap.pixels().map(|p| p.0[3] > 127).collect()
}

/// Squared 1D distance transform of the sampled function `f` into `d`.
fn edt_1d(f: &[f32], d: &mut [f32]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let mut v = vec![0usize; n];
    let mut z = vec![0.0f32; n + 1];
    z[0] = f32::NEG_INFINITY;
    z[1] = f32::INFINITY;
    let mut k = 0usize;
    for q in 1..n {
        let fq = f[q] + (q * q) as f32;
        let mut s = (fq - (f[v[k]] + (v[k] * v[k]) as f32)) / (2 * (q - v[k])) as f32;
        while s <= z[k] && k > 0 {
            k -= 1;
            s = (fq - (f[v[k]] + (v[k] * v[k]) as f32)) / (2 * (q - v[k])) as f32;
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f32::INFINITY;
    }
    k = 0;
    for (q, out) in d.iter_mut().enumerate().take(n) {
        while z[k + 1] < q as f32 {
            k += 1;
        }
        let diff = q as f32 - v[k] as f32;
        *out = diff * diff + f[v[k]];
    }
}

/// Distance from every pixel to the nearest `true` pixel (0 on the set).
/// An empty set yields distances larger than the image diagonal.
pub fn distance_transform(mask: &[bool], width: usize, height: usize) -> Vec<f32> {
    let far = (width * width + height * height) as f32;
    let mut grid: Vec<f32> = mask.iter().map(|&m| if m { 0.0 } else { far }).collect();
    if width == 0 || height == 0 {
        return grid;
    }

    let mut out = vec![0.0f32; width.max(height)];
    for row in grid.chunks_exact_mut(width) {
        edt_1d(row, &mut out[..width]);
        row.copy_from_slice(&out[..width]);
    }
    let mut column = vec![0.0f32; height];
    for x in 0..width {
        for (y, c) in column.iter_mut().enumerate() {
            *c = grid[y * width + x];
        }
        edt_1d(&column, &mut out[..height]);
        for y in 0..height {
            grid[y * width + x] = out[y].sqrt();
        }
    }
    grid
}

/// Majority-vote a mask down to `dst_width` x `dst_height`.
pub fn downsample_mask(
    mask: &[bool],
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
) -> Vec<bool> {
    let sx = src_width as f32 / dst_width as f32;
    let sy = src_height as f32 / dst_height as f32;
    let mut out = Vec::with_capacity(dst_width * dst_height);
    for dy in 0..dst_height {
        let y0 = (dy as f32 * sy) as usize;
        let y1 = (((dy + 1) as f32 * sy).ceil() as usize).min(src_height);
        for dx in 0..dst_width {
            let x0 = (dx as f32 * sx) as usize;
            let x1 = (((dx + 1) as f32 * sx).ceil() as usize).min(src_width);
            let mut inside = 0usize;
            let mut total = 0usize;
            for y in y0..y1 {
                for x in x0..x1 {
                    inside += mask[y * src_width + x] as usize;
                    total += 1;
                }
            }
            out.push(inside * 2 > total);
        }
    }
    out
}

fn field_from_mask(mask: &[bool], width: u32, height: u32, spread: u32) -> RgbaImage {
    let (w, h) = (width as usize, height as usize);
    if !mask.iter().any(|&m| m) {
        return RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
    }
    if mask.iter().all(|&m| m) {
        return RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    }
    let outside: Vec<bool> = mask.iter().map(|&m| !m).collect();
    let to_inside = distance_transform(mask, w, h);
    let to_outside = distance_transform(&outside, w, h);
    let spread = spread.max(1) as f32;
    RgbaImage::from_fn(width, height, |x, y| {
        let i = y as usize * w + x as usize;
        let signed = if mask[i] {
            to_outside[i] - 0.5
        } else {
            0.5 - to_inside[i]
        };
        let v = (signed / spread * 0.5 + 0.5).clamp(0.0, 1.0);
        let v = (v * 255.0).round() as u8;
        Rgba([v, v, v, 255])
    })
}

/// Encode `bitmap` as a distance field of the same size. The value goes to
/// R, G and B alike; alpha is opaque.
pub fn encode(bitmap: &RgbaImage, spread: u32) -> RgbaImage {
    field_from_mask(&inside_mask(bitmap), bitmap.width(), bitmap.height(), spread)
}

/// Downsample the mask of a super-sampled `bitmap` to the target size, then
/// encode. `spread` is in target pixels.
pub fn encode_downsampled(bitmap: &RgbaImage, target_width: u32, target_height: u32, spread: u32) -> RgbaImage {
    let mask = downsample_mask(
        &inside_mask(bitmap),
        bitmap.width() as usize,
        bitmap.height() as usize,
        target_width as usize,
        target_height as usize,
    );
    field_from_mask(&mask, target_width, target_height, spread)
}
