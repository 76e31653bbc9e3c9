//! Distance fields generated directly from glyph outlines.

use image::{Rgba, RgbaImage};

use crate::outline::GlyphCommand;
use crate::placement::PlacementParams;

const QUAD_STEPS: u32 = 16;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Segment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

pub(crate) fn point_seg_dist(px: f32, py: f32, s: &Segment) -> f32 {
    let vx = s.x1 - s.x0;
    let vy = s.y1 - s.y0;
    let wx = px - s.x0;
    let wy = py - s.y0;
    let c1 = vx * wx + vy * wy;
    let c2 = vx * vx + vy * vy;
    let b = if c2 > 0.0 { (c1 / c2).clamp(0.0, 1.0) } else { 0.0 };
    let dx = px - (s.x0 + b * vx);
    let dy = py - (s.y0 + b * vy);
    (dx * dx + dy * dy).sqrt()
}

/// Signed crossing count of a ray towards +x.
fn line_winding(px: f32, py: f32, s: &Segment) -> i32 {
    if (s.y0 <= py && s.y1 > py) || (s.y1 <= py && s.y0 > py) {
        let t = (py - s.y0) / (s.y1 - s.y0);
        let ix = s.x0 + t * (s.x1 - s.x0);
        if ix > px {
            return if s.y1 > s.y0 { 1 } else { -1 };
        }
    }
    0
}

/// Flatten commands into line segments; quadratics are sampled uniformly.
pub(crate) fn flatten(commands: &[GlyphCommand]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = (0.0f32, 0.0f32);
    for cmd in commands {
        match *cmd {
            GlyphCommand::MoveTo(x, y) => cursor = (x, y),
            GlyphCommand::LineTo(x, y) => {
                segments.push(Segment { x0: cursor.0, y0: cursor.1, x1: x, y1: y });
                cursor = (x, y);
            }
            GlyphCommand::QuadTo { ctrl_x, ctrl_y, to_x, to_y } => {
                let (mut prev_x, mut prev_y) = cursor;
                for i in 1..=QUAD_STEPS {
                    let t = i as f32 / QUAD_STEPS as f32;
                    let mt = 1.0 - t;
                    let nx = mt * mt * cursor.0 + 2.0 * mt * t * ctrl_x + t * t * to_x;
                    let ny = mt * mt * cursor.1 + 2.0 * mt * t * ctrl_y + t * t * to_y;
                    segments.push(Segment { x0: prev_x, y0: prev_y, x1: nx, y1: ny });
                    prev_x = nx;
                    prev_y = ny;
                }
                cursor = (to_x, to_y);
            }
        }
    }
    segments
}

/// Render an outline (EM units) into a `width` x `height` distance field.
///
/// Pixel centres are mapped to EM space with `params`; the signed distance
/// (positive inside, nonzero winding) is converted back to pixels and
/// normalised over `spread`. The value is written to R, G and B with opaque
/// alpha, so an outline without contours yields an all-black tile.
pub fn generate_field(
    commands: &[GlyphCommand],
    width: u32,
    height: u32,
    spread: u32,
    params: &PlacementParams,
) -> RgbaImage {
    let segments = flatten(commands);
    let spread = spread.max(1) as f32;
    RgbaImage::from_fn(width, height, |ix, iy| {
        if segments.is_empty() {
            return Rgba([0, 0, 0, 255]);
        }
        let (gx, gy) = params.to_em(ix as f32 + 0.5, (height - iy) as f32 - 0.5);
        let mut min_dist = f32::MAX;
        let mut winding = 0;
        for s in &segments {
            min_dist = min_dist.min(point_seg_dist(gx, gy, s));
            winding += line_winding(gx, gy, s);
        }
        let sign = if winding != 0 { 1.0 } else { -1.0 };
        let signed_px = sign * min_dist * params.scale;
        let v = ((signed_px / spread) * 0.5 + 0.5).clamp(0.0, 1.0);
        let v = (v * 255.0).round() as u8;
        Rgba([v, v, v, 255])
    })
}
