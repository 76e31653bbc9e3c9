//! Glyph placement: one transform (or one font size) per region so that every
//! glyph in the region shares a baseline and a horizontal centre.

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::metrics::FontMetrics;
use crate::raster::{InkBounds, Rasterizer};

/// Wide reference glyphs used to cap the font size by ink width.
pub const WIDTH_PROBE: &str = "W@M#%&QG";

/// Font-size search range for the bisection, in pixels.
pub const SIZE_SEARCH_RANGE: (f32, f32) = (1.0, 1024.0);
pub const SIZE_SEARCH_ITERATIONS: u32 = 32;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlacementError {
    #[error("cell {width}x{height} leaves no room inside a {spread}px distance-field margin")]
    CellTooSmall { width: u32, height: u32, spread: u32 },
    #[error("padding {0} must be in (0, 1]")]
    InvalidPadding(f32),
    #[error("rasterizer '{font}' reports no line metrics at {size}px")]
    LineMetricsUnavailable { font: String, size: f32 },
}

/// Transform from EM space to cell pixels, shared by every glyph rendered
/// through the vector path for one (font, cell, spread, padding) tuple.
///
/// A point `(x, y)` in EM units lands at pixel
/// `((x + translate_x) * scale, (y + translate_y) * scale)` measured from the
/// cell's bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl PlacementParams {
    /// Metric-driven placement. The spread is reserved as a margin at the top
    /// and the bottom; `padding` shrinks the ascent-descent band inside the
    /// remaining height and keeps it centred.
    pub fn metric_driven(
        metrics: &FontMetrics,
        cell_width: u32,
        cell_height: u32,
        spread: u32,
        padding: f32,
    ) -> Result<Self, PlacementError> {
        if !(padding > 0.0 && padding <= 1.0) {
            return Err(PlacementError::InvalidPadding(padding));
        }
        let margin = spread as f32;
        let usable = cell_height as f32 - 2.0 * margin;
        if usable <= 0.0 || cell_width == 0 {
            return Err(PlacementError::CellTooSmall {
                width: cell_width,
                height: cell_height,
                spread,
            });
        }
        let scale = usable * padding / metrics.line_height_em();
        let bottom = margin + usable * (1.0 - padding) / 2.0;
        Ok(Self {
            scale,
            translate_x: cell_width as f32 / (2.0 * scale) - metrics.advance_em / 2.0,
            translate_y: bottom / scale - metrics.descent_em,
        })
    }

    /// Map a cell pixel position (y up from the bottom edge) back to EM.
    pub fn to_em(&self, px: f32, py: f32) -> (f32, f32) {
        (px / self.scale - self.translate_x, py / self.scale - self.translate_y)
    }

    /// Height of the baseline above the cell's bottom edge, in pixels.
    pub fn baseline_from_bottom(&self) -> f32 {
        self.scale * self.translate_y
    }

    /// The baseline as an image row boundary (y down).
    pub fn baseline_row(&self, cell_height: u32) -> f32 {
        cell_height as f32 - self.baseline_from_bottom()
    }
}

/// Find the pixel size whose `ascent + descent + line_gap` matches `target`.
pub fn solve_font_size_for_height(r: &dyn Rasterizer, target: f32) -> Result<f32, PlacementError> {
    let (mut lo, mut hi) = SIZE_SEARCH_RANGE;
    for _ in 0..SIZE_SEARCH_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        let lm = r.line_metrics(mid).ok_or_else(|| PlacementError::LineMetricsUnavailable {
            font: r.name().to_string(),
            size: mid,
        })?;
        if lm.height() < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok((lo + hi) / 2.0)
}

/// Shrink `size` so the widest probe glyph's ink fits in `cell_width * margin`.
pub fn apply_width_constraint(r: &dyn Rasterizer, size: f32, cell_width: u32, margin: f32) -> f32 {
    let worst = WIDTH_PROBE
        .chars()
        .filter(|&c| r.has_glyph(c))
        .map(|c| r.ink_bounds(c, size).width)
        .fold(0.0f32, f32::max);
    let limit = cell_width as f32 * margin;
    if worst <= limit {
        size
    } else {
        size * (limit / worst)
    }
}

/// Empirical placement for bitmap rasterization: a solved font size plus
/// per-glyph centring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitmapPlacement {
    pub font_size: f32,
    pub ascent: f32,
    pub descent: f32,
    /// Graphic glyphs are centred on their advance so they tile edge to edge.
    pub fill_cell: bool,
    pub width: u32,
    pub height: u32,
}

impl BitmapPlacement {
    /// `width_margin` is `Some` for text glyphs (apply the probe-width cap)
    /// and `None` for graphic glyphs, which use the height fit only.
    pub fn solve(
        r: &dyn Rasterizer,
        width: u32,
        height: u32,
        padding: f32,
        width_margin: Option<f32>,
    ) -> Result<Self, PlacementError> {
        if !(padding > 0.0 && padding <= 1.0) {
            return Err(PlacementError::InvalidPadding(padding));
        }
        if width == 0 || height == 0 {
            return Err(PlacementError::CellTooSmall { width, height, spread: 0 });
        }
        let mut size = solve_font_size_for_height(r, height as f32 * padding)?;
        if let Some(margin) = width_margin {
            size = apply_width_constraint(r, size, width, margin);
        }
        let lm = r.line_metrics(size).ok_or_else(|| PlacementError::LineMetricsUnavailable {
            font: r.name().to_string(),
            size,
        })?;
        log::debug!(
            "bitmap placement for '{}' at {width}x{height}: {size:.3}px (fill_cell={})",
            r.name(),
            width_margin.is_none()
        );
        Ok(Self {
            font_size: size,
            ascent: lm.ascent,
            descent: lm.descent,
            fill_cell: width_margin.is_none(),
            width,
            height,
        })
    }

    /// Pen position for a glyph: x from the left edge and the baseline
    /// height from the bottom edge, both snapped to whole pixels.
    pub fn origin(&self, ink: &InkBounds) -> (f32, f32) {
        let w = self.width as f32;
        let x = if self.fill_cell {
            (w - ink.advance) / 2.0
        } else {
            (w - ink.width) / 2.0 - ink.x
        };
        let baseline = (self.height as f32 - (self.ascent + self.descent)) / 2.0 + self.descent;
        (x.round(), baseline.round())
    }

    /// Render `c` as white ink whose alpha is the coverage. `None` if the
    /// rasterizer failed; a glyph without ink yields a transparent tile.
    pub fn render(&self, r: &dyn Rasterizer, c: char) -> Option<RgbaImage> {
        let cov = r.rasterize(c, self.font_size)?;
        let mut img = RgbaImage::from_pixel(self.width, self.height, Rgba([0, 0, 0, 0]));
        if cov.is_empty() {
            return Some(img);
        }
        let ink = r.ink_bounds(c, self.font_size);
        let (ox, baseline) = self.origin(&ink);
        let left = ox as i64 + cov.left as i64;
        let top = self.height as i64 - (baseline as i64 + cov.bottom as i64 + cov.height as i64);
        for (j, row) in cov.data.chunks_exact(cov.width).enumerate() {
            let y = top + j as i64;
            if y < 0 || y >= self.height as i64 {
                continue;
            }
            for (i, &a) in row.iter().enumerate() {
                let x = left + i as i64;
                if x < 0 || x >= self.width as i64 || a == 0 {
                    continue;
                }
                img.put_pixel(x as u32, y as u32, Rgba([255, 255, 255, a]));
            }
        }
        Some(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::BlockRasterizer;

    fn metrics() -> FontMetrics {
        FontMetrics::new(1000, 800, -200, 500).unwrap()
    }

    #[test]
    fn metric_driven_without_padding_matches_formulas() {
        let p = PlacementParams::metric_driven(&metrics(), 16, 32, 4, 1.0).unwrap();
        assert!((p.scale - 24.0).abs() < 1e-5);
        assert!((p.translate_y - (4.0 / 24.0 + 0.2)).abs() < 1e-5);
        assert!((p.translate_x - (16.0 / 48.0 - 0.25)).abs() < 1e-5);
        // descent line sits exactly on the bottom margin
        assert!((p.scale * (p.translate_y - 0.2) - 4.0).abs() < 1e-4);
    }

    #[test]
    fn padding_keeps_band_centred() {
        let m = metrics();
        let p = PlacementParams::metric_driven(&m, 16, 32, 4, 0.92).unwrap();
        let bottom = p.scale * (p.translate_y + m.descent_em);
        let top = 32.0 - p.scale * (p.translate_y + m.ascent_em);
        assert!((bottom - top).abs() < 1e-4);
        assert!(bottom > 4.0);
        let (x, _) = p.to_em(8.0, 0.0);
        assert!((x - m.advance_em / 2.0).abs() < 1e-5);
    }

    #[test]
    fn rejects_cells_smaller_than_margins() {
        assert_eq!(
            PlacementParams::metric_driven(&metrics(), 16, 8, 4, 1.0),
            Err(PlacementError::CellTooSmall { width: 16, height: 8, spread: 4 })
        );
        assert_eq!(
            PlacementParams::metric_driven(&metrics(), 16, 32, 4, 0.0),
            Err(PlacementError::InvalidPadding(0.0))
        );
    }

    #[test]
    fn bisection_converges_on_line_height() {
        let r = BlockRasterizer::new(0.5);
        let size = solve_font_size_for_height(&r, 32.0 * 0.92).unwrap();
        assert!((size - 29.44).abs() < 1e-3);
    }

    #[test]
    fn wide_probe_glyph_shrinks_size() {
        let r = BlockRasterizer::new(0.5).glyph('W', 0.0, 0.0, 0.9, 0.7);
        let size = apply_width_constraint(&r, 29.44, 16, 0.98);
        assert!(size < 29.44);
        assert!((0.9 * size - 16.0 * 0.98).abs() < 1e-3);
        // narrow glyphs leave the size alone
        let r = BlockRasterizer::new(0.5).glyph('M', 0.0, 0.0, 0.4, 0.7);
        assert_eq!(apply_width_constraint(&r, 29.44, 16, 0.98), 29.44);
    }

    #[test]
    fn graphic_block_fills_the_cell() {
        let r = BlockRasterizer::new(0.5).glyph('█', 0.0, -0.2, 0.5, 0.8);
        let placement = BitmapPlacement::solve(&r, 16, 32, 1.0, None).unwrap();
        assert!(placement.fill_cell);
        let tile = placement.render(&r, '█').unwrap();
        assert!(tile.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn text_glyphs_share_a_baseline() {
        let r = BlockRasterizer::new(0.5)
            .glyph('T', 0.05, 0.0, 0.45, 0.7)
            .glyph('g', 0.05, -0.2, 0.45, 0.5);
        let placement = BitmapPlacement::solve(&r, 16, 32, 0.92, Some(0.98)).unwrap();
        let t = placement.render(&r, 'T').unwrap();
        let g = placement.render(&r, 'g').unwrap();
        let lowest = |img: &RgbaImage| (0..img.height()).rev().find(|&y| img.get_pixel(8, y).0[3] > 0);
        let t_bottom = lowest(&t).unwrap();
        let g_bottom = lowest(&g).unwrap();
        // the descender of 'g' reaches below the baseline where 'T' stops
        assert!(g_bottom > t_bottom);
        let (_, base_t) = placement.origin(&r.ink_bounds('T', placement.font_size));
        let (_, base_g) = placement.origin(&r.ink_bounds('g', placement.font_size));
        assert_eq!(base_t, base_g);
    }

    #[test]
    fn failed_rasterization_is_none_and_blank_glyph_is_transparent() {
        let r = BlockRasterizer::new(0.5).glyph(' ', 0.0, 0.0, 0.0, 0.0);
        let placement = BitmapPlacement::solve(&r, 16, 32, 0.92, Some(0.98)).unwrap();
        assert!(placement.render(&r, 'x').is_none());
        let space = placement.render(&r, ' ').unwrap();
        assert!(space.pixels().all(|p| p.0[3] == 0));
    }
}
