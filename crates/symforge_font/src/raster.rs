//! Bitmap rasterization seam. The atlas pipeline only talks to the
//! [`Rasterizer`] trait; [`FontdueRasterizer`] is the production backend.

use std::path::Path;

use fontdue::{Font, FontSettings};

use crate::error::FontError;

/// Line metrics at a pixel size. Both `ascent` and `descent` are positive
/// distances from the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

impl LineMetrics {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }
}

/// Ink box of a glyph relative to its origin on the baseline (y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InkBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub advance: f32,
}

/// An 8-bit coverage bitmap, row 0 at the top. `left`/`bottom` give the
/// position of the bitmap's bottom-left corner relative to the glyph origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub width: usize,
    pub height: usize,
    pub left: i32,
    pub bottom: i32,
    pub advance: f32,
    pub data: Vec<u8>,
}

impl Coverage {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.iter().all(|&c| c == 0)
    }
}

pub trait Rasterizer: Send + Sync {
    /// A short name for diagnostics.
    fn name(&self) -> &str;

    fn has_glyph(&self, c: char) -> bool;

    fn line_metrics(&self, px: f32) -> Option<LineMetrics>;

    fn ink_bounds(&self, c: char, px: f32) -> InkBounds;

    /// Render `c` at `px`. `None` means the backend failed on this glyph.
    fn rasterize(&self, c: char, px: f32) -> Option<Coverage>;
}

pub struct FontdueRasterizer {
    font: Font,
    name: String,
}

impl FontdueRasterizer {
    pub fn from_bytes(data: &[u8], collection_index: u32, name: impl Into<String>) -> Result<Self, FontError> {
        let name = name.into();
        let settings = FontSettings {
            collection_index,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(data, settings).map_err(|reason| FontError::Rasterizer {
            name: name.clone(),
            reason: reason.to_string(),
        })?;
        Ok(Self { font, name })
    }

    pub fn load(path: &Path, collection_index: u32) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&data, collection_index, path.display().to_string())
    }
}

impl Rasterizer for FontdueRasterizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_glyph(&self, c: char) -> bool {
        self.font.lookup_glyph_index(c) != 0
    }

    fn line_metrics(&self, px: f32) -> Option<LineMetrics> {
        self.font.horizontal_line_metrics(px).map(|m| LineMetrics {
            ascent: m.ascent,
            descent: -m.descent,
            line_gap: m.line_gap,
        })
    }

    fn ink_bounds(&self, c: char, px: f32) -> InkBounds {
        let m = self.font.metrics(c, px);
        InkBounds {
            x: m.bounds.xmin,
            y: m.bounds.ymin,
            width: m.bounds.width,
            height: m.bounds.height,
            advance: m.advance_width,
        }
    }

    fn rasterize(&self, c: char, px: f32) -> Option<Coverage> {
        if !px.is_finite() || px <= 0.0 {
            return None;
        }
        let (m, data) = self.font.rasterize(c, px);
        if data.len() != m.width * m.height {
            return None;
        }
        Some(Coverage {
            width: m.width,
            height: m.height,
            left: m.xmin,
            bottom: m.ymin,
            advance: m.advance_width,
            data,
        })
    }
}

impl std::fmt::Debug for FontdueRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontdueRasterizer").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SynthFont;

    #[test]
    fn fontdue_backend_reads_synthesized_font() {
        let data = SynthFont::new(1000, 800, -200)
            .rect('A', 600, 100, 0, 500, 700)
            .build();
        let r = FontdueRasterizer::from_bytes(&data, 0, "synth").expect("fontdue accepts font");
        assert!(r.has_glyph('A'));
        assert!(!r.has_glyph('B'));

        let lm = r.line_metrics(100.0).expect("hhea present");
        assert!((lm.ascent - 80.0).abs() < 0.5);
        assert!((lm.descent - 20.0).abs() < 0.5);

        let cov = r.rasterize('A', 100.0).expect("rasterized");
        assert!(!cov.is_empty());
        assert!((cov.width as i32 - 40).abs() <= 1);
        assert!((cov.height as i32 - 70).abs() <= 1);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            FontdueRasterizer::from_bytes(b"nope", 0, "bad"),
            Err(FontError::Rasterizer { .. })
        ));
    }
}
