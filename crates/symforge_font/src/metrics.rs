//! Font-wide metrics normalized to the EM square.

use crate::error::FontError;
use crate::parser::FontParser;

/// Vertical metrics and a representative advance, all in EM units.
///
/// `descent_em` keeps the font's sign convention (negative below the
/// baseline).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascent_em: f32,
    pub descent_em: f32,
    pub advance_em: f32,
}

impl FontMetrics {
    /// Read metrics from `hhea`/`hmtx`. The advance is taken from
    /// `advance_probe` ('M' for monospace text, '中' for CJK); if the font
    /// lacks it the widest advance in `hhea` is used instead.
    pub fn from_parser(parser: &FontParser, advance_probe: char) -> Result<Self, FontError> {
        let upem = parser.units_per_em();
        if !(16..=16384).contains(&upem) {
            return Err(FontError::InvalidMetrics(format!("unitsPerEm {upem} outside 16..=16384")));
        }
        let hhea = parser.hhea();
        let advance = match parser.glyph_index(advance_probe).and_then(|g| parser.advance_width(g)) {
            Some(adv) => adv,
            None => {
                log::debug!(
                    "advance probe {advance_probe:?} not in font, using advanceWidthMax {}",
                    hhea.advance_width_max
                );
                hhea.advance_width_max
            }
        };
        Self::new(upem, hhea.ascender, hhea.descender, advance)
    }

    /// Validate raw font-unit metrics and normalize them.
    pub fn new(units_per_em: u16, ascender: i16, descender: i16, advance: u16) -> Result<Self, FontError> {
        if units_per_em == 0 {
            return Err(FontError::InvalidMetrics("unitsPerEm is zero".into()));
        }
        if descender > 0 {
            return Err(FontError::InvalidMetrics(format!("descender {descender} is above the baseline")));
        }
        if ascender <= descender {
            return Err(FontError::InvalidMetrics(format!(
                "ascender {ascender} is not above descender {descender}"
            )));
        }
        if advance == 0 {
            return Err(FontError::InvalidMetrics("advance width is zero".into()));
        }
        let k = 1.0 / units_per_em as f32;
        Ok(Self {
            units_per_em,
            ascent_em: ascender as f32 * k,
            descent_em: descender as f32 * k,
            advance_em: advance as f32 * k,
        })
    }

    /// `ascent - descent` in EM units.
    pub fn line_height_em(&self) -> f32 {
        self.ascent_em - self.descent_em
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SynthFont;

    #[test]
    fn normalizes_to_em() {
        let m = FontMetrics::new(2048, 1638, -410, 1229).unwrap();
        assert!((m.ascent_em - 0.7998).abs() < 1e-3);
        assert!((m.descent_em + 0.2002).abs() < 1e-3);
        assert!((m.line_height_em() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_inverted_metrics() {
        assert!(matches!(FontMetrics::new(1000, -10, -5, 500), Err(FontError::InvalidMetrics(_))));
        assert!(matches!(FontMetrics::new(1000, 800, 100, 500), Err(FontError::InvalidMetrics(_))));
        assert!(matches!(FontMetrics::new(1000, 800, -200, 0), Err(FontError::InvalidMetrics(_))));
    }

    #[test]
    fn advance_comes_from_probe_glyph() {
        let data = SynthFont::new(1000, 800, -200)
            .rect('M', 500, 50, 0, 450, 700)
            .rect('W', 900, 50, 0, 850, 700)
            .build();
        let parser = FontParser::new(data).unwrap();
        let m = FontMetrics::from_parser(&parser, 'M').unwrap();
        assert!((m.advance_em - 0.5).abs() < 1e-6);
        // unmapped probe falls back to advanceWidthMax
        let m = FontMetrics::from_parser(&parser, '中').unwrap();
        assert!((m.advance_em - 0.9).abs() < 1e-6);
    }
}
