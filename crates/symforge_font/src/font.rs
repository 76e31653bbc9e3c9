use std::path::Path;

use image::RgbaImage;

use crate::error::FontError;
use crate::metrics::FontMetrics;
use crate::outline::GlyphOutline;
use crate::parser::FontParser;
use crate::placement::PlacementParams;
use crate::vector_field::generate_field;

/// A parsed font file that can produce distance fields straight from its
/// outlines.
#[derive(Debug)]
pub struct VectorFont {
    parser: FontParser,
    name: String,
}

impl VectorFont {
    pub fn from_bytes(data: Vec<u8>, collection_index: u32, name: impl Into<String>) -> Result<Self, FontError> {
        let parser = FontParser::with_collection_index(data, collection_index)?;
        if !parser.has_glyf_outlines() {
            return Err(FontError::Unsupported(
                "font has no glyf/loca outlines (CFF outlines are rasterized instead)".into(),
            ));
        }
        Ok(Self { parser, name: name.into() })
    }

    /// Read and parse a font file from disk.
    pub fn load(path: &Path, collection_index: u32) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes, collection_index, path.display().to_string())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parser(&self) -> &FontParser {
        &self.parser
    }

    pub fn has_glyph(&self, c: char) -> bool {
        self.parser.glyph_index(c).is_some()
    }

    pub fn metrics(&self, advance_probe: char) -> Result<FontMetrics, FontError> {
        FontMetrics::from_parser(&self.parser, advance_probe)
    }

    pub fn outline(&self, c: char) -> Result<Option<GlyphOutline>, FontError> {
        self.parser.outline_for(c)
    }

    /// Distance field for `c`, or `Ok(None)` if the font has no glyph for it.
    pub fn render_field(
        &self,
        c: char,
        width: u32,
        height: u32,
        spread: u32,
        params: &PlacementParams,
    ) -> Result<Option<RgbaImage>, FontError> {
        Ok(self
            .outline(c)?
            .map(|outline| generate_field(&outline, width, height, spread, params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SynthFont;

    #[test]
    fn renders_mapped_glyphs_only() {
        let data = SynthFont::new(1000, 800, -200)
            .rect('M', 500, 50, 0, 450, 700)
            .build();
        let font = VectorFont::from_bytes(data, 0, "synth").unwrap();
        let metrics = font.metrics('M').unwrap();
        let params = PlacementParams::metric_driven(&metrics, 16, 32, 4, 1.0).unwrap();
        let field = font.render_field('M', 16, 32, 4, &params).unwrap().expect("mapped");
        assert_eq!(field.dimensions(), (16, 32));
        assert_eq!(field.get_pixel(8, 16).0[0], 255);
        assert!(font.render_field('?', 16, 32, 4, &params).unwrap().is_none());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = VectorFont::load(Path::new("/nonexistent/font.ttf"), 0).unwrap_err();
        assert!(matches!(err, FontError::Io { ref path, .. } if path.ends_with("font.ttf")));
    }
}
