//! Font discovery: explicit paths win, otherwise the first usable
//! platform candidate.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use symforge_atlas::{FontSources, RegionFonts};
use symforge_font::{FontError, FontLibrary, Rasterizer};

use crate::config::{FontConfig, FontRef};

/// Monospace fonts with good box-drawing and braille coverage first.
const TUI_CANDIDATES: &[(&str, u32)] = &[
    ("$HOME/Library/Fonts/DroidSansMNerdFontMono-Regular.otf", 0),
    ("$HOME/Library/Fonts/DejaVuSansMNerdFont-Regular.ttf", 0),
    ("$HOME/.local/share/fonts/DroidSansMNerdFontMono-Regular.otf", 0),
    ("/System/Library/Fonts/Monaco.ttf", 0),
    ("/System/Library/Fonts/Menlo.ttc", 0),
    ("/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf", 0),
    ("C:\\Windows\\Fonts\\consola.ttf", 0),
];

const CJK_CANDIDATES: &[(&str, u32)] = &[
    ("/System/Library/Fonts/STHeiti Light.ttc", 0),
    ("/System/Library/Fonts/Supplemental/Songti.ttc", 0),
    ("/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc", 0),
    ("/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf", 0),
    ("C:\\Windows\\Fonts\\msyh.ttc", 0),
    ("C:\\Windows\\Fonts\\simsun.ttc", 0),
];

/// Monochrome outline emoji fonts; color bitmap formats are not rasterized.
const EMOJI_CANDIDATES: &[(&str, u32)] = &[
    ("/usr/share/fonts/truetype/noto/NotoEmoji-Regular.ttf", 0),
    ("$HOME/.local/share/fonts/NotoEmoji-Regular.ttf", 0),
    ("C:\\Windows\\Fonts\\seguiemj.ttf", 0),
];

/// A CJK candidate only counts if it can render this.
pub const CJK_PROBE: char = '中';

pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("$HOME"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(format!("{}{rest}", home.to_string_lossy())),
        _ => PathBuf::from(path),
    }
}

fn renders(r: &dyn Rasterizer, probe: char) -> bool {
    r.has_glyph(probe) && r.rasterize(probe, 32.0).is_some_and(|c| !c.is_empty())
}

/// Pick a font for one region. An explicit font must load; candidates that
/// are missing, unreadable or fail the probe are skipped.
pub fn select(
    library: &FontLibrary,
    explicit: Option<&FontRef>,
    candidates: &[FontRef],
    probe: Option<char>,
) -> Result<Option<FontRef>> {
    if let Some(font) = explicit {
        let r = library
            .rasterizer(&font.path, font.collection_index)
            .with_context(|| format!("loading font {}", font.path.display()))?;
        if let Some(c) = probe.filter(|&c| !renders(r.as_ref(), c)) {
            warn!("{} cannot render {c:?}; using it anyway", font.path.display());
        }
        return Ok(Some(font.clone()));
    }
    for font in candidates {
        if !font.path.is_file() {
            continue;
        }
        match library.rasterizer(&font.path, font.collection_index) {
            Ok(r) if probe.map_or(true, |c| renders(r.as_ref(), c)) => return Ok(Some(font.clone())),
            Ok(_) => info!("skipping {}: probe glyph missing", font.path.display()),
            Err(e) => warn!("skipping {}: {e}", font.path.display()),
        }
    }
    Ok(None)
}

/// Rasterizer plus, when the font has TrueType outlines, the vector source.
fn region_fonts(library: &FontLibrary, font: &FontRef) -> Result<RegionFonts> {
    let raster = library
        .rasterizer(&font.path, font.collection_index)
        .with_context(|| format!("loading font {}", font.path.display()))?;
    let vector = match library.vector(&font.path, font.collection_index) {
        Ok(v) => Some(v),
        Err(FontError::Unsupported(reason)) => {
            info!("{}: {reason}; distance fields come from bitmaps", font.path.display());
            None
        }
        Err(e) => return Err(e).with_context(|| format!("reading outlines of {}", font.path.display())),
    };
    Ok(RegionFonts {
        vector,
        raster: Some(raster as Arc<dyn Rasterizer>),
    })
}

fn candidates(list: &[(&str, u32)]) -> Vec<FontRef> {
    list.iter()
        .map(|&(path, collection_index)| FontRef {
            path: expand_home(path),
            collection_index,
        })
        .collect()
}

/// Resolve the fonts of every text region. Regions without a font render
/// blank tiles.
pub fn discover(library: &FontLibrary, config: &FontConfig) -> Result<FontSources> {
    let mut sources = FontSources::default();

    match select(library, config.tui.as_ref(), &candidates(TUI_CANDIDATES), None)? {
        Some(font) => {
            info!("tui font: {}", font.path.display());
            sources.tui = region_fonts(library, &font)?;
        }
        None => warn!("no tui font found; pass --font <path>"),
    }

    match select(library, config.cjk.as_ref(), &candidates(CJK_CANDIDATES), Some(CJK_PROBE))? {
        Some(font) => {
            info!("cjk font: {} (index {})", font.path.display(), font.collection_index);
            sources.cjk = region_fonts(library, &font)?;
        }
        None => warn!("no cjk font found; cjk glyphs will be blank"),
    }

    match select(library, config.emoji.as_ref(), &candidates(EMOJI_CANDIDATES), None)? {
        Some(font) => {
            info!("emoji font: {}", font.path.display());
            sources.emoji = region_fonts(library, &font)?.raster;
        }
        None => warn!("no emoji font found; emoji will be blank"),
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use symforge_font::synth::SynthFont;

    fn write_font(dir: &std::path::Path, name: &str, with_probe: bool) -> FontRef {
        let mut font = SynthFont::new(1000, 800, -200).rect('A', 600, 50, 0, 550, 700);
        if with_probe {
            font = font.rect(CJK_PROBE, 1000, 50, -100, 950, 750);
        }
        let path = dir.join(name);
        std::fs::write(&path, font.build()).unwrap();
        FontRef::new(path)
    }

    #[test]
    fn home_is_expanded() {
        let home = std::env::var("HOME").unwrap_or_default();
        if !home.is_empty() {
            assert_eq!(expand_home("$HOME/fonts/a.ttf"), PathBuf::from(format!("{home}/fonts/a.ttf")));
        }
        assert_eq!(expand_home("/usr/a.ttf"), PathBuf::from("/usr/a.ttf"));
    }

    #[test]
    fn candidates_must_pass_the_probe() {
        let dir = tempfile::tempdir().unwrap();
        let latin = write_font(dir.path(), "latin.ttf", false);
        let cjk = write_font(dir.path(), "cjk.ttf", true);
        let missing = FontRef::new(dir.path().join("missing.ttf"));
        let library = FontLibrary::new();
        let picked = select(&library, None, &[missing, latin.clone(), cjk.clone()], Some(CJK_PROBE)).unwrap();
        assert_eq!(picked, Some(cjk));
        let picked = select(&library, None, &[latin.clone()], None).unwrap();
        assert_eq!(picked, Some(latin));
    }

    #[test]
    fn explicit_font_must_load() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.ttf");
        std::fs::write(&bad, b"not a font").unwrap();
        let library = FontLibrary::new();
        assert!(select(&library, Some(&FontRef::new(&bad)), &[], None).is_err());
    }

    #[test]
    fn outline_fonts_get_a_vector_source() {
        let dir = tempfile::tempdir().unwrap();
        let font = write_font(dir.path(), "mono.ttf", false);
        let library = FontLibrary::new();
        let fonts = region_fonts(&library, &font).unwrap();
        assert!(fonts.vector.is_some());
        assert!(fonts.raster.is_some());
        assert_eq!(library.len(), 2);
    }
}
