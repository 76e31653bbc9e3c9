//! Per-character choice of rendering path, with fallback accounting.
//!
//! Each text region gets a [`RegionPipeline`]: the ordered strategies its
//! render mode allows, plus everything those strategies share (fonts,
//! placement). Resolving a character tries the strategies in order and ends
//! on a blank tile when none produces one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::debug;
use symforge_font::{BitmapPlacement, PlacementParams, Rasterizer, VectorFont};
use thiserror::Error;

use crate::config::{FieldFilter, LayoutConfig, RenderMode};
use crate::error::AtlasError;
use crate::layout::RegionId;
use crate::sdf;

/// Box drawing, block elements, braille and private-use (icon) glyphs. They
/// must tile edge to edge, so they are placed at full cell padding.
pub fn is_graphic_char(c: char) -> bool {
    let cp = c as u32;
    (0x2500..=0x257F).contains(&cp)
        || (0x2580..=0x259F).contains(&cp)
        || (0x2800..=0x28FF).contains(&cp)
        || cp >= 0xE000
}

/// The fallback rung that produced a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Vector,
    BitmapField,
    Bitmap,
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileEncoding {
    DistanceField,
    Bitmap,
}

impl TileEncoding {
    /// The placeholder for slots without a glyph: opaque black decodes as
    /// "outside" in a distance field; bitmaps use full transparency.
    pub fn blank(self, width: u32, height: u32) -> RgbaImage {
        match self {
            TileEncoding::DistanceField => RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            TileEncoding::Bitmap => RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])),
        }
    }
}

/// Recoverable per-glyph failures; they select the next tier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GlyphError {
    #[error("{0:?} is not in the font")]
    Missing(char),
    #[error("rasterizer produced nothing for {0:?}")]
    RasterFailure(char),
    #[error("outline of {0:?} is unreadable: {1}")]
    Outline(char, String),
}

/// What a slot should contain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotContent<'a> {
    Empty,
    Glyph(char),
    Emoji(&'a str),
    Sprite(&'a RgbaImage),
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub tile: RgbaImage,
    pub tier: Tier,
    pub failures: Vec<GlyphError>,
    /// The slot had no input at all.
    pub empty: bool,
}

/// Outcome counters for one region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackStats {
    pub vector: usize,
    pub bitmap_field: usize,
    pub bitmap: usize,
    pub blank: usize,
    pub glyph_missing: usize,
    pub raster_failures: usize,
    pub empty_slots: usize,
}

impl FallbackStats {
    pub fn record(&mut self, resolution: &Resolution) {
        if resolution.empty {
            self.empty_slots += 1;
            return;
        }
        match resolution.tier {
            Tier::Vector => self.vector += 1,
            Tier::BitmapField => self.bitmap_field += 1,
            Tier::Bitmap => self.bitmap += 1,
            Tier::Blank => self.blank += 1,
        }
        if resolution.failures.iter().any(|f| matches!(f, GlyphError::Missing(_))) {
            self.glyph_missing += 1;
        }
        if resolution
            .failures
            .iter()
            .any(|f| matches!(f, GlyphError::RasterFailure(_) | GlyphError::Outline(..)))
        {
            self.raster_failures += 1;
        }
    }

    pub fn merge(&mut self, other: &FallbackStats) {
        self.vector += other.vector;
        self.bitmap_field += other.bitmap_field;
        self.bitmap += other.bitmap;
        self.blank += other.blank;
        self.glyph_missing += other.glyph_missing;
        self.raster_failures += other.raster_failures;
        self.empty_slots += other.empty_slots;
    }

    /// Slots that had input.
    pub fn rendered(&self) -> usize {
        self.vector + self.bitmap_field + self.bitmap + self.blank
    }
}

impl fmt::Display for FallbackStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vector={} bitmap_field={} bitmap={} blank={} (missing={}, raster_failures={}, empty={})",
            self.vector,
            self.bitmap_field,
            self.bitmap,
            self.blank,
            self.glyph_missing,
            self.raster_failures,
            self.empty_slots
        )
    }
}

/// Font sources for one text region. Either may be absent; the strategies
/// that need it are then skipped.
#[derive(Clone, Default)]
pub struct RegionFonts {
    pub vector: Option<Arc<VectorFont>>,
    pub raster: Option<Arc<dyn Rasterizer>>,
}

#[derive(Clone, Default)]
pub struct FontSources {
    pub tui: RegionFonts,
    pub cjk: RegionFonts,
    pub emoji: Option<Arc<dyn Rasterizer>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Vector,
    BitmapField,
    Bitmap,
}

fn strategies(mode: RenderMode) -> &'static [Strategy] {
    match mode {
        RenderMode::VectorDistanceField => &[Strategy::Vector, Strategy::BitmapField],
        RenderMode::SdfFromBitmap => &[Strategy::BitmapField],
        RenderMode::BitmapOnly => &[Strategy::Bitmap],
    }
}

/// Tier order for glyphs routed through the rasterizer first. The outline
/// path stays as the fallback.
fn bitmap_first(order: &'static [Strategy]) -> &'static [Strategy] {
    match order {
        [Strategy::Vector, Strategy::BitmapField] => &[Strategy::BitmapField, Strategy::Vector],
        other => other,
    }
}

struct VectorSource {
    font: Arc<VectorFont>,
    text: PlacementParams,
    graphic: PlacementParams,
}

struct RasterSource {
    rasterizer: Arc<dyn Rasterizer>,
    text: BitmapPlacement,
    graphic: BitmapPlacement,
}

struct RegionPipeline {
    encoding: TileEncoding,
    cell: (u32, u32),
    strategies: &'static [Strategy],
    vector: Option<VectorSource>,
    raster: Option<RasterSource>,
}

/// Chooses the rendering path per character. Built once per run; shared by
/// the worker threads of the composer.
pub struct GlyphSourceResolver {
    spread: u32,
    supersample: u32,
    field_filter: FieldFilter,
    graphic_prefers_bitmap: bool,
    sprite_cell: (u32, u32),
    pipelines: BTreeMap<RegionId, RegionPipeline>,
}

impl GlyphSourceResolver {
    /// Fails if a supplied font has unusable metrics or the cell cannot
    /// hold a glyph: either would corrupt the whole region.
    pub fn new(config: &LayoutConfig, fonts: FontSources) -> Result<Self, AtlasError> {
        let render = &config.render;
        let mut pipelines = BTreeMap::new();
        let text_regions = [
            (RegionId::Tui, fonts.tui),
            (RegionId::Cjk, fonts.cjk),
            (
                RegionId::Emoji,
                RegionFonts {
                    vector: None,
                    raster: fonts.emoji,
                },
            ),
        ];
        for (id, region_fonts) in text_regions {
            let region = config.layout.region(id);
            let mode = config.mode(id);
            let cell = (region.cell_width, region.cell_height);
            let strategies = strategies(mode);

            let vector = match region_fonts.vector {
                Some(font) if strategies.contains(&Strategy::Vector) => {
                    let metrics = font.metrics(config.advance_probe(id)).map_err(|source| AtlasError::Font {
                        name: font.name().to_string(),
                        source,
                    })?;
                    let place = |padding| {
                        PlacementParams::metric_driven(&metrics, cell.0, cell.1, render.spread, padding)
                            .map_err(|source| AtlasError::Placement {
                                region: id.to_string(),
                                source,
                            })
                    };
                    Some(VectorSource {
                        text: place(render.text_padding)?,
                        graphic: place(1.0)?,
                        font,
                    })
                }
                _ => None,
            };

            let raster = match region_fonts.raster {
                Some(rasterizer) => {
                    let factor = if mode.is_distance_field() { render.supersample } else { 1 };
                    let (w, h) = (cell.0 * factor, cell.1 * factor);
                    let place = |padding, margin| {
                        BitmapPlacement::solve(rasterizer.as_ref(), w, h, padding, margin).map_err(|source| {
                            AtlasError::Placement {
                                region: id.to_string(),
                                source,
                            }
                        })
                    };
                    Some(RasterSource {
                        text: place(render.text_padding, Some(render.width_margin))?,
                        graphic: place(1.0, None)?,
                        rasterizer,
                    })
                }
                None => None,
            };

            if vector.is_none() && raster.is_none() {
                debug!("region {id} has no font source; every glyph will be blank");
            }
            pipelines.insert(
                id,
                RegionPipeline {
                    encoding: if mode.is_distance_field() {
                        TileEncoding::DistanceField
                    } else {
                        TileEncoding::Bitmap
                    },
                    cell,
                    strategies,
                    vector,
                    raster,
                },
            );
        }

        let sprite = config.layout.region(RegionId::Sprite);
        Ok(Self {
            spread: render.spread,
            supersample: render.supersample,
            field_filter: render.field_filter,
            graphic_prefers_bitmap: render.graphic_prefers_bitmap,
            sprite_cell: (sprite.cell_width, sprite.cell_height),
            pipelines,
        })
    }

    /// Encoding used for blank tiles of `region`.
    pub fn encoding(&self, region: RegionId) -> TileEncoding {
        self.pipelines
            .get(&region)
            .map_or(TileEncoding::Bitmap, |p| p.encoding)
    }

    /// Produce the tile for one slot. Never fails: every failure ends in a
    /// blank tile and is listed in the resolution.
    pub fn resolve(&self, region: RegionId, content: SlotContent<'_>) -> Resolution {
        let (encoding, (w, h)) = match self.pipelines.get(&region) {
            Some(p) => (p.encoding, p.cell),
            None => (TileEncoding::Bitmap, self.sprite_cell),
        };
        let c = match content {
            SlotContent::Empty => {
                return Resolution {
                    tile: encoding.blank(w, h),
                    tier: Tier::Blank,
                    failures: Vec::new(),
                    empty: true,
                }
            }
            SlotContent::Sprite(img) => {
                let tile = if img.dimensions() == (w, h) {
                    img.clone()
                } else {
                    imageops::resize(img, w, h, FilterType::Lanczos3)
                };
                return Resolution {
                    tile,
                    tier: Tier::Bitmap,
                    failures: Vec::new(),
                    empty: false,
                };
            }
            SlotContent::Glyph(c) => c,
            // no shaping: the first scalar stands for the whole sequence
            SlotContent::Emoji(s) => match s.chars().next() {
                Some(c) => c,
                None => return self.resolve(region, SlotContent::Empty),
            },
        };

        let mut failures = Vec::new();
        if let Some(pipeline) = self.pipelines.get(&region) {
            let order = if self.graphic_prefers_bitmap && is_graphic_char(c) {
                bitmap_first(pipeline.strategies)
            } else {
                pipeline.strategies
            };
            for &strategy in order {
                match self.attempt(pipeline, strategy, c) {
                    Ok(Some(tile)) => {
                        let tier = match strategy {
                            Strategy::Vector => Tier::Vector,
                            Strategy::BitmapField => Tier::BitmapField,
                            Strategy::Bitmap => Tier::Bitmap,
                        };
                        return Resolution {
                            tile,
                            tier,
                            failures,
                            empty: false,
                        };
                    }
                    Ok(None) => {}
                    Err(e) => {
                        debug!("{region}: {strategy:?} failed: {e}");
                        failures.push(e);
                    }
                }
            }
        }
        Resolution {
            tile: encoding.blank(w, h),
            tier: Tier::Blank,
            failures,
            empty: false,
        }
    }

    /// `Ok(None)` means the strategy has no source in this region.
    fn attempt(&self, p: &RegionPipeline, strategy: Strategy, c: char) -> Result<Option<RgbaImage>, GlyphError> {
        let graphic = is_graphic_char(c);
        let (w, h) = p.cell;
        match strategy {
            Strategy::Vector => {
                let Some(src) = &p.vector else { return Ok(None) };
                let params = if graphic { &src.graphic } else { &src.text };
                match src.font.render_field(c, w, h, self.spread, params) {
                    Ok(Some(tile)) => Ok(Some(tile)),
                    Ok(None) => Err(GlyphError::Missing(c)),
                    Err(e) => Err(GlyphError::Outline(c, e.to_string())),
                }
            }
            Strategy::BitmapField => {
                let bitmap = match self.render_bitmap(p, c, graphic)? {
                    Some(b) => b,
                    None => return Ok(None),
                };
                let field = match self.field_filter {
                    FieldFilter::Resize => {
                        let big = sdf::encode(&bitmap, self.spread * self.supersample);
                        let mut small = imageops::resize(&big, w, h, FilterType::Lanczos3);
                        for px in small.pixels_mut() {
                            px.0[3] = 255;
                        }
                        small
                    }
                    FieldFilter::Downsample => sdf::encode_downsampled(&bitmap, w, h, self.spread),
                };
                Ok(Some(field))
            }
            Strategy::Bitmap => self.render_bitmap(p, c, graphic),
        }
    }

    fn render_bitmap(&self, p: &RegionPipeline, c: char, graphic: bool) -> Result<Option<RgbaImage>, GlyphError> {
        let Some(src) = &p.raster else { return Ok(None) };
        if !src.rasterizer.has_glyph(c) {
            return Err(GlyphError::Missing(c));
        }
        let placement = if graphic { &src.graphic } else { &src.text };
        placement
            .render(src.rasterizer.as_ref(), c)
            .map(Some)
            .ok_or(GlyphError::RasterFailure(c))
    }
}
