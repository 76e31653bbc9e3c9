//! Atlas side of symforge: the fixed region layout, distance-field encoding
//! of bitmaps, per-glyph source resolution and the composer that stamps
//! everything into one texture plus its symbol map.

pub mod composer;
pub mod config;
pub mod error;
pub mod layout;
pub mod resolver;
pub mod sdf;
pub mod sprite;
pub mod symbol_map;

pub use composer::{AtlasComposer, AtlasInputs, AtlasOutput, RunReport, ATLAS_FILE_NAME, SYMBOL_MAP_FILE_NAME};
pub use config::{FieldFilter, LayoutConfig, RenderMode, RenderSettings};
pub use error::{AtlasError, Result};
pub use layout::{plan_layout, Addressing, AtlasLayout, Coord, PixelRect, Region, RegionId, TextureSize};
pub use resolver::{
    is_graphic_char, FallbackStats, FontSources, GlyphError, GlyphSourceResolver, RegionFonts, Resolution,
    SlotContent, Tier, TileEncoding,
};
pub use symbol_map::{RegionEntry, SymbolList, SymbolMap};
