use serde::{Deserialize, Serialize};

use crate::error::AtlasError;
use crate::layout::{plan_layout, AtlasLayout, RegionId, TextureSize};

/// How a text region turns characters into tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Plain coverage bitmaps, no distance field.
    BitmapOnly,
    /// Rasterize at a super-sampled size, then distance-transform.
    SdfFromBitmap,
    /// Distance fields from outlines, falling back to `SdfFromBitmap`.
    VectorDistanceField,
}

impl RenderMode {
    pub fn is_distance_field(self) -> bool {
        !matches!(self, RenderMode::BitmapOnly)
    }
}

/// Resampling used to bring a super-sampled bitmap field down to the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFilter {
    /// Encode at the super-sampled size, then Lanczos-resize the field.
    #[default]
    Resize,
    /// Majority-vote the mask down to the cell, then encode.
    Downsample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Distance-field spread (pxrange) in atlas pixels.
    pub spread: u32,
    pub text_padding: f32,
    pub width_margin: f32,
    pub supersample: u32,
    pub tui_mode: RenderMode,
    pub cjk_mode: RenderMode,
    /// Route box-drawing, braille and private-use glyphs through the
    /// rasterizer even when an outline is available.
    pub graphic_prefers_bitmap: bool,
    pub field_filter: FieldFilter,
    pub tui_advance_probe: char,
    pub cjk_advance_probe: char,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            spread: 4,
            text_padding: 0.92,
            width_margin: 0.98,
            supersample: 2,
            tui_mode: RenderMode::VectorDistanceField,
            cjk_mode: RenderMode::VectorDistanceField,
            graphic_prefers_bitmap: true,
            field_filter: FieldFilter::Resize,
            tui_advance_probe: 'M',
            cjk_advance_probe: '中',
        }
    }
}

impl RenderSettings {
    pub fn with_spread(mut self, spread: u32) -> Self {
        self.spread = spread;
        self
    }

    pub fn with_text_padding(mut self, padding: f32) -> Self {
        self.text_padding = padding;
        self
    }

    pub fn with_modes(mut self, tui: RenderMode, cjk: RenderMode) -> Self {
        self.tui_mode = tui;
        self.cjk_mode = cjk;
        self
    }

    pub fn with_field_filter(mut self, filter: FieldFilter) -> Self {
        self.field_filter = filter;
        self
    }

    pub fn validate(&self) -> Result<(), AtlasError> {
        if self.spread == 0 {
            return Err(AtlasError::Config("spread must be at least 1 pixel".into()));
        }
        if !(self.text_padding > 0.0 && self.text_padding <= 1.0) {
            return Err(AtlasError::Config(format!(
                "text padding {} must be in (0, 1]",
                self.text_padding
            )));
        }
        if !(self.width_margin > 0.0 && self.width_margin <= 1.0) {
            return Err(AtlasError::Config(format!(
                "width margin {} must be in (0, 1]",
                self.width_margin
            )));
        }
        if !(1..=8).contains(&self.supersample) {
            return Err(AtlasError::Config(format!(
                "supersample {} must be between 1 and 8",
                self.supersample
            )));
        }
        Ok(())
    }
}

/// Immutable configuration for one generation run: the planned geometry and
/// the render settings. Built once and passed by reference everywhere.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub layout: AtlasLayout,
    pub render: RenderSettings,
}

impl LayoutConfig {
    pub fn new(size: TextureSize, render: RenderSettings) -> Result<Self, AtlasError> {
        render.validate()?;
        Ok(Self {
            layout: plan_layout(size),
            render,
        })
    }

    pub fn from_pixels(size: u32, render: RenderSettings) -> Result<Self, AtlasError> {
        Self::new(TextureSize::try_from(size)?, render)
    }

    pub fn size(&self) -> TextureSize {
        self.layout.size
    }

    /// Render mode of a region. Emoji are always bitmaps and sprites are
    /// copied from sheets, so neither is configurable.
    pub fn mode(&self, region: RegionId) -> RenderMode {
        match region {
            RegionId::Sprite | RegionId::Emoji => RenderMode::BitmapOnly,
            RegionId::Tui => self.render.tui_mode,
            RegionId::Cjk => self.render.cjk_mode,
        }
    }

    pub fn advance_probe(&self, region: RegionId) -> char {
        match region {
            RegionId::Cjk => self.render.cjk_advance_probe,
            _ => self.render.tui_advance_probe,
        }
    }
}
