//! Drives a full atlas build: resolve a tile for every linear index, stamp
//! it at its planned position and describe the result in a symbol map.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::{imageops, RgbaImage};
use log::{info, warn};
use rayon::prelude::*;

use crate::config::LayoutConfig;
use crate::error::AtlasError;
use crate::layout::{Region, RegionId};
use crate::resolver::{FallbackStats, GlyphSourceResolver, Resolution, SlotContent};
use crate::symbol_map::SymbolMap;

/// Tiles resolved in parallel before they are stamped.
const STAMP_CHUNK: u32 = 1024;

pub const ATLAS_FILE_NAME: &str = "symbols.png";
pub const SYMBOL_MAP_FILE_NAME: &str = "symbol_map.json";

/// Everything that goes into the atlas, in slot order per region.
#[derive(Debug, Clone, Default)]
pub struct AtlasInputs {
    pub sprites: Vec<RgbaImage>,
    pub tui: Vec<char>,
    pub emoji: Vec<String>,
    pub cjk: Vec<char>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub stats: BTreeMap<RegionId, FallbackStats>,
    /// Inputs dropped because a region was full: (region, dropped count).
    pub truncated: Vec<(RegionId, usize)>,
}

impl RunReport {
    pub fn total(&self) -> FallbackStats {
        let mut total = FallbackStats::default();
        for stats in self.stats.values() {
            total.merge(stats);
        }
        total
    }

    pub fn log_summary(&self) {
        for (region, stats) in &self.stats {
            info!("{region}: {stats}");
        }
        for (region, dropped) in &self.truncated {
            warn!("{region}: {dropped} inputs did not fit and were dropped");
        }
    }
}

#[derive(Debug, Clone)]
pub struct AtlasOutput {
    pub image: RgbaImage,
    pub symbol_map: SymbolMap,
    pub report: RunReport,
}

impl AtlasOutput {
    /// Write `symbols.png` and `symbol_map.json` into `dir`, creating it if
    /// needed. Returns both paths.
    pub fn save(&self, dir: &Path) -> Result<(PathBuf, PathBuf), AtlasError> {
        std::fs::create_dir_all(dir).map_err(|source| AtlasError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let png = dir.join(ATLAS_FILE_NAME);
        info!("saving atlas to {}", png.display());
        self.image.save(&png).map_err(|source| AtlasError::Image {
            path: png.clone(),
            source,
        })?;
        let json = dir.join(SYMBOL_MAP_FILE_NAME);
        info!("saving symbol map to {}", json.display());
        std::fs::write(&json, self.symbol_map.to_json()?).map_err(|source| AtlasError::Io {
            path: json.clone(),
            source,
        })?;
        Ok((png, json))
    }
}

pub struct AtlasComposer {
    config: LayoutConfig,
    resolver: GlyphSourceResolver,
}

fn truncate<T>(items: &mut Vec<T>, region: &Region, report: &mut RunReport) {
    let capacity = region.linear_total as usize;
    if items.len() > capacity {
        let dropped = items.len() - capacity;
        warn!(
            "{} has {} inputs but only {capacity} slots; dropping the last {dropped}",
            region.id,
            items.len()
        );
        items.truncate(capacity);
        report.truncated.push((region.id, dropped));
    }
}

impl AtlasComposer {
    pub fn new(config: LayoutConfig, resolver: GlyphSourceResolver) -> Self {
        Self { config, resolver }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Build the whole atlas. Per-glyph failures end up in the report; only
    /// geometry violations abort.
    pub fn compose(&self, mut inputs: AtlasInputs) -> Result<AtlasOutput, AtlasError> {
        let layout = &self.config.layout;
        let mut report = RunReport::default();
        truncate(&mut inputs.sprites, layout.region(RegionId::Sprite), &mut report);
        truncate(&mut inputs.tui, layout.region(RegionId::Tui), &mut report);
        truncate(&mut inputs.emoji, layout.region(RegionId::Emoji), &mut report);
        truncate(&mut inputs.cjk, layout.region(RegionId::Cjk), &mut report);

        let size = self.config.size().pixels();
        info!("composing {size}x{size} atlas");
        let mut canvas = RgbaImage::new(size, size);

        for region in layout.regions() {
            let stats = self.stamp_region(&mut canvas, region, &inputs)?;
            info!("{}: {} slots stamped ({})", region.id, region.linear_total, stats);
            report.stats.insert(region.id, stats);
        }

        let symbol_map = SymbolMap::build(layout, &inputs.tui, &inputs.emoji, &inputs.cjk);
        report.log_summary();
        Ok(AtlasOutput {
            image: canvas,
            symbol_map,
            report,
        })
    }

    fn stamp_region(
        &self,
        canvas: &mut RgbaImage,
        region: &Region,
        inputs: &AtlasInputs,
    ) -> Result<FallbackStats, AtlasError> {
        let content = |offset: u32| {
            let i = offset as usize;
            let slot = match region.id {
                RegionId::Sprite => inputs.sprites.get(i).map(SlotContent::Sprite),
                RegionId::Tui => inputs.tui.get(i).map(|&c| SlotContent::Glyph(c)),
                RegionId::Emoji => inputs.emoji.get(i).map(|s| SlotContent::Emoji(s.as_str())),
                RegionId::Cjk => inputs.cjk.get(i).map(|&c| SlotContent::Glyph(c)),
            };
            slot.unwrap_or(SlotContent::Empty)
        };

        let mut stats = FallbackStats::default();
        let mut start = 0;
        while start < region.linear_total {
            let end = (start + STAMP_CHUNK).min(region.linear_total);
            let tiles: Vec<(u32, Resolution)> = (start..end)
                .into_par_iter()
                .map(|offset| (region.linear_base + offset, self.resolver.resolve(region.id, content(offset))))
                .collect();
            for (linear, resolution) in tiles {
                self.stamp(canvas, region, linear, &resolution.tile)?;
                stats.record(&resolution);
            }
            start = end;
        }
        Ok(stats)
    }

    /// Place one tile, checking that its address round-trips and that it
    /// fills its cell exactly.
    fn stamp(&self, canvas: &mut RgbaImage, region: &Region, linear: u32, tile: &RgbaImage) -> Result<(), AtlasError> {
        let layout = &self.config.layout;
        let (id, coord) = layout.locate(linear)?;
        if id != region.id || layout.linear_index(id, coord)? != linear {
            return Err(AtlasError::Geometry(format!(
                "linear index {linear} does not round-trip through {coord:?} in {}",
                region.id
            )));
        }
        let rect = layout.pixel_rect(id, coord)?;
        if tile.dimensions() != (rect.width, rect.height) {
            return Err(AtlasError::Geometry(format!(
                "tile for index {linear} is {:?}, cell is {}x{}",
                tile.dimensions(),
                rect.width,
                rect.height
            )));
        }
        imageops::replace(canvas, tile, rect.x as i64, rect.y as i64);
        Ok(())
    }
}
