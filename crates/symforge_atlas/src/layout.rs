//! Atlas geometry: regions, their addressing, and the bijection between
//! linear indices and (region, coordinate) pairs.
//!
//! The base design is a 4096 px square; the 8192 variant multiplies every
//! pixel quantity by two while block counts, grid dimensions and linear bases
//! stay the same.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AtlasError;

pub const BASE_TEXTURE_SIZE: u32 = 4096;
pub const BLOCKS_PER_ROW: u32 = 16;

/// One of the supported square atlas sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSize(u32);

impl TextureSize {
    pub const BASE: TextureSize = TextureSize(BASE_TEXTURE_SIZE);
    pub const DOUBLE: TextureSize = TextureSize(BASE_TEXTURE_SIZE * 2);

    pub fn pixels(self) -> u32 {
        self.0
    }

    /// Multiplier applied to every pixel quantity of the base design.
    pub fn scale(self) -> u32 {
        self.0 / BASE_TEXTURE_SIZE
    }
}

impl TryFrom<u32> for TextureSize {
    type Error = AtlasError;

    fn try_from(size: u32) -> Result<Self, Self::Error> {
        match size {
            4096 => Ok(Self::BASE),
            8192 => Ok(Self::DOUBLE),
            other => Err(AtlasError::UnsupportedTextureSize(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionId {
    Sprite,
    Tui,
    Emoji,
    Cjk,
}

impl RegionId {
    /// All regions in linear-index order.
    pub const ALL: [RegionId; 4] = [RegionId::Sprite, RegionId::Tui, RegionId::Emoji, RegionId::Cjk];

    pub fn name(self) -> &'static str {
        match self {
            RegionId::Sprite => "sprite",
            RegionId::Tui => "tui",
            RegionId::Emoji => "emoji",
            RegionId::Cjk => "cjk",
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// Fixed-size blocks of cells. Block indices are global across regions.
    Block {
        first_block: u32,
        block_count: u32,
        chars_per_block: u32,
        slots_per_row: u32,
    },
    Grid { cols: u32, rows: u32 },
}

/// Position of one tile inside its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coord {
    Block { block: u32, slot: u32 },
    Grid { col: u32, row: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: RegionId,
    pub addressing: Addressing,
    pub cell_width: u32,
    pub cell_height: u32,
    pub origin_x: u32,
    pub origin_y: u32,
    pub linear_base: u32,
    pub linear_total: u32,
}

impl Region {
    pub fn contains(&self, linear: u32) -> bool {
        linear >= self.linear_base && linear - self.linear_base < self.linear_total
    }

    pub fn linear_range(&self) -> std::ops::Range<u32> {
        self.linear_base..self.linear_base + self.linear_total
    }

    /// Inclusive `[first, last]` global block range of a block region.
    pub fn block_range(&self) -> Option<[u32; 2]> {
        match self.addressing {
            Addressing::Block { first_block, block_count, .. } => {
                Some([first_block, first_block + block_count - 1])
            }
            Addressing::Grid { .. } => None,
        }
    }

    /// Pixel size of one block.
    pub fn block_size(&self) -> Option<(u32, u32)> {
        match self.addressing {
            Addressing::Block { chars_per_block, slots_per_row, .. } => Some((
                slots_per_row * self.cell_width,
                chars_per_block / slots_per_row * self.cell_height,
            )),
            Addressing::Grid { .. } => None,
        }
    }

    pub fn coord_of(&self, linear: u32) -> Option<Coord> {
        if !self.contains(linear) {
            return None;
        }
        let offset = linear - self.linear_base;
        Some(match self.addressing {
            Addressing::Block { first_block, chars_per_block, .. } => Coord::Block {
                block: first_block + offset / chars_per_block,
                slot: offset % chars_per_block,
            },
            Addressing::Grid { cols, .. } => Coord::Grid {
                col: offset % cols,
                row: offset / cols,
            },
        })
    }

    /// Inverse of [`Region::coord_of`]; `None` for coordinates outside the
    /// region.
    pub fn linear_of(&self, coord: Coord) -> Option<u32> {
        match (self.addressing, coord) {
            (
                Addressing::Block { first_block, block_count, chars_per_block, .. },
                Coord::Block { block, slot },
            ) => {
                if block < first_block || block - first_block >= block_count || slot >= chars_per_block {
                    return None;
                }
                Some(self.linear_base + (block - first_block) * chars_per_block + slot)
            }
            (Addressing::Grid { cols, rows }, Coord::Grid { col, row }) => {
                if col >= cols || row >= rows {
                    return None;
                }
                Some(self.linear_base + row * cols + col)
            }
            _ => None,
        }
    }

    pub fn pixel_rect(&self, coord: Coord) -> Option<PixelRect> {
        self.linear_of(coord)?;
        let (x, y) = match (self.addressing, coord) {
            (Addressing::Block { first_block, slots_per_row, .. }, Coord::Block { block, slot }) => {
                let (bw, bh) = self.block_size()?;
                let rel = block - first_block;
                (
                    self.origin_x + (rel % BLOCKS_PER_ROW) * bw + (slot % slots_per_row) * self.cell_width,
                    self.origin_y + (rel / BLOCKS_PER_ROW) * bh + (slot / slots_per_row) * self.cell_height,
                )
            }
            (Addressing::Grid { .. }, Coord::Grid { col, row }) => (
                self.origin_x + col * self.cell_width,
                self.origin_y + row * self.cell_height,
            ),
            _ => return None,
        };
        Some(PixelRect {
            x,
            y,
            width: self.cell_width,
            height: self.cell_height,
        })
    }
}

/// The planned atlas: texture size and the four regions in linear order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasLayout {
    pub size: TextureSize,
    regions: Vec<Region>,
}

/// Build the region table for `size`. Pixel quantities come from the base
/// design multiplied by the size's scale.
pub fn plan_layout(size: TextureSize) -> AtlasLayout {
    let s = size.scale();
    let sprite = Region {
        id: RegionId::Sprite,
        addressing: Addressing::Block {
            first_block: 0,
            block_count: 160,
            chars_per_block: 256,
            slots_per_row: 16,
        },
        cell_width: 16 * s,
        cell_height: 16 * s,
        origin_x: 0,
        origin_y: 0,
        linear_base: 0,
        linear_total: 160 * 256,
    };
    let tui = Region {
        id: RegionId::Tui,
        addressing: Addressing::Block {
            first_block: 160,
            block_count: 10,
            chars_per_block: 256,
            slots_per_row: 16,
        },
        cell_width: 16 * s,
        cell_height: 32 * s,
        origin_x: 0,
        origin_y: 2560 * s,
        linear_base: sprite.linear_base + sprite.linear_total,
        linear_total: 10 * 256,
    };
    let emoji = Region {
        id: RegionId::Emoji,
        addressing: Addressing::Block {
            first_block: 170,
            block_count: 6,
            chars_per_block: 128,
            slots_per_row: 8,
        },
        cell_width: 32 * s,
        cell_height: 32 * s,
        origin_x: 2560 * s,
        origin_y: 2560 * s,
        linear_base: tui.linear_base + tui.linear_total,
        linear_total: 6 * 128,
    };
    let cjk = Region {
        id: RegionId::Cjk,
        addressing: Addressing::Grid { cols: 128, rows: 32 },
        cell_width: 32 * s,
        cell_height: 32 * s,
        origin_x: 0,
        origin_y: 3072 * s,
        linear_base: emoji.linear_base + emoji.linear_total,
        linear_total: 128 * 32,
    };
    AtlasLayout {
        size,
        regions: vec![sprite, tui, emoji, cjk],
    }
}

impl AtlasLayout {
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> &Region {
        // regions are stored in RegionId::ALL order
        &self.regions[id as usize]
    }

    /// Total number of addressable tiles.
    pub fn linear_total(&self) -> u32 {
        self.regions.iter().map(|r| r.linear_total).sum()
    }

    pub fn locate(&self, linear: u32) -> Result<(RegionId, Coord), AtlasError> {
        self.regions
            .iter()
            .find_map(|r| r.coord_of(linear).map(|c| (r.id, c)))
            .ok_or_else(|| {
                AtlasError::Geometry(format!(
                    "linear index {linear} is outside every region (total {})",
                    self.linear_total()
                ))
            })
    }

    pub fn linear_index(&self, region: RegionId, coord: Coord) -> Result<u32, AtlasError> {
        self.region(region)
            .linear_of(coord)
            .ok_or_else(|| AtlasError::Geometry(format!("{coord:?} is not a valid {region} coordinate")))
    }

    pub fn pixel_rect(&self, region: RegionId, coord: Coord) -> Result<PixelRect, AtlasError> {
        self.region(region)
            .pixel_rect(coord)
            .ok_or_else(|| AtlasError::Geometry(format!("{coord:?} has no pixel position in {region}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_two_sizes_are_supported() {
        assert_eq!(TextureSize::try_from(4096).unwrap().scale(), 1);
        assert_eq!(TextureSize::try_from(8192).unwrap().scale(), 2);
        assert!(matches!(TextureSize::try_from(2048), Err(AtlasError::UnsupportedTextureSize(2048))));
        assert!(TextureSize::try_from(6144).is_err());
    }

    #[test]
    fn linear_ranges_are_contiguous() {
        let layout = plan_layout(TextureSize::BASE);
        let mut next = 0;
        for (region, id) in layout.regions().iter().zip(RegionId::ALL) {
            assert_eq!(region.id, id);
            assert_eq!(region.linear_base, next);
            next += region.linear_total;
        }
        assert_eq!(next, 48384);
        assert_eq!(layout.region(RegionId::Tui).linear_base, 40960);
        assert_eq!(layout.region(RegionId::Emoji).linear_base, 43520);
        assert_eq!(layout.region(RegionId::Cjk).linear_base, 44288);
    }

    #[test]
    fn locate_and_linear_index_are_inverse() {
        let layout = plan_layout(TextureSize::BASE);
        for i in 0..layout.linear_total() {
            let (region, coord) = layout.locate(i).unwrap();
            assert_eq!(layout.linear_index(region, coord).unwrap(), i);
        }
        assert!(layout.locate(layout.linear_total()).is_err());
    }

    #[test]
    fn region_boundaries() {
        let layout = plan_layout(TextureSize::BASE);
        let cases = [
            (0, RegionId::Sprite, Coord::Block { block: 0, slot: 0 }),
            (40959, RegionId::Sprite, Coord::Block { block: 159, slot: 255 }),
            (40960, RegionId::Tui, Coord::Block { block: 160, slot: 0 }),
            (43519, RegionId::Tui, Coord::Block { block: 169, slot: 255 }),
            (43520, RegionId::Emoji, Coord::Block { block: 170, slot: 0 }),
            (44287, RegionId::Emoji, Coord::Block { block: 175, slot: 127 }),
            (44288, RegionId::Cjk, Coord::Grid { col: 0, row: 0 }),
            (48383, RegionId::Cjk, Coord::Grid { col: 127, row: 31 }),
        ];
        for (linear, region, coord) in cases {
            assert_eq!(layout.locate(linear).unwrap(), (region, coord), "index {linear}");
            assert_eq!(layout.linear_index(region, coord).unwrap(), linear);
        }
        // wrong-kind and out-of-range coordinates are rejected
        assert!(layout.linear_index(RegionId::Tui, Coord::Block { block: 159, slot: 0 }).is_err());
        assert!(layout.linear_index(RegionId::Emoji, Coord::Block { block: 170, slot: 128 }).is_err());
        assert!(layout.linear_index(RegionId::Cjk, Coord::Block { block: 0, slot: 0 }).is_err());
        assert!(layout.linear_index(RegionId::Cjk, Coord::Grid { col: 128, row: 0 }).is_err());
    }

    #[test]
    fn last_slot_of_block_ten() {
        let layout = plan_layout(TextureSize::BASE);
        let (region, coord) = layout.locate(10 * 256 + 255).unwrap();
        assert_eq!((region, coord), (RegionId::Sprite, Coord::Block { block: 10, slot: 255 }));
        let rect = layout.pixel_rect(region, coord).unwrap();
        // block 10 sits at (10 * 256, 0); slot 255 is cell (15, 15)
        assert_eq!((rect.x, rect.y), (10 * 256 + 15 * 16, 15 * 16));
        assert_eq!((rect.width, rect.height), (16, 16));
    }

    #[test]
    fn double_size_only_scales_pixels() {
        let base = plan_layout(TextureSize::BASE);
        let double = plan_layout(TextureSize::DOUBLE);
        assert_eq!(base.linear_total(), double.linear_total());
        for i in (0..base.linear_total()).step_by(97).chain([40959, 40960, 44287, 44288, 48383]) {
            let (rb, cb) = base.locate(i).unwrap();
            let (rd, cd) = double.locate(i).unwrap();
            assert_eq!((rb, cb), (rd, cd));
            let pb = base.pixel_rect(rb, cb).unwrap();
            let pd = double.pixel_rect(rd, cd).unwrap();
            assert_eq!((pd.x, pd.y, pd.width, pd.height), (pb.x * 2, pb.y * 2, pb.width * 2, pb.height * 2));
        }
    }

    #[test]
    fn tiles_stay_inside_their_texture() {
        for size in [TextureSize::BASE, TextureSize::DOUBLE] {
            let layout = plan_layout(size);
            for region in layout.regions() {
                for i in [region.linear_base, region.linear_base + region.linear_total - 1] {
                    let rect = region.pixel_rect(region.coord_of(i).unwrap()).unwrap();
                    assert!(rect.x + rect.width <= size.pixels());
                    assert!(rect.y + rect.height <= size.pixels());
                }
            }
        }
    }

    #[test]
    fn region_areas_do_not_overlap() {
        let layout = plan_layout(TextureSize::BASE);
        let tui_last = layout.pixel_rect(RegionId::Tui, Coord::Block { block: 169, slot: 255 }).unwrap();
        let emoji_first = layout.pixel_rect(RegionId::Emoji, Coord::Block { block: 170, slot: 0 }).unwrap();
        assert_eq!(tui_last.x + tui_last.width, 2560);
        assert_eq!(emoji_first.x, 2560);
        let sprite_last = layout.pixel_rect(RegionId::Sprite, Coord::Block { block: 159, slot: 255 }).unwrap();
        assert_eq!(sprite_last.y + sprite_last.height, 2560);
        let cjk_first = layout.pixel_rect(RegionId::Cjk, Coord::Grid { col: 0, row: 0 }).unwrap();
        assert_eq!(cjk_first.y, 3072);
    }
}
