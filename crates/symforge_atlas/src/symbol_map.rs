//! The symbol map document: region definitions plus the character to slot
//! assignments a renderer needs to find a symbol in the atlas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AtlasError;
use crate::layout::{Addressing, AtlasLayout, RegionId};

pub const SYMBOL_MAP_VERSION: u32 = 1;

/// Slot order of the sprite sheets (C64 character set, first sheet).
pub const SPRITE_SYMBOLS: &str =
    "@abcdefghijklmnopqrstuvwxyz[£]↑← !\"#$%&'()*+,-./0123456789:;<=>?─ABCDEFGHIJKLMNOPQRSTUVWXYZ┼";

/// Symbols pinned to sprite slots outside the ordered string, as
/// `[block, slot]`.
pub const SPRITE_EXTRAS: [(&str, [u32; 2]); 13] = [
    ("▇", [1, 209]),
    ("▒", [1, 94]),
    ("∙", [1, 122]),
    ("│", [1, 93]),
    ("┐", [1, 110]),
    ("╮", [1, 73]),
    ("┌", [1, 112]),
    ("╭", [1, 85]),
    ("└", [1, 109]),
    ("╰", [1, 74]),
    ("┘", [1, 125]),
    ("╯", [1, 75]),
    ("_", [2, 30]),
];

/// Ordered slot contents of a block region. Single-scalar regions use a
/// plain string; emoji may span several scalars and use one string per slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolList {
    Text(String),
    Sequence(Vec<String>),
}

impl SymbolList {
    pub fn position(&self, symbol: &str) -> Option<usize> {
        match self {
            SymbolList::Text(text) => {
                let mut chars = symbol.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return None;
                };
                text.chars().position(|t| t == c)
            }
            SymbolList::Sequence(items) => items.iter().position(|s| s == symbol),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SymbolList::Text(text) => text.chars().count(),
            SymbolList::Sequence(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegionEntry {
    Block {
        block_range: [u32; 2],
        chars_per_block: u32,
        symbols: SymbolList,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        extras: BTreeMap<String, [u32; 2]>,
    },
    Grid {
        grid_cols: u32,
        mappings: BTreeMap<String, [u32; 2]>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMap {
    pub version: u32,
    pub regions: BTreeMap<String, RegionEntry>,
    pub linear_index: BTreeMap<String, u32>,
}

impl SymbolMap {
    /// Describe `layout` with the given (already truncated) inputs.
    pub fn build(layout: &AtlasLayout, tui: &[char], emoji: &[String], cjk: &[char]) -> Self {
        let mut regions = BTreeMap::new();
        let mut linear_index = BTreeMap::new();
        for region in layout.regions() {
            let entry = match region.addressing {
                Addressing::Block { chars_per_block, .. } => {
                    let (symbols, extras) = match region.id {
                        RegionId::Sprite => (
                            SymbolList::Text(SPRITE_SYMBOLS.to_string()),
                            SPRITE_EXTRAS.iter().map(|(s, at)| (s.to_string(), *at)).collect(),
                        ),
                        RegionId::Tui => (SymbolList::Text(tui.iter().collect()), BTreeMap::new()),
                        _ => (SymbolList::Sequence(emoji.to_vec()), BTreeMap::new()),
                    };
                    RegionEntry::Block {
                        block_range: region.block_range().unwrap_or([0, 0]),
                        chars_per_block,
                        symbols,
                        extras,
                    }
                }
                Addressing::Grid { cols, .. } => RegionEntry::Grid {
                    grid_cols: cols,
                    mappings: cjk
                        .iter()
                        .enumerate()
                        .map(|(i, c)| (c.to_string(), [i as u32 % cols, i as u32 / cols]))
                        .collect(),
                },
            };
            regions.insert(region.id.name().to_string(), entry);
            linear_index.insert(format!("{}_base", region.id), region.linear_base);
            linear_index.insert(format!("{}_total", region.id), region.linear_total);
        }
        Self {
            version: SYMBOL_MAP_VERSION,
            regions,
            linear_index,
        }
    }

    pub fn to_json(&self) -> Result<String, AtlasError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, AtlasError> {
        let map: SymbolMap = serde_json::from_str(text)?;
        if map.version != SYMBOL_MAP_VERSION {
            return Err(AtlasError::Config(format!(
                "symbol map version {} is not supported (expected {SYMBOL_MAP_VERSION})",
                map.version
            )));
        }
        Ok(map)
    }

    /// Linear index of `symbol`, searching sprite, tui, emoji then cjk.
    pub fn linear_index_of(&self, symbol: &str) -> Option<u32> {
        RegionId::ALL
            .iter()
            .find_map(|id| self.linear_index_in(id.name(), symbol))
    }

    /// Linear index of `symbol` within one region: pinned extras first, then
    /// slot order (block regions) or the mapping table (grid regions).
    pub fn linear_index_in(&self, region: &str, symbol: &str) -> Option<u32> {
        let base = *self.linear_index.get(&format!("{region}_base"))?;
        match self.regions.get(region)? {
            RegionEntry::Block {
                block_range,
                chars_per_block,
                symbols,
                extras,
            } => {
                if let Some(&[block, slot]) = extras.get(symbol) {
                    if slot >= *chars_per_block || !(block_range[0]..=block_range[1]).contains(&block) {
                        return None;
                    }
                    return Some(base + (block - block_range[0]) * chars_per_block + slot);
                }
                symbols.position(symbol).map(|pos| base + pos as u32)
            }
            RegionEntry::Grid { grid_cols, mappings } => {
                let [col, row] = mappings.get(symbol)?;
                Some(base + row * grid_cols + col)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{plan_layout, Coord, TextureSize};

    fn sample() -> SymbolMap {
        let layout = plan_layout(TextureSize::BASE);
        SymbolMap::build(
            &layout,
            &[' ', '─', 'é'],
            &["😀".to_string(), "❤\u{FE0F}".to_string()],
            &['中', '文'],
        )
    }

    #[test]
    fn document_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["regions"]["sprite"]["type"], "block");
        assert_eq!(json["regions"]["sprite"]["block_range"], serde_json::json!([0, 159]));
        assert_eq!(json["regions"]["sprite"]["extras"]["_"], serde_json::json!([2, 30]));
        assert_eq!(json["regions"]["tui"]["block_range"], serde_json::json!([160, 169]));
        assert_eq!(json["regions"]["tui"]["symbols"], " ─é");
        assert!(json["regions"]["tui"].get("extras").is_none());
        assert_eq!(json["regions"]["emoji"]["chars_per_block"], 128);
        assert_eq!(json["regions"]["emoji"]["symbols"][1], "❤\u{FE0F}");
        assert_eq!(json["regions"]["cjk"]["type"], "grid");
        assert_eq!(json["regions"]["cjk"]["grid_cols"], 128);
        assert_eq!(json["regions"]["cjk"]["mappings"]["文"], serde_json::json!([1, 0]));
        assert_eq!(json["linear_index"]["tui_base"], 40960);
        assert_eq!(json["linear_index"]["emoji_total"], 768);
        assert_eq!(json["linear_index"]["cjk_base"], 44288);
        assert_eq!(json["linear_index"]["cjk_total"], 4096);
    }

    #[test]
    fn json_round_trip() {
        let map = sample();
        assert_eq!(SymbolMap::from_json(&map.to_json().unwrap()).unwrap(), map);
    }

    #[test]
    fn rejects_unknown_versions() {
        let mut map = sample();
        map.version = 2;
        assert!(matches!(
            SymbolMap::from_json(&map.to_json().unwrap()),
            Err(AtlasError::Config(_))
        ));
        assert!(matches!(SymbolMap::from_json("{"), Err(AtlasError::SymbolMap(_))));
    }

    #[test]
    fn lookups_agree_with_the_layout() {
        let layout = plan_layout(TextureSize::BASE);
        let map = sample();
        assert_eq!(map.linear_index_of("@"), Some(0));
        assert_eq!(map.linear_index_of("a"), Some(1));
        // extras win over slot order
        assert_eq!(
            map.linear_index_of("_"),
            Some(layout.linear_index(RegionId::Sprite, Coord::Block { block: 2, slot: 30 }).unwrap())
        );
        // '─' is in the sprite string, so the sprite slot is found first
        assert_eq!(map.linear_index_of("─"), Some(SPRITE_SYMBOLS.chars().position(|c| c == '─').unwrap() as u32));
        assert_eq!(map.linear_index_in("tui", "─"), Some(40961));
        assert_eq!(map.linear_index_of("é"), Some(40962));
        assert_eq!(map.linear_index_of("❤\u{FE0F}"), Some(43521));
        assert_eq!(
            map.linear_index_of("文"),
            Some(layout.linear_index(RegionId::Cjk, Coord::Grid { col: 1, row: 0 }).unwrap())
        );
        assert_eq!(map.linear_index_of("ü"), None);
        assert_eq!(map.linear_index_in("nowhere", "a"), None);
    }

    #[test]
    fn extras_outside_the_region_do_not_resolve() {
        let mut map = sample();
        let Some(RegionEntry::Block { extras, .. }) = map.regions.get_mut("sprite") else {
            panic!("sprite is a block region");
        };
        extras.insert("▲".to_string(), [1, 300]);
        extras.insert("▼".to_string(), [160, 0]);
        extras.insert("◆".to_string(), [159, 255]);
        assert_eq!(map.linear_index_in("sprite", "▲"), None);
        assert_eq!(map.linear_index_in("sprite", "▼"), None);
        assert_eq!(map.linear_index_of("◆"), Some(40959));
    }
}
