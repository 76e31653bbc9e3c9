//! Table directory and the fixed-layout header tables (`head`, `hhea`,
//! `maxp`).

use std::collections::HashMap;

use crate::binary_reader::{i16_at, u16_at, u32_at};
use crate::error::FontError;

/// A directory entry in the font file's table directory.
#[derive(Debug, Clone)]
pub struct TableRecord {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

pub fn tag_name(tag: &[u8; 4]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

/// Offset of the `index`-th font inside `data`. Plain sfnt files only have
/// index 0; `ttcf` collections list one offset per face.
pub fn face_offset(data: &[u8], index: u32) -> Result<u32, FontError> {
    if data.get(0..4) != Some(&b"ttcf"[..]) {
        if index != 0 {
            return Err(FontError::CollectionIndex { index, count: 1 });
        }
        return Ok(0);
    }
    let count = u32_at(data, 8)?;
    if index >= count {
        return Err(FontError::CollectionIndex { index, count });
    }
    Ok(u32_at(data, 12 + index as usize * 4)?)
}

#[derive(Debug, Clone, Default)]
pub struct TableDirectory {
    tables: HashMap<[u8; 4], TableRecord>,
}

impl TableDirectory {
    /// Read the offset table and directory of the face starting at `face`.
    pub fn read(data: &[u8], face: u32) -> Result<Self, FontError> {
        let base = face as usize;
        let version = u32_at(data, base)?;
        // 0x00010000 TrueType outlines, 'true' (Apple), 'OTTO' CFF outlines.
        if version != 0x0001_0000 && &version.to_be_bytes() != b"true" && &version.to_be_bytes() != b"OTTO" {
            return Err(FontError::Unsupported(format!("sfnt version {version:#010x}")));
        }
        let num_tables = u16_at(data, base + 4)?;
        let mut tables = HashMap::with_capacity(num_tables as usize);
        for i in 0..num_tables as usize {
            let rec_off = base + 12 + i * 16;
            let mut tag = [0u8; 4];
            tag.copy_from_slice(
                data.get(rec_off..rec_off + 4)
                    .ok_or_else(|| FontError::Unsupported("table directory truncated".into()))?,
            );
            let rec = TableRecord {
                tag,
                checksum: u32_at(data, rec_off + 4)?,
                offset: u32_at(data, rec_off + 8)?,
                length: u32_at(data, rec_off + 12)?,
            };
            tables.insert(tag, rec);
        }
        Ok(Self { tables })
    }

    pub fn get(&self, tag: &[u8; 4]) -> Option<&TableRecord> {
        self.tables.get(tag)
    }

    pub fn contains(&self, tag: &[u8; 4]) -> bool {
        self.tables.contains_key(tag)
    }

    /// Bounds-checked view of a table's bytes.
    pub fn slice<'a>(&self, data: &'a [u8], tag: &[u8; 4]) -> Result<&'a [u8], FontError> {
        let rec = self
            .tables
            .get(tag)
            .ok_or_else(|| FontError::MissingTable(tag_name(tag)))?;
        let start = rec.offset as usize;
        let end = start + rec.length as usize;
        data.get(start..end).ok_or_else(|| {
            FontError::Unsupported(format!(
                "table '{}' ({start}..{end}) exceeds file size {}",
                tag_name(tag),
                data.len()
            ))
        })
    }
}

/// The parts of `head` the parser needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadTable {
    pub units_per_em: u16,
    pub index_to_loc_format: i16,
}

impl HeadTable {
    pub fn parse(head: &[u8]) -> Result<Self, FontError> {
        Ok(Self {
            units_per_em: u16_at(head, 18)?,
            index_to_loc_format: i16_at(head, 50)?,
        })
    }
}

/// Horizontal header: font-wide vertical metrics in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub number_of_h_metrics: u16,
}

impl HheaTable {
    pub fn parse(hhea: &[u8]) -> Result<Self, FontError> {
        Ok(Self {
            ascender: i16_at(hhea, 4)?,
            descender: i16_at(hhea, 6)?,
            line_gap: i16_at(hhea, 8)?,
            advance_width_max: u16_at(hhea, 10)?,
            number_of_h_metrics: u16_at(hhea, 34)?,
        })
    }
}

pub fn parse_num_glyphs(maxp: &[u8]) -> Result<u16, FontError> {
    Ok(u16_at(maxp, 4)?)
}
