//! Structures and logic for parsing TrueType fonts.

use std::io::Cursor;

use crate::binary_reader::*;
use crate::error::FontError;
use crate::outline::{contours_to_commands, GlyphOutline, OutlinePoint};
use crate::tables::{face_offset, parse_num_glyphs, HeadTable, HheaTable, TableDirectory};

const MAX_COMPONENT_DEPTH: u32 = 8;

// simple glyph flags
const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;

// composite glyph flags
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmapFormat {
    SegmentDelta,
    SegmentedCoverage,
}

/// Location of the preferred Unicode subtable inside `cmap`.
#[derive(Debug, Clone, Copy)]
struct CmapSubtable {
    format: CmapFormat,
    offset: usize,
}

pub struct FontParser {
    data: Vec<u8>,
    directory: TableDirectory,
    head: HeadTable,
    hhea: HheaTable,
    num_glyphs: u16,
    cmap: Option<CmapSubtable>,
}

impl std::fmt::Debug for FontParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontParser")
            .field("bytes", &self.data.len())
            .field("head", &self.head)
            .field("hhea", &self.hhea)
            .field("num_glyphs", &self.num_glyphs)
            .finish()
    }
}

impl FontParser {
    /// Create a new `FontParser` from raw font bytes. The table directory
    /// and the header tables are read immediately.
    pub fn new(data: Vec<u8>) -> Result<Self, FontError> {
        Self::with_collection_index(data, 0)
    }

    /// Like [`FontParser::new`] but selects a face inside a `.ttc` file.
    pub fn with_collection_index(data: Vec<u8>, index: u32) -> Result<Self, FontError> {
        let face = face_offset(&data, index)?;
        let directory = TableDirectory::read(&data, face)?;
        let head = HeadTable::parse(directory.slice(&data, b"head")?)?;
        let hhea = HheaTable::parse(directory.slice(&data, b"hhea")?)?;
        let num_glyphs = match directory.slice(&data, b"maxp") {
            Ok(maxp) => parse_num_glyphs(maxp)?,
            Err(FontError::MissingTable(_)) => u16::MAX,
            Err(e) => return Err(e),
        };
        let cmap = match directory.slice(&data, b"cmap") {
            Ok(cmap) => select_cmap_subtable(cmap)?,
            Err(FontError::MissingTable(_)) => None,
            Err(e) => return Err(e),
        };
        Ok(Self {
            data,
            directory,
            head,
            hhea,
            num_glyphs,
            cmap,
        })
    }

    pub fn head(&self) -> &HeadTable {
        &self.head
    }

    pub fn hhea(&self) -> &HheaTable {
        &self.hhea
    }

    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    /// True when outlines are TrueType quadratics (as opposed to CFF).
    pub fn has_glyf_outlines(&self) -> bool {
        self.directory.contains(b"glyf") && self.directory.contains(b"loca")
    }

    /// Map a character to its glyph id. `None` when the font has no glyph
    /// for it (cmap lookup yields `.notdef`).
    pub fn glyph_index(&self, c: char) -> Option<u16> {
        let sub = self.cmap?;
        let cmap = self.directory.slice(&self.data, b"cmap").ok()?;
        let glyph = match sub.format {
            CmapFormat::SegmentDelta => lookup_format4(cmap, sub.offset, c as u32),
            CmapFormat::SegmentedCoverage => lookup_format12(cmap, sub.offset, c as u32),
        }?;
        (glyph != 0 && glyph < self.num_glyphs).then_some(glyph)
    }

    /// Advance width in font units from `hmtx`.
    pub fn advance_width(&self, glyph: u16) -> Option<u16> {
        let hmtx = self.directory.slice(&self.data, b"hmtx").ok()?;
        let long_metrics = self.hhea.number_of_h_metrics.max(1);
        // glyphs past the long metrics share the last advance
        let entry = glyph.min(long_metrics - 1) as usize;
        u16_at(hmtx, entry * 4).ok()
    }

    /// Outline of a character in EM units; `Ok(None)` if the character is
    /// not mapped.
    pub fn outline_for(&self, c: char) -> Result<Option<GlyphOutline>, FontError> {
        match self.glyph_index(c) {
            Some(glyph) => self.outline(glyph).map(Some),
            None => Ok(None),
        }
    }

    /// Outline of a glyph id in EM units. Glyphs without contours (space)
    /// yield an empty outline.
    pub fn outline(&self, glyph: u16) -> Result<GlyphOutline, FontError> {
        if !self.has_glyf_outlines() {
            return Err(FontError::Unsupported(
                "font has no glyf/loca outlines (CFF outlines are rasterized instead)".into(),
            ));
        }
        let mut contours = Vec::new();
        self.collect_contours(glyph, [1.0, 0.0, 0.0, 1.0, 0.0, 0.0], 0, &mut contours)?;
        Ok(contours_to_commands(&contours, self.head.units_per_em))
    }

    fn glyph_range(&self, glyph: u16) -> Result<(usize, usize), FontError> {
        let loca = self.directory.slice(&self.data, b"loca")?;
        let i = glyph as usize;
        if self.head.index_to_loc_format == 0 {
            Ok((
                u16_at(loca, i * 2)? as usize * 2,
                u16_at(loca, i * 2 + 2)? as usize * 2,
            ))
        } else {
            Ok((u32_at(loca, i * 4)? as usize, u32_at(loca, i * 4 + 4)? as usize))
        }
    }

    /// Append the glyph's contours, transformed by `m` = [a, b, c, d, dx, dy]
    /// (x' = a*x + c*y + dx, y' = b*x + d*y + dy).
    fn collect_contours(
        &self,
        glyph: u16,
        m: [f32; 6],
        depth: u32,
        out: &mut Vec<Vec<OutlinePoint>>,
    ) -> Result<(), FontError> {
        if depth > MAX_COMPONENT_DEPTH {
            return Err(FontError::Unsupported(format!(
                "composite glyph nesting deeper than {MAX_COMPONENT_DEPTH}"
            )));
        }
        let (start, end) = self.glyph_range(glyph)?;
        if end <= start {
            return Ok(());
        }
        let glyf = self.directory.slice(&self.data, b"glyf")?;
        let record = glyf.get(start..end).ok_or_else(|| {
            FontError::Unsupported(format!("glyph {glyph} lies outside the glyf table"))
        })?;
        let num_contours = i16_at(record, 0)?;
        if num_contours >= 0 {
            for contour in parse_simple_glyph(record, num_contours as usize)? {
                out.push(
                    contour
                        .into_iter()
                        .map(|p| OutlinePoint {
                            x: m[0] * p.x + m[2] * p.y + m[4],
                            y: m[1] * p.x + m[3] * p.y + m[5],
                            on_curve: p.on_curve,
                        })
                        .collect(),
                );
            }
            return Ok(());
        }

        let mut cur = Cursor::new(record);
        cur.set_position(10);
        loop {
            let flags = read_u16_be(&mut cur)?;
            let component = read_u16_be(&mut cur)?;
            let (arg1, arg2) = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
                (read_i16_be(&mut cur)? as f32, read_i16_be(&mut cur)? as f32)
            } else {
                (read_i8(&mut cur)? as f32, read_i8(&mut cur)? as f32)
            };
            let (a, b, c, d) = if flags & WE_HAVE_A_SCALE != 0 {
                let s = read_f2dot14(&mut cur)?;
                (s, 0.0, 0.0, s)
            } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                let sx = read_f2dot14(&mut cur)?;
                let sy = read_f2dot14(&mut cur)?;
                (sx, 0.0, 0.0, sy)
            } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
                (
                    read_f2dot14(&mut cur)?,
                    read_f2dot14(&mut cur)?,
                    read_f2dot14(&mut cur)?,
                    read_f2dot14(&mut cur)?,
                )
            } else {
                (1.0, 0.0, 0.0, 1.0)
            };
            let (dx, dy) = if flags & ARGS_ARE_XY_VALUES != 0 {
                (arg1, arg2)
            } else {
                // point-matching anchors are rare in text fonts
                log::debug!("glyph {glyph}: point-matched component {component} placed at origin");
                (0.0, 0.0)
            };
            // child transform first, then the parent's
            let child = [
                m[0] * a + m[2] * b,
                m[1] * a + m[3] * b,
                m[0] * c + m[2] * d,
                m[1] * c + m[3] * d,
                m[0] * dx + m[2] * dy + m[4],
                m[1] * dx + m[3] * dy + m[5],
            ];
            self.collect_contours(component, child, depth + 1, out)?;
            if flags & MORE_COMPONENTS == 0 {
                break;
            }
        }
        Ok(())
    }
}

fn parse_simple_glyph(record: &[u8], num_contours: usize) -> Result<Vec<Vec<OutlinePoint>>, FontError> {
    let mut cur = Cursor::new(record);
    cur.set_position(10);
    let mut end_points = Vec::with_capacity(num_contours);
    for _ in 0..num_contours {
        end_points.push(read_u16_be(&mut cur)? as usize);
    }
    let num_points = match end_points.last() {
        Some(&last) => last + 1,
        None => return Ok(Vec::new()),
    };
    let instruction_len = read_u16_be(&mut cur)? as u64;
    cur.set_position(cur.position() + instruction_len);

    let mut flags = Vec::with_capacity(num_points);
    while flags.len() < num_points {
        let flag = read_u8(&mut cur)?;
        flags.push(flag);
        if flag & REPEAT != 0 {
            let repeat = read_u8(&mut cur)?;
            for _ in 0..repeat {
                flags.push(flag);
            }
        }
    }
    flags.truncate(num_points);

    let mut xs = Vec::with_capacity(num_points);
    let mut x = 0i32;
    for &flag in &flags {
        if flag & X_SHORT != 0 {
            let dx = read_u8(&mut cur)? as i32;
            x += if flag & X_SAME_OR_POSITIVE != 0 { dx } else { -dx };
        } else if flag & X_SAME_OR_POSITIVE == 0 {
            x += read_i16_be(&mut cur)? as i32;
        }
        xs.push(x);
    }
    let mut ys = Vec::with_capacity(num_points);
    let mut y = 0i32;
    for &flag in &flags {
        if flag & Y_SHORT != 0 {
            let dy = read_u8(&mut cur)? as i32;
            y += if flag & Y_SAME_OR_POSITIVE != 0 { dy } else { -dy };
        } else if flag & Y_SAME_OR_POSITIVE == 0 {
            y += read_i16_be(&mut cur)? as i32;
        }
        ys.push(y);
    }

    let mut contours = Vec::with_capacity(num_contours);
    let mut first = 0;
    for &last in &end_points {
        if last < first || last >= num_points {
            return Err(FontError::Unsupported("glyph contour end points out of order".into()));
        }
        contours.push(
            (first..=last)
                .map(|i| OutlinePoint {
                    x: xs[i] as f32,
                    y: ys[i] as f32,
                    on_curve: flags[i] & ON_CURVE != 0,
                })
                .collect(),
        );
        first = last + 1;
    }
    Ok(contours)
}

/// Pick the best Unicode subtable: full-repertoire format 12 first, then
/// BMP format 4.
fn select_cmap_subtable(cmap: &[u8]) -> Result<Option<CmapSubtable>, FontError> {
    let num_subtables = u16_at(cmap, 2)?;
    let mut best: Option<(u8, CmapSubtable)> = None;
    for i in 0..num_subtables as usize {
        let rec = 4 + i * 8;
        let platform = u16_at(cmap, rec)?;
        let encoding = u16_at(cmap, rec + 2)?;
        let offset = u32_at(cmap, rec + 4)? as usize;
        let unicode = platform == 0 || (platform == 3 && (encoding == 1 || encoding == 10));
        if !unicode {
            continue;
        }
        let (rank, format) = match u16_at(cmap, offset)? {
            12 => (2, CmapFormat::SegmentedCoverage),
            4 => (1, CmapFormat::SegmentDelta),
            _ => continue,
        };
        if best.map_or(true, |(r, _)| rank > r) {
            best = Some((rank, CmapSubtable { format, offset }));
        }
    }
    Ok(best.map(|(_, sub)| sub))
}

fn lookup_format4(cmap: &[u8], sub: usize, code: u32) -> Option<u16> {
    if code > 0xFFFF {
        return None;
    }
    let seg_count = (u16_at(cmap, sub + 6).ok()? / 2) as usize;
    let end_codes = sub + 14;
    let start_codes = end_codes + seg_count * 2 + 2;
    let id_deltas = start_codes + seg_count * 2;
    let id_range_offsets = id_deltas + seg_count * 2;
    for i in 0..seg_count {
        let end = u16_at(cmap, end_codes + i * 2).ok()? as u32;
        if code > end {
            continue;
        }
        let start = u16_at(cmap, start_codes + i * 2).ok()? as u32;
        if code < start {
            return None;
        }
        let delta = u16_at(cmap, id_deltas + i * 2).ok()?;
        let range_offset = u16_at(cmap, id_range_offsets + i * 2).ok()? as usize;
        if range_offset == 0 {
            return Some((code as u16).wrapping_add(delta));
        }
        // idRangeOffset is relative to its own position in the array
        let pos = id_range_offsets + i * 2 + range_offset + (code - start) as usize * 2;
        let glyph = u16_at(cmap, pos).ok()?;
        return if glyph == 0 { Some(0) } else { Some(glyph.wrapping_add(delta)) };
    }
    None
}

fn lookup_format12(cmap: &[u8], sub: usize, code: u32) -> Option<u16> {
    let num_groups = u32_at(cmap, sub + 12).ok()? as usize;
    let (mut lo, mut hi) = (0usize, num_groups);
    while lo < hi {
        let mid = (lo + hi) / 2;
        let group = sub + 16 + mid * 12;
        let start = u32_at(cmap, group).ok()?;
        let end = u32_at(cmap, group + 4).ok()?;
        if code < start {
            hi = mid;
        } else if code > end {
            lo = mid + 1;
        } else {
            let start_glyph = u32_at(cmap, group + 8).ok()?;
            return u16::try_from(start_glyph + (code - start)).ok();
        }
    }
    None
}
