//! In-memory fonts and a box rasterizer for tests.
//!
//! [`SynthFont`] writes a minimal but valid TrueType file (`cmap`, `glyf`,
//! `head`, `hhea`, `hmtx`, `loca`, `maxp`) that both [`crate::FontParser`]
//! and `fontdue` accept.

use std::collections::{BTreeMap, HashMap};

use crate::raster::{Coverage, InkBounds, LineMetrics, Rasterizer};

struct SynthGlyph {
    advance: u16,
    contours: Vec<Vec<(i16, i16, bool)>>,
}

pub struct SynthFont {
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    glyphs: BTreeMap<char, SynthGlyph>,
}

impl SynthFont {
    pub fn new(units_per_em: u16, ascender: i16, descender: i16) -> Self {
        Self {
            units_per_em,
            ascender,
            descender,
            glyphs: BTreeMap::new(),
        }
    }

    /// Add a glyph from contours of `(x, y, on_curve)` points in font units.
    pub fn glyph(mut self, c: char, advance: u16, contours: Vec<Vec<(i16, i16, bool)>>) -> Self {
        self.glyphs.insert(c, SynthGlyph { advance, contours });
        self
    }

    /// Add a filled rectangle glyph (clockwise, as TrueType expects).
    pub fn rect(self, c: char, advance: u16, x0: i16, y0: i16, x1: i16, y1: i16) -> Self {
        let contour = vec![(x0, y0, true), (x0, y1, true), (x1, y1, true), (x1, y0, true)];
        self.glyph(c, advance, vec![contour])
    }

    /// Add a glyph without contours, like a space.
    pub fn blank(self, c: char, advance: u16) -> Self {
        self.glyph(c, advance, Vec::new())
    }

    pub fn build(&self) -> Vec<u8> {
        // glyph 0 is .notdef, then characters in code point order
        let chars: Vec<char> = self.glyphs.keys().copied().collect();
        let num_glyphs = chars.len() as u16 + 1;

        let mut glyf = Vec::new();
        // .notdef has no outline: its range is empty
        let mut loca = vec![0u32, 0u32];
        let mut hmtx = Vec::new();
        push_u16(&mut hmtx, self.units_per_em / 2);
        push_i16(&mut hmtx, 0);
        let mut advance_max = self.units_per_em / 2;
        let (mut x_min, mut y_min, mut x_max, mut y_max) = (0i16, 0i16, 0i16, 0i16);
        for c in &chars {
            let g = &self.glyphs[c];
            let bbox = write_simple_glyph(&mut glyf, &g.contours);
            while glyf.len() % 4 != 0 {
                glyf.push(0);
            }
            loca.push(glyf.len() as u32);
            push_u16(&mut hmtx, g.advance);
            push_i16(&mut hmtx, bbox.map_or(0, |b| b.0));
            advance_max = advance_max.max(g.advance);
            if let Some((a, b, c, d)) = bbox {
                x_min = x_min.min(a);
                y_min = y_min.min(b);
                x_max = x_max.max(c);
                y_max = y_max.max(d);
            }
        }

        let mut head = vec![0u8; 54];
        head[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
        head[18..20].copy_from_slice(&self.units_per_em.to_be_bytes());
        head[36..38].copy_from_slice(&x_min.to_be_bytes());
        head[38..40].copy_from_slice(&y_min.to_be_bytes());
        head[40..42].copy_from_slice(&x_max.to_be_bytes());
        head[42..44].copy_from_slice(&y_max.to_be_bytes());
        head[46..48].copy_from_slice(&8u16.to_be_bytes());
        head[50..52].copy_from_slice(&1i16.to_be_bytes());

        let mut hhea = vec![0u8; 36];
        hhea[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        hhea[4..6].copy_from_slice(&self.ascender.to_be_bytes());
        hhea[6..8].copy_from_slice(&self.descender.to_be_bytes());
        hhea[10..12].copy_from_slice(&advance_max.to_be_bytes());
        hhea[34..36].copy_from_slice(&num_glyphs.to_be_bytes());

        let mut maxp = vec![0u8; 32];
        maxp[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        maxp[4..6].copy_from_slice(&num_glyphs.to_be_bytes());

        let mut loca_bytes = Vec::with_capacity(loca.len() * 4);
        for off in loca {
            loca_bytes.extend_from_slice(&off.to_be_bytes());
        }

        let mut tables: Vec<([u8; 4], Vec<u8>)> = vec![
            (*b"cmap", build_cmap(&chars)),
            (*b"glyf", glyf),
            (*b"head", head),
            (*b"hhea", hhea),
            (*b"hmtx", hmtx),
            (*b"loca", loca_bytes),
            (*b"maxp", maxp),
        ];
        tables.sort_by(|a, b| a.0.cmp(&b.0));
        assemble(&tables)
    }
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_i16(out: &mut Vec<u8>, v: i16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// Writes one simple glyph and returns its bounding box, or nothing for an
/// empty glyph.
fn write_simple_glyph(out: &mut Vec<u8>, contours: &[Vec<(i16, i16, bool)>]) -> Option<(i16, i16, i16, i16)> {
    let points: Vec<(i16, i16, bool)> = contours.iter().flatten().copied().collect();
    if points.is_empty() {
        return None;
    }
    let x_min = points.iter().map(|p| p.0).min().unwrap_or(0);
    let y_min = points.iter().map(|p| p.1).min().unwrap_or(0);
    let x_max = points.iter().map(|p| p.0).max().unwrap_or(0);
    let y_max = points.iter().map(|p| p.1).max().unwrap_or(0);

    push_i16(out, contours.len() as i16);
    for v in [x_min, y_min, x_max, y_max] {
        push_i16(out, v);
    }
    let mut end = 0usize;
    for contour in contours {
        end += contour.len();
        push_u16(out, (end - 1) as u16);
    }
    push_u16(out, 0); // no instructions
    for p in &points {
        out.push(if p.2 { 0x01 } else { 0x00 });
    }
    let mut prev = 0i16;
    for p in &points {
        push_i16(out, p.0 - prev);
        prev = p.0;
    }
    prev = 0;
    for p in &points {
        push_i16(out, p.1 - prev);
        prev = p.1;
    }
    Some((x_min, y_min, x_max, y_max))
}

/// A format 4 subtable for the BMP, plus a format 12 subtable when any
/// character lies outside it.
fn build_cmap(chars: &[char]) -> Vec<u8> {
    let bmp: Vec<(u16, u16)> = chars
        .iter()
        .enumerate()
        .filter_map(|(i, &c)| u16::try_from(c as u32).ok().map(|code| (code, i as u16 + 1)))
        .filter(|&(code, _)| code != 0xFFFF)
        .collect();
    let wide = chars.iter().any(|&c| c as u32 > 0xFFFF);

    let mut format4 = Vec::new();
    let seg_count = bmp.len() as u16 + 1;
    push_u16(&mut format4, 4);
    push_u16(&mut format4, 0); // length, patched below
    push_u16(&mut format4, 0);
    push_u16(&mut format4, seg_count * 2);
    let mut search_range = 2u16;
    let mut entry_selector = 0u16;
    while search_range * 2 <= seg_count * 2 {
        search_range *= 2;
        entry_selector += 1;
    }
    push_u16(&mut format4, search_range);
    push_u16(&mut format4, entry_selector);
    push_u16(&mut format4, seg_count * 2 - search_range);
    for &(code, _) in &bmp {
        push_u16(&mut format4, code);
    }
    push_u16(&mut format4, 0xFFFF);
    push_u16(&mut format4, 0);
    for &(code, _) in &bmp {
        push_u16(&mut format4, code);
    }
    push_u16(&mut format4, 0xFFFF);
    for &(code, glyph) in &bmp {
        push_u16(&mut format4, glyph.wrapping_sub(code));
    }
    push_u16(&mut format4, 1);
    for _ in 0..seg_count {
        push_u16(&mut format4, 0);
    }
    let len = format4.len() as u16;
    format4[2..4].copy_from_slice(&len.to_be_bytes());

    let mut subtables: Vec<(u16, u16, Vec<u8>)> = vec![(3, 1, format4)];
    if wide {
        let mut format12 = Vec::new();
        push_u16(&mut format12, 12);
        push_u16(&mut format12, 0);
        push_u32(&mut format12, 16 + chars.len() as u32 * 12);
        push_u32(&mut format12, 0);
        push_u32(&mut format12, chars.len() as u32);
        for (i, &c) in chars.iter().enumerate() {
            push_u32(&mut format12, c as u32);
            push_u32(&mut format12, c as u32);
            push_u32(&mut format12, i as u32 + 1);
        }
        subtables.push((3, 10, format12));
    }

    let mut cmap = Vec::new();
    push_u16(&mut cmap, 0);
    push_u16(&mut cmap, subtables.len() as u16);
    let mut offset = 4 + subtables.len() as u32 * 8;
    for (platform, encoding, data) in &subtables {
        push_u16(&mut cmap, *platform);
        push_u16(&mut cmap, *encoding);
        push_u32(&mut cmap, offset);
        offset += data.len() as u32;
    }
    for (_, _, data) in &subtables {
        cmap.extend_from_slice(data);
    }
    cmap
}

fn assemble(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut data = Vec::new();
    push_u32(&mut data, 0x0001_0000);
    push_u16(&mut data, tables.len() as u16);
    data.extend_from_slice(&[0; 6]);

    let mut offset = 12 + tables.len() * 16;
    let mut padded = Vec::with_capacity(tables.len());
    for (tag, table) in tables {
        data.extend_from_slice(tag);
        push_u32(&mut data, 0);
        push_u32(&mut data, offset as u32);
        push_u32(&mut data, table.len() as u32);
        let mut t = table.clone();
        while t.len() % 4 != 0 {
            t.push(0);
        }
        offset += t.len();
        padded.push(t);
    }
    for t in padded {
        data.extend_from_slice(&t);
    }
    data
}

/// A rasterizer whose glyphs are axis-aligned boxes given in EM units.
/// Line metrics are 0.8 em ascent and 0.2 em descent with no gap.
pub struct BlockRasterizer {
    advance_em: f32,
    glyphs: HashMap<char, [f32; 4]>,
}

impl BlockRasterizer {
    pub fn new(advance_em: f32) -> Self {
        Self {
            advance_em,
            glyphs: HashMap::new(),
        }
    }

    pub fn glyph(mut self, c: char, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        self.glyphs.insert(c, [x0, y0, x1, y1]);
        self
    }
}

impl Rasterizer for BlockRasterizer {
    fn name(&self) -> &str {
        "block"
    }

    fn has_glyph(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    fn line_metrics(&self, px: f32) -> Option<LineMetrics> {
        Some(LineMetrics {
            ascent: 0.8 * px,
            descent: 0.2 * px,
            line_gap: 0.0,
        })
    }

    fn ink_bounds(&self, c: char, px: f32) -> InkBounds {
        let [x0, y0, x1, y1] = self.glyphs.get(&c).copied().unwrap_or_default();
        InkBounds {
            x: x0 * px,
            y: y0 * px,
            width: (x1 - x0) * px,
            height: (y1 - y0) * px,
            advance: self.advance_em * px,
        }
    }

    fn rasterize(&self, c: char, px: f32) -> Option<Coverage> {
        let [x0, y0, x1, y1] = *self.glyphs.get(&c)?;
        let left = (x0 * px).floor() as i32;
        let bottom = (y0 * px).floor() as i32;
        let width = ((x1 * px).ceil() as i32 - left).max(0) as usize;
        let height = ((y1 * px).ceil() as i32 - bottom).max(0) as usize;
        Some(Coverage {
            width,
            height,
            left,
            bottom,
            advance: self.advance_em * px,
            data: vec![255; width * height],
        })
    }
}
