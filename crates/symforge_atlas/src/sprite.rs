//! Sprite sheets: 16x16 grids of 16 px symbols separated by 1 px gutters.

use std::path::Path;

use image::{imageops, RgbaImage};
use log::info;

use crate::error::AtlasError;

pub const SHEET_CELL: u32 = 16;
pub const SHEET_SPACING: u32 = 1;
pub const SHEET_GRID: u32 = 16;

/// Smallest sheet that holds the full grid (no trailing gutter needed).
pub const SHEET_MIN_SIZE: u32 = SHEET_GRID * (SHEET_CELL + SHEET_SPACING) - SHEET_SPACING;

/// Cut a sheet into its symbols, row by row.
pub fn slice_sheet(sheet: &RgbaImage) -> Result<Vec<RgbaImage>, AtlasError> {
    let (w, h) = sheet.dimensions();
    if w < SHEET_MIN_SIZE || h < SHEET_MIN_SIZE {
        return Err(AtlasError::Config(format!(
            "sprite sheet is {w}x{h}, needs at least {SHEET_MIN_SIZE}x{SHEET_MIN_SIZE}"
        )));
    }
    let mut symbols = Vec::with_capacity((SHEET_GRID * SHEET_GRID) as usize);
    for row in 0..SHEET_GRID {
        for col in 0..SHEET_GRID {
            let x = col * (SHEET_CELL + SHEET_SPACING);
            let y = row * (SHEET_CELL + SHEET_SPACING);
            symbols.push(imageops::crop_imm(sheet, x, y, SHEET_CELL, SHEET_CELL).to_image());
        }
    }
    Ok(symbols)
}

/// Load and slice every sheet in order. Sprites keep their 16 px source size;
/// the resolver scales them to the atlas cell.
pub fn load_sheets<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<RgbaImage>, AtlasError> {
    let mut sprites = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let sheet = image::open(path)
            .map_err(|source| AtlasError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let symbols = slice_sheet(&sheet).map_err(|e| match e {
            AtlasError::Config(msg) => AtlasError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        info!("loaded {} sprites from {}", symbols.len(), path.display());
        sprites.extend(symbols);
    }
    Ok(sprites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sheet() -> RgbaImage {
        // every symbol is filled with its own index in the red channel
        RgbaImage::from_fn(SHEET_MIN_SIZE, SHEET_MIN_SIZE, |x, y| {
            let pitch = SHEET_CELL + SHEET_SPACING;
            if x % pitch == SHEET_CELL || y % pitch == SHEET_CELL {
                Rgba([0, 0, 255, 255])
            } else {
                Rgba([((y / pitch) * SHEET_GRID + x / pitch) as u8, 0, 0, 255])
            }
        })
    }

    #[test]
    fn slices_in_row_order_without_gutters() {
        let symbols = slice_sheet(&sheet()).unwrap();
        assert_eq!(symbols.len(), 256);
        for (i, s) in symbols.iter().enumerate() {
            assert_eq!(s.dimensions(), (16, 16));
            assert!(s.pixels().all(|p| p.0 == [i as u8, 0, 0, 255]));
        }
    }

    #[test]
    fn undersized_sheets_are_rejected() {
        assert!(matches!(slice_sheet(&RgbaImage::new(100, 271)), Err(AtlasError::Config(_))));
    }

    #[test]
    fn load_sheets_reads_pngs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("c64l.png");
        let b = dir.path().join("c64u.png");
        sheet().save(&a).unwrap();
        sheet().save(&b).unwrap();
        let sprites = load_sheets(&[&a, &b]).unwrap();
        assert_eq!(sprites.len(), 512);
        assert_eq!(sprites[257].get_pixel(0, 0).0, [1, 0, 0, 255]);
        assert!(matches!(
            load_sheets(&[dir.path().join("missing.png")]),
            Err(AtlasError::Image { .. })
        ));
    }
}
