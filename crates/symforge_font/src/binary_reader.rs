//! Big-endian readers for sfnt table data.
//!
//! Tables are parsed either sequentially through a `Cursor` or by absolute
//! offset into a table slice; both flavours return `io::Result` so that a
//! truncated table surfaces as `UnexpectedEof` instead of a panic.

use std::io::{self, Cursor, Read};

pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_i8<R: Read>(reader: &mut R) -> io::Result<i8> {
    read_u8(reader).map(|v| v as i8)
}

/// Read an unsigned 16-bit big-endian value from the cursor.
pub fn read_u16_be<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Read a signed 16-bit big-endian value.
pub fn read_i16_be<R: Read>(reader: &mut R) -> io::Result<i16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(i16::from_be_bytes(buf))
}

/// Read an unsigned 32-bit big-endian value.
pub fn read_u32_be<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read a 2.14 fixed point number (composite glyph scales).
pub fn read_f2dot14<R: Read>(reader: &mut R) -> io::Result<f32> {
    read_i16_be(reader).map(|v| v as f32 / 16384.0)
}

fn cursor_at(slice: &[u8], offset: usize) -> io::Result<Cursor<&[u8]>> {
    if offset > slice.len() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("offset {offset} past end of {}-byte table", slice.len()),
        ));
    }
    let mut cur = Cursor::new(slice);
    cur.set_position(offset as u64);
    Ok(cur)
}

pub fn u16_at(slice: &[u8], offset: usize) -> io::Result<u16> {
    read_u16_be(&mut cursor_at(slice, offset)?)
}

pub fn i16_at(slice: &[u8], offset: usize) -> io::Result<i16> {
    read_i16_be(&mut cursor_at(slice, offset)?)
}

pub fn u32_at(slice: &[u8], offset: usize) -> io::Result<u32> {
    read_u32_be(&mut cursor_at(slice, offset)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_and_absolute_reads_agree() {
        let data = [0x12, 0x34, 0x56, 0x78, 0xFF, 0xFE];
        let mut cur = Cursor::new(&data[..]);
        assert_eq!(read_u16_be(&mut cur).unwrap(), 0x1234);
        assert_eq!(read_u16_be(&mut cur).unwrap(), 0x5678);
        assert_eq!(read_i16_be(&mut cur).unwrap(), -2);
        assert_eq!(u32_at(&data, 0).unwrap(), 0x1234_5678);
        assert_eq!(i16_at(&data, 4).unwrap(), -2);
    }

    #[test]
    fn reads_past_the_end_fail() {
        let data = [0u8; 3];
        assert!(u16_at(&data, 2).is_err());
        assert!(u32_at(&data, 8).is_err());
    }

    #[test]
    fn f2dot14_scale() {
        let data = 0x4000u16.to_be_bytes();
        assert_eq!(read_f2dot14(&mut Cursor::new(&data[..])).unwrap(), 1.0);
    }
}
