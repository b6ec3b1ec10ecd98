//! EXIF orientation lookup over a TIFF-structured buffer.
//!
//! Only IFD0 is walked; that is where the orientation tag lives. Any structural
//! inconsistency yields 0 rather than an error.

use crate::binary::Endian;

const TAG_ORIENTATION: u16 = 0x0112;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TIFF_MAGIC: u16 = 42;
const ENTRY_SIZE: usize = 12;

/// Orientation code 1-8 found in IFD0 of `data`, or 0 when absent or unparseable.
pub fn orientation(data: &[u8]) -> u8 {
    read_orientation(data)
        .filter(|value| (1..=8).contains(value))
        .and_then(|value| u8::try_from(value).ok())
        .unwrap_or(0)
}

fn read_orientation(data: &[u8]) -> Option<u32> {
    let endian = Endian::from_marker(data)?;
    if endian.read_u16(data, 2)? != TIFF_MAGIC {
        return None;
    }

    let ifd = endian.read_u32(data, 4)? as usize;
    let count = endian.read_u16(data, ifd)? as usize;
    let entries = ifd.checked_add(2)?;
    if entries.checked_add(count * ENTRY_SIZE)? > data.len() {
        return None;
    }

    (0..count)
        .map(|i| entries + i * ENTRY_SIZE)
        .find(|&entry| endian.read_u16(data, entry) == Some(TAG_ORIENTATION))
        .and_then(|entry| inline_value(data, entry, endian))
}

fn inline_value(data: &[u8], entry: usize, endian: Endian) -> Option<u32> {
    let kind = endian.read_u16(data, entry + 2)?;
    let count = endian.read_u32(data, entry + 4)?;
    if count == 0 {
        return None;
    }

    match kind {
        TYPE_SHORT => endian.read_u16(data, entry + 8).map(u32::from),
        TYPE_LONG if count == 1 => endian.read_u32(data, entry + 8),
        _ => None,
    }
}
