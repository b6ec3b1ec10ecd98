use crate::binary::{Endian, slice_eq};
use crate::stream::{ByteDemand, Exhausted};
use crate::types::{ImageType, SizeResult};

const SIG_LITTLE: &[u8; 4] = b"II\x2A\0";
const SIG_BIG: &[u8; 4] = b"MM\0\x2A";
const HEADER_SIZE: usize = 8;
const ENTRY_SIZE: usize = 12;

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const MIME: &str = "image/tiff";

/// Byte order and IFD0 offset from the 8-byte header.
fn read_header(data: &[u8]) -> Option<(Endian, u32)> {
    if !slice_eq(data, 0, SIG_LITTLE) && !slice_eq(data, 0, SIG_BIG) {
        return None;
    }
    let endian = Endian::from_marker(data)?;
    let ifd = endian.read_u32(data, 4)?;
    (ifd as usize >= HEADER_SIZE).then_some((endian, ifd))
}

/// Single inline SHORT or LONG value; anything else is not supported.
fn ifd_value(entry: &[u8], endian: Endian) -> Option<u32> {
    let kind = endian.read_u16(entry, 2)?;
    if endian.read_u32(entry, 4)? != 1 {
        return None;
    }
    match kind {
        TYPE_SHORT => endian.read_u16(entry, 8).map(u32::from),
        TYPE_LONG => endian.read_u32(entry, 8),
        _ => None,
    }
}

fn size_from_entries(entries: &[u8], endian: Endian) -> Option<SizeResult> {
    let mut width = None;
    let mut height = None;

    for entry in entries.chunks_exact(ENTRY_SIZE) {
        match endian.read_u16(entry, 0) {
            Some(TAG_IMAGE_WIDTH) => width = ifd_value(entry, endian),
            Some(TAG_IMAGE_LENGTH) => height = ifd_value(entry, endian),
            _ => {}
        }
    }

    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => {
            Some(SizeResult::pixels(w, h, ImageType::Tiff, MIME))
        }
        _ => None,
    }
}

pub fn parse(data: &[u8]) -> Option<SizeResult> {
    let (endian, ifd) = read_header(data)?;
    let ifd = ifd as usize;
    let count = usize::from(endian.read_u16(data, ifd)?);
    if count == 0 {
        return None;
    }

    let start = ifd + 2;
    let entries = data.get(start..start.checked_add(count * ENTRY_SIZE)?)?;
    size_from_entries(entries, endian)
}

pub async fn decode(input: &mut ByteDemand) -> Result<Option<SizeResult>, Exhausted> {
    let header = input.demand_exact(HEADER_SIZE).await?;
    let Some((endian, ifd)) = read_header(&header) else {
        return Ok(None);
    };

    input.skip_exact(u64::from(ifd) - HEADER_SIZE as u64).await?;

    let raw_count = input.demand_exact(2).await?;
    let count = endian.read_u16(&raw_count, 0).map_or(0, usize::from);
    if count == 0 {
        return Ok(None);
    }

    let entries = input.demand_exact(count * ENTRY_SIZE).await?;
    Ok(size_from_entries(&entries, endian))
}
