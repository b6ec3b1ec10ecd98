//! RIFF/WEBP container: walks chunks until a size-bearing one (VP8, VP8L or
//! VP8X) is found, then keeps going only while an EXIF chunk may still follow.

use crate::binary::{read_u16_le, read_u24_le, read_u32_le, slice_eq, tag};
use crate::exif;
use crate::stream::{ByteDemand, Exhausted};
use crate::types::{ImageType, SizeResult};

const RIFF: [u8; 4] = tag("RIFF");
const WEBP: [u8; 4] = tag("WEBP");
const VP8: [u8; 4] = tag("VP8 ");
const VP8L: [u8; 4] = tag("VP8L");
const VP8X: [u8; 4] = tag("VP8X");
const EXIF: [u8; 4] = tag("EXIF");

const FILE_HEADER_SIZE: usize = 12;
const CHUNK_HEADER_SIZE: u64 = 8;
const VP8_KEYFRAME_START: [u8; 3] = [0x9D, 0x01, 0x2A];
const VP8L_SIGNATURE: u8 = 0x2F;
const VP8X_FLAG_EXIF: u8 = 0x08;
const MIME: &str = "image/webp";

/// Bytes of a chunk's payload needed to read its dimensions, 0 when it has none.
fn size_bytes_needed(kind: &[u8; 4], length: u32) -> usize {
    match *kind {
        VP8 if length >= 10 => 10,
        VP8L if length >= 5 => 5,
        VP8X if length >= 10 => 10,
        _ => 0,
    }
}

/// Dimensions from the head of a size-bearing chunk, plus whether an EXIF
/// chunk may still follow it.
fn chunk_size(kind: &[u8; 4], head: &[u8]) -> Option<(SizeResult, bool)> {
    let (width, height, more) = match *kind {
        VP8 => {
            if !slice_eq(head, 3, &VP8_KEYFRAME_START) {
                return None;
            }
            let width = read_u16_le(head, 6)? & 0x3FFF;
            let height = read_u16_le(head, 8)? & 0x3FFF;
            (u32::from(width), u32::from(height), false)
        }
        VP8L => {
            if head.first() != Some(&VP8L_SIGNATURE) {
                return None;
            }
            let bits = read_u32_le(head, 1)?;
            ((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1, false)
        }
        VP8X => {
            let flags = *head.first()?;
            let width = read_u24_le(head, 4)? + 1;
            let height = read_u24_le(head, 7)? + 1;
            (width, height, flags & VP8X_FLAG_EXIF != 0)
        }
        _ => return None,
    };
    Some((SizeResult::pixels(width, height, ImageType::Webp, MIME), more))
}

fn is_webp(header: &[u8]) -> bool {
    slice_eq(header, 0, &RIFF) && slice_eq(header, 8, &WEBP)
}

/// Declared end of the RIFF payload, counted from the start of the file.
fn declared_end(header: &[u8]) -> Option<u64> {
    read_u32_le(header, 4).map(|len| u64::from(len) + CHUNK_HEADER_SIZE)
}

#[derive(Debug, Default)]
struct Walk {
    found: Option<SizeResult>,
    orientation: u8,
}

impl Walk {
    fn finish(self) -> Option<SizeResult> {
        let orientation = self.orientation;
        self.found.map(|result| result.with_orientation(orientation))
    }
}

pub fn parse(data: &[u8]) -> Option<SizeResult> {
    if !is_webp(data) {
        return None;
    }
    let file_end = declared_end(data)?;

    let mut walk = Walk::default();
    let mut offset = FILE_HEADER_SIZE;

    while (offset as u64) + CHUNK_HEADER_SIZE < file_end {
        let Some(&first) = data.get(offset) else {
            break;
        };
        if first == 0 {
            // padding after an odd-sized chunk
            offset += 1;
            continue;
        }

        let kind = data
            .get(offset..offset + 4)
            .and_then(|k| <[u8; 4]>::try_from(k).ok());
        let Some(kind) = kind else {
            break;
        };
        let Some(length) = read_u32_le(data, offset + 4) else {
            break;
        };

        let payload_start = offset + CHUNK_HEADER_SIZE as usize;
        let payload_end = payload_start as u64 + u64::from(length);
        if payload_end > file_end {
            break;
        }
        let Ok(payload_end) = usize::try_from(payload_end) else {
            break;
        };
        let payload = &data[payload_start.min(data.len())..payload_end.min(data.len())];

        if kind == EXIF {
            walk.orientation = exif::orientation(payload);
            break;
        }

        if walk.found.is_none() && size_bytes_needed(&kind, length) > 0 {
            if let Some((result, more)) = chunk_size(&kind, payload) {
                walk.found = Some(result);
                if !more {
                    break;
                }
            }
        }

        offset = payload_end;
    }

    walk.finish()
}

pub async fn decode(input: &mut ByteDemand) -> Result<Option<SizeResult>, Exhausted> {
    let header = input.demand_exact(FILE_HEADER_SIZE).await?;
    if !is_webp(&header) {
        return Ok(None);
    }
    let Some(file_end) = declared_end(&header) else {
        return Ok(None);
    };

    let mut walk = Walk::default();
    match walk_chunks(input, file_end, &mut walk).await {
        // a truncated file still reports a size found before the cut
        Ok(()) | Err(Exhausted) => Ok(walk.finish()),
    }
}

async fn walk_chunks(
    input: &mut ByteDemand,
    file_end: u64,
    walk: &mut Walk,
) -> Result<(), Exhausted> {
    while input.position() + CHUNK_HEADER_SIZE < file_end {
        let first = input.demand_exact(1).await?[0];
        if first == 0 {
            continue;
        }

        let rest = input.demand_exact(7).await?;
        let kind = [first, rest[0], rest[1], rest[2]];
        let length = u32::from_le_bytes([rest[3], rest[4], rest[5], rest[6]]);

        let payload_end = input.position() + u64::from(length);
        if payload_end > file_end {
            return Ok(());
        }

        if kind == EXIF {
            let payload = input.demand_exact(length as usize).await?;
            walk.orientation = exif::orientation(&payload);
            return Ok(());
        }

        let needed = size_bytes_needed(&kind, length);
        if walk.found.is_none() && needed > 0 {
            let head = input.demand_exact(needed).await?;
            if let Some((result, more)) = chunk_size(&kind, &head) {
                walk.found = Some(result);
                if !more {
                    return Ok(());
                }
            }
        }

        input.skip_exact(payload_end - input.position()).await?;
    }
    Ok(())
}
