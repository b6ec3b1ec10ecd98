use crate::binary::{read_u16_be, slice_eq};
use crate::exif;
use crate::stream::{ByteDemand, Exhausted};
use crate::types::{ImageType, SizeResult};

pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

const MARKER_PREFIX: u8 = 0xFF;
const MARKER_EOI: u8 = 0xD9;
const MARKER_SOS: u8 = 0xDA;
const MARKER_APP1: u8 = 0xE1;
const EXIF_SIGNATURE: &[u8; 6] = b"Exif\0\0";
const MIN_EXIF_SEGMENT: usize = 10;
const MIN_FRAME_SEGMENT: usize = 5;
const MIME: &str = "image/jpeg";

/// Whether a marker carries a length field; `None` for codes that are not markers.
#[inline]
fn has_length(marker: u8) -> Option<bool> {
    match marker {
        0xD0..=0xD9 | 0x01 => Some(false),
        0xC0..=0xFE => Some(true),
        _ => None,
    }
}

#[inline]
fn ends_header(marker: u8) -> bool {
    marker == MARKER_EOI || marker == MARKER_SOS
}

/// SOF0-SOF15 minus DHT, JPG and DAC, which share the range.
#[inline]
fn is_frame_header(marker: u8, length: usize) -> bool {
    length >= MIN_FRAME_SEGMENT
        && matches!(marker, 0xC0..=0xCF)
        && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

#[inline]
fn is_exif_candidate(marker: u8, length: usize) -> bool {
    marker == MARKER_APP1 && length >= MIN_EXIF_SEGMENT
}

/// Orientation carried by an APP1 payload, when it is an Exif block.
fn exif_orientation(segment: &[u8]) -> Option<u8> {
    if !slice_eq(segment, 0, EXIF_SIGNATURE) {
        return None;
    }
    Some(exif::orientation(&segment[EXIF_SIGNATURE.len()..]))
}

fn frame_size(segment: &[u8], orientation: u8) -> Option<SizeResult> {
    let height = read_u16_be(segment, 1)?;
    let width = read_u16_be(segment, 3)?;
    Some(
        SizeResult::pixels(width.into(), height.into(), ImageType::Jpg, MIME)
            .with_orientation(orientation),
    )
}

pub fn parse(data: &[u8]) -> Option<SizeResult> {
    if !slice_eq(data, 0, &JPEG_SOI) || data.get(2) != Some(&MARKER_PREFIX) {
        return None;
    }

    let mut pos = JPEG_SOI.len();
    let mut orientation = 0;

    loop {
        while *data.get(pos)? != MARKER_PREFIX {
            pos += 1;
        }
        while *data.get(pos)? == MARKER_PREFIX {
            pos += 1;
        }
        let marker = data[pos];
        pos += 1;

        let length = if has_length(marker)? {
            let declared = usize::from(read_u16_be(data, pos)?);
            pos += 2;
            declared.checked_sub(2)?
        } else {
            0
        };

        if ends_header(marker) {
            return None;
        }

        let end = pos.checked_add(length)?;
        if is_exif_candidate(marker, length) {
            let segment = &data[pos.min(data.len())..end.min(data.len())];
            if let Some(found) = exif_orientation(segment).filter(|&o| o > 0) {
                orientation = found;
            }
        }

        if is_frame_header(marker, length) {
            return frame_size(data.get(pos..end)?, orientation);
        }

        pos = end;
    }
}

pub async fn decode(input: &mut ByteDemand) -> Result<Option<SizeResult>, Exhausted> {
    let soi = input.demand_exact(JPEG_SOI.len()).await?;
    if soi[..] != JPEG_SOI {
        return Ok(None);
    }

    let mut orientation = 0;
    let mut first_marker = true;

    loop {
        // only the marker right after SOI is strict; later garbage is skipped
        loop {
            let byte = input.demand_exact(1).await?[0];
            if byte == MARKER_PREFIX {
                break;
            }
            if first_marker {
                return Ok(None);
            }
        }
        first_marker = false;

        let mut marker = input.demand_exact(1).await?[0];
        while marker == MARKER_PREFIX {
            marker = input.demand_exact(1).await?[0];
        }

        let length = match has_length(marker) {
            None => return Ok(None),
            Some(false) => 0,
            Some(true) => {
                let raw = input.demand_exact(2).await?;
                match usize::from(u16::from_be_bytes([raw[0], raw[1]])).checked_sub(2) {
                    Some(length) => length,
                    None => return Ok(None),
                }
            }
        };

        if ends_header(marker) {
            return Ok(None);
        }

        if is_exif_candidate(marker, length) {
            let segment = input.demand_exact(length).await?;
            if let Some(found) = exif_orientation(&segment).filter(|&o| o > 0) {
                orientation = found;
            }
            continue;
        }

        if is_frame_header(marker, length) {
            let segment = input.demand_exact(length).await?;
            return Ok(frame_size(&segment, orientation));
        }

        input.skip_exact(length as u64).await?;
    }
}
