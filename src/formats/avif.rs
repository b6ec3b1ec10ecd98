//! MIAF-based images (AVIF, HEIC, HEIF).
//!
//! The `meta` box has to come before `mdat`; files that store their metadata
//! after the image data are not recognized. Only the primary item's size is
//! authoritative, other extents are reported as variants.

use crate::binary::{read_u32_be, slice_eq};
use crate::exif;
use crate::miaf::{
    self, BOX_HEADER_SIZE, BoxIterator, ExifLocation, FTYP, FileType, MDAT, META, MetaSize,
};
use crate::stream::{ByteDemand, Exhausted};
use crate::types::SizeResult;

/// Payload length of a box from its 8-byte header, `None` when the size is too small.
fn body_length(header: &[u8]) -> Option<usize> {
    usize::try_from(read_u32_be(header, 0)?)
        .ok()?
        .checked_sub(BOX_HEADER_SIZE)
}

fn size_result(size: &MetaSize, file_type: FileType) -> SizeResult {
    let result = SizeResult::pixels(size.width, size.height, file_type.kind, file_type.mime)
        .with_orientation(size.orientation);
    if size.variants.len() > 1 {
        result.with_variants(size.variants.clone())
    } else {
        result
    }
}

/// TIFF data of an EXIF item that lies entirely inside `data`.
fn exif_payload(data: &[u8], location: ExifLocation) -> Option<&[u8]> {
    let start = usize::try_from(location.offset).ok()?;
    let end = start.checked_add(usize::try_from(location.length).ok()?)?;
    let item = data.get(start..end)?;
    let tiff_offset = usize::try_from(read_u32_be(item, 0)?).ok()?;
    Some(item.get(tiff_offset.checked_add(4)?..).unwrap_or_default())
}

pub fn parse(data: &[u8]) -> Option<SizeResult> {
    if !slice_eq(data, 4, &FTYP) {
        return None;
    }
    let ftyp = miaf::unbox(data, 0)?;
    let file_type = miaf::file_type(ftyp.payload)?;

    let meta = BoxIterator::starting_at(data, ftyp.end)
        .take_while(|item| item.kind != MDAT)
        .find(|item| item.kind == META && !item.payload.is_empty())?;

    let size = miaf::read_size_from_meta(meta.payload)?;
    let mut result = size_result(&size, file_type);

    if let Some(tiff) = size.exif_location.and_then(|location| exif_payload(data, location)) {
        result = result.with_orientation(exif::orientation(tiff));
    }
    Some(result)
}

pub async fn decode(input: &mut ByteDemand) -> Result<Option<SizeResult>, Exhausted> {
    let header = input.demand_exact(BOX_HEADER_SIZE).await?;
    if !slice_eq(&header, 4, &FTYP) {
        return Ok(None);
    }
    let Some(length) = body_length(&header).filter(|&len| len > 0) else {
        return Ok(None);
    };
    let ftyp = input.demand_exact(length).await?;
    let Some(file_type) = miaf::file_type(&ftyp) else {
        return Ok(None);
    };

    loop {
        let header = input.demand_exact(BOX_HEADER_SIZE).await?;
        if header[4..8] == MDAT {
            return Ok(None);
        }
        let Some(length) = body_length(&header) else {
            return Ok(None);
        };

        if header[4..8] == META && length > 0 {
            let meta = input.demand_exact(length).await?;
            let Some(size) = miaf::read_size_from_meta(&meta) else {
                return Ok(None);
            };

            let mut result = size_result(&size, file_type);
            if let Some(location) = size.exif_location {
                // an unreadable EXIF item leaves the size intact
                let orientation = read_exif_orientation(input, location).await.unwrap_or(0);
                result = result.with_orientation(orientation);
            }
            return Ok(Some(result));
        }

        input.skip_exact(length as u64).await?;
    }
}

async fn read_exif_orientation(
    input: &mut ByteDemand,
    location: ExifLocation,
) -> Result<u8, Exhausted> {
    if location.offset <= input.position() {
        return Ok(0);
    }
    input.skip_exact(location.offset - input.position()).await?;

    let raw = input.demand_exact(4).await?;
    let tiff_offset = u64::from(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]));
    let Some(count) = location
        .length
        .checked_sub(tiff_offset + 4)
        .filter(|&count| count > 0)
        .and_then(|count| usize::try_from(count).ok())
    else {
        return Ok(0);
    };

    input.skip_exact(tiff_offset).await?;
    let tiff = input.demand_exact(count).await?;
    Ok(exif::orientation(&tiff))
}
