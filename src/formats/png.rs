use crate::binary::{read_u32_be, slice_eq};
use crate::stream::{ByteDemand, Exhausted};
use crate::types::{ImageType, SizeResult};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const IHDR_CHUNK_TYPE: &[u8; 4] = b"IHDR";

/// Signature, IHDR length and type, then width and height.
const HEADER_SIZE: usize = 24;
const MIME: &str = "image/png";

#[inline]
fn size_from_header(data: &[u8]) -> Option<SizeResult> {
    if !slice_eq(data, 0, &PNG_SIGNATURE) || !slice_eq(data, 12, IHDR_CHUNK_TYPE) {
        return None;
    }

    let width = read_u32_be(data, 16)?;
    let height = read_u32_be(data, 20)?;
    Some(SizeResult::pixels(width, height, ImageType::Png, MIME))
}

pub fn parse(data: &[u8]) -> Option<SizeResult> {
    size_from_header(data)
}

pub async fn decode(input: &mut ByteDemand) -> Result<Option<SizeResult>, Exhausted> {
    let header = input.demand_exact(HEADER_SIZE).await?;
    Ok(size_from_header(&header))
}
