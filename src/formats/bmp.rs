use crate::binary::{read_i32_le, read_u16_le, read_u32_le, slice_eq};
use crate::stream::{ByteDemand, Exhausted};
use crate::types::{ImageType, SizeResult};

const SIGNATURE: &[u8; 2] = b"BM";
/// File header (14) plus enough of the DIB header to hold both dimensions.
const HEADER_SIZE: usize = 26;
const CORE_HEADER_SIZE: u32 = 12;
const MIME: &str = "image/bmp";

fn size_from_header(data: &[u8]) -> Option<SizeResult> {
    if !slice_eq(data, 0, SIGNATURE) {
        return None;
    }

    let (width, height) = if read_u32_le(data, 14)? == CORE_HEADER_SIZE {
        (u32::from(read_u16_le(data, 18)?), u32::from(read_u16_le(data, 20)?))
    } else {
        // negative height marks a top-down bitmap
        (
            read_i32_le(data, 18)?.unsigned_abs(),
            read_i32_le(data, 22)?.unsigned_abs(),
        )
    };
    Some(SizeResult::pixels(width, height, ImageType::Bmp, MIME))
}

pub fn parse(data: &[u8]) -> Option<SizeResult> {
    size_from_header(data)
}

pub async fn decode(input: &mut ByteDemand) -> Result<Option<SizeResult>, Exhausted> {
    let header = input.demand_exact(HEADER_SIZE).await?;
    Ok(size_from_header(&header))
}
