use crate::binary::{read_u32_be, slice_eq};
use crate::stream::{ByteDemand, Exhausted};
use crate::types::{ImageType, SizeResult};

const SIGNATURE: &[u8; 6] = b"8BPS\x00\x01";
/// Signature, reserved bytes and channel count, then height and width.
const HEADER_SIZE: usize = 22;
const MIME: &str = "image/vnd.adobe.photoshop";

fn size_from_header(data: &[u8]) -> Option<SizeResult> {
    if !slice_eq(data, 0, SIGNATURE) {
        return None;
    }

    let height = read_u32_be(data, 14)?;
    let width = read_u32_be(data, 18)?;
    Some(SizeResult::pixels(width, height, ImageType::Psd, MIME))
}

pub fn parse(data: &[u8]) -> Option<SizeResult> {
    size_from_header(data)
}

pub async fn decode(input: &mut ByteDemand) -> Result<Option<SizeResult>, Exhausted> {
    let signature = input.demand_exact(SIGNATURE.len()).await?;
    if signature[..] != SIGNATURE[..] {
        return Ok(None);
    }

    let rest = input.demand_exact(HEADER_SIZE - SIGNATURE.len()).await?;
    let mut header = signature.to_vec();
    header.extend_from_slice(&rest);
    Ok(size_from_header(&header))
}
