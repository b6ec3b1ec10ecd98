use crate::binary::read_u16_le;
use crate::stream::{ByteDemand, Exhausted};
use crate::types::{ImageType, SizeResult};

const GIF87A: &[u8; 6] = b"GIF87a";
const GIF89A: &[u8; 6] = b"GIF89a";
const HEADER_SIZE: usize = 10;
const MIME: &str = "image/gif";

fn size_from_header(data: &[u8]) -> Option<SizeResult> {
    let signature = data.get(..6)?;
    if signature != GIF87A && signature != GIF89A {
        return None;
    }

    let width = read_u16_le(data, 6)?;
    let height = read_u16_le(data, 8)?;
    Some(SizeResult::pixels(width.into(), height.into(), ImageType::Gif, MIME))
}

pub fn parse(data: &[u8]) -> Option<SizeResult> {
    size_from_header(data)
}

pub async fn decode(input: &mut ByteDemand) -> Result<Option<SizeResult>, Exhausted> {
    let header = input.demand_exact(HEADER_SIZE).await?;
    Ok(size_from_header(&header))
}
