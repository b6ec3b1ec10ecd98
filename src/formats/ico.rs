use crate::binary::read_u16_le;
use crate::stream::{ByteDemand, Exhausted};
use crate::types::{ImageType, SizeResult, Variant};

const HEADER_SIZE: usize = 6;
const ENTRY_SIZE: usize = 16;
const RESOURCE_ICON: u16 = 1;
const MIME: &str = "image/x-icon";

/// Number of directory entries announced by an icon header, `None` if it is not one.
fn entry_count(header: &[u8]) -> Option<usize> {
    let reserved = read_u16_le(header, 0)?;
    let resource = read_u16_le(header, 2)?;
    let count = read_u16_le(header, 4)?;
    (reserved == 0 && resource == RESOURCE_ICON && count > 0).then_some(usize::from(count))
}

/// A stored dimension of zero stands for 256.
#[inline]
fn dimension(byte: u8) -> u32 {
    if byte == 0 { 256 } else { u32::from(byte) }
}

fn size_from_directory(entries: &[u8]) -> SizeResult {
    let mut variants = Vec::with_capacity(entries.len() / ENTRY_SIZE);
    let mut largest = Variant::new(0, 0);

    for entry in entries.chunks_exact(ENTRY_SIZE) {
        let size = Variant::new(dimension(entry[0]), dimension(entry[1]));
        variants.push(size);
        if size.width > largest.width || size.height > largest.height {
            largest = size;
        }
    }

    SizeResult::pixels(largest.width, largest.height, ImageType::Ico, MIME).with_variants(variants)
}

pub fn parse(data: &[u8]) -> Option<SizeResult> {
    let count = entry_count(data)?;
    let entries = data.get(HEADER_SIZE..HEADER_SIZE + count * ENTRY_SIZE)?;
    Some(size_from_directory(entries))
}

pub async fn decode(input: &mut ByteDemand) -> Result<Option<SizeResult>, Exhausted> {
    let header = input.demand_exact(HEADER_SIZE).await?;
    let Some(count) = entry_count(&header) else {
        return Ok(None);
    };

    let entries = input.demand_exact(count * ENTRY_SIZE).await?;
    Ok(Some(size_from_directory(&entries)))
}
