//! ISO base media box utilities for MIAF containers (AVIF, HEIC, HEIF).
//!
//! Limits shared by the AVIF decoders:
//! - image collections are not sized separately, every `ispe` is only listed as a variant
//! - boxes with 64-bit or "until end of file" sizes are not walked
//! - only `iloc` construction method 0 (file offsets) is used to locate EXIF data

use tracing::trace;

use crate::binary::{read_sized_be, read_u8, read_u16_be, read_u32_be, tag};
use crate::types::{ImageType, Variant};

pub const FTYP: [u8; 4] = tag("ftyp");
pub const META: [u8; 4] = tag("meta");
pub const MDAT: [u8; 4] = tag("mdat");

const PITM: [u8; 4] = tag("pitm");
const IINF: [u8; 4] = tag("iinf");
const INFE: [u8; 4] = tag("infe");
const ILOC: [u8; 4] = tag("iloc");
const IPRP: [u8; 4] = tag("iprp");
const IPCO: [u8; 4] = tag("ipco");
const IPMA: [u8; 4] = tag("ipma");
const ISPE: [u8; 4] = tag("ispe");
const IROT: [u8; 4] = tag("irot");
const IMIR: [u8; 4] = tag("imir");
const EXIF_ITEM: [u8; 4] = tag("Exif");

pub const BOX_HEADER_SIZE: usize = 8;
const FULL_BOX_HEADER_SIZE: usize = 4;

const ORIENTATION_UNMIRRORED: [u8; 4] = [1, 8, 3, 6];
const ORIENTATION_MIRROR_VERTICAL_AXIS: [u8; 4] = [2, 7, 4, 5];
const ORIENTATION_MIRROR_HORIZONTAL_AXIS: [u8; 4] = [4, 5, 2, 7];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiafBox<'a> {
    pub kind: [u8; 4],
    pub payload: &'a [u8],
    pub end: usize,
}

/// Box starting at `offset`, or `None` when its header or body does not fit in `data`.
pub fn unbox(data: &[u8], offset: usize) -> Option<MiafBox<'_>> {
    let size = read_u32_be(data, offset)? as usize;
    if size < BOX_HEADER_SIZE {
        return None;
    }
    let end = offset.checked_add(size)?;
    let kind = data.get(offset + 4..offset + 8)?.try_into().ok()?;
    let payload = data.get(offset + BOX_HEADER_SIZE..end)?;
    Some(MiafBox { kind, payload, end })
}

/// Sibling boxes laid out back to back in `data`.
pub struct BoxIterator<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BoxIterator<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::starting_at(data, 0)
    }

    pub fn starting_at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }
}

impl<'a> Iterator for BoxIterator<'a> {
    type Item = MiafBox<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = unbox(self.data, self.pos)?;
        self.pos = item.end;
        Some(item)
    }
}

fn full_box_children(payload: &[u8], header: usize) -> BoxIterator<'_> {
    BoxIterator::new(payload.get(header..).unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileType {
    pub kind: ImageType,
    pub mime: &'static str,
}

impl FileType {
    const fn new(kind: ImageType, mime: &'static str) -> Self {
        Self { kind, mime }
    }
}

/// Classifies an `ftyp` payload (major brand, minor version, compatible brands).
pub fn file_type(ftyp: &[u8]) -> Option<FileType> {
    let major: [u8; 4] = ftyp.get(..4)?.try_into().ok()?;
    let compatible: Vec<[u8; 4]> = ftyp
        .get(8..)
        .unwrap_or_default()
        .chunks_exact(4)
        .filter_map(|brand| brand.try_into().ok())
        .collect();
    let has = |brand: &[u8; 4]| major == *brand || compatible.contains(brand);

    // every MIAF-derived file lists one of these structural brands
    if !has(b"mif1") && !has(b"msf1") && !has(b"miaf") {
        return None;
    }

    let file_type = match &major {
        b"avif" | b"avis" | b"avio" => FileType::new(ImageType::Avif, "image/avif"),
        b"heic" | b"heix" => FileType::new(ImageType::Heic, "image/heic"),
        b"hevc" | b"hevx" => FileType::new(ImageType::Heic, "image/heic-sequence"),
        _ if has(b"avif") || has(b"avis") => FileType::new(ImageType::Avif, "image/avif"),
        _ if [b"heic", b"heix", b"hevc", b"hevx", b"heis"]
            .into_iter()
            .any(|brand| has(brand)) =>
        {
            if has(b"msf1") {
                FileType::new(ImageType::Heif, "image/heif-sequence")
            } else {
                FileType::new(ImageType::Heif, "image/heif")
            }
        }
        _ => FileType::new(ImageType::Avif, "image/avif"),
    };
    Some(file_type)
}

/// Absolute byte range of an EXIF item inside the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExifLocation {
    pub offset: u64,
    pub length: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaSize {
    pub width: u32,
    pub height: u32,
    pub orientation: u8,
    pub variants: Vec<Variant>,
    pub exif_location: Option<ExifLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Property {
    Extent(Variant),
    Rotation(u8),
    Mirror(u8),
    Other,
}

#[derive(Debug, Default)]
struct MetaScan {
    primary_item: Option<u32>,
    exif_item: Option<u32>,
    locations: Vec<(u32, ExifLocation)>,
    properties: Vec<Property>,
    associations: Vec<(u32, Vec<u16>)>,
}

/// Interprets a `meta` box payload. `None` when no `ispe` property exists.
pub fn read_size_from_meta(meta: &[u8]) -> Option<MetaSize> {
    let mut scan = MetaScan::default();

    for child in full_box_children(meta, FULL_BOX_HEADER_SIZE) {
        match child.kind {
            PITM => scan.primary_item = read_item_id(child.payload, 4),
            // a short box keeps whatever entries were read before the cut
            IINF => {
                if scan_iinf(child.payload, &mut scan).is_none() {
                    trace!("iinf box only partly read");
                }
            }
            ILOC => {
                if scan_iloc(child.payload, &mut scan).is_none() {
                    trace!("iloc box only partly read");
                }
            }
            IPRP => scan_iprp(child.payload, &mut scan),
            _ => {}
        }
    }

    scan.resolve()
}

fn read_item_id(payload: &[u8], offset: usize) -> Option<u32> {
    match read_u8(payload, 0)? {
        0 => read_u16_be(payload, offset).map(u32::from),
        _ => read_u32_be(payload, offset),
    }
}

fn scan_iinf(payload: &[u8], scan: &mut MetaScan) -> Option<()> {
    let header = match read_u8(payload, 0)? {
        0 => FULL_BOX_HEADER_SIZE + 2,
        _ => FULL_BOX_HEADER_SIZE + 4,
    };

    for entry in full_box_children(payload, header).filter(|b| b.kind == INFE) {
        let version = read_u8(entry.payload, 0)?;
        let (item_id, type_offset) = match version {
            2 => (u32::from(read_u16_be(entry.payload, 4)?), 8),
            3 => (read_u32_be(entry.payload, 4)?, 10),
            _ => continue,
        };
        if entry.payload.get(type_offset..type_offset + 4) == Some(&EXIF_ITEM[..]) {
            scan.exif_item = Some(item_id);
        }
    }
    Some(())
}

fn scan_iloc(payload: &[u8], scan: &mut MetaScan) -> Option<()> {
    let version = read_u8(payload, 0)?;
    if version > 2 {
        return None;
    }
    let sizes = read_u8(payload, 4)?;
    let offset_size = usize::from(sizes >> 4);
    let length_size = usize::from(sizes & 0x0F);
    let packed = read_u8(payload, 5)?;
    let base_offset_size = usize::from(packed >> 4);
    let index_size = if version > 0 { usize::from(packed & 0x0F) } else { 0 };

    let mut pos = 6;
    let item_count = if version < 2 {
        pos += 2;
        u32::from(read_u16_be(payload, pos - 2)?)
    } else {
        pos += 4;
        read_u32_be(payload, pos - 4)?
    };

    for _ in 0..item_count {
        let item_id = if version < 2 {
            pos += 2;
            u32::from(read_u16_be(payload, pos - 2)?)
        } else {
            pos += 4;
            read_u32_be(payload, pos - 4)?
        };

        let mut construction_method = 0;
        if version > 0 {
            construction_method = read_u16_be(payload, pos)? & 0x0F;
            pos += 2;
        }
        // data_reference_index
        pos += 2;
        let base_offset = read_sized_be(payload, pos, base_offset_size)?;
        pos += base_offset_size;
        let extent_count = read_u16_be(payload, pos)?;
        pos += 2;

        for extent in 0..extent_count {
            pos += index_size;
            let extent_offset = read_sized_be(payload, pos, offset_size)?;
            pos += offset_size;
            let extent_length = read_sized_be(payload, pos, length_size)?;
            pos += length_size;

            if extent == 0 && construction_method == 0 {
                scan.locations.push((
                    item_id,
                    ExifLocation {
                        offset: base_offset.checked_add(extent_offset)?,
                        length: extent_length,
                    },
                ));
            }
        }
    }
    Some(())
}

fn scan_iprp(payload: &[u8], scan: &mut MetaScan) {
    for child in BoxIterator::new(payload) {
        match child.kind {
            IPCO => scan
                .properties
                .extend(BoxIterator::new(child.payload).map(read_property)),
            IPMA => {
                if scan_ipma(child.payload, scan).is_none() {
                    trace!("ipma box only partly read");
                }
            }
            _ => {}
        }
    }
}

fn read_property(item: MiafBox<'_>) -> Property {
    let property = match item.kind {
        ISPE => read_u32_be(item.payload, 4)
            .zip(read_u32_be(item.payload, 8))
            .map(|(width, height)| Property::Extent(Variant::new(width, height))),
        IROT => read_u8(item.payload, 0).map(|angle| Property::Rotation(angle & 0x03)),
        IMIR => read_u8(item.payload, 0).map(|axis| Property::Mirror(axis & 0x01)),
        _ => None,
    };
    property.unwrap_or(Property::Other)
}

fn scan_ipma(payload: &[u8], scan: &mut MetaScan) -> Option<()> {
    let version = read_u8(payload, 0)?;
    let wide_indexes = read_u8(payload, 3)? & 0x01 == 1;
    let entry_count = read_u32_be(payload, 4)?;
    let mut pos = 8;

    for _ in 0..entry_count {
        let item_id = if version < 1 {
            pos += 2;
            u32::from(read_u16_be(payload, pos - 2)?)
        } else {
            pos += 4;
            read_u32_be(payload, pos - 4)?
        };
        let association_count = read_u8(payload, pos)?;
        pos += 1;

        let mut indexes = Vec::with_capacity(usize::from(association_count));
        for _ in 0..association_count {
            // the top bit marks an essential property
            let index = if wide_indexes {
                pos += 2;
                read_u16_be(payload, pos - 2)? & 0x7FFF
            } else {
                pos += 1;
                u16::from(read_u8(payload, pos - 1)? & 0x7F)
            };
            indexes.push(index);
        }
        scan.associations.push((item_id, indexes));
    }
    Some(())
}

impl MetaScan {
    fn primary_properties(&self) -> Option<Vec<Property>> {
        let primary = self.primary_item?;
        let (_, indexes) = self.associations.iter().find(|(id, _)| *id == primary)?;
        Some(
            indexes
                .iter()
                .filter_map(|&index| self.properties.get(usize::from(index).checked_sub(1)?))
                .copied()
                .collect(),
        )
    }

    fn resolve(self) -> Option<MetaSize> {
        let variants: Vec<Variant> = self
            .properties
            .iter()
            .filter_map(|p| match p {
                Property::Extent(size) => Some(*size),
                _ => None,
            })
            .collect();
        if variants.is_empty() {
            return None;
        }

        let primary = self.primary_properties();
        let transforms = primary.as_deref().unwrap_or(self.properties.as_slice());

        let size = primary
            .as_deref()
            .and_then(|props| {
                props.iter().find_map(|p| match p {
                    Property::Extent(size) => Some(*size),
                    _ => None,
                })
            })
            .unwrap_or_else(|| largest(&variants));

        let rotation = transforms.iter().find_map(|p| match p {
            Property::Rotation(angle) => Some(*angle),
            _ => None,
        });
        let mirror = transforms.iter().find_map(|p| match p {
            Property::Mirror(axis) => Some(*axis),
            _ => None,
        });

        let exif_location = self.exif_item.and_then(|exif| {
            self.locations
                .iter()
                .find(|(id, _)| *id == exif)
                .map(|(_, location)| *location)
        });

        Some(MetaSize {
            width: size.width,
            height: size.height,
            orientation: orientation(rotation, mirror),
            variants,
            exif_location,
        })
    }
}

fn largest(variants: &[Variant]) -> Variant {
    variants
        .iter()
        .copied()
        .reduce(|a, b| {
            if a.width > b.width || (a.width == b.width && a.height > b.height) {
                a
            } else {
                b
            }
        })
        .unwrap_or(Variant::new(0, 0))
}

/// EXIF orientation equivalent to rotating by `angle` quarter turns anticlockwise
/// and then mirroring about `axis`.
fn orientation(rotation: Option<u8>, mirror: Option<u8>) -> u8 {
    if rotation.is_none() && mirror.is_none() {
        return 0;
    }
    let angle = usize::from(rotation.unwrap_or(0) & 0x03);
    match mirror {
        None => ORIENTATION_UNMIRRORED[angle],
        Some(0) => ORIENTATION_MIRROR_VERTICAL_AXIS[angle],
        Some(_) => ORIENTATION_MIRROR_HORIZONTAL_AXIS[angle],
    }
}
