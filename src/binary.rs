//! Bounds-checked fixed-width reads shared by every decoder.
//!
//! Each read returns `None` when the field does not fit in the buffer, so a
//! short buffer turns into "not recognized" instead of a panic.

#[inline]
fn field<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    data.get(offset..end)?.try_into().ok()
}

#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied()
}

#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    field(data, offset).map(u16::from_le_bytes)
}

#[inline]
pub fn read_u16_be(data: &[u8], offset: usize) -> Option<u16> {
    field(data, offset).map(u16::from_be_bytes)
}

#[inline]
pub fn read_u24_le(data: &[u8], offset: usize) -> Option<u32> {
    field::<3>(data, offset).map(|b| u32::from_le_bytes([b[0], b[1], b[2], 0]))
}

#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    field(data, offset).map(u32::from_le_bytes)
}

#[inline]
pub fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    field(data, offset).map(u32::from_be_bytes)
}

#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> Option<i32> {
    field(data, offset).map(i32::from_le_bytes)
}

#[inline]
pub fn read_u64_be(data: &[u8], offset: usize) -> Option<u64> {
    field(data, offset).map(u64::from_be_bytes)
}

/// Big-endian unsigned integer of 0, 4 or 8 bytes, as used by `iloc` field sizes.
pub fn read_sized_be(data: &[u8], offset: usize, size: usize) -> Option<u64> {
    match size {
        0 => Some(0),
        4 => read_u32_be(data, offset).map(u64::from),
        8 => read_u64_be(data, offset),
        _ => None,
    }
}

/// True when `pattern` occurs in `data` starting at `start`.
#[inline]
pub fn slice_eq(data: &[u8], start: usize, pattern: &[u8]) -> bool {
    start
        .checked_add(pattern.len())
        .and_then(|end| data.get(start..end))
        .is_some_and(|window| window == pattern)
}

/// Four-character code from an ASCII literal.
pub const fn tag(name: &str) -> [u8; 4] {
    let bytes = name.as_bytes();
    assert!(bytes.len() == 4, "four-character codes are four bytes");
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order announced by a TIFF-style `II`/`MM` marker.
    pub fn from_marker(data: &[u8]) -> Option<Endian> {
        match data.get(..2)? {
            b"II" => Some(Endian::Little),
            b"MM" => Some(Endian::Big),
            _ => None,
        }
    }

    #[inline]
    pub fn read_u16(self, data: &[u8], offset: usize) -> Option<u16> {
        match self {
            Endian::Little => read_u16_le(data, offset),
            Endian::Big => read_u16_be(data, offset),
        }
    }

    #[inline]
    pub fn read_u32(self, data: &[u8], offset: usize) -> Option<u32> {
        match self {
            Endian::Little => read_u32_le(data, offset),
            Endian::Big => read_u32_be(data, offset),
        }
    }
}
