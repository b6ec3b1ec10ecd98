//! SVG sizing from the attributes of the root element.
//!
//! Only the first tag is inspected. Anything other than `<svg ...>` (optionally
//! namespaced) fails the format, so SVG embedded in HTML is not picked up.

use aho_corasick::AhoCorasick;
use memchr::memchr;
use std::sync::LazyLock;

use crate::stream::{ByteDemand, Exhausted};
use crate::types::{ImageType, SizeResult, Unit};

/// Prelude (comments, doctype) plus the root tag must fit in this many bytes.
pub const MAX_HEAD_SIZE: usize = 65_536;

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const MIME: &str = "image/svg+xml";

const ATTR_WIDTH: usize = 0;
const ATTR_HEIGHT: usize = 1;

static ATTRIBUTES: LazyLock<Option<AhoCorasick>> =
    LazyLock::new(|| AhoCorasick::new(["width", "height", "viewBox", "viewbox"]).ok());

#[inline]
fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

#[inline]
fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b':')
}

#[inline]
fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

enum Lead {
    NeedMore,
    Markup(usize),
    NotMarkup,
}

/// Position of the first `<` after an optional BOM and whitespace.
fn leading(data: &[u8]) -> Lead {
    if data.len() < BOM.len() && BOM.starts_with(data) {
        return Lead::NeedMore;
    }
    let mut i = if data.starts_with(&BOM) { BOM.len() } else { 0 };
    while i < data.len() && is_space(data[i]) {
        i += 1;
    }
    match data.get(i) {
        None => Lead::NeedMore,
        Some(b'<') => Lead::Markup(i),
        Some(_) => Lead::NotMarkup,
    }
}

/// First complete element tag, skipping `<?`, `<!` and other non-name openers.
fn first_tag(data: &[u8]) -> Option<&[u8]> {
    let mut from = 0;
    while let Some(rel) = memchr(b'<', &data[from..]) {
        let start = from + rel;
        match data.get(start + 1) {
            Some(&byte) if is_name_byte(byte) => {
                let end = memchr(b'>', &data[start..])?;
                return Some(&data[start..=start + end]);
            }
            Some(_) => from = start + 1,
            None => return None,
        }
    }
    None
}

/// `<svg` or `<prefix:svg` followed by whitespace.
fn is_svg_root(tag: &[u8]) -> bool {
    let name_len = tag[1..].iter().take_while(|&&b| is_name_byte(b)).count();
    let name = &tag[1..1 + name_len];
    let named_svg = name == b"svg" || (name.len() > 4 && name.ends_with(b":svg"));
    named_svg && tag.get(1 + name_len).is_some_and(|&b| b.is_ascii_whitespace())
}

#[derive(Debug, Default)]
struct Attributes<'a> {
    width: Option<&'a str>,
    height: Option<&'a str>,
    view_box: Option<&'a str>,
}

/// Quoted value right after `name=`, up to the matching quote.
fn quoted_value(tag: &[u8], name_end: usize) -> Option<&[u8]> {
    if tag.get(name_end) != Some(&b'=') {
        return None;
    }
    let quote = *tag.get(name_end + 1)?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let start = name_end + 2;
    let len = memchr(quote, tag.get(start..)?)?;
    Some(&tag[start..start + len])
}

fn attributes(tag: &[u8]) -> Attributes<'_> {
    let mut attrs = Attributes::default();
    let Some(matcher) = ATTRIBUTES.as_ref() else {
        return attrs;
    };

    for found in matcher.find_iter(tag) {
        let before = found.start().checked_sub(1).map(|i| tag[i]);
        if before.is_none_or(|b| is_word_byte(b) || b == b'-') {
            continue;
        }
        let Some(value) = quoted_value(tag, found.end()) else {
            continue;
        };
        let Ok(value) = std::str::from_utf8(value) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        let slot = match found.pattern().as_usize() {
            ATTR_WIDTH | ATTR_HEIGHT if value.contains('%') => continue,
            ATTR_WIDTH => &mut attrs.width,
            ATTR_HEIGHT => &mut attrs.height,
            _ => &mut attrs.view_box,
        };
        slot.get_or_insert(value);
    }
    attrs
}

/// Leading decimal number of `value`, ignoring whatever trails it (`"12.5mm"` is 12.5).
fn parse_number(value: &str) -> Option<f64> {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |at: usize| {
        bytes[at.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let integer = digits_from(end);
    end += integer;

    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if integer > 0 || fraction > 0 {
            end += 1 + fraction;
        }
    }
    if integer == 0 && fraction == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let digits = digits_from(exp);
        if digits > 0 {
            end = exp + digits;
        }
    }

    s[..end].parse().ok()
}

#[inline]
fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn positive_number(value: &str) -> Option<f64> {
    parse_number(value).filter(|&v| positive(v))
}

fn svg_size(width: f64, height: f64, w_units: Unit, h_units: Unit) -> SizeResult {
    SizeResult::new(width, height, ImageType::Svg, MIME, w_units, h_units)
}

fn size_from_tag(tag: &[u8]) -> Option<SizeResult> {
    if !is_svg_root(tag) {
        return None;
    }
    let attrs = attributes(tag);

    if let (Some(w), Some(h)) = (attrs.width, attrs.height) {
        return Some(svg_size(
            positive_number(w)?,
            positive_number(h)?,
            Unit::from_suffix(w),
            Unit::from_suffix(h),
        ));
    }

    let view_box: Vec<&str> = attrs
        .view_box?
        .split(|c: char| c.is_ascii_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .collect();
    let (vb_w, vb_h) = (*view_box.get(2)?, *view_box.get(3)?);
    let (vb_width, vb_height) = (positive_number(vb_w)?, positive_number(vb_h)?);
    let unit = Unit::from_suffix(vb_w);
    if unit != Unit::from_suffix(vb_h) {
        return None;
    }
    let ratio = vb_width / vb_height;

    if let Some(w) = attrs.width {
        let width = positive_number(w)?;
        let unit = Unit::from_suffix(w);
        return Some(svg_size(width, width / ratio, unit, unit));
    }
    if let Some(h) = attrs.height {
        let height = positive_number(h)?;
        let unit = Unit::from_suffix(h);
        return Some(svg_size(height * ratio, height, unit, unit));
    }
    Some(svg_size(vb_width, vb_height, unit, unit))
}

pub fn parse(data: &[u8]) -> Option<SizeResult> {
    let Lead::Markup(start) = leading(data) else {
        return None;
    };
    size_from_tag(first_tag(&data[start..])?)
}

pub async fn decode(input: &mut ByteDemand) -> Result<Option<SizeResult>, Exhausted> {
    let mut head = Vec::new();
    let mut markup = None;

    while head.len() <= MAX_HEAD_SIZE {
        let chunk = input.demand_any(MAX_HEAD_SIZE + 1 - head.len()).await?;
        head.extend_from_slice(&chunk);

        let start = match markup {
            Some(start) => start,
            None => match leading(&head) {
                Lead::NeedMore => continue,
                Lead::NotMarkup => return Ok(None),
                Lead::Markup(start) => *markup.insert(start),
            },
        };

        if let Some(tag) = first_tag(&head[start..]) {
            return Ok(size_from_tag(tag));
        }
    }
    Ok(None)
}
