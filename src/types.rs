use serde::Serialize;
use std::fmt;

/// Type tag reported for a recognized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Avif,
    Bmp,
    Gif,
    Heic,
    Heif,
    Ico,
    Jpg,
    Png,
    Psd,
    Svg,
    Tiff,
    Webp,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Avif => "avif",
            ImageType::Bmp => "bmp",
            ImageType::Gif => "gif",
            ImageType::Heic => "heic",
            ImageType::Heif => "heif",
            ImageType::Ico => "ico",
            ImageType::Jpg => "jpg",
            ImageType::Png => "png",
            ImageType::Psd => "psd",
            ImageType::Svg => "svg",
            ImageType::Tiff => "tiff",
            ImageType::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical unit of a reported dimension. Only SVG reports anything but pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Px,
    In,
    Mm,
    Cm,
    Pt,
    Pc,
    Em,
    Ex,
}

impl Unit {
    const SUFFIXES: [(&'static str, Unit); 8] = [
        ("in", Unit::In),
        ("mm", Unit::Mm),
        ("cm", Unit::Cm),
        ("pt", Unit::Pt),
        ("pc", Unit::Pc),
        ("px", Unit::Px),
        ("em", Unit::Em),
        ("ex", Unit::Ex),
    ];

    /// Unit named by the trailing two characters of a length, `px` when none matches.
    pub fn from_suffix(value: &str) -> Unit {
        Self::SUFFIXES
            .iter()
            .find(|(suffix, _)| value.ends_with(suffix))
            .map(|&(_, unit)| unit)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Px => "px",
            Unit::In => "in",
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::Pt => "pt",
            Unit::Pc => "pc",
            Unit::Em => "em",
            Unit::Ex => "ex",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Variant {
    pub width: u32,
    pub height: u32,
}

impl Variant {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeResult {
    pub width: f64,
    pub height: f64,
    #[serde(rename = "type")]
    pub kind: ImageType,
    pub mime: &'static str,
    #[serde(rename = "wUnits")]
    pub w_units: Unit,
    #[serde(rename = "hUnits")]
    pub h_units: Unit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<Variant>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SizeResult {
    /// Pixel-unit result, the shape every raster format reports.
    pub fn pixels(width: u32, height: u32, kind: ImageType, mime: &'static str) -> Self {
        Self::new(f64::from(width), f64::from(height), kind, mime, Unit::Px, Unit::Px)
    }

    pub fn new(
        width: f64,
        height: f64,
        kind: ImageType,
        mime: &'static str,
        w_units: Unit,
        h_units: Unit,
    ) -> Self {
        Self {
            width,
            height,
            kind,
            mime,
            w_units,
            h_units,
            orientation: None,
            variants: None,
            length: None,
            url: None,
        }
    }

    /// Records an EXIF orientation; zero means "none found" and is dropped.
    pub fn with_orientation(mut self, orientation: u8) -> Self {
        if orientation > 0 {
            self.orientation = Some(orientation);
        }
        self
    }

    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        self.variants = Some(variants);
        self
    }

    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Decorates a stream result with what a transport learned from its response:
    /// the declared content length (only when purely numeric) and the final URL.
    pub fn annotate_response(self, content_length: Option<&str>, final_url: &str) -> Self {
        let annotated = match content_length.and_then(parse_content_length) {
            Some(length) => self.with_length(length),
            None => self,
        };
        annotated.with_url(final_url)
    }
}

pub fn parse_content_length(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
