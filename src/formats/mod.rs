pub mod avif;
pub mod bmp;
pub mod gif;
pub mod ico;
pub mod jpeg;
pub mod png;
pub mod psd;
pub mod svg;
pub mod tiff;
pub mod webp;

use std::fmt;
use std::str::FromStr;

use crate::stream::{ByteDemand, Exhausted};
use crate::types::SizeResult;

/// A family of decoders; each has a buffered and a streaming entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Avif,
    Bmp,
    Gif,
    Ico,
    Jpeg,
    Png,
    Psd,
    Svg,
    Tiff,
    Webp,
}

impl ImageFormat {
    /// Every format, in the order the buffered dispatcher tries them.
    pub const ALL: [ImageFormat; 10] = [
        ImageFormat::Avif,
        ImageFormat::Bmp,
        ImageFormat::Gif,
        ImageFormat::Ico,
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Psd,
        ImageFormat::Svg,
        ImageFormat::Tiff,
        ImageFormat::Webp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Avif => "avif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Gif => "gif",
            ImageFormat::Ico => "ico",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Psd => "psd",
            ImageFormat::Svg => "svg",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Webp => "webp",
        }
    }

    /// Decodes a fully buffered prefix of the file.
    pub fn parse(self, data: &[u8]) -> Option<SizeResult> {
        match self {
            ImageFormat::Avif => avif::parse(data),
            ImageFormat::Bmp => bmp::parse(data),
            ImageFormat::Gif => gif::parse(data),
            ImageFormat::Ico => ico::parse(data),
            ImageFormat::Jpeg => jpeg::parse(data),
            ImageFormat::Png => png::parse(data),
            ImageFormat::Psd => psd::parse(data),
            ImageFormat::Svg => svg::parse(data),
            ImageFormat::Tiff => tiff::parse(data),
            ImageFormat::Webp => webp::parse(data),
        }
    }

    /// Decodes from a byte feed. `Ok(None)` means the bytes are not this format;
    /// [`Exhausted`] means the feed ended before a verdict.
    pub async fn decode(self, input: &mut ByteDemand) -> Result<Option<SizeResult>, Exhausted> {
        match self {
            ImageFormat::Avif => avif::decode(input).await,
            ImageFormat::Bmp => bmp::decode(input).await,
            ImageFormat::Gif => gif::decode(input).await,
            ImageFormat::Ico => ico::decode(input).await,
            ImageFormat::Jpeg => jpeg::decode(input).await,
            ImageFormat::Png => png::decode(input).await,
            ImageFormat::Psd => psd::decode(input).await,
            ImageFormat::Svg => svg::decode(input).await,
            ImageFormat::Tiff => tiff::decode(input).await,
            ImageFormat::Webp => webp::decode(input).await,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "avif" | "heic" | "heif" => Ok(ImageFormat::Avif),
            "bmp" => Ok(ImageFormat::Bmp),
            "gif" => Ok(ImageFormat::Gif),
            "ico" => Ok(ImageFormat::Ico),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "png" => Ok(ImageFormat::Png),
            "psd" => Ok(ImageFormat::Psd),
            "svg" => Ok(ImageFormat::Svg),
            "tiff" | "tif" => Ok(ImageFormat::Tiff),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(format!("unknown image format: {other}")),
        }
    }
}
