use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{Level, warn};

use imgprobe::config::DEFAULT_READ_CHUNK_SIZE;
use imgprobe::{ImageFormat, SizeResult};

#[derive(Parser)]
#[command(name = "imgprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Report image dimensions read from file headers", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Read files incrementally instead of mapping them
    #[arg(short, long)]
    pub stream: bool,

    /// Print one JSON object per file
    #[arg(long)]
    pub json: bool,

    #[arg(short = 't', long, value_delimiter = ',')]
    pub types: Option<Vec<String>>,

    /// Bytes per read in stream mode
    #[arg(short, long, default_value_t = DEFAULT_READ_CHUNK_SIZE)]
    pub chunk_size: usize,

    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn init_tracing(verbose: bool, debug: bool) {
    let level = if debug {
        Level::TRACE
    } else if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Formats named on the command line; every format when none are given.
pub fn parse_formats(types: Option<Vec<String>>) -> Vec<ImageFormat> {
    match types {
        None => ImageFormat::ALL.to_vec(),
        Some(names) => names
            .iter()
            .filter_map(|name| match name.parse::<ImageFormat>() {
                Ok(format) => Some(format),
                Err(err) => {
                    warn!("{err}");
                    None
                }
            })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SizeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn new(path: &Path, outcome: anyhow::Result<SizeResult>) -> Self {
        let path = path.display().to_string();
        match outcome {
            Ok(result) => Self {
                path,
                result: Some(result),
                error: None,
            },
            Err(err) => Self {
                path,
                result: None,
                error: Some(format!("{err:#}")),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_some()
    }

    pub fn print(&self, json: bool) -> anyhow::Result<()> {
        if json {
            println!("{}", serde_json::to_string(self)?);
            return Ok(());
        }

        match (&self.result, &self.error) {
            (Some(result), _) => println!("{}: {}", self.path, describe(result)),
            (None, Some(err)) => println!("{}: {}", self.path, err),
            (None, None) => println!("{}: unrecognized", self.path),
        }
        Ok(())
    }
}

fn describe(result: &SizeResult) -> String {
    let mut line = format!(
        "{}{} x {}{} {} ({})",
        result.width, result.w_units, result.height, result.h_units, result.kind, result.mime
    );
    if let Some(orientation) = result.orientation {
        line.push_str(&format!(", orientation {orientation}"));
    }
    if let Some(variants) = &result.variants {
        line.push_str(&format!(", {} variants", variants.len()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgprobe::ImageType;

    #[test]
    fn test_parse_formats_skips_unknown() {
        let formats = parse_formats(Some(vec!["png".into(), "exr".into(), "JPG".into()]));
        assert_eq!(formats, vec![ImageFormat::Png, ImageFormat::Jpeg]);
        assert_eq!(parse_formats(None).len(), ImageFormat::ALL.len());
    }

    #[test]
    fn test_describe() {
        let result = SizeResult::pixels(640, 480, ImageType::Png, "image/png").with_orientation(6);
        assert_eq!(describe(&result), "640px x 480px png (image/png), orientation 6");
    }
}
