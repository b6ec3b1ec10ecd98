pub mod binary;
pub mod config;
pub mod error;
pub mod exif;
pub mod formats;
pub mod miaf;
pub mod stream;
pub mod sync;
pub mod types;

pub use config::ProbeConfig;
pub use error::ProbeError;
pub use formats::ImageFormat;
pub use stream::{ByteDemand, Exhausted, probe_stream, probe_stream_with};
pub use sync::{probe_buffer, probe_buffer_with};
pub use types::{ImageType, SizeResult, Unit, Variant, parse_content_length};
