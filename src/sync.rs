use tracing::trace;

use crate::formats::ImageFormat;
use crate::types::SizeResult;

/// Size of the image whose leading bytes are `data`, trying every format in turn.
///
/// `data` may be a prefix of the file; decoders that need more than it holds
/// simply fail.
pub fn probe_buffer(data: &[u8]) -> Option<SizeResult> {
    probe_buffer_with(data, &ImageFormat::ALL)
}

pub fn probe_buffer_with(data: &[u8], formats: &[ImageFormat]) -> Option<SizeResult> {
    let found = formats
        .iter()
        .find_map(|format| format.parse(data).map(|result| (format, result)));

    match found {
        Some((format, result)) => {
            trace!(%format, len = data.len(), "buffer recognized");
            Some(result)
        }
        None => {
            trace!(len = data.len(), "buffer not recognized");
            None
        }
    }
}
