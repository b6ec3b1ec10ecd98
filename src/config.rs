use crate::formats::ImageFormat;

pub const DEFAULT_READ_CHUNK_SIZE: usize = 16 * 1024;

/// Tuning for the streaming probe.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    read_chunk_size: usize,
    formats: Vec<ImageFormat>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            formats: ImageFormat::ALL.to_vec(),
        }
    }
}

impl ProbeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upper bound on a single read from the source.
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Restricts the race to `formats`, keeping their first-seen order.
    pub fn with_formats(mut self, formats: impl IntoIterator<Item = ImageFormat>) -> Self {
        self.formats.clear();
        for format in formats {
            if !self.formats.contains(&format) {
                self.formats.push(format);
            }
        }
        self
    }

    #[inline]
    pub fn read_chunk_size(&self) -> usize {
        self.read_chunk_size
    }


    #[inline]
    pub fn formats(&self) -> &[ImageFormat] {
        &self.formats
    }
}
