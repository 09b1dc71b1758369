use crate::zip::DEFAULT_CHUNK_SIZE;

/// Decoding policy handed to every reader a format creates.
///
/// The lenient switch used to be process-wide state; here it travels with the
/// format, so two formats with different policies can dispatch side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Turn entry-level decode failures into a quiet end of archive
    pub lenient: bool,
    /// Reject entries larger than this many bytes
    pub max_entry_size: Option<u64>,
    /// Bytes produced per decode step
    pub chunk_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            lenient: false,
            max_entry_size: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ReaderConfig {
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn with_max_entry_size(mut self, max_entry_size: Option<u64>) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}
