//! ZIP local entry decoding.
//!
//! This module reads ZIP archives front to back, one Local File Header at a
//! time, so that an archive can be consumed from a plain sequential stream.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures for the local header, data descriptor and
//!   resolved entry metadata
//! - [`parser`]: The forward-only [`EntryCursor`] producing one decoded
//!   [`Record`](crate::Record) per entry
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file, each optionally
//!    followed by a data descriptor
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Only part 1 is read. The first byte sequence that is not a local header
//! (normally the Central Directory) ends the walk.
//!
//! ## Supported Features
//!
//! - STORED (no compression) method
//! - DEFLATE compression method, with or without data descriptor
//! - ZIP64 sizes in the local extra field
//! - CRC-32 verification of every entry
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod parser;
mod structures;

#[cfg(test)]
pub(crate) mod testutil;

pub use parser::{DEFAULT_CHUNK_SIZE, EntryCursor};
pub use structures::*;
