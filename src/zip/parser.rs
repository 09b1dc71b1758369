//! Forward-only ZIP local entry parser.
//!
//! The archive is walked from its first byte, one local file header at a time,
//! without consulting the Central Directory. This is what makes a single
//! sequential pass over a non-seekable stream possible.
//!
//! ## Parsing Strategy
//!
//! 1. Read the 30-byte Local File Header; anything that does not start with
//!    `PK\x03\x04` (Central Directory, EOCD, or plain garbage) ends the walk
//! 2. Read the file name and extra field, applying ZIP64 sizes if present
//! 3. Decompress the body chunk by chunk until the decoder reports the end
//!    of the entry
//! 4. If flagged, read the trailing data descriptor
//! 5. Verify sizes and CRC-32 before the entry is handed out
//!
//! The underlying reader must be [`BufRead`]: the inflater only consumes the
//! bytes that belong to the deflate stream, so the stream is left exactly on
//! the next header even when sizes are only known after the body.

use crc32fast::Hasher;
use flate2::{Decompress, FlushDecompress, Status};
use log::debug;
use std::io::{self, BufRead, Read};

use crate::error::{ArchiveError, Result};
use crate::record::Record;

use super::structures::*;

/// Default size of a single decode step (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Cursor over the local entries of one archive stream.
///
/// ## Example
///
/// ```ignore
/// let mut cursor = EntryCursor::new(BufReader::new(file));
/// while let Some(record) = cursor.next_entry()? {
///     println!("{} ({} bytes)", record.name(), record.payload().len());
/// }
/// ```
pub struct EntryCursor<R: BufRead> {
    /// The underlying stream, positioned at the next local header
    inner: R,
    /// Output bytes produced per decode step
    chunk_size: usize,
    /// Largest entry accepted, if limited
    max_entry_size: Option<u64>,
    /// Number of entries decoded so far
    entries_read: u64,
}

/// Header fields resolved before the body is read.
struct PendingEntry {
    header: LocalFileHeader,
    name: String,
    zip64: bool,
}

impl<R: BufRead> EntryCursor<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_entry_size: None,
            entries_read: 0,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_max_entry_size(mut self, max_entry_size: Option<u64>) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }

    pub fn entries_read(&self) -> u64 {
        self.entries_read
    }

    /// Give back the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Decode the next entry.
    ///
    /// Returns `Ok(None)` once no further local header can be found. Errors
    /// are entry-level (see [`ArchiveError::is_entry_level`]); the cursor
    /// position is unspecified afterwards.
    pub fn next_entry(&mut self) -> Result<Option<Record>> {
        let Some(pending) = self.read_header()? else {
            return Ok(None);
        };

        let PendingEntry { header, name, zip64 } = pending;

        if header.is_encrypted() {
            return Err(ArchiveError::malformed(
                name,
                "encrypted entries are not supported",
            ));
        }

        if !header.has_data_descriptor() {
            self.check_limit(&name, header.uncompressed_size)?;
        }

        let (payload, meta) = match header.compression_method {
            CompressionMethod::Stored => {
                if header.has_data_descriptor() {
                    return Err(ArchiveError::malformed(
                        name,
                        "only DEFLATE entries may use a data descriptor",
                    ));
                }
                self.read_stored(&name, &header)?
            }
            CompressionMethod::Deflate => self.read_deflated(&name, &header, zip64)?,
            CompressionMethod::Unknown(method) => {
                return Err(ArchiveError::malformed(
                    name,
                    format!("unsupported compression method {method}"),
                ));
            }
        };

        self.entries_read += 1;
        debug!(
            "decoded entry #{} {:?}: {} -> {} bytes",
            self.entries_read,
            name,
            meta.compressed_size,
            payload.len()
        );

        Ok(Some(Record::with_meta(name, payload, meta)))
    }

    /// Read the Local File Header, file name and extra field.
    fn read_header(&mut self) -> Result<Option<PendingEntry>> {
        let mut buf = [0u8; LFH_SIZE];
        let filled = read_up_to(&mut self.inner, &mut buf)?;

        // No recognisable header: end of the local entries
        if filled < LFH_SIGNATURE.len() || &buf[0..4] != LFH_SIGNATURE {
            return Ok(None);
        }
        if filled < LFH_SIZE {
            return Err(ArchiveError::truncated(""));
        }

        let mut header = LocalFileHeader::from_bytes(&buf)?;

        let mut file_name_bytes = vec![0u8; header.file_name_length as usize];
        self.inner
            .read_exact(&mut file_name_bytes)
            .map_err(|e| ArchiveError::from_entry_io("", e))?;
        // Use lossy conversion to handle non-UTF8 filenames gracefully
        let name = String::from_utf8_lossy(&file_name_bytes).to_string();

        let mut extra = vec![0u8; header.extra_field_length as usize];
        self.inner
            .read_exact(&mut extra)
            .map_err(|e| ArchiveError::from_entry_io(&name, e))?;
        let zip64 = header
            .apply_zip64_extra(&extra)
            .map_err(|e| ArchiveError::malformed(name.as_str(), format!("bad extra field: {e}")))?;

        Ok(Some(PendingEntry { header, name, zip64 }))
    }

    /// Copy a STORED body of known size.
    fn read_stored(&mut self, name: &str, header: &LocalFileHeader) -> Result<(Vec<u8>, EntryMeta)> {
        let size = header.compressed_size;
        if size != header.uncompressed_size {
            return Err(ArchiveError::malformed(
                name,
                format!(
                    "stored entry sizes differ: {} compressed, {} uncompressed",
                    size, header.uncompressed_size
                ),
            ));
        }

        let mut chunk = vec![0u8; self.chunk_size];
        let mut payload = Vec::with_capacity(size.min(self.chunk_size as u64) as usize);
        let mut hasher = Hasher::new();
        let mut remaining = size;

        while remaining > 0 {
            let want = remaining.min(chunk.len() as u64) as usize;
            let n = match self.inner.read(&mut chunk[..want]) {
                Ok(0) => return Err(ArchiveError::truncated(name)),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ArchiveError::from_entry_io(name, e)),
            };
            hasher.update(&chunk[..n]);
            payload.extend_from_slice(&chunk[..n]);
            remaining -= n as u64;
        }

        let meta = entry_meta(header, size, size, header.crc32);
        verify_crc(name, header.crc32, hasher.finalize())?;
        Ok((payload, meta))
    }

    /// Inflate a DEFLATE body until the stream end marker.
    fn read_deflated(
        &mut self,
        name: &str,
        header: &LocalFileHeader,
        zip64: bool,
    ) -> Result<(Vec<u8>, EntryMeta)> {
        let mut inflater = Decompress::new(false);
        let mut chunk = vec![0u8; self.chunk_size];
        let mut payload = Vec::new();
        let mut hasher = Hasher::new();

        loop {
            let input = match self.inner.fill_buf() {
                Ok(input) => input,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ArchiveError::from_entry_io(name, e)),
            };
            let eof = input.is_empty();

            let before_in = inflater.total_in();
            let before_out = inflater.total_out();
            let status = inflater
                .decompress(input, &mut chunk, FlushDecompress::None)
                .map_err(|e| ArchiveError::malformed(name, format!("corrupt deflate stream: {e}")))?;
            let consumed = (inflater.total_in() - before_in) as usize;
            let produced = (inflater.total_out() - before_out) as usize;

            self.inner.consume(consumed);

            if produced > 0 {
                hasher.update(&chunk[..produced]);
                payload.extend_from_slice(&chunk[..produced]);
                self.check_limit(name, payload.len() as u64)?;
            }

            match status {
                Status::StreamEnd => break,
                _ if consumed == 0 && produced == 0 => {
                    if eof {
                        return Err(ArchiveError::truncated(name));
                    }
                    return Err(ArchiveError::malformed(name, "deflate stream stalled"));
                }
                _ => {}
            }
        }

        let consumed = inflater.total_in();
        let (crc32, compressed_size, uncompressed_size) = if header.has_data_descriptor() {
            let descriptor = DataDescriptor::read_from(&mut self.inner, zip64)
                .map_err(|e| ArchiveError::from_entry_io(name, e))?;
            (
                descriptor.crc32,
                descriptor.compressed_size,
                descriptor.uncompressed_size,
            )
        } else {
            (
                header.crc32,
                header.compressed_size,
                header.uncompressed_size,
            )
        };

        if payload.len() as u64 != uncompressed_size {
            return Err(ArchiveError::malformed(
                name,
                format!(
                    "invalid entry size: declared {}, decoded {}",
                    uncompressed_size,
                    payload.len()
                ),
            ));
        }
        if consumed != compressed_size {
            return Err(ArchiveError::malformed(
                name,
                format!(
                    "invalid compressed size: declared {}, consumed {}",
                    compressed_size, consumed
                ),
            ));
        }
        verify_crc(name, crc32, hasher.finalize())?;

        Ok((
            payload,
            entry_meta(header, compressed_size, uncompressed_size, crc32),
        ))
    }

    fn check_limit(&self, name: &str, size: u64) -> Result<()> {
        match self.max_entry_size {
            Some(limit) if size > limit => Err(ArchiveError::malformed(
                name,
                format!("entry exceeds the {limit} byte limit"),
            )),
            _ => Ok(()),
        }
    }
}

fn entry_meta(
    header: &LocalFileHeader,
    compressed_size: u64,
    uncompressed_size: u64,
    crc32: u32,
) -> EntryMeta {
    EntryMeta {
        compression_method: header.compression_method,
        compressed_size,
        uncompressed_size,
        crc32,
        last_mod_time: header.last_mod_time,
        last_mod_date: header.last_mod_date,
    }
}

fn verify_crc(name: &str, expected: u32, actual: u32) -> Result<()> {
    if expected != actual {
        return Err(ArchiveError::ChecksumMismatch {
            entry: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Fill `buf` as far as the stream allows, returning the number of bytes read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
