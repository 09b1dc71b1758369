use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};

use crate::error::{ArchiveError, Result};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// General purpose bit flags of a local file header
pub mod flags {
    pub const ENCRYPTED: u16 = 1;
    pub const DATA_DESCRIPTOR: u16 = 1 << 3;
}

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Signature optionally prefixed to a data descriptor
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4b50;

/// Extra field id carrying ZIP64 sizes
pub const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Marker for a 32-bit size field whose real value lives in the ZIP64 extra field
const ZIP64_MAGIC: u64 = 0xFFFF_FFFF;

/// Fixed portion of a local file header, signature included.
#[derive(Debug, Clone)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < LFH_SIZE || &data[0..4] != LFH_SIGNATURE {
            return Err(ArchiveError::malformed("", "invalid local file header"));
        }

        let mut cursor = Cursor::new(&data[4..LFH_SIZE]);

        Ok(Self {
            version_needed: cursor.read_u16::<LittleEndian>()?,
            flags: cursor.read_u16::<LittleEndian>()?,
            compression_method: CompressionMethod::from_u16(cursor.read_u16::<LittleEndian>()?),
            last_mod_time: cursor.read_u16::<LittleEndian>()?,
            last_mod_date: cursor.read_u16::<LittleEndian>()?,
            crc32: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()? as u64,
            uncompressed_size: cursor.read_u32::<LittleEndian>()? as u64,
            file_name_length: cursor.read_u16::<LittleEndian>()?,
            extra_field_length: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & flags::ENCRYPTED != 0
    }

    /// CRC and sizes follow the entry body instead of living in the header.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & flags::DATA_DESCRIPTOR != 0
    }

    /// Apply the ZIP64 extended information field, if the extra data carries one.
    ///
    /// Returns `true` when a ZIP64 field was present, which also means a
    /// trailing data descriptor uses 64-bit sizes.
    pub fn apply_zip64_extra(&mut self, extra: &[u8]) -> io::Result<bool> {
        let mut cursor = Cursor::new(extra);
        let end = extra.len() as u64;
        let mut found = false;

        while cursor.position() + 4 <= end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()? as u64;
            let field_end = (cursor.position() + field_size).min(end);

            if header_id == ZIP64_EXTRA_ID {
                found = true;
                // Fields are present only if the corresponding header field is 0xFFFFFFFF
                if self.uncompressed_size == ZIP64_MAGIC && cursor.position() + 8 <= field_end {
                    self.uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if self.compressed_size == ZIP64_MAGIC && cursor.position() + 8 <= field_end {
                    self.compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
            }

            cursor.set_position(field_end);
        }

        Ok(found)
    }
}

/// Trailer written after the entry body when bit 3 of the flags is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl DataDescriptor {
    /// Read a descriptor, with or without its optional leading signature.
    pub fn read_from<R: Read>(reader: &mut R, zip64: bool) -> io::Result<Self> {
        let first = reader.read_u32::<LittleEndian>()?;
        let crc32 = if first == DATA_DESCRIPTOR_SIGNATURE {
            reader.read_u32::<LittleEndian>()?
        } else {
            first
        };

        let (compressed_size, uncompressed_size) = if zip64 {
            (
                reader.read_u64::<LittleEndian>()?,
                reader.read_u64::<LittleEndian>()?,
            )
        } else {
            (
                reader.read_u32::<LittleEndian>()? as u64,
                reader.read_u32::<LittleEndian>()? as u64,
            )
        };

        Ok(Self {
            crc32,
            compressed_size,
            uncompressed_size,
        })
    }
}

/// Metadata of a decoded entry, as resolved after its body was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
}

impl Default for EntryMeta {
    fn default() -> Self {
        Self {
            compression_method: CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            last_mod_time: 0,
            // 1980-01-01, the DOS epoch
            last_mod_date: 0x0021,
        }
    }
}

impl EntryMeta {
    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}
