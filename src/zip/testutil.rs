//! Hand-built local entries for parser and reader tests.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use super::structures::{DATA_DESCRIPTOR_SIGNATURE, LFH_SIGNATURE, ZIP64_EXTRA_ID, flags};

pub(crate) struct EntryBuilder {
    name: String,
    data: Vec<u8>,
    method: u16,
    flags: u16,
    descriptor: bool,
    zip64: bool,
    crc_override: Option<u32>,
}

impl EntryBuilder {
    pub(crate) fn stored(name: &str, data: &[u8]) -> Self {
        Self::new(name, data, 0)
    }

    pub(crate) fn deflated(name: &str, data: &[u8]) -> Self {
        Self::new(name, data, 8)
    }

    fn new(name: &str, data: &[u8], method: u16) -> Self {
        Self {
            name: name.to_string(),
            data: data.to_vec(),
            method,
            flags: 0,
            descriptor: false,
            zip64: false,
            crc_override: None,
        }
    }

    pub(crate) fn method(mut self, method: u16) -> Self {
        self.method = method;
        self
    }

    pub(crate) fn encrypted(mut self) -> Self {
        self.flags |= flags::ENCRYPTED;
        self
    }

    pub(crate) fn with_descriptor(mut self) -> Self {
        self.descriptor = true;
        self.flags |= flags::DATA_DESCRIPTOR;
        self
    }

    pub(crate) fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    pub(crate) fn wrong_crc(mut self) -> Self {
        self.crc_override = Some(crc32fast::hash(&self.data) ^ 0xFFFF);
        self
    }

    fn body(&self) -> Vec<u8> {
        if self.method == 8 {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&self.data).unwrap();
            encoder.finish().unwrap()
        } else {
            self.data.clone()
        }
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let body = self.body();
        let crc = self
            .crc_override
            .unwrap_or_else(|| crc32fast::hash(&self.data));

        let mut extra = Vec::new();
        if self.zip64 {
            extra.write_u16::<LittleEndian>(ZIP64_EXTRA_ID).unwrap();
            extra.write_u16::<LittleEndian>(16).unwrap();
            extra.write_u64::<LittleEndian>(self.data.len() as u64).unwrap();
            extra.write_u64::<LittleEndian>(body.len() as u64).unwrap();
        }

        let (header_crc, header_csize, header_usize) = if self.descriptor {
            (0, 0, 0)
        } else if self.zip64 {
            (crc, 0xFFFF_FFFF, 0xFFFF_FFFF)
        } else {
            (crc, body.len() as u32, self.data.len() as u32)
        };

        let mut out = LFH_SIGNATURE.to_vec();
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(self.flags).unwrap();
        out.write_u16::<LittleEndian>(self.method).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0x0021).unwrap();
        out.write_u32::<LittleEndian>(header_crc).unwrap();
        out.write_u32::<LittleEndian>(header_csize).unwrap();
        out.write_u32::<LittleEndian>(header_usize).unwrap();
        out.write_u16::<LittleEndian>(self.name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(extra.len() as u16).unwrap();
        out.extend_from_slice(self.name.as_bytes());
        out.extend_from_slice(&extra);
        out.extend_from_slice(&body);

        if self.descriptor {
            out.write_u32::<LittleEndian>(DATA_DESCRIPTOR_SIGNATURE).unwrap();
            out.write_u32::<LittleEndian>(crc).unwrap();
            if self.zip64 {
                out.write_u64::<LittleEndian>(body.len() as u64).unwrap();
                out.write_u64::<LittleEndian>(self.data.len() as u64).unwrap();
            } else {
                out.write_u32::<LittleEndian>(body.len() as u32).unwrap();
                out.write_u32::<LittleEndian>(self.data.len() as u32).unwrap();
            }
        }

        out
    }
}

/// Concatenate entries and close with a central directory signature.
pub(crate) fn archive(entries: &[EntryBuilder]) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in entries {
        out.extend_from_slice(&entry.build());
    }
    out.extend_from_slice(b"PK\x01\x02");
    out.extend_from_slice(&[0u8; 42]);
    out
}
