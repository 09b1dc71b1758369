//! Archive builders shared by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Build an archive with the `zip` crate, deflating every entry unless
/// `stored` is set.
pub fn zip_archive(entries: &[(&str, &[u8])], stored: bool) -> Vec<u8> {
    let method = if stored {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    };
    let options = SimpleFileOptions::default().compression_method(method);

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Offsets of every local file header in `bytes`.
pub fn local_header_offsets(bytes: &[u8]) -> Vec<usize> {
    bytes
        .windows(LFH_SIGNATURE.len())
        .enumerate()
        .filter(|(_, w)| *w == LFH_SIGNATURE)
        .map(|(i, _)| i)
        .collect()
}

/// Start of the entry body following the local header at `offset`.
pub fn body_offset(bytes: &[u8], offset: usize) -> usize {
    let name_len = u16::from_le_bytes([bytes[offset + 26], bytes[offset + 27]]) as usize;
    let extra_len = u16::from_le_bytes([bytes[offset + 28], bytes[offset + 29]]) as usize;
    offset + 30 + name_len + extra_len
}

/// Set the encrypted flag on the `index`th entry, leaving its body intact.
pub fn mark_encrypted(bytes: &mut [u8], index: usize) {
    let offset = local_header_offsets(bytes)[index];
    bytes[offset + 6] |= 1;
}

/// Flip the first body byte of the `index`th entry.
pub fn corrupt_body(bytes: &mut [u8], index: usize) {
    let offset = local_header_offsets(bytes)[index];
    let body = body_offset(bytes, offset);
    bytes[body] ^= 0xff;
}

/// Cut the stream a few bytes into the body of the `index`th entry.
pub fn truncate_in_body(mut bytes: Vec<u8>, index: usize) -> Vec<u8> {
    let offset = local_header_offsets(&bytes)[index];
    let body = body_offset(&bytes, offset);
    bytes.truncate(body + 4);
    bytes
}

/// Pseudo-random bytes that do not start with a ZIP signature.
pub fn noise(len: usize) -> Vec<u8> {
    let mut state = 0x2545_f491u32;
    let mut out = Vec::with_capacity(len);
    out.push(b'#');
    while out.len() < len {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        out.push(state as u8);
    }
    out
}
