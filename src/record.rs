use crate::zip::EntryMeta;

/// One fully decompressed archive entry.
///
/// `name` is the full path stored in the archive, subdirectories included
/// (e.g. `subdir1/subsubdir2/Ulysses-18.txt`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    name: String,
    payload: Vec<u8>,
    meta: EntryMeta,
}

impl Record {
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        let payload_len = payload.len() as u64;
        Self {
            name: name.into(),
            payload,
            meta: EntryMeta {
                compressed_size: payload_len,
                uncompressed_size: payload_len,
                ..EntryMeta::default()
            },
        }
    }

    pub(crate) fn with_meta(name: String, payload: Vec<u8>, meta: EntryMeta) -> Self {
        Self {
            name,
            payload,
            meta,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn meta(&self) -> &EntryMeta {
        &self.meta
    }

    /// Directory entries carry a trailing `/` and an empty payload
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.name, self.payload)
    }
}
