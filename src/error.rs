//! Error kinds surfaced by the archive record reader.
//!
//! Errors fall in two groups. Entry-level errors ([`ArchiveError::MalformedEntry`],
//! [`ArchiveError::TruncatedStream`], [`ArchiveError::ChecksumMismatch`] and
//! [`ArchiveError::Io`]) describe a single entry that could not be decoded; the
//! reader's lenient policy decides whether they fail the work unit or end the
//! archive quietly. Everything else always propagates.

use std::io;

use thiserror::Error;

/// Result alias used throughout the reader.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The storage collaborator could not open the archive.
    #[error("archive source unavailable: {location}")]
    SourceUnavailable {
        location: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Bad local header, encrypted entry, unsupported method or size mismatch.
    #[error("malformed entry {entry:?}: {reason}")]
    MalformedEntry { entry: String, reason: String },

    /// The stream ended in the middle of an entry.
    #[error("stream truncated inside entry {entry:?}")]
    TruncatedStream { entry: String },

    #[error("CRC-32 mismatch in entry {entry:?}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        entry: String,
        expected: u32,
        actual: u32,
    },

    /// Any other I/O failure while an entry was being read.
    #[error("I/O failure while reading entry: {0}")]
    Io(#[from] io::Error),

    #[error("no current record: advance() has not produced one")]
    NoCurrentRecord,

    /// The reader was driven out of protocol order.
    #[error("invalid reader state: {0}")]
    InvalidState(&'static str),
}

impl ArchiveError {
    pub(crate) fn malformed(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        ArchiveError::MalformedEntry {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn truncated(entry: impl Into<String>) -> Self {
        ArchiveError::TruncatedStream {
            entry: entry.into(),
        }
    }

    /// Wrap an I/O error raised while decoding `entry`, turning premature EOF
    /// into [`ArchiveError::TruncatedStream`].
    pub(crate) fn from_entry_io(entry: &str, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::truncated(entry)
        } else {
            ArchiveError::Io(err)
        }
    }

    /// Whether the lenient policy may turn this error into end-of-archive.
    pub fn is_entry_level(&self) -> bool {
        matches!(
            self,
            ArchiveError::MalformedEntry { .. }
                | ArchiveError::TruncatedStream { .. }
                | ArchiveError::ChecksumMismatch { .. }
                | ArchiveError::Io(_)
        )
    }
}
