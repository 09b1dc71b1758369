//! Pull-based record reader over one archive stream.
//!
//! ```ignore
//! let mut reader = ArchiveRecordReader::new(ReaderConfig::default());
//! reader.initialize(Box::new(LocalFileSource::open(path)?))?;
//! while reader.advance()? {
//!     let record = reader.current_record()?;
//!     println!("{}: {} bytes", record.name(), record.payload().len());
//! }
//! reader.close();
//! ```

use log::{debug, warn};
use std::io::BufReader;
use std::iter::FusedIterator;

use crate::config::ReaderConfig;
use crate::error::{ArchiveError, Result};
use crate::io::ArchiveSource;
use crate::record::Record;
use crate::zip::EntryCursor;

type SourceCursor = EntryCursor<BufReader<Box<dyn ArchiveSource>>>;

/// Lifecycle of an [`ArchiveRecordReader`].
///
/// `Uninitialized → Ready → Reading → {Exhausted | Failed} → Closed`, with
/// `Closed` reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Uninitialized,
    Ready,
    Reading,
    /// Clean end of archive, or an entry failure swallowed in lenient mode
    Exhausted,
    /// An entry failure propagated in strict mode
    Failed,
    Closed,
}

/// Sequential, single-pass reader turning archive entries into [`Record`]s.
///
/// The reader is driven by one worker at a time. It owns its source and
/// releases it exactly once, through [`close`](Self::close) or on drop.
pub struct ArchiveRecordReader {
    config: ReaderConfig,
    location: String,
    cursor: Option<SourceCursor>,
    current: Option<Record>,
    state: ReaderState,
}

impl ArchiveRecordReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self {
            config,
            location: String::from("<archive>"),
            cursor: None,
            current: None,
            state: ReaderState::Uninitialized,
        }
    }

    /// Name the archive in log messages.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Bind the reader to an already opened source.
    pub fn initialize(&mut self, mut source: Box<dyn ArchiveSource>) -> Result<()> {
        if self.state != ReaderState::Uninitialized {
            if let Err(e) = source.close() {
                warn!("failed to release rejected source for {}: {e}", self.location);
            }
            return Err(ArchiveError::InvalidState("reader is already initialized"));
        }

        let cursor = EntryCursor::new(BufReader::with_capacity(self.config.chunk_size, source))
            .with_chunk_size(self.config.chunk_size)
            .with_max_entry_size(self.config.max_entry_size);

        self.cursor = Some(cursor);
        self.state = ReaderState::Ready;
        Ok(())
    }

    /// Decode the next entry and make it the current record.
    ///
    /// Returns `Ok(false)` once the archive is exhausted, after a failure, and
    /// after [`close`](Self::close). In strict mode an entry failure is
    /// returned as the error; in lenient mode it ends the archive instead.
    pub fn advance(&mut self) -> Result<bool> {
        self.current = None;
        match self.next_record()? {
            Some(record) => {
                self.current = Some(record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The record produced by the last successful [`advance`](Self::advance).
    pub fn current_record(&self) -> Result<&Record> {
        self.current.as_ref().ok_or(ArchiveError::NoCurrentRecord)
    }

    /// 0.0 while entries may remain, 1.0 once the reader reached a terminal
    /// state (exhausted, failed or closed).
    ///
    /// Sequential streams give no byte-accurate position, so this is a coarse
    /// signal rather than a real fraction.
    pub fn progress(&self) -> f32 {
        match self.state {
            ReaderState::Exhausted | ReaderState::Failed | ReaderState::Closed => 1.0,
            ReaderState::Uninitialized | ReaderState::Ready | ReaderState::Reading => 0.0,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn records_read(&self) -> u64 {
        self.cursor.as_ref().map_or(0, EntryCursor::entries_read)
    }

    /// Release the decode cursor and the source.
    ///
    /// Idempotent. A failure to release the source is logged and swallowed.
    pub fn close(&mut self) {
        if let Some(cursor) = self.cursor.take() {
            let mut source = cursor.into_inner().into_inner();
            match source.close() {
                Ok(()) => debug!("closed {}", self.location),
                Err(e) => warn!("failed to close {}: {e}", self.location),
            }
        }
        self.current = None;
        self.state = ReaderState::Closed;
    }

    /// Iterate over the remaining records, each one owned by the caller.
    ///
    /// The iterator ends after the last entry or after the first error.
    pub fn records(&mut self) -> Records<'_> {
        Records {
            reader: self,
            done: false,
        }
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        match self.state {
            ReaderState::Uninitialized => {
                return Err(ArchiveError::InvalidState(
                    "advance() called before initialize()",
                ));
            }
            ReaderState::Exhausted | ReaderState::Failed | ReaderState::Closed => return Ok(None),
            ReaderState::Ready | ReaderState::Reading => {}
        }

        let Some(cursor) = self.cursor.as_mut() else {
            return Err(ArchiveError::InvalidState("reader has no open source"));
        };

        match cursor.next_entry() {
            Ok(Some(record)) => {
                self.state = ReaderState::Reading;
                Ok(Some(record))
            }
            Ok(None) => {
                debug!(
                    "{}: end of archive after {} entries",
                    self.location,
                    cursor.entries_read()
                );
                self.state = ReaderState::Exhausted;
                Ok(None)
            }
            Err(err) if err.is_entry_level() && self.config.lenient => {
                warn!(
                    "{}: {err}; skipping the rest of the archive",
                    self.location
                );
                self.state = ReaderState::Exhausted;
                Ok(None)
            }
            Err(err) => {
                self.state = ReaderState::Failed;
                Err(err)
            }
        }
    }

}

impl Drop for ArchiveRecordReader {
    fn drop(&mut self) {
        self.close();
    }
}

/// Pull one item for an iterator, fusing it after the first error or end.
fn next_item(reader: &mut ArchiveRecordReader, done: &mut bool) -> Option<Result<Record>> {
    if *done {
        return None;
    }
    let item = reader.next_record().transpose();
    if !matches!(item, Some(Ok(_))) {
        *done = true;
    }
    item
}

/// Borrowing iterator returned by [`ArchiveRecordReader::records`].
pub struct Records<'a> {
    reader: &'a mut ArchiveRecordReader,
    done: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.current = None;
        next_item(self.reader, &mut self.done)
    }
}

impl FusedIterator for Records<'_> {}

/// Owning iterator, closing the reader when dropped.
pub struct IntoRecords {
    reader: ArchiveRecordReader,
    done: bool,
}

impl Iterator for IntoRecords {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        next_item(&mut self.reader, &mut self.done)
    }
}

impl FusedIterator for IntoRecords {}

impl IntoIterator for ArchiveRecordReader {
    type Item = Result<Record>;
    type IntoIter = IntoRecords;

    fn into_iter(self) -> IntoRecords {
        IntoRecords {
            reader: self,
            done: false,
        }
    }
}
