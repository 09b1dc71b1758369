//! # ziprecords
//!
//! Treat every entry of a ZIP archive as one `(name, bytes)` record for a batch
//! processing job.
//!
//! An archive is one atomic work unit: a worker opens it as a plain sequential
//! stream and walks its local file headers front to back, decompressing each
//! entry fully into memory before handing it to the next stage. No seeking and
//! no Central Directory lookup is needed, so archives can be read from local
//! files or straight off an HTTP response body.
//!
//! ## Features
//!
//! - Pull-based [`ArchiveRecordReader`] (`advance` / `current_record` /
//!   `progress` / `close`), also usable as an iterator of records
//! - STORED and DEFLATE entries, data descriptors, ZIP64 sizes, CRC-32 checks
//! - Strict or lenient failure policy per [`ArchiveInputFormat`]
//! - A local batch [`Job`](job::Job) driver with a word count mapper
//!
//! ## Example
//!
//! ```no_run
//! use ziprecords::{ArchiveInputFormat, ReaderConfig, WorkUnit};
//!
//! fn main() -> anyhow::Result<()> {
//!     let format = ArchiveInputFormat::new(ReaderConfig::default().with_lenient(true));
//!     let mut reader = format.create_reader(&WorkUnit::new("input/zip-01.zip"))?;
//!
//!     while reader.advance()? {
//!         let record = reader.current_record()?;
//!         println!("{}: {} bytes", record.name(), record.payload().len());
//!     }
//!     reader.close();
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod job;
pub mod reader;
pub mod record;
pub mod zip;

pub use cli::Cli;
pub use config::ReaderConfig;
pub use error::{ArchiveError, Result};
pub use format::{ArchiveInputFormat, list_units};
pub use io::{ArchiveSource, DefaultOpener, HttpSource, LocalFileSource, SourceOpener, WorkUnit};
pub use reader::{ArchiveRecordReader, ReaderState};
pub use record::Record;
