mod http;
mod local;

pub use http::HttpSource;
pub use local::LocalFileSource;

use anyhow::Result;
use std::fmt;
use std::io::{self, Cursor, Read};
use std::path::Path;

/// Sequential byte stream over exactly one archive.
///
/// Sources are owned by a single reader and released through [`close`](Self::close).
pub trait ArchiveSource: Read + Send {
    /// Release the underlying resource.
    ///
    /// Calling it again, or reading afterwards, must not panic.
    fn close(&mut self) -> io::Result<()>;
}

impl<T: AsRef<[u8]> + Send> ArchiveSource for Cursor<T> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One archive assigned to one worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkUnit {
    location: String,
}

impl WorkUnit {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::new(path.to_string_lossy())
    }

    /// Local path or HTTP(S) URL of the archive
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_http_url(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

/// Storage collaborator turning a [`WorkUnit`] into an open [`ArchiveSource`].
pub trait SourceOpener: Send + Sync {
    fn open(&self, unit: &WorkUnit) -> Result<Box<dyn ArchiveSource>>;
}

impl<F> SourceOpener for F
where
    F: Fn(&WorkUnit) -> Result<Box<dyn ArchiveSource>> + Send + Sync,
{
    fn open(&self, unit: &WorkUnit) -> Result<Box<dyn ArchiveSource>> {
        self(unit)
    }
}

/// Opens HTTP(S) URLs with [`HttpSource`] and everything else as a local file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOpener;

impl SourceOpener for DefaultOpener {
    fn open(&self, unit: &WorkUnit) -> Result<Box<dyn ArchiveSource>> {
        if unit.is_http_url() {
            Ok(Box::new(HttpSource::open(unit.location())?))
        } else {
            Ok(Box::new(LocalFileSource::open(Path::new(unit.location()))?))
        }
    }
}
