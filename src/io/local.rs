use super::ArchiveSource;
use anyhow::{Result, bail};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Local file opened for a single sequential pass
pub struct LocalFileSource {
    file: Option<File>,
    path: PathBuf,
    size: u64,
}

impl LocalFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            bail!("{} is not a regular file", path.display());
        }
        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Read for LocalFileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.read(buf),
            None => Err(io::Error::other(format!(
                "{} is already closed",
                self.path.display()
            ))),
        }
    }
}

impl ArchiveSource for LocalFileSource {
    fn close(&mut self) -> io::Result<()> {
        // Dropping the handle closes it
        self.file.take();
        Ok(())
    }
}
