//! Integration point for a batch scheduler.
//!
//! [`ArchiveInputFormat`] tells the scheduler how to cut the input into work
//! units (one whole archive per unit) and builds one [`ArchiveRecordReader`]
//! per assigned unit.

use anyhow::{Context, Result as AnyResult};
use std::path::Path;
use std::sync::Arc;

use crate::config::ReaderConfig;
use crate::error::{ArchiveError, Result};
use crate::io::{DefaultOpener, SourceOpener, WorkUnit};
use crate::reader::ArchiveRecordReader;

pub struct ArchiveInputFormat {
    config: ReaderConfig,
    opener: Arc<dyn SourceOpener>,
}

impl Default for ArchiveInputFormat {
    fn default() -> Self {
        Self::new(ReaderConfig::default())
    }
}

impl ArchiveInputFormat {
    pub fn new(config: ReaderConfig) -> Self {
        Self {
            config,
            opener: Arc::new(DefaultOpener),
        }
    }

    /// Replace the storage collaborator used to open archives.
    pub fn with_opener(mut self, opener: Arc<dyn SourceOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Applies to every reader created after the call.
    pub fn set_lenient(&mut self, lenient: bool) {
        self.config.lenient = lenient;
    }

    pub fn lenient(&self) -> bool {
        self.config.lenient
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Archives are never split: entry boundaries are only discoverable by
    /// decoding from the first byte.
    pub fn is_splittable(&self, _unit: &WorkUnit) -> bool {
        false
    }

    /// Open the unit's archive and wrap it in a fresh reader.
    pub fn create_reader(&self, unit: &WorkUnit) -> Result<ArchiveRecordReader> {
        let source = self
            .opener
            .open(unit)
            .map_err(|e| ArchiveError::SourceUnavailable {
                location: unit.location().to_string(),
                source: e.into(),
            })?;

        let mut reader = ArchiveRecordReader::new(self.config).with_location(unit.location());
        reader.initialize(source)?;
        Ok(reader)
    }
}

/// Expand input locations into work units, one per archive.
///
/// URLs and files are taken as they are. Directories contribute their regular
/// files (not recursively) in name order, skipping hidden names that start
/// with `.` or `_`.
pub fn list_units<S: AsRef<str>>(inputs: &[S]) -> AnyResult<Vec<WorkUnit>> {
    let mut units = Vec::new();

    for input in inputs {
        let input = input.as_ref();
        let unit = WorkUnit::new(input);
        let path = Path::new(input);

        if unit.is_http_url() || !path.is_dir() {
            units.push(unit);
            continue;
        }

        let mut files = Vec::new();
        for entry in path
            .read_dir()
            .with_context(|| format!("Failed to list input directory {}", path.display()))?
        {
            let entry = entry?;
            let hidden = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.') || name.starts_with('_'));
            if !hidden && entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        units.extend(files.iter().map(|p| WorkUnit::from_path(p)));
    }

    Ok(units)
}
