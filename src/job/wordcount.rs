use anyhow::Result;
use log::debug;
use std::collections::BTreeMap;

use super::Mapper;
use crate::record::Record;

/// Counts words in the `.txt` entries of each archive.
///
/// Text is reduced to ASCII letters, spaces and newlines and lowercased before
/// it is split, so `"Hello, World!"` counts as `hello` and `world`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordCount;

impl WordCount {
    /// Sum the emitted `(word, 1)` pairs.
    pub fn reduce<I>(pairs: I) -> BTreeMap<String, u64>
    where
        I: IntoIterator<Item = (String, u64)>,
    {
        let mut counts = BTreeMap::new();
        for (word, count) in pairs {
            *counts.entry(word).or_insert(0) += count;
        }
        counts
    }
}

impl Mapper for WordCount {
    type Output = (String, u64);

    fn map(&mut self, record: &Record, output: &mut Vec<(String, u64)>) -> Result<()> {
        debug!("map: {}", record.name());

        if !record.name().ends_with(".txt") {
            return Ok(());
        }

        let content: String = String::from_utf8_lossy(record.payload())
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || *c == ' ' || *c == '\n')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        output.extend(content.split_whitespace().map(|word| (word.to_string(), 1)));
        Ok(())
    }
}
