use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use crate::config::ReaderConfig;
use crate::job::JobConfig;

#[derive(Parser, Debug)]
#[command(name = "ziprecords")]
#[command(version)]
#[command(about = "Run a word count over the entries of ZIP archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  ziprecords input/                      count words in every .txt entry of every archive\n  \
  ziprecords --lenient input/            stop quietly at corrupt entries instead of failing\n  \
  ziprecords -l https://example.com/a.zip   list the records of a remote archive")]
pub struct Cli {
    /// ZIP files, directories of ZIP files, or HTTP URLs
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// Treat corrupt or encrypted entries as the end of their archive
    #[arg(long)]
    pub lenient: bool,

    /// List records instead of counting words
    #[arg(short = 'l')]
    pub list: bool,

    /// Write results to this file instead of stdout
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Archives processed at the same time
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// Attempts per archive before the job gives up on it
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub attempts: u32,

    /// Reject entries larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_entry_size: Option<u64>,

    /// Level of verbosity
    #[arg(short = 'v', long, value_name = "LEVEL", default_value = "info")]
    pub verbosity: LevelFilter,
}

impl Cli {
    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig::default()
            .with_lenient(self.lenient)
            .with_max_entry_size(self.max_entry_size)
    }

    pub fn job_config(&self) -> JobConfig {
        let defaults = JobConfig::default();
        JobConfig {
            concurrency: self.jobs.unwrap_or(defaults.concurrency),
            max_attempts: self.attempts,
        }
    }
}
