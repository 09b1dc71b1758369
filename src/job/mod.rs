//! Local batch driver: the surrounding orchestration for a set of archives.
//!
//! Every work unit runs on a blocking worker thread with its own reader and
//! mapper. Output of a unit is committed only when the whole unit succeeds,
//! so a failing archive never leaks partial results into the job output.

mod wordcount;

pub use wordcount::WordCount;

use anyhow::{Context, Result};
use log::{error, info, warn};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::format::ArchiveInputFormat;
use crate::io::WorkUnit;
use crate::record::Record;

/// Per-record processing stage.
pub trait Mapper: Send {
    type Output: Send + 'static;

    fn map(&mut self, record: &Record, output: &mut Vec<Self::Output>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobConfig {
    /// Units running at the same time
    pub concurrency: usize,
    /// Attempts per unit before it is reported as failed
    pub max_attempts: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            max_attempts: 1,
        }
    }
}

#[derive(Debug)]
pub enum UnitOutcome {
    Succeeded { records: u64 },
    Failed { error: anyhow::Error },
}

#[derive(Debug)]
pub struct UnitReport<T> {
    pub unit: WorkUnit,
    pub attempts: u32,
    pub outcome: UnitOutcome,
    /// Committed output, empty unless the unit succeeded
    pub output: Vec<T>,
}

impl<T> UnitReport<T> {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Succeeded { .. })
    }
}

/// Per-unit results, in the order the units were submitted.
#[derive(Debug)]
pub struct JobReport<T> {
    pub units: Vec<UnitReport<T>>,
}

impl<T> JobReport<T> {
    /// True when every unit succeeded
    pub fn succeeded(&self) -> bool {
        self.units.iter().all(UnitReport::succeeded)
    }

    pub fn failed_units(&self) -> impl Iterator<Item = &UnitReport<T>> {
        self.units.iter().filter(|u| !u.succeeded())
    }

    /// Total records read by successful units
    pub fn records(&self) -> u64 {
        self.units
            .iter()
            .map(|u| match u.outcome {
                UnitOutcome::Succeeded { records } => records,
                UnitOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn into_output(self) -> Vec<T> {
        self.units.into_iter().flat_map(|u| u.output).collect()
    }
}

pub struct Job {
    format: Arc<ArchiveInputFormat>,
    config: JobConfig,
}

impl Job {
    pub fn new(format: ArchiveInputFormat, config: JobConfig) -> Self {
        Self {
            format: Arc::new(format),
            config,
        }
    }

    pub fn format(&self) -> &ArchiveInputFormat {
        &self.format
    }

    /// Run `units`, creating a fresh mapper for every attempt.
    pub async fn run<M, F>(&self, units: Vec<WorkUnit>, make_mapper: F) -> Result<JobReport<M::Output>>
    where
        M: Mapper + 'static,
        F: Fn() -> M + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let make_mapper = Arc::new(make_mapper);
        let max_attempts = self.config.max_attempts.max(1);

        let mut handles = Vec::with_capacity(units.len());
        for unit in units {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .context("Job semaphore was closed")?;
            let format = Arc::clone(&self.format);
            let make_mapper = Arc::clone(&make_mapper);

            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                run_with_retries(&format, unit, &*make_mapper, max_attempts)
            }));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            reports.push(handle.await.context("Failed to wait on Tokio task")?);
        }

        Ok(JobReport { units: reports })
    }
}

fn run_with_retries<M, F>(
    format: &ArchiveInputFormat,
    unit: WorkUnit,
    make_mapper: &F,
    max_attempts: u32,
) -> UnitReport<M::Output>
where
    M: Mapper,
    F: Fn() -> M,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let mut mapper = make_mapper();

        match run_unit(format, &unit, &mut mapper) {
            Ok((records, output)) => {
                info!("{unit}: {records} records");
                return UnitReport {
                    unit,
                    attempts,
                    outcome: UnitOutcome::Succeeded { records },
                    output,
                };
            }
            Err(e) if attempts < max_attempts => {
                warn!("{unit}: attempt {attempts}/{max_attempts} failed: {e:#}");
            }
            Err(e) => {
                error!("{unit}: failed after {attempts} attempt(s): {e:#}");
                return UnitReport {
                    unit,
                    attempts,
                    outcome: UnitOutcome::Failed { error: e },
                    output: Vec::new(),
                };
            }
        }
    }
}

fn run_unit<M: Mapper>(
    format: &ArchiveInputFormat,
    unit: &WorkUnit,
    mapper: &mut M,
) -> Result<(u64, Vec<M::Output>)> {
    let mut reader = format.create_reader(unit)?;
    let mut output = Vec::new();
    let mut records = 0;

    while reader.advance()? {
        let record = reader.current_record()?;
        mapper
            .map(record, &mut output)
            .with_context(|| format!("Mapper failed on entry {:?}", record.name()))?;
        records += 1;
    }

    reader.close();
    Ok((records, output))
}
