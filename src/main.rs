//! Main entry point for the ziprecords CLI application.
//!
//! Runs a batch job over a set of ZIP archives: either a word count over the
//! `.txt` entries, or a listing of every record each archive produces.

mod logger;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{error, info};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use logger::Logger;
use ziprecords::job::{Job, JobReport, Mapper, UnitOutcome, WordCount};
use ziprecords::zip::EntryMeta;
use ziprecords::{ArchiveInputFormat, Cli, Record, list_units};

/// Application entry point.
///
/// Exits with a failure status when any archive failed its work unit.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = Logger::new(cli.verbosity).init() {
        eprintln!("Failed to set up logger: {e}");
    }

    let result = run(&cli).await;
    if let Err(err) = &result {
        error!("{err:?}");
    }

    if succeeded(&result) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Only a job where every unit succeeded exits cleanly.
fn succeeded(result: &Result<bool>) -> bool {
    matches!(result, Ok(true))
}

/// Run the job selected by the CLI options, returning whether it succeeded.
async fn run(cli: &Cli) -> Result<bool> {
    let units = list_units(&cli.inputs)?;
    if units.is_empty() {
        bail!("No input archives found");
    }

    info!(
        "Processing {} archive(s) in {} mode",
        units.len(),
        if cli.lenient { "lenient" } else { "strict" }
    );

    let job = Job::new(ArchiveInputFormat::new(cli.reader_config()), cli.job_config());

    let succeeded = if cli.list {
        let report = job.run(units, || ListRecords).await?;
        summarize(&report);
        let succeeded = report.succeeded();
        write_listing(&mut open_output(cli)?, report)?;
        succeeded
    } else {
        let report = job.run(units, || WordCount).await?;
        summarize(&report);
        let succeeded = report.succeeded();

        // A failed job commits no output
        if succeeded {
            let mut out = open_output(cli)?;
            for (word, count) in WordCount::reduce(report.into_output()) {
                writeln!(out, "{word}\t{count}")?;
            }
            out.flush()?;
        }
        succeeded
    };

    Ok(succeeded)
}

fn open_output(cli: &Cli) -> Result<Box<dyn Write>> {
    Ok(match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    })
}

fn summarize<T>(report: &JobReport<T>) {
    for unit in report.failed_units() {
        if let UnitOutcome::Failed { error } = &unit.outcome {
            error!("{}: {error:#}", unit.unit);
        }
    }

    info!(
        "{} of {} archive(s) succeeded, {} record(s) read",
        report.units.len() - report.failed_units().count(),
        report.units.len(),
        report.records()
    );
}

/// One row of the `-l` listing.
struct ListedRecord {
    name: String,
    length: u64,
    meta: EntryMeta,
}

/// Mapper emitting one [`ListedRecord`] per entry.
struct ListRecords;

impl Mapper for ListRecords {
    type Output = ListedRecord;

    fn map(&mut self, record: &Record, output: &mut Vec<ListedRecord>) -> Result<()> {
        output.push(ListedRecord {
            name: record.name().to_string(),
            length: record.payload().len() as u64,
            meta: *record.meta(),
        });
        Ok(())
    }
}

/// Print the records of every archive as a table.
///
/// Columns follow `unzip -v`: length, packed size, compression ratio,
/// modification date and time, name.
fn write_listing(out: &mut dyn Write, report: JobReport<ListedRecord>) -> Result<()> {
    for unit in report.units {
        if !matches!(unit.outcome, UnitOutcome::Succeeded { .. }) {
            continue;
        }

        writeln!(out, "Archive:  {}", unit.unit)?;
        writeln!(
            out,
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        )?;
        writeln!(out, "{}", "-".repeat(70))?;

        // Track totals for summary line
        let mut total_uncompressed = 0u64;
        let mut total_compressed = 0u64;

        for entry in &unit.output {
            let (year, month, day) = entry.meta.mod_date();
            let (hour, minute, _second) = entry.meta.mod_time();

            writeln!(
                out,
                "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
                entry.length,
                entry.meta.compressed_size,
                ratio(entry.meta.compressed_size, entry.length),
                year,
                month,
                day,
                hour,
                minute,
                entry.name
            )?;

            total_uncompressed += entry.length;
            total_compressed += entry.meta.compressed_size;
        }

        writeln!(out, "{}", "-".repeat(70))?;
        writeln!(
            out,
            "{:>10}  {:>10}  {}  {:>21}  {} records ({})",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            unit.output.len(),
            format_size(total_uncompressed)
        )?;
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

/// Compression ratio as percentage saved.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
