use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Colored stderr logger for the command line tool
///
/// Errors and warnings get a prefix so they stand out from per-archive progress.
/// Debug and trace lines name the module that emitted them.
pub struct Logger {
    level: LevelFilter,
}

impl Logger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    pub fn init(self) -> Result<(), SetLoggerError> {
        log::set_max_level(self.level);
        log::set_boxed_logger(Box::new(self))
    }
}

/// Module path relative to the crate, e.g. `zip::parser`.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix("ziprecords::")
        .unwrap_or(target)
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let msg = record.args().to_string();

        match record.level() {
            Level::Error => eprintln!("{} {}", "error:".bright_red().bold(), msg.bright_red()),
            Level::Warn => eprintln!("{} {}", "warning:".bright_yellow().bold(), msg.bright_yellow()),
            Level::Info => eprintln!("{}", msg.bright_blue()),
            Level::Debug => eprintln!(
                "{} {}",
                format!("[{}]", short_target(record.target())).dimmed(),
                msg.bright_magenta()
            ),
            Level::Trace => eprintln!(
                "{} {}",
                format!("[{}]", short_target(record.target())).dimmed(),
                msg.bright_black()
            ),
        }
    }

    fn flush(&self) {}
}
