use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use std::time::SystemTime;

struct CliLogger {
    verbose: bool,
    start_time: SystemTime,
}

impl log::Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.verbose || metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!(
                "{} [{}] {}",
                get_timestamp(self.start_time),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Installs the console logger. Info and debug output only shows with
/// `verbose`.
pub fn init(verbose: bool, start_time: SystemTime) -> Result<(), SetLoggerError> {
    let logger = Box::leak(Box::new(CliLogger {
        verbose,
        start_time,
    }));
    log::set_logger(logger)?;
    log::set_max_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    Ok(())
}

pub fn get_timestamp(start_time: SystemTime) -> String {
    let elapsed = start_time.elapsed().unwrap_or_default();
    format!(
        "[{:02}:{:02}.{:03}]",
        elapsed.as_secs() / 60,
        elapsed.as_secs() % 60,
        elapsed.subsec_millis()
    )
}
