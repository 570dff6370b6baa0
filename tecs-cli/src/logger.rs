//! Console and log file output
use std::fs::File;
use std::io::Write;
use std::path::Path;

use env_logger::{Builder, Logger, Target};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Dispatches every record to the console and to the log file,
/// each filtering at its own level
pub struct Tee {
    console: Logger,
    file: Logger,
}

impl Tee {
    /// Console shows warnings and errors, the file receives
    /// every record down to `level`
    pub fn new(path: &Path, level: LevelFilter) -> std::io::Result<Self> {
        let console = Builder::new()
            .filter_level(LevelFilter::Warn)
            .target(Target::Stderr)
            .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
            .build();

        let file = File::create(path)?;
        let file = Builder::new()
            .filter_level(level)
            .target(Target::Pipe(Box::new(file)))
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{}] {}: {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .build();

        Ok(Self { console, file })
    }

    /// Installs this logger
    pub fn init(self) -> Result<(), SetLoggerError> {
        let max_level = self.console.filter().max(self.file.filter());
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for Tee {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || self.file.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.console.log(record);
        self.file.log(record);
    }

    fn flush(&self) {
        self.console.flush();
        self.file.flush();
    }
}
