//! Command line tool, slant TEC from RINEX files
mod cli;
mod discovery;
mod logger;
mod writer;

use std::fs::{create_dir_all, read_to_string};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use cli::Cli;
use logger::Tee;
use writer::{TextSettings, TextWriter};

use tec_suite::prelude::{Config, OutFileMode, Pipeline};

#[macro_use]
extern crate log;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error")]
    StdioError(#[from] std::io::Error),
    #[error("tec-suite error")]
    TecError(#[from] tec_suite::error::Error),
    #[error("invalid configuration file")]
    JsonError(#[from] serde_json::Error),
    #[error("logger initialization")]
    LoggerError(#[from] log::SetLoggerError),
}

/// Loads the configuration file, defaults apply when it does not exist.
/// Relative directories are relative to the configuration file.
fn load_config(path: &Path) -> Result<Config, Error> {
    let mut config = if path.exists() {
        let content = read_to_string(path)?;
        serde_json::from_str::<Config>(&content)?
    } else {
        println!(
            "\"{}\" does not exist, using default configuration.",
            path.display()
        );
        Config::default()
    };
    let base = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    config.resolve_paths(base);
    config.validate()?;
    Ok(config)
}

pub fn main() -> Result<(), Error> {
    let start = Instant::now();
    let cli = Cli::new();

    let mut config = load_config(&cli.rcfile())?;
    create_dir_all(&config.out_dir)?;

    let log_path = config.log_path();
    Tee::new(&log_path, config.level_filter()?)?.init()?;
    debug!("{:?}", config);

    print!("Trying to find observation files...");
    std::io::stdout().flush()?;
    let obs_files = discovery::observation_files(&config.obs_dir);
    println!("done ({}).", obs_files.len());
    debug!("observation files: {:?}", obs_files);

    if obs_files.is_empty() {
        println!(
            "Can't find any observation file in {:?}.",
            config.obs_dir
        );
        return Ok(());
    }

    config.nav_dir = discovery::navigation_dirs(&config.nav_dir);
    debug!("navigation directories: {:?}", config.nav_dir);

    let settings = TextSettings {
        out_dir: config.out_dir.clone(),
        layout: config.layout()?,
        datetime_format: config.datetime_format.clone(),
        sampling: config.sampling_interval,
        verbose: !cli.quiet(),
    };
    let mode = config.out_file_mode;

    let mut pipeline = Pipeline::new(config)?;
    let report = pipeline.run(&obs_files, |source| {
        println!("{}: processing...", source.name);
        match mode {
            OutFileMode::Text => TextWriter::new(settings.clone(), source),
        }
    })?;

    println!(
        "done: {}/{} file(s), {} record(s).",
        report.files,
        obs_files.len(),
        report.rows
    );
    if report.errors > 0 {
        println!(
            "\nThere are some errors, check out the log-file: {}.",
            log_path.display()
        );
    }
    log::logger().flush();

    let minutes = start.elapsed().as_secs_f64() / 60.0;
    println!("Total processing time: {:.3} min.", minutes);
    Ok(())
}
