//! Text output: one file per satellite and observation file
use std::collections::BTreeMap;
use std::fmt::{Display, Write as _};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};
use gnss_rs::prelude::SV;
use hifitime::Epoch;

use tec_suite::{
    epoch::decompose,
    error::Error,
    output::{Layout, OutputRow, Writer},
    pipeline::Source,
    system,
};

/// Output files extension
const EXTENSION: &str = "dat";

/// Renders a chrono formatted datetime, `fmt` being the format description
fn render<D: Display>(formatted: D, fmt: &str) -> Result<String, Error> {
    let mut s = String::new();
    write!(s, "{}", formatted)
        .map_err(|_| Error::ConfigError(format!("invalid datetime format \"{}\"", fmt)))?;
    Ok(s)
}

/// Converts an [Epoch] to a naive (GPST) datetime
fn naive_datetime(epoch: Epoch) -> Option<NaiveDateTime> {
    let (date, time) = decompose(epoch);
    let (h, m, s, us) = time.components();
    NaiveDate::from_ymd_opt(date.year, date.month as u32, date.day as u32)?.and_hms_micro_opt(
        h as u32,
        m as u32,
        s as u32,
        us,
    )
}

/// Run wide [TextWriter] settings
#[derive(Debug, Clone)]
pub struct TextSettings {
    pub out_dir: PathBuf,
    pub layout: Layout,
    pub datetime_format: String,
    /// Sampling interval (s), 0 when disabled
    pub sampling: f64,
    /// Print the epoch being written
    pub verbose: bool,
}

impl TextSettings {
    /// Fortran description of the records
    fn fortran(&self) -> Result<String, Error> {
        let now = render(Local::now().format(&self.datetime_format), &self.datetime_format)?;
        Ok(self.layout.fortran(now.len()))
    }
}

#[derive(Debug, Default)]
struct Satellite {
    definition: String,
    navigation: Option<String>,
    file: Option<BufWriter<File>>,
}

type Position = ((f64, f64, f64), (f64, f64, f64));

/// [Writer] producing `<out>/<YYYY>/<DDD>/<site>/<site>_<sat>_<DDD>_<YY>.dat` files
pub struct TextWriter {
    settings: TextSettings,
    source: Source,
    marker: String,
    fortran: String,
    /// Output directory, deduced from the first record
    directory: Option<PathBuf>,
    /// (year, day of year) of the output files
    day: (i32, u16),
    latest: Option<(Epoch, Position)>,
    satellites: BTreeMap<SV, Satellite>,
    last_epoch: Option<Epoch>,
}

impl TextWriter {
    pub fn new(settings: TextSettings, source: &Source) -> Result<Self, Error> {
        let fortran = settings.fortran()?;
        let marker = source.name.chars().take(4).collect::<String>();
        Ok(Self {
            settings,
            source: source.clone(),
            marker,
            fortran,
            directory: None,
            day: (0, 0),
            latest: None,
            satellites: BTreeMap::new(),
            last_epoch: None,
        })
    }

    /// Output directory, None until the first record is written
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    fn file_name(&self, sv: SV) -> String {
        format!(
            "{}_{}_{:03}_{:02}.{}",
            self.marker,
            system::code(sv),
            self.day.1,
            self.day.0 % 100,
            EXTENSION
        )
    }

    fn sampling_description(&self) -> String {
        if self.source.interval > self.settings.sampling {
            format!("{:?} (not used).", self.settings.sampling)
        } else {
            format!("{:?}", self.settings.sampling)
        }
    }

    /// Comment lines opening every output file
    fn header(&self, satellite: &Satellite) -> Result<String, Error> {
        let fmt = "%Y-%m-%d %H:%M:%S %Z";
        let created = render(Local::now().format(fmt), fmt)?;
        let ((x, y, z), (l, b, h)) = self
            .latest
            .map(|(_, position)| position)
            .unwrap_or_default();
        let mut header = String::new();
        let lines = [
            format!("Created on {}", created),
            format!(
                "Sources: {}, {}",
                self.source.name,
                satellite.navigation.as_deref().unwrap_or("None")
            ),
            format!("Satellite: {}", satellite.definition),
            format!("Interval: {:?}", self.source.interval),
            format!("Sampling interval: {}", self.sampling_description()),
            format!("Site: {}", self.marker),
            format!("Position (L, B, H): {:?}, {:?}, {:?}", l, b, h),
            format!("Position (X, Y, Z): {:?}, {:?}, {:?}", x, y, z),
            format!("datetime format: {}", self.settings.datetime_format),
            format!("Columns: {}", self.settings.layout.labels().join(", ")),
            self.fortran.clone(),
        ];
        for line in lines {
            header.push_str("# ");
            header.push_str(&line);
            header.push('\n');
        }
        Ok(header)
    }

    /// Output directory, created on first call
    fn prepare_directory(&mut self, epoch: Epoch) -> Result<PathBuf, Error> {
        if let Some(directory) = &self.directory {
            return Ok(directory.clone());
        }
        let (date, _) = decompose(epoch);
        self.day = (date.year, date.day_of_year());
        let directory = self
            .settings
            .out_dir
            .join(format!("{:04}", date.year))
            .join(format!("{:03}", self.day.1))
            .join(&self.marker);
        create_dir_all(&directory)?;
        self.directory = Some(directory.clone());
        Ok(directory)
    }

    fn show_progress(&mut self, epoch: Epoch, datetime: &str) {
        if !self.settings.verbose || self.last_epoch == Some(epoch) {
            return;
        }
        self.last_epoch = Some(epoch);
        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "\r{:<30}", datetime);
        let _ = stdout.flush();
    }
}

impl Writer for TextWriter {
    fn update_position(
        &mut self,
        epoch: Epoch,
        xyz: (f64, f64, f64),
        lbh: (f64, f64, f64),
    ) -> Result<(), Error> {
        match self.latest {
            Some((latest, _)) if latest > epoch => {},
            Some((latest, _)) if latest == epoch => {
                info!(
                    "{}: duplicate site position at {}: {:?}",
                    self.source.name, epoch, xyz
                );
                self.latest = Some((epoch, (xyz, lbh)));
            },
            _ => self.latest = Some((epoch, (xyz, lbh))),
        }
        Ok(())
    }

    fn update_satellite(
        &mut self,
        sv: SV,
        definition: &str,
        navigation: Option<&str>,
    ) -> Result<(), Error> {
        let satellite = self.satellites.entry(sv).or_default();
        satellite.definition = definition.to_string();
        satellite.navigation = navigation.map(|nav| nav.to_string());
        Ok(())
    }

    fn write(&mut self, row: &OutputRow) -> Result<(), Error> {
        let directory = self.prepare_directory(row.epoch)?;

        let datetime = naive_datetime(row.epoch).ok_or_else(|| {
            Error::ConfigError(format!("can't represent {} as a datetime", row.epoch))
        })?;
        let fmt = &self.settings.datetime_format;
        let datetime = render(datetime.format(fmt), fmt)?;
        let line = self
            .settings
            .layout
            .format(row, self.source.interval, &datetime);

        let opened = self
            .satellites
            .get(&row.sv)
            .map(|satellite| satellite.file.is_some())
            .unwrap_or(false);
        if !opened {
            let satellite = self.satellites.remove(&row.sv).unwrap_or_else(|| Satellite {
                definition: system::code(row.sv),
                ..Default::default()
            });
            let header = self.header(&satellite)?;
            let path = directory.join(self.file_name(row.sv));
            debug!("{}: new output file {}", self.source.name, path.display());
            let mut file = BufWriter::new(File::create(&path)?);
            file.write_all(header.as_bytes())?;
            self.satellites.insert(
                row.sv,
                Satellite {
                    file: Some(file),
                    ..satellite
                },
            );
        }

        if let Some(file) = self
            .satellites
            .get_mut(&row.sv)
            .and_then(|satellite| satellite.file.as_mut())
        {
            file.write_all(line.as_bytes())?;
        }

        self.show_progress(row.epoch, &datetime);
        Ok(())
    }

    fn end_of_file(&mut self) -> Result<(), Error> {
        for (sv, satellite) in self.satellites.iter_mut() {
            match satellite.file.as_mut() {
                Some(file) => file.flush()?,
                None => warn!(
                    "{}: data handling of the {} satellite was skipped.",
                    self.source.name,
                    system::code(*sv)
                ),
            }
        }
        self.satellites.clear();
        if self.settings.verbose && self.last_epoch.is_some() {
            println!();
        }
        Ok(())
    }
}
