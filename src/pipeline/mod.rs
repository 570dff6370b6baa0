//! Epoch processing: from observation records to output rows
use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Seek};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use gnss_rs::prelude::{Constellation, SV};
use hifitime::Epoch;
use log::{debug, error, info, warn};
use nalgebra::Vector3;

use crate::{
    config::Config,
    epoch::{decompose, Date},
    error::Error,
    geodesy::{elevation_azimuth, geodetic_degrees},
    navigation::{find_navigation_file, select_ephemeris, NavigationFile},
    observable::Observables,
    observation::{ObservationFile, ObservationRecord},
    orbit::satellite_position,
    output::{Layout, OutputRow, Writer},
    system,
    tec::{Frequencies, TecEngine},
    validity::Validity,
    xyz::{find_xyz_file, load_xyz_file, SitePositions},
};

mod cache;

pub use cache::{GlonassChannel, Resolution, SatelliteCache, SatelliteKey};

/// Observation file description, handed to the writer factory
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Observation file name
    pub name: String,
    /// Observation interval (s)
    pub interval: f64,
}

/// Run statistics
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Observation files entirely processed
    pub files: usize,
    /// Rows handed to the writers
    pub rows: usize,
    /// Logged errors
    pub errors: usize,
}

/// Writer description of a satellite: Glonass satellites
/// carry their channel, SBAS satellites their PRN.
pub fn satellite_definition(sv: SV, glonass_channel: Option<i8>) -> String {
    let code = system::code(sv);
    match sv.constellation {
        Constellation::Glonass => match glonass_channel {
            Some(k) => format!("{} (k = {})", code, k),
            None => code,
        },
        c if c.is_sbas() => format!("{} (PRN {})", code, sv.prn as u16 + 100),
        _ => code,
    }
}

/// Navigation data of one (date, system) of an observation file
type NavigationSlot = Option<Rc<NavigationFile>>;

/// State of the observation file being processed
struct FileState {
    name: String,
    navigation: HashMap<(Date, Constellation), NavigationSlot>,
    satellites: HashSet<SV>,
    /// Last position handed to the writer
    reported: Option<(f64, f64, f64)>,
    site_geodetic: (f64, f64, f64),
    /// Sampling watermark
    last_epoch: Option<Epoch>,
    sampling: Option<f64>,
    overrides: SitePositions,
}

/// Processing chain: owns the run wide caches and the error count
pub struct Pipeline {
    config: Config,
    engine: TecEngine,
    cache: SatelliteCache,
    report: Report,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;
        let engine = config.tec_engine()?;
        Ok(Self {
            config,
            engine,
            cache: SatelliteCache::default(),
            report: Report::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Output layout of this run
    pub fn layout(&self) -> Result<Layout, Error> {
        self.config.layout()
    }

    pub fn report(&self) -> Report {
        self.report
    }

    fn count_error(&mut self) {
        self.report.errors += 1;
    }

    /// Processes given observation files, in name order. `factory` creates
    /// one [Writer] per observation file. File level errors are logged and
    /// counted; an empty file list is the only hard failure.
    pub fn run<W, F>(&mut self, files: &[PathBuf], mut factory: F) -> Result<Report, Error>
    where
        W: Writer,
        F: FnMut(&Source) -> Result<W, Error>,
    {
        if files.is_empty() {
            return Err(Error::ConfigError(
                "can't find any observation file".to_string(),
            ));
        }
        let mut files = files.to_vec();
        files.sort();

        let total = files.len();
        for (nth, path) in files.iter().enumerate() {
            info!("{} [{}/{}]", path.display(), nth + 1, total);
            let mut file = match ObservationFile::open(path) {
                Ok(file) => file,
                Err(e) => {
                    error!("{}: {}", path.display(), e);
                    self.count_error();
                    continue;
                },
            };
            let overrides = self.load_overrides(path);
            if let Err(e) = self.process_file(&mut file, overrides, &mut factory) {
                error!("{}: {}", path.display(), e);
                self.count_error();
            }
        }

        if self.report.errors > 0 {
            warn!("{} error(s) occurred during processing", self.report.errors);
        }
        Ok(self.report)
    }

    /// Site positions of the companion coordinates file, if any
    fn load_overrides(&mut self, path: &Path) -> SitePositions {
        let xyz = match find_xyz_file(path) {
            Some(xyz) => xyz,
            None => return SitePositions::new(),
        };
        match load_xyz_file(&xyz) {
            Ok(positions) => {
                debug!("{}: {} site positions", xyz.display(), positions.len());
                positions
            },
            Err(e) => {
                error!("{}: {}", xyz.display(), e);
                self.count_error();
                SitePositions::new()
            },
        }
    }

    /// Processes one observation file. Returns an error when
    /// the file is to be abandoned.
    pub fn process_file<R, W, F>(
        &mut self,
        file: &mut ObservationFile<R>,
        overrides: SitePositions,
        factory: &mut F,
    ) -> Result<(), Error>
    where
        R: BufRead + Seek,
        W: Writer,
        F: FnMut(&Source) -> Result<W, Error>,
    {
        let name = file.name().to_string();
        let header = file.header().clone();

        let observed = system::from_letter(header.system)?;
        if !system::is_supported(observed) && observed != Constellation::Mixed {
            warn!("{}: {} is not a supported system, skipped", name, observed);
            return Ok(());
        }
        if header.time_system != "GPS" {
            return Err(Error::UnsupportedTimeSystem(header.time_system));
        }

        let interval = file.interval();
        let sampling = self
            .config
            .sampling()
            .filter(|sampling| *sampling > interval);
        if self.config.sampling().is_some() && sampling.is_none() {
            debug!(
                "{}: sampling interval shorter than observation interval ({}s), not used",
                name, interval
            );
        }

        let mut writer = factory(&Source {
            name: name.clone(),
            interval,
        })?;

        let mut state = FileState {
            name: name.clone(),
            navigation: HashMap::new(),
            satellites: HashSet::new(),
            reported: None,
            site_geodetic: (0.0, 0.0, 0.0),
            last_epoch: None,
            sampling,
            overrides,
        };

        if let Some(first) = header.first_epoch {
            let xyz = header.position;
            state.site_geodetic = geodetic_degrees(&Vector3::new(xyz.0, xyz.1, xyz.2));
            writer.update_position(first, xyz, state.site_geodetic)?;
            state.reported = Some(xyz);
        }

        let filename_date = file.filename_date();
        let mut records = file.records();
        while let Some(result) = records.next() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    error!("{}: {}", name, e);
                    self.count_error();
                    break;
                },
            };
            let live = records.header();
            let expected = live
                .observables
                .codes(system::letter(record.sv.constellation))
                .map(|codes| Validity::from_codes(codes.iter().map(|code| code.as_str())))
                .unwrap_or_default();
            let live_position = live.position;

            self.process_record(
                &mut state,
                &mut writer,
                record,
                filename_date,
                live_position,
                expected,
            )?;
        }

        debug!("{}: {} satellites", state.name, state.satellites.len());
        writer.end_of_file()?;
        self.report.files += 1;
        Ok(())
    }

    /// Loads the navigation data of (date, system), once per file
    fn navigation(
        &mut self,
        state: &mut FileState,
        date: Date,
        constellation: Constellation,
    ) -> Option<Rc<NavigationFile>> {
        let key = (date, constellation);
        if !state.navigation.contains_key(&key) {
            let priority = self.config.nav_priority.get(constellation);
            let slot = match find_navigation_file(&self.config.nav_dir, date, constellation, priority)
            {
                Ok(path) => match NavigationFile::open(&path) {
                    Ok(nav) => {
                        debug!("{}: {} navigation from {}", state.name, constellation, nav.name);
                        Some(Rc::new(nav))
                    },
                    Err(e) => {
                        error!("{}: {}", path.display(), e);
                        self.count_error();
                        None
                    },
                },
                Err(e) => {
                    warn!("{}: {}", state.name, e);
                    None
                },
            };
            state.navigation.insert(key, slot);
        }
        state.navigation.get(&key).cloned().flatten()
    }

    /// Position of `sv` at `epoch`, computed once per run.
    /// Glonass channels are registered on the way.
    fn satellite_position(
        &mut self,
        epoch: Epoch,
        sv: SV,
        navigation: Option<&NavigationFile>,
        obs_name: &str,
    ) -> Resolution {
        let (date, time) = decompose(epoch);
        let key = (sv, date, time);
        let first_of_day = self.config.first_broadcast_of_day;

        let cache = &mut self.cache;
        let mut failed = false;
        let mut channel = None;
        let resolution = cache.position_or_insert_with(key, || {
            let Some(nav) = navigation else {
                return Resolution::Unavailable;
            };
            let Some((offset, eph)) = select_ephemeris(epoch, sv, &nav.store, first_of_day)
            else {
                return Resolution::Unavailable;
            };
            match satellite_position(eph, offset) {
                Ok(position) => {
                    if let Some(k) = eph.glonass_channel() {
                        channel = Some(k);
                        if eph.health() != 0.0 {
                            info!(
                                "{} - {} {}: health = {}",
                                nav.name,
                                epoch,
                                system::code(sv),
                                eph.health()
                            );
                        }
                    }
                    Resolution::Position(position)
                },
                Err(e) => {
                    error!("{}, {} - {} ({})", nav.name, obs_name, e, epoch);
                    failed = true;
                    Resolution::Failed
                },
            }
        });
        if let Some(k) = channel {
            cache.insert_channel(key, k);
        }
        if failed {
            self.count_error();
        }
        resolution
    }

    fn process_record<W: Writer>(
        &mut self,
        state: &mut FileState,
        writer: &mut W,
        record: ObservationRecord,
        filename_date: Option<Date>,
        live_position: (f64, f64, f64),
        expected: Validity,
    ) -> Result<(), Error> {
        let ObservationRecord { epoch, sv, values } = record;
        let constellation = sv.constellation;
        if !system::is_supported(constellation) {
            return Ok(());
        }

        let (date, time) = decompose(epoch);
        if let Some(expected) = filename_date {
            if date != expected {
                info!(
                    "{} - epoch {} does not match the file date ({})",
                    state.name, date, expected
                );
                return Ok(());
            }
        }

        if let Some(sampling) = state.sampling {
            let last = *state.last_epoch.get_or_insert(epoch);
            if last != epoch {
                if (epoch - last).to_seconds() < sampling {
                    return Ok(());
                }
                state.last_epoch = Some(epoch);
            }
        }

        let nav = self.navigation(state, date, constellation);
        let nav_name = nav.as_ref().map(|nav| nav.name.clone());
        let position = self.satellite_position(epoch, sv, nav.as_deref(), &state.name);

        let site = state.overrides.get(&epoch).copied().unwrap_or(live_position);
        if state.reported != Some(site) {
            state.site_geodetic = geodetic_degrees(&Vector3::new(site.0, site.1, site.2));
            debug!("{}: site position set to {:?}", state.name, site);
            writer.update_position(epoch, site, state.site_geodetic)?;
            state.reported = Some(site);
        }
        let site_xyz = Vector3::new(site.0, site.1, site.2);

        let (satellite, elevation, azimuth) = match position {
            Resolution::Position(satellite) => match elevation_azimuth(&site_xyz, &satellite) {
                Ok((el, az)) => (satellite, el, az),
                Err(e) => {
                    error!(
                        "{}, {} - {} ({})",
                        nav_name.as_deref().unwrap_or("None"),
                        state.name,
                        e,
                        epoch
                    );
                    self.count_error();
                    return Ok(());
                },
            },
            Resolution::Failed => return Ok(()),
            Resolution::Unavailable => {
                if !self.config.nav_ignore_absence || constellation == Constellation::Glonass {
                    debug!("{} - {}: no satellite position", epoch, system::code(sv));
                    return Ok(());
                }
                (Vector3::zeros(), 0.0, 0.0)
            },
        };

        if elevation < 0.0 {
            info!(
                "el = {} ({}, {}, {}, {})",
                elevation,
                state.name,
                nav_name.as_deref().unwrap_or("None"),
                epoch,
                system::code(sv)
            );
            return Ok(());
        }

        let (frequencies, channel) = if constellation == Constellation::Glonass {
            match self.cache.channel(&(sv, date, time)) {
                Some(GlonassChannel { k, frequencies }) => (frequencies, Some(k)),
                None => return Ok(()),
            }
        } else {
            match Frequencies::of(constellation) {
                Some(frequencies) => (frequencies, None),
                None => {
                    info!("{}: unknown satellite system {}", state.name, constellation);
                    return Ok(());
                },
            }
        };

        let observables = Observables::resolve(&values);
        let tec = self.engine.compute(&observables, &frequencies);
        let validity = expected ^ Validity::actual(&values, &observables);

        if state.satellites.insert(sv) {
            writer.update_satellite(
                sv,
                &satellite_definition(sv, channel),
                nav_name.as_deref(),
            )?;
        }

        writer.write(&OutputRow {
            epoch,
            sv,
            elevation,
            azimuth,
            observables,
            tec,
            validity,
            satellite,
            site: site_xyz,
            site_geodetic: state.site_geodetic,
        })?;
        self.report.rows += 1;
        Ok(())
    }
}
