//! Processing configuration
use std::path::{Path, PathBuf};

use gnss_rs::prelude::Constellation;
use log::LevelFilter;

#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::{error::Error, output::Layout, tec::TecEngine};

fn default_obs_dir() -> Vec<PathBuf> {
    vec![PathBuf::from("./obs")]
}

fn default_nav_dir() -> Vec<PathBuf> {
    vec![PathBuf::from("./nav")]
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("./out")
}

fn default_first_broadcast() -> bool {
    true
}

fn default_rec_fields() -> String {
    "datetime, el, az, tec.l1l2, validity".to_string()
}

fn default_datetime_format() -> String {
    "%Y-%j %H:%M:%S".to_string()
}

fn default_log_level() -> String {
    "DEBUG".to_string()
}

fn default_log_file() -> String {
    "tecs.log".to_string()
}

/// Preferred navigation files per system: the first name of the list
/// matching an available file is used.
#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct NavPriority {
    #[cfg_attr(feature = "serde", serde(default))]
    pub gps: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub glonass: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sbas: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub beidou: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub galileo: Vec<String>,
}

impl NavPriority {
    /// Priority list of given system
    pub fn get(&self, constellation: Constellation) -> &[String] {
        match constellation {
            Constellation::GPS => &self.gps,
            Constellation::Glonass => &self.glonass,
            Constellation::BeiDou => &self.beidou,
            Constellation::Galileo => &self.galileo,
            c if c.is_sbas() => &self.sbas,
            _ => &[],
        }
    }
}

/// Output file formats
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OutFileMode {
    /// One text file per satellite
    #[default]
    Text,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// Observation directories
    #[cfg_attr(feature = "serde", serde(default = "default_obs_dir"))]
    pub obs_dir: Vec<PathBuf>,
    /// Navigation directories, searched recursively
    #[cfg_attr(feature = "serde", serde(default = "default_nav_dir"))]
    pub nav_dir: Vec<PathBuf>,
    #[cfg_attr(feature = "serde", serde(default = "default_out_dir"))]
    pub out_dir: PathBuf,
    #[cfg_attr(feature = "serde", serde(default))]
    pub nav_priority: NavPriority,
    /// Output sampling interval (s), 0 disables the thinning.
    /// Ignored when shorter than the observation interval.
    #[cfg_attr(feature = "serde", serde(default))]
    pub sampling_interval: f64,
    /// Keep records of satellites without ephemeris,
    /// with zero geometry
    #[cfg_attr(feature = "serde", serde(default))]
    pub nav_ignore_absence: bool,
    /// GPS and BeiDou positions are computed from the first
    /// broadcast of the day
    #[cfg_attr(feature = "serde", serde(default = "default_first_broadcast"))]
    pub first_broadcast_of_day: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub out_file_mode: OutFileMode,
    /// Comma separated output columns, `all` for every column
    #[cfg_attr(feature = "serde", serde(default = "default_rec_fields"))]
    pub rec_fields: String,
    /// strftime like format of the datetime column
    #[cfg_attr(feature = "serde", serde(default = "default_datetime_format"))]
    pub datetime_format: String,
    #[cfg_attr(feature = "serde", serde(default = "default_log_level"))]
    pub log_level: String,
    /// Log file, relative to [Self::out_dir]
    #[cfg_attr(feature = "serde", serde(default = "default_log_file"))]
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            obs_dir: default_obs_dir(),
            nav_dir: default_nav_dir(),
            out_dir: default_out_dir(),
            nav_priority: NavPriority::default(),
            sampling_interval: 0.0,
            nav_ignore_absence: false,
            first_broadcast_of_day: default_first_broadcast(),
            out_file_mode: OutFileMode::default(),
            rec_fields: default_rec_fields(),
            datetime_format: default_datetime_format(),
            log_level: default_log_level(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// Checks values that can't be verified at deserialization time
    pub fn validate(&self) -> Result<(), Error> {
        self.level_filter()?;
        self.layout()?;
        if !self.sampling_interval.is_finite() || self.sampling_interval < 0.0 {
            return Err(Error::ConfigError(format!(
                "invalid sampling interval: {}",
                self.sampling_interval
            )));
        }
        if self.datetime_format.is_empty() {
            return Err(Error::ConfigError("empty datetime format".to_string()));
        }
        Ok(())
    }

    /// Output record layout
    pub fn layout(&self) -> Result<Layout, Error> {
        Layout::parse(&self.rec_fields)
    }

    /// [TecEngine] computing the combinations the output displays
    pub fn tec_engine(&self) -> Result<TecEngine, Error> {
        Ok(TecEngine::new(self.layout()?.combinations()))
    }

    /// Sampling interval (s), None when disabled
    pub fn sampling(&self) -> Option<f64> {
        if self.sampling_interval > 0.0 {
            Some(self.sampling_interval)
        } else {
            None
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter, Error> {
        match self.log_level.to_uppercase().as_str() {
            "DEBUG" => Ok(LevelFilter::Debug),
            "INFO" => Ok(LevelFilter::Info),
            "WARNING" => Ok(LevelFilter::Warn),
            "ERROR" | "CRITICAL" => Ok(LevelFilter::Error),
            _ => Err(Error::ConfigError(format!(
                "unknown log level: '{}'",
                self.log_level
            ))),
        }
    }

    /// Log file path
    pub fn log_path(&self) -> PathBuf {
        self.out_dir.join(&self.log_file)
    }

    /// Makes relative directories relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        self.obs_dir.iter_mut().for_each(resolve);
        self.nav_dir.iter_mut().for_each(resolve);
        resolve(&mut self.out_dir);
    }
}
