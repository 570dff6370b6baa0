//! Navigation RINEX files
use std::io::BufRead;
use std::path::Path;

use log::{debug, info};

use crate::{
    epoch::Date,
    error::Error,
    filename,
    reader::BufferedReader,
    version::Version,
};

mod ephemeris;
mod parsing;
mod resolver;
mod store;

pub use ephemeris::{CartesianState, Ephemeris, Family, Kepler, Perturbations};
pub use resolver::{find_navigation_file, select_ephemeris};
pub use store::EphemerisStore;

/// Navigation RINEX file, entirely loaded at opening time.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationFile {
    /// File name
    pub name: String,
    pub version: Version,
    /// Date encoded in the file name
    pub date: Option<Date>,
    /// Ephemeris frames published on [Self::date]
    pub store: EphemerisStore,
}

impl NavigationFile {
    /// Opens and parses given (possibly gzip compressed) navigation file
    pub fn open(path: &Path) -> Result<Self, Error> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut reader = BufferedReader::open(path)?;
        Self::from_reader(&name, &mut reader)
    }

    /// Parses navigation content. `name` is the file name, its date is used
    /// to discard frames published on other days.
    pub fn from_reader<R: BufRead>(name: &str, reader: &mut R) -> Result<Self, Error> {
        let (header, layout) = parsing::parse_header(reader)?;
        let date = filename::date_from_name(name);

        let mut store = EphemerisStore::default();
        while let Some(ephemeris) = parsing::next_frame(reader, &header, layout)? {
            if let Some(date) = date {
                let published = Date::from_epoch(ephemeris.epoch);
                if published != date {
                    info!(
                        "{}: {} frame published on {} ({}) discarded",
                        name, ephemeris.sv, published, ephemeris.epoch
                    );
                    continue;
                }
            }
            if !store.insert(ephemeris) {
                debug!("{}: duplicate frame", name);
            }
        }

        debug!("{}: {} ephemeris frames", name, store.len());
        Ok(Self {
            name: name.to_string(),
            version: header.version,
            date,
            store,
        })
    }
}
