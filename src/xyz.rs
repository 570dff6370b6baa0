//! Site coordinates companion files.
//!
//! An `.xyz` file sitting next to an observation file lists
//! site positions that override the header position:
//!
//! ```text
//! # date     time          X             Y             Z
//! 2016-04-01 00:00:00  4846664.918   -370195.200   4116929.526
//! ```
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use hifitime::Epoch;
use log::{debug, error, info};

use crate::{
    epoch::validate,
    error::{Error, ParsingError},
    filename::observation_stem,
    reader::next_line,
};

/// Site positions (m) indexed by epoch
pub type SitePositions = BTreeMap<Epoch, (f64, f64, f64)>;

const EXTENSION: &str = ".xyz";

/// Companion `.xyz` file of given observation file, if it exists
pub fn find_xyz_file(obs_path: &Path) -> Option<PathBuf> {
    let name = obs_path.file_name()?.to_string_lossy().to_string();
    let stem = match observation_stem(&name) {
        Some(stem) => stem,
        None => {
            error!("{}: not an observation file name", name);
            return None;
        },
    };
    let candidate = obs_path.with_file_name(format!("{}{}", stem, EXTENSION));
    if candidate.exists() {
        debug!("xyz file found: {}", candidate.display());
        Some(candidate)
    } else {
        None
    }
}

fn parse_epoch(date: &str, time: &str) -> Option<Epoch> {
    let mut ymd = date.split('-').map(|s| s.parse::<u32>().ok());
    let mut hms = time.split(':').map(|s| s.parse::<u32>().ok());
    let (year, month, day) = (ymd.next()??, ymd.next()??, ymd.next()??);
    let (hour, minute, second) = (hms.next()??, hms.next()??, hms.next()??);
    if month > 12 || day > 31 || hour > 23 || minute > 59 || second > 59 {
        return None;
    }
    validate(year as i32, month as u8, day as u8, hour as u8, minute, second, 0).ok()
}

/// Parses site positions. Comment lines start with '#'.
/// A repeated epoch overrides the previous position.
pub fn parse_xyz<R: BufRead>(reader: &mut R, name: &str) -> Result<SitePositions, Error> {
    let mut positions = SitePositions::new();
    while let Some(line) = next_line(reader)? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let items = line.split_whitespace().collect::<Vec<_>>();
        let invalid = || Error::FormatError(ParsingError::Coordinates(format!("{}: {}", name, line)));
        if items.len() != 5 {
            return Err(invalid());
        }
        let epoch = parse_epoch(items[0], items[1]).ok_or_else(invalid)?;
        let mut xyz = [0.0_f64; 3];
        for (value, item) in xyz.iter_mut().zip(&items[2..]) {
            *value = item.parse::<f64>().map_err(|_| invalid())?;
        }
        if positions.insert(epoch, (xyz[0], xyz[1], xyz[2])).is_some() {
            info!("{}: {} duplicate epoch", name, epoch);
        }
    }
    Ok(positions)
}

/// Loads site positions from given `.xyz` file
pub fn load_xyz_file(path: &Path) -> Result<SitePositions, Error> {
    let mut reader = BufReader::new(File::open(path)?);
    parse_xyz(&mut reader, &path.display().to_string())
}
