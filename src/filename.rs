//! RINEX file name conventions
use gnss_rs::prelude::Constellation;
use log::warn;
use regex::Regex;

use crate::{
    epoch::{complete_year, Date},
    error::{Error, ParsingError},
    system,
};

/// Legacy daily observations: ssssDDD#.YY[od]
const CLASSIC_DAILY_OBS: &str = r"\w{4}\d{3}\w\.\d{2}[od]";

/// Legacy sub daily observations: ssssDDDhMM.YY[od]
const CLASSIC_HOURLY_OBS: &str = r"\w{4}\d{3}[a-x](?:00|15|30|45)\.\d{2}[od]";

/// Modern observations: SSSSMRCCC_S_YYYYDDDHHMM_PPP_FFF_MO.(rnx|crx)
const MODERN_OBS: &str = r"\w{9}_[RSU]_\d{11}_\w{3}_\w{3}_\wo\.(?:crx|rnx)";

lazy_static! {
    static ref CLASSIC_NAME: Regex =
        Regex::new(r"(?i)^\w{4}(\d{3})\w{1,3}\.(\d{2})[odnmglphbc]").unwrap();
    static ref MODERN_NAME: Regex =
        Regex::new(r"(?i)^\w{4}\w{5}_[RSU]_(\d{4})(\d{3})\d{4}").unwrap();
    static ref OBSERVATION: Regex = Regex::new(&format!(
        r"(?i)^(?:{}|{}|{})(?:\.z|\.gz)?$",
        CLASSIC_HOURLY_OBS, CLASSIC_DAILY_OBS, MODERN_OBS
    ))
    .unwrap();
    static ref OBSERVATION_STEM: Regex = Regex::new(&format!(
        r"(?i)^({}|{}|{})",
        CLASSIC_HOURLY_OBS, CLASSIC_DAILY_OBS, MODERN_OBS
    ))
    .unwrap();
    static ref COORDINATES: Regex = Regex::new(&format!(
        r"(?i)^(?:{}|{}|{})\.xyz$",
        CLASSIC_HOURLY_OBS, CLASSIC_DAILY_OBS, MODERN_OBS
    ))
    .unwrap();
}

/// Date encoded in a legacy or modern RINEX file name.
/// Returns None (logged) when the name carries no valid date.
pub fn date_from_name(name: &str) -> Option<Date> {
    let (year, doy) = if let Some(caps) = CLASSIC_NAME.captures(name) {
        (complete_year(caps[2].parse().ok()?), caps[1].parse::<u16>().ok()?)
    } else if let Some(caps) = MODERN_NAME.captures(name) {
        (caps[1].parse().ok()?, caps[2].parse::<u16>().ok()?)
    } else {
        warn!("{}: can't find out the date of the file", name);
        return None;
    };
    let date = Date::from_ordinal(year, doy);
    if date.is_none() {
        warn!("{}: invalid day of year {} ({})", name, doy, year);
    }
    date
}

/// True if this looks like an observation file name, optionally compressed
pub fn is_observation(name: &str) -> bool {
    OBSERVATION.is_match(name)
}

/// True if this is a site coordinates companion file name
pub fn is_coordinates(name: &str) -> bool {
    COORDINATES.is_match(name)
}

/// Observation file name, compression extension removed
pub fn observation_stem(name: &str) -> Option<&str> {
    OBSERVATION_STEM
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Legacy navigation file type letter
fn legacy_type(constellation: Constellation) -> Option<char> {
    match constellation {
        Constellation::GPS => Some('n'),
        Constellation::Glonass => Some('g'),
        Constellation::Galileo => Some('l'),
        Constellation::Mixed => Some('p'),
        c if c.is_sbas() => Some('h'),
        _ => None,
    }
}

/// Navigation file name pattern, for given system and date.
/// Systems without a legacy type letter only match modern names.
pub fn navigation_pattern(constellation: Constellation, date: Date) -> Result<Regex, Error> {
    let doy = date.day_of_year();
    let letter = system::letter(constellation);
    let modern = format!(
        r"^\w{{4}}\w{{5}}_\w_{:04}{:03}\d{{4}}_\w{{3}}(?:_\w{{3}})?_{}N\.rnx",
        date.year, doy, letter
    );
    let pattern = match legacy_type(constellation) {
        Some(file_type) => format!(
            r"(?i)^\w{{4}}{:03}\w\.{:02}{}|{}",
            doy,
            date.year.rem_euclid(100),
            file_type,
            modern
        ),
        None => format!("(?i){}", modern),
    };
    Regex::new(&pattern).map_err(|e| ParsingError::InvalidField("file pattern", e.to_string()).into())
}
