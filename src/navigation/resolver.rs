//! Navigation file lookup and ephemeris selection
use std::path::{Path, PathBuf};

use gnss_rs::prelude::{Constellation, SV};
use hifitime::Epoch;
use log::{debug, error, info};
use regex::Regex;

use crate::{
    epoch::{decompose, week_seconds, Date},
    error::Error,
    filename::navigation_pattern,
    navigation::{EphemerisStore, Ephemeris},
};

/// Lists the files of given directories whose name matches `pattern`,
/// sorted by path. Unreadable directories are logged and skipped.
fn find_files(paths: &[PathBuf], pattern: &Regex) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for dir in paths {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!("{}: {}", dir.display(), e);
                continue;
            },
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let matches = path
                .file_name()
                .map(|name| pattern.is_match(&name.to_string_lossy()))
                .unwrap_or(false);
            if matches && path.is_file() {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

/// Priority entries are case insensitive patterns. Invalid
/// patterns are interpreted literally.
fn priority_pattern(entry: &str) -> Option<Regex> {
    Regex::new(&format!("(?i){}", entry))
        .or_else(|_| Regex::new(&format!("(?i){}", regex::escape(entry))))
        .ok()
}

/// Picks the first candidate matching the first priority entry
/// that matches any candidate, otherwise the first candidate.
fn prioritize<'a>(candidates: &'a [PathBuf], priority: &[String]) -> Option<&'a Path> {
    let name = |path: &Path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    };
    for pattern in priority.iter().filter_map(|entry| priority_pattern(entry)) {
        if let Some(found) = candidates.iter().find(|path| pattern.is_match(&name(path))) {
            return Some(found);
        }
    }
    if !priority.is_empty() {
        debug!("no navigation file matches priority list {:?}", priority);
    }
    candidates.first().map(|path| path.as_path())
}

/// Searches `paths` for the navigation file describing `constellation` on `date`.
/// Mixed navigation files are looked up when no dedicated file exists.
pub fn find_navigation_file(
    paths: &[PathBuf],
    date: Date,
    constellation: Constellation,
    priority: &[String],
) -> Result<PathBuf, Error> {
    let mut candidates = find_files(paths, &navigation_pattern(constellation, date)?);
    if candidates.is_empty() {
        candidates = find_files(paths, &navigation_pattern(Constellation::Mixed, date)?);
    }
    prioritize(&candidates, priority)
        .map(|path| path.to_path_buf())
        .ok_or_else(|| {
            Error::EphemerisUnavailable(format!(
                "can't find any navigation file for {} on {}-{:03}",
                constellation,
                date.year,
                date.day_of_year()
            ))
        })
}

/// Broadcast time tolerance of each system, in seconds
fn tolerance(constellation: Constellation) -> Option<u32> {
    match constellation {
        Constellation::GPS | Constellation::BeiDou => Some(7_200),
        Constellation::Galileo => Some(10_800),
        Constellation::Glonass => Some(900),
        c if c.is_sbas() => Some(256),
        _ => None,
    }
}

/// Seconds of week for systems propagating Keplerian orbits
/// from a time of week. None for other systems.
fn week_second(epoch: Epoch, constellation: Constellation) -> Option<f64> {
    let (origin, seconds) = match constellation {
        Constellation::GPS => (Date::new(1980, 1, 6)?, 0),
        Constellation::BeiDou => (Date::new(2006, 1, 1)?, 0),
        Constellation::Galileo => (Date::new(1999, 8, 22)?, 13),
        _ => return None,
    };
    Some(week_seconds(epoch, origin, seconds))
}

/// Selects the frame describing `sv` at `epoch`, with the propagation offset:
/// seconds of week for GPS, BeiDou and Galileo, signed time elapsed since
/// the broadcast for other systems.
/// When `first_of_day` is set, GPS and BeiDou use the first frame of the day.
pub fn select_ephemeris(
    epoch: Epoch,
    sv: SV,
    store: &EphemerisStore,
    first_of_day: bool,
) -> Option<(f64, &Ephemeris)> {
    let constellation = sv.constellation;
    if !store.contains_system(constellation) {
        info!("no {} navigation message", constellation);
        return None;
    }
    if !store.contains_satellite(sv) {
        info!("no navigation message for {}", sv);
        return None;
    }

    let (date, time) = decompose(epoch);
    let window = match tolerance(constellation) {
        Some(window) => window,
        None => {
            error!("{} navigation is not supported", constellation);
            return None;
        },
    };
    let week_second = week_second(epoch, constellation);

    if let Some(ephemeris) = store.get(sv, date, time) {
        return Some((week_second.unwrap_or(0.0), ephemeris));
    }

    let mut broadcasts = store.broadcasts(sv, date).peekable();
    if first_of_day && matches!(constellation, Constellation::GPS | Constellation::BeiDou) {
        let (_, ephemeris) = broadcasts.peek()?;
        return Some((week_second.unwrap_or(0.0), *ephemeris));
    }

    let observed = time.whole_seconds() as i64;
    for (published, ephemeris) in broadcasts {
        let delta = observed - published.whole_seconds() as i64;
        if delta.unsigned_abs() <= window as u64 {
            let offset = week_second.unwrap_or(delta as f64);
            return Some((offset, ephemeris));
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    fn store(frames: &[(SV, u8, u8)]) -> EphemerisStore {
        let mut store = EphemerisStore::default();
        for (sv, hour, minute) in frames {
            store.insert(Ephemeris {
                sv: *sv,
                epoch: Epoch::from_gregorian_utc(2016, 4, 9, *hour, *minute, 0, 0),
                clock_bias: (*hour as f64) * 60.0 + *minute as f64,
                ..Default::default()
            });
        }
        store
    }

    #[test]
    fn gps_selection() {
        let g01 = SV::new(Constellation::GPS, 1);
        let store = store(&[(g01, 2, 0), (g01, 4, 0), (g01, 6, 0)]);
        let t = Epoch::from_gregorian_utc(2016, 4, 9, 5, 0, 0, 0);
        let week_second = 6.0 * 86_400.0 + 5.0 * 3_600.0;

        let (offset, eph) = select_ephemeris(t, g01, &store, false).unwrap();
        assert_eq!(offset, week_second);
        assert_eq!(eph.clock_bias, 240.0);

        let (offset, eph) = select_ephemeris(t, g01, &store, true).unwrap();
        assert_eq!(offset, week_second);
        assert_eq!(eph.clock_bias, 120.0);

        let t = Epoch::from_gregorian_utc(2016, 4, 9, 6, 0, 0, 0);
        let (_, eph) = select_ephemeris(t, g01, &store, true).unwrap();
        assert_eq!(eph.clock_bias, 360.0);

        let t = Epoch::from_gregorian_utc(2016, 4, 9, 7, 30, 0, 0);
        assert_eq!(
            select_ephemeris(t, g01, &store, false).map(|(_, eph)| eph.clock_bias),
            Some(360.0)
        );
        let t = Epoch::from_gregorian_utc(2016, 4, 9, 8, 0, 1, 0);
        assert!(select_ephemeris(t, g01, &store, false).is_none());

        assert!(select_ephemeris(t, SV::new(Constellation::GPS, 2), &store, false).is_none());
        assert!(select_ephemeris(t, SV::new(Constellation::Glonass, 2), &store, false).is_none());
    }

    #[test]
    fn glonass_selection() {
        let r05 = SV::new(Constellation::Glonass, 5);
        let store = store(&[(r05, 0, 15), (r05, 0, 45)]);

        let t = Epoch::from_gregorian_utc(2016, 4, 9, 0, 30, 0, 0);
        let (offset, eph) = select_ephemeris(t, r05, &store, true).unwrap();
        assert_eq!(offset, 900.0);
        assert_eq!(eph.clock_bias, 15.0);

        let t = Epoch::from_gregorian_utc(2016, 4, 9, 0, 5, 0, 0);
        let (offset, eph) = select_ephemeris(t, r05, &store, false).unwrap();
        assert_eq!(offset, -600.0);
        assert_eq!(eph.clock_bias, 15.0);

        let t = Epoch::from_gregorian_utc(2016, 4, 9, 0, 45, 0, 0);
        let (offset, eph) = select_ephemeris(t, r05, &store, false).unwrap();
        assert_eq!(offset, 0.0);
        assert_eq!(eph.clock_bias, 45.0);

        let t = Epoch::from_gregorian_utc(2016, 4, 9, 1, 0, 1, 0);
        assert!(select_ephemeris(t, r05, &store, false).is_none());
    }

    #[test]
    fn selection_is_idempotent() {
        let e11 = SV::new(Constellation::Galileo, 11);
        let store = store(&[(e11, 1, 0), (e11, 3, 10)]);
        let t = Epoch::from_gregorian_utc(2016, 4, 9, 3, 0, 0, 0);
        let first = select_ephemeris(t, e11, &store, false).unwrap();
        let second = select_ephemeris(t, e11, &store, false).unwrap();
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
        assert_eq!(first.1.clock_bias, 60.0);
        assert_eq!(first.0, 6.0 * 86_400.0 + 3.0 * 3_600.0 - 13.0);
    }

    #[test]
    fn navigation_file_priority() {
        let candidates = vec![
            PathBuf::from("nav/abmf1000.16n"),
            PathBuf::from("nav/zimj1000.16n"),
            PathBuf::from("nav/ZIMM1000.16n"),
        ];
        let priority = vec!["zimm".to_string(), "zimj".to_string()];
        assert_eq!(
            prioritize(&candidates, &priority),
            Some(Path::new("nav/ZIMM1000.16n"))
        );
        let priority = vec!["algo".to_string(), "zim.".to_string()];
        assert_eq!(
            prioritize(&candidates, &priority),
            Some(Path::new("nav/zimj1000.16n"))
        );
        assert_eq!(
            prioritize(&candidates, &[]),
            Some(Path::new("nav/abmf1000.16n"))
        );
        assert_eq!(prioritize(&[], &priority), None);
        assert!(priority_pattern("zim[").is_some());
    }

    #[test]
    fn missing_navigation_file() {
        let date = Date::new(2016, 4, 9).unwrap();
        let paths = vec![PathBuf::from("does/not/exist")];
        assert!(matches!(
            find_navigation_file(&paths, date, Constellation::GPS, &[]),
            Err(Error::EphemerisUnavailable(_))
        ));
    }
}
