//! Observation RINEX header
use std::collections::BTreeMap;
use std::io::BufRead;

use hifitime::Epoch;
use log::{debug, warn};

use crate::{
    columns::{column, is_blank, parse_float, parse_int},
    epoch::{split_seconds, validate},
    error::{Error, ParsingError},
    reader::{expect_line, next_line},
    version::{ObsLayout, Version},
};

const VERSION_TYPE: &str = "RINEX VERSION / TYPE";
const FIRST_OBS: &str = "TIME OF FIRST OBS";
const APPROX_POSITION: &str = "APPROX POSITION XYZ";
const INTERVAL: &str = "INTERVAL";
const TYPES_OF_OBS: &str = "# / TYPES OF OBSERV";
const SYS_OBS_TYPES: &str = "SYS / # / OBS TYPES";
const END_OF_HEADER: &str = "END OF HEADER";

/// Header label, found in columns 61-80
pub(crate) fn label(line: &str) -> &str {
    column(line, 60, line.len()).trim()
}

/// Declared observation codes
#[derive(Debug, Clone, PartialEq)]
pub enum ObservableCatalog {
    /// RINEX2: same codes for every system
    Flat(Vec<String>),
    /// RINEX3: codes per system letter
    PerSystem(BTreeMap<char, Vec<String>>),
}

impl Default for ObservableCatalog {
    fn default() -> Self {
        Self::Flat(Vec::new())
    }
}

impl ObservableCatalog {
    /// Codes declared for given system letter
    pub fn codes(&self, system: char) -> Option<&[String]> {
        match self {
            Self::Flat(codes) => Some(codes),
            Self::PerSystem(map) => map.get(&system).map(|codes| codes.as_slice()),
        }
    }
    /// Largest number of codes declared for one system
    pub fn max_count(&self) -> usize {
        match self {
            Self::Flat(codes) => codes.len(),
            Self::PerSystem(map) => map.values().map(|c| c.len()).max().unwrap_or(0),
        }
    }
}

/// Observation RINEX header fields the processing relies on
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: Version,
    /// File type letter ('O' for observations)
    pub file_type: char,
    /// Satellite system letter ('M' for mixed files)
    pub system: char,
    /// Time of first observation
    pub first_epoch: Option<Epoch>,
    /// Time system of the first observation ("GPS" when blank)
    pub time_system: String,
    /// Approximate marker position (m), origin when not declared
    pub position: (f64, f64, f64),
    /// Sampling interval (s)
    pub interval: Option<f64>,
    pub observables: ObservableCatalog,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: Version::default(),
            file_type: 'O',
            system: 'G',
            first_epoch: None,
            time_system: "GPS".to_string(),
            position: (0.0, 0.0, 0.0),
            interval: None,
            observables: ObservableCatalog::default(),
        }
    }
}

impl Header {
    /// Parses the header section, up to and including END OF HEADER.
    /// Returns the header and the layout of following records.
    pub(crate) fn parse<R: BufRead>(reader: &mut R) -> Result<(Self, &'static ObsLayout), Error> {
        let first = next_line(reader)?.ok_or(ParsingError::MissingVersion)?;
        if label(&first) != VERSION_TYPE {
            return Err(ParsingError::MissingVersion.into());
        }
        let version = column(&first, 0, 9).trim();
        let layout = version
            .parse::<Version>()
            .ok()
            .and_then(ObsLayout::lookup)
            .ok_or_else(|| Error::UnsupportedVersion(version.to_string()))?;

        let mut lines = vec![first];
        loop {
            let line = expect_line(reader)?;
            if label(&line) == END_OF_HEADER {
                break;
            }
            lines.push(line);
        }

        let mut header = Self {
            version: layout.version,
            ..Default::default()
        };
        if layout.modern {
            header.observables = ObservableCatalog::PerSystem(BTreeMap::new());
        }
        header.merge(&lines, layout, false)?;

        if !layout.modern {
            header.observables = ObservableCatalog::Flat(parse_flat_codes(&lines, layout)?);
        }
        debug!(
            "RINEX {} header: system {}, {} observables",
            header.version,
            header.system,
            header.observables.max_count()
        );
        Ok((header, layout))
    }

    /// Merges header lines into self. The first occurrence of each label wins.
    /// In stream blocks (epoch flags 3 and 4) may redeclare RINEX3 codes.
    pub(crate) fn merge(
        &mut self,
        lines: &[String],
        layout: &ObsLayout,
        in_stream: bool,
    ) -> Result<(), ParsingError> {
        let mut version_type = false;
        let mut first_obs = false;
        let mut position = false;
        let mut interval = false;
        let mut sys_codes = Vec::<&str>::new();

        for line in lines {
            match label(line) {
                VERSION_TYPE if !version_type => {
                    version_type = true;
                    self.parse_version_type(line)?;
                },
                FIRST_OBS if !first_obs => {
                    first_obs = true;
                    self.parse_first_obs(line, layout)?;
                },
                APPROX_POSITION if !position => {
                    position = true;
                    self.position = (
                        parse_float(line, 0, 14, "position")?,
                        parse_float(line, 14, 28, "position")?,
                        parse_float(line, 28, 42, "position")?,
                    );
                },
                INTERVAL if !interval => {
                    interval = true;
                    self.interval = if layout.integer_interval {
                        Some(parse_int::<i32>(line, 0, 6, "interval")? as f64)
                    } else {
                        Some(parse_float(line, 0, 10, "interval")?)
                    };
                },
                SYS_OBS_TYPES if layout.modern => sys_codes.push(line),
                _ => {},
            }
        }

        if layout.modern && !sys_codes.is_empty() {
            let declared = parse_system_codes(&sys_codes, layout)?;
            match &mut self.observables {
                ObservableCatalog::PerSystem(map) if in_stream => {
                    for (system, codes) in declared {
                        debug!("observation types redeclared for system {}", system);
                        map.insert(system, codes);
                    }
                },
                catalog => *catalog = ObservableCatalog::PerSystem(declared),
            }
        }
        Ok(())
    }

    fn parse_version_type(&mut self, line: &str) -> Result<(), ParsingError> {
        let version = column(line, 0, 9);
        self.version = version.parse::<Version>()?;
        self.file_type = column(line, 20, 21).chars().next().unwrap_or(' ');
        self.system = column(line, 40, 41).chars().next().unwrap_or(' ');
        if self.version.major < 3 && self.system == ' ' {
            self.system = 'G';
        }
        Ok(())
    }

    fn parse_first_obs(&mut self, line: &str, layout: &ObsLayout) -> Result<(), ParsingError> {
        let year = parse_int::<i32>(line, 0, 6, "year")?;
        let month = parse_int::<u8>(line, 6, 12, "month")?;
        let day = parse_int::<u8>(line, 12, 18, "day")?;
        let hour = parse_int::<u8>(line, 18, 24, "hour")?;
        let minute = parse_int::<u32>(line, 24, 30, "minute")?;
        let (start, end) = layout.first_obs_seconds;
        let (second, micros) = split_seconds(parse_float(line, start, end, "seconds")?)?;
        self.first_epoch = Some(validate(year, month, day, hour, minute, second, micros)?);

        let time_system = column(line, 48, 51).trim();
        self.time_system = if time_system.is_empty() {
            "GPS".to_string()
        } else {
            time_system.to_string()
        };
        Ok(())
    }
}

/// RINEX2 "# / TYPES OF OBSERV": count, then 9 codes per line.
fn parse_flat_codes(lines: &[String], layout: &ObsLayout) -> Result<Vec<String>, ParsingError> {
    let mut declared = lines.iter().filter(|line| label(line) == TYPES_OF_OBS);
    let first = match declared.next() {
        Some(first) => first,
        None => return Ok(Vec::new()),
    };
    let count = parse_int::<usize>(first, 0, 6, "number of observation types")?;

    let mut codes = Vec::with_capacity(count);
    for line in std::iter::once(first).chain(declared) {
        for i in 0..9 {
            if codes.len() == count {
                break;
            }
            let field = column(line, 6 + i * 6, 12 + i * 6);
            let code = field.trim();
            if code.is_empty() {
                break;
            }
            if let Some(codes) = layout.codes {
                if !codes.contains(code) {
                    warn!("unknown observation type \"{}\"", code);
                }
            }
            codes.push(code.to_string());
        }
    }

    if codes.len() != count {
        return Err(ParsingError::ObservableCount(
            "all".to_string(),
            count,
            codes.len(),
        ));
    }
    Ok(codes)
}

/// RINEX3 "SYS / # / OBS TYPES", continuation lines start blank.
fn parse_system_codes(
    lines: &[&str],
    layout: &ObsLayout,
) -> Result<BTreeMap<char, Vec<String>>, ParsingError> {
    let mut entries = Vec::<String>::new();
    for line in lines {
        if is_blank(column(line, 0, 6)) {
            match entries.last_mut() {
                Some(entry) => {
                    entry.push(' ');
                    entry.push_str(column(line, 7, 60));
                },
                None => return Err(ParsingError::OrphanLine),
            }
        } else {
            entries.push(column(line, 0, 60).to_string());
        }
    }

    let mut map = BTreeMap::new();
    for entry in entries {
        let mut items = entry.split_ascii_whitespace();
        let system = items
            .next()
            .and_then(|s| s.chars().next())
            .ok_or_else(|| ParsingError::InvalidField("system", entry.clone()))?;
        let count = items
            .next()
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| ParsingError::InvalidField("number of observation types", entry.clone()))?;

        let codes = items
            .map(|code| {
                if layout.beidou_relabel && system == 'C' && code.as_bytes().get(1) == Some(&b'1') {
                    code.replace('1', "2")
                } else {
                    code.to_string()
                }
            })
            .collect::<Vec<_>>();

        if codes.len() != count {
            return Err(ParsingError::ObservableCount(
                system.to_string(),
                count,
                codes.len(),
            ));
        }
        if map.insert(system, codes).is_some() {
            return Err(ParsingError::DuplicateSystem(system.to_string()));
        }
    }
    Ok(map)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    const V2_HEADER: &str = "     2.11           OBSERVATION DATA    G (GPS)             RINEX VERSION / TYPE
teqc  2013Mar15                         20160410 00:05:12UTCPGM / RUN BY / DATE
ZIMJ                                                        MARKER NAME
  4331297.3480   567555.6390  4633133.7180                  APPROX POSITION XYZ
    10    L1    L2    C1    P1    P2    S1    S2    C2    L5# / TYPES OF OBSERV
          C5                                                # / TYPES OF OBSERV
    30.0000                                                 INTERVAL
  2016     4     9     0     0    0.0000000     GPS         TIME OF FIRST OBS
                                                            END OF HEADER
";

    #[test]
    fn rinex2_header() {
        let mut reader = Cursor::new(V2_HEADER);
        let (header, layout) = Header::parse(&mut reader).unwrap();
        assert_eq!(header.version, Version::new(2, 11));
        assert!(!layout.modern);
        assert_eq!(header.file_type, 'O');
        assert_eq!(header.system, 'G');
        assert_eq!(header.position, (4331297.3480, 567555.6390, 4633133.7180));
        assert_eq!(header.interval, Some(30.0));
        assert_eq!(header.time_system, "GPS");
        assert_eq!(
            header.first_epoch,
            Some(Epoch::from_gregorian_utc(2016, 4, 9, 0, 0, 0, 0))
        );
        let codes = header.observables.codes('R').unwrap();
        assert_eq!(
            codes,
            &["L1", "L2", "C1", "P1", "P2", "S1", "S2", "C2", "L5", "C5"]
        );
    }

    #[test]
    fn rinex2_header_missing_codes() {
        let content = V2_HEADER.replace("    10    L1", "    11    L1");
        let mut reader = Cursor::new(content);
        assert!(Header::parse(&mut reader).is_err());
    }

    #[test]
    fn unsupported_revision() {
        let content = V2_HEADER.replace("     2.11 ", "     2.12 ");
        let mut reader = Cursor::new(content);
        match Header::parse(&mut reader) {
            Err(Error::UnsupportedVersion(v)) => assert_eq!(v, "2.12"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn missing_version() {
        let mut reader = Cursor::new("ZIMJ                                                        MARKER NAME\n");
        assert!(matches!(
            Header::parse(&mut reader),
            Err(Error::FormatError(ParsingError::MissingVersion))
        ));
    }

    #[test]
    fn rinex3_system_codes() {
        let layout = ObsLayout::lookup(Version::new(3, 2)).unwrap();
        let lines = [
            "G   18 C1C L1C D1C S1C C1W S1W C2W L2W D2W S2W C2L L2L D2L  SYS / # / OBS TYPES",
            "       S2L C5Q L5Q D5Q S5Q                                  SYS / # / OBS TYPES",
            "C    8 C1I L1I D1I S1I C7I L7I D7I S7I                      SYS / # / OBS TYPES",
        ];
        let map = parse_system_codes(&lines, layout).unwrap();
        assert_eq!(map[&'G'].len(), 18);
        assert_eq!(map[&'G'][17], "S5Q");
        assert_eq!(
            map[&'C'],
            vec!["C2I", "L2I", "D2I", "S2I", "C7I", "L7I", "D7I", "S7I"]
        );

        let layout = ObsLayout::lookup(Version::new(3, 1)).unwrap();
        let map = parse_system_codes(&lines, layout).unwrap();
        assert_eq!(map[&'C'][0], "C1I");

        let duplicated = [lines[2], lines[2]];
        assert!(matches!(
            parse_system_codes(&duplicated, layout),
            Err(ParsingError::DuplicateSystem(_))
        ));
        let short = ["C    9 C1I L1I D1I S1I C7I L7I D7I S7I                      SYS / # / OBS TYPES"];
        assert!(matches!(
            parse_system_codes(&short, layout),
            Err(ParsingError::ObservableCount(_, 9, 8))
        ));
    }

    #[test]
    fn in_stream_header() {
        let layout = ObsLayout::lookup(Version::new(3, 2)).unwrap();
        let mut header = Header::default();
        let lines = [
            "  0000000.0000  0000000.0000  0000000.0000                  APPROX POSITION XYZ".to_string(),
            "    60.200                                                  INTERVAL".to_string(),
        ];
        header.merge(&lines, layout, true).unwrap();
        assert_eq!(header.interval, Some(60.2));
        assert_eq!(header.position, (0.0, 0.0, 0.0));
    }
}
