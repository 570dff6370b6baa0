//! Observation RINEX files
use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, Seek, SeekFrom};
use std::path::Path;

use gnss_rs::prelude::SV;
use hifitime::Epoch;
use itertools::Itertools;
use log::{info, warn};

use crate::{
    epoch::Date,
    error::{Error, ParsingError},
    filename,
    header::Header,
    reader::BufferedReader,
    version::ObsLayout,
};

pub(crate) mod parsing;

use parsing::next_epoch;

/// Number of epoch deltas the sampling interval is deduced from
const INTERVAL_DELTAS: usize = 10;

/// Observation value, with its loss of lock indicator
/// and signal strength digits.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ObsValue {
    /// None when the field is blank
    pub value: Option<f64>,
    pub lli: u8,
    pub ssi: u8,
}

impl ObsValue {
    pub fn new(value: Option<f64>, lli: u8, ssi: u8) -> Self {
        Self { value, lli, ssi }
    }
    /// Measured value: blank and zero fields are not measurements.
    pub fn measurement(&self) -> Option<f64> {
        self.value.filter(|v| *v != 0.0)
    }
}

/// Observations of one satellite at one epoch, indexed by observation code
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub epoch: Epoch,
    pub sv: SV,
    pub values: HashMap<String, ObsValue>,
}

/// Observation RINEX file, open for streaming.
/// The sampling interval is known once opened: the header value is
/// checked against the spacing of the first epochs.
#[derive(Debug)]
pub struct ObservationFile<R> {
    name: String,
    header: Header,
    layout: &'static ObsLayout,
    reader: R,
}

impl ObservationFile<BufferedReader> {
    /// Opens given (possibly gzip compressed) observation file
    pub fn open(path: &Path) -> Result<Self, Error> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let reader = BufferedReader::open(path)?;
        Self::from_reader(&name, reader)
    }
}

impl<R: BufRead + Seek> ObservationFile<R> {
    /// Parses the header and determines the sampling interval.
    /// `name` is the file name, used for date deduction.
    pub fn from_reader(name: &str, mut reader: R) -> Result<Self, Error> {
        let (mut header, layout) = Header::parse(&mut reader)?;
        let data_start = reader.stream_position()?;

        let detected = detect_interval(&mut reader, &header, layout)?;
        reader.seek(SeekFrom::Start(data_start))?;

        header.interval = match (detected, header.interval) {
            (Some(detected), Some(declared)) => {
                if (detected - declared).abs() > f64::EPSILON {
                    warn!(
                        "{}: declared interval {} differs from observed interval {}",
                        name, declared, detected
                    );
                }
                Some(detected)
            },
            (Some(detected), None) => Some(detected),
            (None, Some(declared)) => {
                warn!(
                    "{}: interval could not be observed, using declared value {}",
                    name, declared
                );
                Some(declared)
            },
            (None, None) => return Err(ParsingError::UndeterminedInterval.into()),
        };

        Ok(Self {
            name: name.to_string(),
            header,
            layout,
            reader,
        })
    }
}

impl<R: BufRead> ObservationFile<R> {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn header(&self) -> &Header {
        &self.header
    }
    /// Sampling interval (s)
    pub fn interval(&self) -> f64 {
        self.header.interval.unwrap_or_default()
    }
    /// Observation date, as encoded in the file name
    pub fn filename_date(&self) -> Option<Date> {
        filename::date_from_name(&self.name)
    }
    /// Streams the observation records, in file order.
    /// Records repeating the previous epoch of a satellite are dropped.
    pub fn records(&mut self) -> Records<'_, R> {
        Records {
            file: self,
            pending: VecDeque::new(),
            last_seen: HashMap::new(),
            done: false,
        }
    }
}

/// Modal epoch spacing over the first epochs, rounded to the millisecond.
/// Events met on the way are applied to a copy of the header.
fn detect_interval<R: BufRead>(
    reader: &mut R,
    header: &Header,
    layout: &ObsLayout,
) -> Result<Option<f64>, Error> {
    let mut scratch = header.clone();
    let mut previous: Option<Epoch> = None;
    let mut deltas = Vec::<i64>::with_capacity(INTERVAL_DELTAS);

    while deltas.len() < INTERVAL_DELTAS {
        let block = match next_epoch(reader, &mut scratch, layout)? {
            Some(block) => block,
            None => break,
        };
        if let Some(previous) = previous {
            let dt = ((block.epoch - previous).to_seconds() * 1.0E3).round() as i64;
            if dt != 0 {
                deltas.push(dt);
            }
        }
        previous = Some(block.epoch);
    }

    // most frequent delta, earliest wins ties
    let counts = deltas.iter().counts();
    let modal = deltas
        .iter()
        .unique()
        .fold(None, |best: Option<(i64, usize)>, dt| {
            let n = counts[dt];
            match best {
                Some((_, m)) if m >= n => best,
                _ => Some((*dt, n)),
            }
        });

    match modal {
        Some((dt, _)) if dt <= 0 => Err(ParsingError::UndeterminedInterval.into()),
        Some((dt, _)) => Ok(Some(dt as f64 / 1.0E3)),
        None => Ok(None),
    }
}

/// Observation records iterator, see [ObservationFile::records].
/// The iterator fuses after the first error.
pub struct Records<'a, R> {
    file: &'a mut ObservationFile<R>,
    pending: VecDeque<ObservationRecord>,
    last_seen: HashMap<SV, Epoch>,
    done: bool,
}

impl<'a, R: BufRead> Records<'a, R> {
    /// Live header: in stream header blocks are applied as they are met
    pub fn header(&self) -> &Header {
        &self.file.header
    }
}

impl<'a, R: BufRead> Iterator for Records<'a, R> {
    type Item = Result<ObservationRecord, Error>;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }
            let file = &mut *self.file;
            match next_epoch(&mut file.reader, &mut file.header, file.layout) {
                Ok(Some(block)) => {
                    for (sv, values) in block.records {
                        if self.last_seen.insert(sv, block.epoch) == Some(block.epoch) {
                            info!("{} - {}: duplicate epoch dropped", block.epoch, sv);
                            continue;
                        }
                        self.pending.push_back(ObservationRecord {
                            epoch: block.epoch,
                            sv,
                            values,
                        });
                    }
                },
                Ok(None) => {
                    self.done = true;
                },
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                },
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    const V2_HEADER: &str = "     2.11           OBSERVATION DATA    G (GPS)             RINEX VERSION / TYPE
  4324754.1700  2657301.8400  3790657.2900                  APPROX POSITION XYZ
     4    L1    L2    C1    P2                              # / TYPES OF OBSERV
    30.000                                                  INTERVAL
                                                            END OF HEADER
";

    fn epoch_line(minute: u32, second: u32, sats: &str) -> String {
        format!(
            " 16  4  9  0{:3}{:11.7}  0{:3}{}\n",
            minute,
            second as f64,
            sats.len() / 3,
            sats
        )
    }

    fn v2_file(epochs: &[(u32, u32)]) -> String {
        let mut content = V2_HEADER.to_string();
        for (minute, second) in epochs {
            content.push_str(&epoch_line(*minute, *second, "G01G02"));
            content.push_str(" 110158208.24418  85837565.80545  20962406.617    20962410.324  \n");
            content.push_str(" 120158208.24418  95837565.80545  21962406.617    21962410.324  \n");
        }
        content
    }

    #[test]
    fn rinex2_stream() {
        let content = v2_file(&[(0, 0), (0, 15), (0, 30)]);
        let mut file = ObservationFile::from_reader("test0990.16o", Cursor::new(content)).unwrap();
        assert_eq!(file.interval(), 15.0);
        assert_eq!(file.header().position, (4324754.17, 2657301.84, 3790657.29));
        assert_eq!(file.filename_date(), Date::new(2016, 4, 8));

        let records = file.records().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].sv, SV::new(gnss_rs::prelude::Constellation::GPS, 1));
        assert_eq!(records[1].sv, SV::new(gnss_rs::prelude::Constellation::GPS, 2));
        assert_eq!(
            records[1].values["C1"],
            ObsValue::new(Some(21962406.617), 0, 0)
        );
        assert_eq!(
            records[5].epoch,
            Epoch::from_gregorian_utc(2016, 4, 9, 0, 0, 30, 0)
        );
    }

    #[test]
    fn duplicate_epochs() {
        let content = v2_file(&[(0, 0), (0, 30), (0, 30), (1, 0)]);
        let mut file = ObservationFile::from_reader("test", Cursor::new(content)).unwrap();
        assert_eq!(file.interval(), 30.0);
        assert_eq!(file.filename_date(), None);
        let records = file.records().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(records.len(), 6);
    }

    #[test]
    fn declared_interval_fallback() {
        let content = v2_file(&[(0, 0)]);
        let file = ObservationFile::from_reader("test", Cursor::new(content)).unwrap();
        assert_eq!(file.interval(), 30.0);

        let content = V2_HEADER.replace(
            "    30.000                                                  INTERVAL\n",
            "",
        );
        assert!(ObservationFile::from_reader("test", Cursor::new(content)).is_err());
    }

    #[test]
    fn fused_on_error() {
        let epochs = (0..12).map(|i| (i, 0)).collect::<Vec<_>>();
        let mut content = v2_file(&epochs);
        content.push_str(" 16  4  9  0 12  0.0000000  0  1G0X\n");
        let mut file = ObservationFile::from_reader("test", Cursor::new(content)).unwrap();
        assert_eq!(file.interval(), 60.0);
        let mut records = file.records();
        for _ in 0..24 {
            assert!(records.next().unwrap().is_ok());
        }
        assert!(records.next().unwrap().is_err());
        assert!(records.next().is_none());
    }

    #[test]
    fn obs_values() {
        assert_eq!(ObsValue::new(Some(0.0), 0, 0).measurement(), None);
        assert_eq!(ObsValue::new(None, 1, 0).measurement(), None);
        assert_eq!(ObsValue::new(Some(1.5), 0, 0).measurement(), Some(1.5));
    }
}
