//! Observation RINEX parsing
use std::collections::HashMap;
use std::io::BufRead;
use std::str::FromStr;

use gnss_rs::prelude::SV;
use hifitime::Epoch;
use log::{debug, info};

use crate::{
    columns::{column, digit, is_blank, parse_float, parse_int, tail},
    epoch::{split_seconds, validate, EpochFlag},
    error::{Error, ParsingError},
    header::{Header, ObservableCatalog},
    reader::{expect_line, next_line},
    system::satellite,
    version::ObsLayout,
};

use super::ObsValue;

/// Observation field width: F14.3, LLI and signal strength digits
const FIELD_WIDTH: usize = 16;

/// RINEX2 fields per record line
const V2_FIELDS_PER_LINE: usize = 5;

/// RINEX2 satellites per epoch line
const V2_SATS_PER_LINE: usize = 12;

/// Decoded epoch line
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EpochLine {
    /// None for special events
    pub epoch: Option<Epoch>,
    pub flag: EpochFlag,
    /// Number of satellites, or number of special lines
    pub count: usize,
    /// Receiver clock offset (s)
    pub clock_offset: Option<f64>,
    /// RINEX2 satellite list
    pub satellites: Vec<SV>,
}

/// Observations of every satellite, at one epoch
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EpochBlock {
    pub epoch: Epoch,
    pub flag: EpochFlag,
    pub records: Vec<(SV, HashMap<String, ObsValue>)>,
}

/// Returns true if given line starts a new epoch
pub(crate) fn is_new_epoch(line: &str, layout: &ObsLayout) -> bool {
    if layout.modern {
        line.starts_with('>')
    } else {
        !is_blank(line)
    }
}

/// Parses a RINEX2 satellite field ("G05", " 5", "R12")
pub(crate) fn parse_v2_satellite(field: &str) -> Result<SV, ParsingError> {
    let mut chars = field.chars();
    let letter = match chars.next() {
        Some(' ') => 'G',
        Some(c) => c.to_ascii_uppercase(),
        None => return Err(ParsingError::InvalidField("satellite", field.to_string())),
    };
    let prn = chars
        .as_str()
        .trim()
        .parse::<u8>()
        .map_err(|_| ParsingError::InvalidField("satellite", field.to_string()))?;
    satellite(letter, prn)
}

/// Decodes a RINEX2 epoch line, continuation lines
/// of the satellite list are pulled from the reader.
pub(crate) fn parse_v2_epoch<R: BufRead>(line: &str, reader: &mut R) -> Result<EpochLine, Error> {
    let flag = EpochFlag::from_str(column(line, 26, 29))?;
    let count = parse_int::<usize>(line, 29, 32, "number of satellites")?;

    if !flag.is_ok() {
        return Ok(EpochLine {
            epoch: None,
            flag,
            count,
            clock_offset: None,
            satellites: Vec::new(),
        });
    }

    let year = parse_int::<i32>(line, 0, 3, "year")?;
    let month = parse_int::<u8>(line, 3, 6, "month")?;
    let day = parse_int::<u8>(line, 6, 9, "day")?;
    let hour = parse_int::<u8>(line, 9, 12, "hour")?;
    let minute = parse_int::<u32>(line, 12, 15, "minute")?;
    let (second, micros) = split_seconds(parse_float(line, 15, 26, "seconds")?)?;
    let epoch = validate(year, month, day, hour, minute, second, micros)?;

    let clock_offset = tail(line, 68).trim().parse::<f64>().ok();

    let mut satellites = Vec::with_capacity(count);
    let mut content = line.to_string();
    while satellites.len() < count {
        if !satellites.is_empty() {
            content = expect_line(reader)?;
        }
        let on_line = (count - satellites.len()).min(V2_SATS_PER_LINE);
        for i in 0..on_line {
            let start = 32 + i * 3;
            let field = column(&content, start, start + 3);
            if field.is_empty() {
                return Err(ParsingError::InvalidField("satellite list", content.clone()).into());
            }
            satellites.push(parse_v2_satellite(field)?);
        }
    }

    Ok(EpochLine {
        epoch: Some(epoch),
        flag,
        count,
        clock_offset,
        satellites,
    })
}

/// Decodes a RINEX3 epoch line.
/// Special events may not carry a date, their epoch is None.
pub(crate) fn parse_v3_epoch(line: &str) -> Result<EpochLine, ParsingError> {
    if !line.starts_with('>') {
        return Err(ParsingError::InvalidField("epoch", line.to_string()));
    }
    let flag = EpochFlag::from_str(column(line, 31, 32))?;
    let count = parse_int::<usize>(line, 32, 35, "number of satellites")?;

    let date = || -> Result<Epoch, ParsingError> {
        let year = parse_int::<i32>(line, 1, 6, "year")?;
        let month = parse_int::<u8>(line, 6, 9, "month")?;
        let day = parse_int::<u8>(line, 9, 12, "day")?;
        let hour = parse_int::<u8>(line, 12, 15, "hour")?;
        let minute = parse_int::<u32>(line, 15, 18, "minute")?;
        let (second, micros) = split_seconds(parse_float(line, 18, 29, "seconds")?)?;
        validate(year, month, day, hour, minute, second, micros)
    };

    let epoch = match date() {
        Ok(epoch) => Some(epoch),
        Err(e) => {
            if flag.is_ok() {
                return Err(e);
            }
            None
        },
    };

    Ok(EpochLine {
        epoch,
        flag,
        count,
        clock_offset: tail(line, 42).trim().parse::<f64>().ok(),
        satellites: Vec::new(),
    })
}

/// Decodes one 16 column observation field.
/// Blank fields are (None, 0, 0).
pub(crate) fn parse_field(field: &str) -> Result<ObsValue, ParsingError> {
    if is_blank(field) {
        return Ok(ObsValue::default());
    }
    let value = column(field, 0, 14).trim();
    let value = if value.is_empty() {
        None
    } else {
        Some(
            value
                .parse::<f64>()
                .map_err(|_| ParsingError::InvalidField("observation", value.to_string()))?,
        )
    };
    Ok(ObsValue::new(value, digit(field, 14), digit(field, 15)))
}

/// Decodes the observations of one satellite, RINEX2 records
/// span ceil(n/5) lines.
pub(crate) fn parse_v2_record<R: BufRead>(
    reader: &mut R,
    codes: &[String],
) -> Result<HashMap<String, ObsValue>, Error> {
    let mut values = HashMap::with_capacity(codes.len());
    for chunk in codes.chunks(V2_FIELDS_PER_LINE) {
        let line = expect_line(reader)?;
        for (i, code) in chunk.iter().enumerate() {
            let field = column(&line, i * FIELD_WIDTH, (i + 1) * FIELD_WIDTH);
            values.insert(code.clone(), parse_field(field)?);
        }
    }
    Ok(values)
}

/// Decodes a RINEX3 observation line
pub(crate) fn parse_v3_record(
    line: &str,
    catalog: &ObservableCatalog,
) -> Result<(SV, HashMap<String, ObsValue>), ParsingError> {
    let id = column(line, 0, 3).replace(' ', "0");
    let letter = id
        .chars()
        .next()
        .ok_or_else(|| ParsingError::InvalidField("satellite", line.to_string()))?;
    let codes = catalog
        .codes(letter)
        .ok_or_else(|| ParsingError::UndeclaredSystem(letter.to_string()))?;
    let prn = column(&id, 1, 3)
        .parse::<u8>()
        .map_err(|_| ParsingError::InvalidField("satellite", id.clone()))?;
    let sv = satellite(letter, prn)?;

    let mut values = HashMap::with_capacity(codes.len());
    for (i, code) in codes.iter().enumerate() {
        let start = 3 + i * FIELD_WIDTH;
        let field = column(line, start, start + FIELD_WIDTH);
        values.insert(code.clone(), parse_field(field)?);
    }
    Ok((sv, values))
}

/// Reads `count` special lines following an event
fn special_lines<R: BufRead>(reader: &mut R, count: usize) -> Result<Vec<String>, Error> {
    (0..count).map(|_| expect_line(reader)).collect()
}

/// Applies a special event. Header blocks are merged into the live header,
/// other special lines are skipped.
fn handle_event<R: BufRead>(
    reader: &mut R,
    header: &mut Header,
    layout: &ObsLayout,
    event: &EpochLine,
) -> Result<(), Error> {
    let lines = special_lines(reader, event.count)?;
    match event.flag {
        EpochFlag::NewSiteOccupation | EpochFlag::HeaderInformationFollows => {
            if event.flag == EpochFlag::NewSiteOccupation {
                info!("new site occupation");
            }
            header.merge(&lines, layout, true)?;
        },
        flag => {
            debug!("{:?} event: {} special line(s) skipped", flag, lines.len());
        },
    }
    Ok(())
}

/// Reads up to the next sampling epoch, applying special events on the way.
/// Returns None at end of stream.
pub(crate) fn next_epoch<R: BufRead>(
    reader: &mut R,
    header: &mut Header,
    layout: &ObsLayout,
) -> Result<Option<EpochBlock>, Error> {
    loop {
        let line = match next_line(reader)? {
            Some(line) => line,
            None => return Ok(None),
        };
        if !is_new_epoch(&line, layout) {
            if !is_blank(&line) {
                debug!("unexpected line \"{}\"", line);
            }
            continue;
        }

        let event = if layout.modern {
            parse_v3_epoch(&line)?
        } else {
            parse_v2_epoch(&line, reader)?
        };

        if !event.flag.is_ok() {
            handle_event(reader, header, layout, &event)?;
            continue;
        }

        let epoch = event
            .epoch
            .ok_or_else(|| ParsingError::EpochOutOfRange(line.clone()))?;

        if event.flag == EpochFlag::PowerFailure {
            info!("{} - power failure between previous and current epoch", epoch);
        }

        let mut records = Vec::with_capacity(event.count);
        if layout.modern {
            for _ in 0..event.count {
                let line = expect_line(reader)?;
                records.push(parse_v3_record(&line, &header.observables)?);
            }
        } else {
            let codes = header.observables.codes(header.system).unwrap_or(&[]).to_vec();
            for sv in event.satellites {
                records.push((sv, parse_v2_record(reader, &codes)?));
            }
        }

        return Ok(Some(EpochBlock {
            epoch,
            flag: event.flag,
            records,
        }));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::version::Version;
    use gnss_rs::prelude::Constellation;
    use std::collections::BTreeMap;
    use std::io::Cursor;

    #[test]
    fn rinex2_satellites() {
        assert_eq!(
            parse_v2_satellite("G05").unwrap(),
            SV::new(Constellation::GPS, 5)
        );
        assert_eq!(
            parse_v2_satellite(" 5").unwrap(),
            SV::new(Constellation::GPS, 5)
        );
        assert_eq!(
            parse_v2_satellite("r12").unwrap(),
            SV::new(Constellation::Glonass, 12)
        );
        assert!(parse_v2_satellite("GXX").is_err());
        assert!(parse_v2_satellite("").is_err());
    }

    #[test]
    fn rinex2_epoch_continuation() {
        let line = " 16  4  9  0  0  0.0000000  0 14G01G02G03G04G05G06G07G08G09G10G11G12       -0.000123456";
        let mut reader = Cursor::new("                                R01R02\n");
        let epoch = parse_v2_epoch(line, &mut reader).unwrap();
        assert_eq!(
            epoch.epoch,
            Some(Epoch::from_gregorian_utc(2016, 4, 9, 0, 0, 0, 0))
        );
        assert_eq!(epoch.flag, EpochFlag::Ok);
        assert_eq!(epoch.count, 14);
        assert_eq!(epoch.satellites.len(), 14);
        assert_eq!(epoch.satellites[11], SV::new(Constellation::GPS, 12));
        assert_eq!(epoch.satellites[13], SV::new(Constellation::Glonass, 2));
        assert_eq!(epoch.clock_offset, Some(-0.000123456));
    }

    #[test]
    fn rinex2_event() {
        let line = "                            4  2";
        let mut reader = Cursor::new("");
        let epoch = parse_v2_epoch(line, &mut reader).unwrap();
        assert_eq!(epoch.epoch, None);
        assert_eq!(epoch.flag, EpochFlag::HeaderInformationFollows);
        assert_eq!(epoch.count, 2);
    }

    #[test]
    fn rinex2_truncated_satellite_list() {
        let line = " 16  4  9  0  0  0.0000000  0 14G01G02G03G04G05G06G07G08G09G10G11G12";
        let mut reader = Cursor::new("");
        assert!(parse_v2_epoch(line, &mut reader).is_err());
    }

    #[test]
    fn rinex3_epoch() {
        let epoch = parse_v3_epoch("> 2016 01 01 01 29 30.0000000  0 23      01.000001000000").unwrap();
        assert_eq!(
            epoch.epoch,
            Some(Epoch::from_gregorian_utc(2016, 1, 1, 1, 29, 30, 0))
        );
        assert_eq!(epoch.flag, EpochFlag::Ok);
        assert_eq!(epoch.count, 23);
        assert_eq!(epoch.clock_offset, Some(1.000001));

        let event = parse_v3_epoch(">                              4 11").unwrap();
        assert_eq!(event.epoch, None);
        assert_eq!(event.flag, EpochFlag::HeaderInformationFollows);
        assert_eq!(event.count, 11);

        assert!(parse_v3_epoch(">                              0 11").is_err());
        assert!(parse_v3_epoch("  2016 01 01 01 29 30.0000000  0 23").is_err());
    }

    #[test]
    fn observation_fields() {
        assert_eq!(
            parse_field("  23619095.450 7").unwrap(),
            ObsValue::new(Some(23619095.450), 0, 7)
        );
        assert_eq!(
            parse_field("    -53875.63216").unwrap(),
            ObsValue::new(Some(-53875.632), 1, 6)
        );
        assert_eq!(parse_field("                ").unwrap(), ObsValue::default());
        assert_eq!(parse_field("").unwrap(), ObsValue::default());
        assert_eq!(
            parse_field("        44.250").unwrap(),
            ObsValue::new(Some(44.25), 0, 0)
        );
        assert!(parse_field("  2361909X.450 7").is_err());
    }

    #[test]
    fn rinex3_record() {
        let mut map = BTreeMap::new();
        map.insert(
            'C',
            ["C2I", "L2I", "D2I", "S2I", "C7I", "L7I", "D7I", "S7I"]
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>(),
        );
        let catalog = ObservableCatalog::PerSystem(map);
        let line = "C05  40498966.534 5 210888798.39505       -39.173 5        35.750    40498964.477 6 163072617.03306       -30.366";
        let (sv, values) = parse_v3_record(line, &catalog).unwrap();
        assert_eq!(sv, SV::new(Constellation::BeiDou, 5));
        assert_eq!(values["C2I"], ObsValue::new(Some(40498966.534), 0, 5));
        assert_eq!(values["L2I"], ObsValue::new(Some(210888798.395), 0, 5));
        assert_eq!(values["D2I"], ObsValue::new(Some(-39.173), 0, 5));
        assert_eq!(values["S2I"], ObsValue::new(Some(35.750), 0, 0));
        assert_eq!(values["C7I"], ObsValue::new(Some(40498964.477), 0, 6));
        assert_eq!(values["L7I"], ObsValue::new(Some(163072617.033), 0, 6));
        assert_eq!(values["D7I"], ObsValue::new(Some(-30.366), 0, 0));
        assert_eq!(values["S7I"], ObsValue::default());

        let padded = "C 5  40498966.534 5";
        let (sv, _) = parse_v3_record(padded, &catalog).unwrap();
        assert_eq!(sv, SV::new(Constellation::BeiDou, 5));

        assert!(matches!(
            parse_v3_record("G05  40498966.534 5", &catalog),
            Err(ParsingError::UndeclaredSystem(_))
        ));
    }

    #[test]
    fn rinex2_multiline_record() {
        let codes = ["L1", "L2", "C1", "P1", "P2", "S1", "S2"]
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>();
        let mut reader = Cursor::new(
            " 110158208.24418  85837565.80545  20962406.617                    20962410.324  \n        48.000          30.000\n",
        );
        let values = parse_v2_record(&mut reader, &codes).unwrap();
        assert_eq!(values["L1"], ObsValue::new(Some(110158208.244), 1, 8));
        assert_eq!(values["L2"], ObsValue::new(Some(85837565.805), 4, 5));
        assert_eq!(values["C1"], ObsValue::new(Some(20962406.617), 0, 0));
        assert_eq!(values["P1"], ObsValue::default());
        assert_eq!(values["P2"], ObsValue::new(Some(20962410.324), 0, 0));
        assert_eq!(values["S1"], ObsValue::new(Some(48.0), 0, 0));
        assert_eq!(values["S2"], ObsValue::new(Some(30.0), 0, 0));

        let mut reader = Cursor::new(" 110158208.24418\n");
        assert!(parse_v2_record(&mut reader, &codes).is_err());
    }

    #[test]
    fn header_events() {
        let layout = ObsLayout::lookup(Version::new(3, 2)).unwrap();
        let mut header = Header {
            observables: ObservableCatalog::PerSystem(BTreeMap::new()),
            ..Default::default()
        };
        let content = ">                              4  1
  0000001.0000  0000002.0000  0000003.0000                  APPROX POSITION XYZ
>                              2  1
just a comment
";
        let mut reader = Cursor::new(content);
        assert!(next_epoch(&mut reader, &mut header, layout).unwrap().is_none());
        assert_eq!(header.position, (1.0, 2.0, 3.0));
    }
}
