//! Navigation RINEX parsing
use std::io::BufRead;

use gnss_rs::prelude::{Constellation, SV};
use hifitime::Epoch;

use crate::{
    columns::{column, fortran_float, is_blank, parse_float, parse_int},
    epoch::{split_seconds, validate},
    error::{Error, ParsingError},
    header::label,
    navigation::{Ephemeris, Family},
    reader::{expect_line, next_line},
    system::satellite,
    version::{NavLayout, Version},
};

/// Width of a broadcast value
const WORD_SIZE: usize = 19;

/// Navigation header fields
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NavHeader {
    pub version: Version,
    /// File type letter ('N', 'G', 'H')
    pub file_type: char,
    /// System letter (RINEX3)
    pub system: char,
}

/// Parses the header, up to and including END OF HEADER
pub(crate) fn parse_header<R: BufRead>(
    reader: &mut R,
) -> Result<(NavHeader, &'static NavLayout), Error> {
    let first = next_line(reader)?.ok_or(ParsingError::MissingVersion)?;
    if label(&first) != "RINEX VERSION / TYPE" {
        return Err(ParsingError::MissingVersion.into());
    }
    let version = column(&first, 0, 9).trim();
    let layout = version
        .parse::<Version>()
        .ok()
        .and_then(NavLayout::lookup)
        .ok_or_else(|| Error::UnsupportedVersion(version.to_string()))?;

    let header = NavHeader {
        version: layout.version,
        file_type: column(&first, 20, 21).chars().next().unwrap_or(' '),
        system: column(&first, 40, 41).chars().next().unwrap_or(' '),
    };

    loop {
        let line = expect_line(reader)?;
        if label(&line) == "END OF HEADER" {
            break;
        }
    }
    Ok((header, layout))
}

fn clock_terms(line: &str, start: usize) -> Result<(f64, f64, f64), ParsingError> {
    let term = |i: usize| {
        let offset = start + i * WORD_SIZE;
        fortran_float(column(line, offset, offset + WORD_SIZE), "clock")
    };
    Ok((term(0)?, term(1)?, term(2)?))
}

/// Decodes a RINEX2 epoch line: the system is given by the file type
pub(crate) fn parse_v2_epoch(
    line: &str,
    constellation: Constellation,
) -> Result<(SV, Epoch, (f64, f64, f64)), ParsingError> {
    let prn = parse_int::<u8>(line, 0, 2, "satellite number")?;
    let year = parse_int::<i32>(line, 2, 5, "year")?;
    let month = parse_int::<u8>(line, 5, 8, "month")?;
    let day = parse_int::<u8>(line, 8, 11, "day")?;
    let hour = parse_int::<u8>(line, 11, 14, "hour")?;
    let minute = parse_int::<u32>(line, 14, 17, "minute")?;
    let (second, micros) = split_seconds(parse_float(line, 17, 22, "seconds")?)?;
    let epoch = validate(year, month, day, hour, minute, second, micros)?;
    let clock = clock_terms(line, 22)?;
    Ok((SV::new(constellation, prn), epoch, clock))
}

/// Decodes a RINEX3 epoch line: "G01 2016 04 09 00 00 00"
pub(crate) fn parse_v3_epoch(line: &str) -> Result<(SV, Epoch, (f64, f64, f64)), ParsingError> {
    let letter = line
        .chars()
        .next()
        .ok_or_else(|| ParsingError::InvalidField("satellite", line.to_string()))?;
    let prn = parse_int::<u8>(line, 1, 3, "satellite number")?;
    let sv = satellite(letter, prn)?;
    let year = parse_int::<i32>(line, 4, 8, "year")?;
    let month = parse_int::<u8>(line, 8, 11, "month")?;
    let day = parse_int::<u8>(line, 11, 14, "day")?;
    let hour = parse_int::<u8>(line, 14, 17, "hour")?;
    let minute = parse_int::<u32>(line, 17, 20, "minute")?;
    let second = parse_int::<u32>(line, 20, 23, "seconds")?;
    let epoch = validate(year, month, day, hour, minute, second, 0)?;
    let clock = clock_terms(line, 23)?;
    Ok((sv, epoch, clock))
}

/// Reads the broadcast orbit lines following an epoch line
fn parse_orbits<R: BufRead>(
    reader: &mut R,
    family: Family,
    layout: &NavLayout,
    ephemeris: &mut Ephemeris,
) -> Result<(), Error> {
    let mut fields = family.fields().iter();
    for count in family.values_per_line() {
        let line = expect_line(reader)?;
        for i in 0..*count {
            let offset = layout.orbit_start + i * WORD_SIZE;
            let value = fortran_float(column(&line, offset, offset + WORD_SIZE), "orbit")?;
            if let Some(field) = fields.next() {
                ephemeris.set_orbit_f64(field, value);
            }
        }
    }
    Ok(())
}

/// Reads the next ephemeris frame. Returns None at end of stream.
pub(crate) fn next_frame<R: BufRead>(
    reader: &mut R,
    header: &NavHeader,
    layout: &NavLayout,
) -> Result<Option<Ephemeris>, Error> {
    let line = loop {
        match next_line(reader)? {
            Some(line) if is_blank(&line) => continue,
            Some(line) => break line,
            None => return Ok(None),
        }
    };

    if is_blank(column(&line, 0, layout.indent)) {
        return Err(ParsingError::OrphanLine.into());
    }

    let (sv, epoch, clock) = if layout.modern {
        parse_v3_epoch(&line)?
    } else {
        let constellation = layout
            .file_type_system(header.file_type)
            .ok_or_else(|| ParsingError::UnknownSystem(header.file_type.to_string()))?;
        parse_v2_epoch(&line, constellation)?
    };

    let family = Family::of(sv.constellation)
        .ok_or_else(|| ParsingError::UnknownSystem(sv.constellation.to_string()))?;

    let mut ephemeris = Ephemeris {
        sv,
        epoch,
        clock_bias: clock.0,
        clock_drift: clock.1,
        clock_drift_rate: clock.2,
        ..Default::default()
    };
    parse_orbits(reader, family, layout, &mut ephemeris)?;
    Ok(Some(ephemeris))
}
