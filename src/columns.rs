//! Fixed column field helpers
use std::str::FromStr;

use crate::error::ParsingError;

/// Returns line[start..end], clamped to the line length.
/// Missing columns read as an empty field.
pub(crate) fn column(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("")
}

/// Returns line[start..], possibly empty.
pub(crate) fn tail(line: &str, start: usize) -> &str {
    column(line, start, line.len())
}

pub(crate) fn is_blank(field: &str) -> bool {
    field.trim().is_empty()
}

/// Parses an integer field, surrounding spaces are ignored.
pub(crate) fn parse_int<T: FromStr>(
    line: &str,
    start: usize,
    end: usize,
    name: &'static str,
) -> Result<T, ParsingError> {
    let field = column(line, start, end).trim();
    field
        .parse::<T>()
        .map_err(|_| ParsingError::InvalidField(name, field.to_string()))
}

/// Parses a float field, surrounding spaces are ignored.
pub(crate) fn parse_float(
    line: &str,
    start: usize,
    end: usize,
    name: &'static str,
) -> Result<f64, ParsingError> {
    let field = column(line, start, end).trim();
    field
        .parse::<f64>()
        .map_err(|_| ParsingError::InvalidField(name, field.to_string()))
}

/// Parses a Fortran formatted float (D exponent). Blank fields read as zero.
pub(crate) fn fortran_float(field: &str, name: &'static str) -> Result<f64, ParsingError> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(0.0);
    }
    field
        .replace(&['D', 'd'][..], "e")
        .parse::<f64>()
        .map_err(|_| ParsingError::InvalidField(name, field.to_string()))
}

/// Interprets a single column as a digit, anything else reads as zero.
pub(crate) fn digit(line: &str, pos: usize) -> u8 {
    match line.as_bytes().get(pos) {
        Some(c) if c.is_ascii_digit() => c - b'0',
        _ => 0,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn fixed_columns() {
        let line = "  2.11           OBSERVATION DATA";
        assert_eq!(column(line, 0, 9), "  2.11   ");
        assert_eq!(column(line, 20, 21), "O");
        assert_eq!(column(line, 60, 80), "");
        assert_eq!(column(line, 30, 80), "N DATA");
        assert_eq!(parse_float(line, 0, 9, "version").unwrap(), 2.11);
        assert!(parse_int::<u8>(line, 40, 43, "count").is_err());
    }
    #[test]
    fn fortran_notation() {
        assert_eq!(fortran_float(" 0.123D+02", "value").unwrap(), 12.3);
        assert_eq!(fortran_float("-1.5d-01", "value").unwrap(), -0.15);
        assert_eq!(fortran_float("                   ", "value").unwrap(), 0.0);
        assert!(fortran_float("1.0X+00", "value").is_err());
    }
    #[test]
    fn flag_digits() {
        assert_eq!(digit("  23619095.45041", 15), 1);
        assert_eq!(digit("  23619095.450 7", 15), 7);
        assert_eq!(digit("  23619095.450  ", 15), 0);
        assert_eq!(digit("  23619095.450", 15), 0);
    }
}
