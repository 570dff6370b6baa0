//! Satellite system letters, as used in RINEX files
use gnss_rs::prelude::{Constellation, SV};

use crate::error::ParsingError;

/// Systems the processing chain knows how to handle
pub const SUPPORTED_SYSTEMS: [Constellation; 5] = [
    Constellation::GPS,
    Constellation::Glonass,
    Constellation::SBAS,
    Constellation::BeiDou,
    Constellation::Galileo,
];

/// Returns true if [Constellation] is processed
pub fn is_supported(constellation: Constellation) -> bool {
    SUPPORTED_SYSTEMS.contains(&constellation)
}

/// Interprets a RINEX system letter
pub fn from_letter(letter: char) -> Result<Constellation, ParsingError> {
    match letter.to_ascii_uppercase() {
        'G' => Ok(Constellation::GPS),
        'R' => Ok(Constellation::Glonass),
        'S' => Ok(Constellation::SBAS),
        'E' => Ok(Constellation::Galileo),
        'C' => Ok(Constellation::BeiDou),
        'J' => Ok(Constellation::QZSS),
        'I' => Ok(Constellation::IRNSS),
        'M' => Ok(Constellation::Mixed),
        _ => Err(ParsingError::UnknownSystem(letter.to_string())),
    }
}

/// RINEX system letter of this [Constellation]
pub fn letter(constellation: Constellation) -> char {
    match constellation {
        Constellation::GPS => 'G',
        Constellation::Glonass => 'R',
        Constellation::Galileo => 'E',
        Constellation::BeiDou => 'C',
        Constellation::QZSS => 'J',
        Constellation::IRNSS => 'I',
        Constellation::Mixed => 'M',
        c if c.is_sbas() => 'S',
        _ => '?',
    }
}

/// Builds a satellite from its system letter and number
pub fn satellite(letter: char, prn: u8) -> Result<SV, ParsingError> {
    let constellation = from_letter(letter)?;
    if constellation == Constellation::Mixed {
        return Err(ParsingError::UnknownSystem(letter.to_string()));
    }
    Ok(SV::new(constellation, prn))
}

/// Satellite code, as written in RINEX files ("G05")
pub fn code(sv: SV) -> String {
    format!("{}{:02}", letter(sv.constellation), sv.prn)
}
