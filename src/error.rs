use thiserror::Error;

/// Errors that may rise while decoding RINEX content
#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("missing RINEX VERSION / TYPE header")]
    MissingVersion,
    #[error("invalid version \"{0}\"")]
    VersionParsing(String),
    #[error("invalid {0} field \"{1}\"")]
    InvalidField(&'static str, String),
    #[error("invalid epoch: {0}")]
    EpochOutOfRange(String),
    #[error("unknown satellite system \"{0}\"")]
    UnknownSystem(String),
    #[error("satellite system \"{0}\" is not declared in the header")]
    UndeclaredSystem(String),
    #[error("system {0}: {1} observation types declared, {2} found")]
    ObservableCount(String, usize, usize),
    #[error("observation types declared twice for system {0}")]
    DuplicateSystem(String),
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error("continuation line without epoch line")]
    OrphanLine,
    #[error("sampling interval can't be determined")]
    UndeterminedInterval,
    #[error("invalid coordinates line \"{0}\"")]
    Coordinates(String),
}

/// Numerical failures of the orbit and geometry solvers
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ArithmeticError {
    #[error("non finite value in {0}")]
    NonFinite(&'static str),
    #[error("degenerate {0}")]
    Degenerate(&'static str),
    #[error("kepler solver did not converge")]
    KeplerConvergence,
    #[error("geodetic latitude did not converge")]
    GeodeticConvergence,
}

/// Library errors. Reading errors abort the current file,
/// [Error::ArithmeticError] and [Error::EphemerisUnavailable]
/// only abort the current satellite.
#[derive(Error, Debug)]
pub enum Error {
    #[error("format error: {0}")]
    FormatError(#[from] ParsingError),
    #[error("unsupported RINEX version {0}")]
    UnsupportedVersion(String),
    #[error("arithmetic error: {0}")]
    ArithmeticError(#[from] ArithmeticError),
    #[error("navigation message unavailable: {0}")]
    EphemerisUnavailable(String),
    #[error("uncompress failed: {0}")]
    DecompressError(String),
    #[error("i/o error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("unsupported time system \"{0}\"")]
    UnsupportedTimeSystem(String),
}

impl Error {
    /// True for the failures that only concern one satellite at one epoch.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ArithmeticError(_) | Self::EphemerisUnavailable(_))
    }
}
