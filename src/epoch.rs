//! Epoch parsing and calendar helpers.
//! RINEX timestamps are kept as [Epoch] holding the
//! calendar labels found in the file.
use std::str::FromStr;

use hifitime::{Duration, Epoch};

use crate::error::ParsingError;

#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
/// `EpochFlag` validates or describes events
/// that occured during an `epoch`
pub enum EpochFlag {
    /// Epoch is sane
    #[default]
    Ok,
    /// Power failure since previous epoch
    PowerFailure,
    /// Antenna is being moved at current epoch
    AntennaBeingMoved,
    /// Site has changed, received has moved since last epoch
    NewSiteOccupation,
    /// New information to come after this epoch
    HeaderInformationFollows,
    /// External event - significant event in this epoch
    ExternalEvent,
    /// Cycle slip at this epoch
    CycleSlip,
}

impl EpochFlag {
    /// Returns true if self describes a sampling epoch
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PowerFailure)
    }
    /// Returns true if the special lines following this flag
    /// are header lines to be merged into the header
    pub fn carries_header(self) -> bool {
        matches!(
            self,
            Self::NewSiteOccupation | Self::HeaderInformationFollows
        )
    }
}

impl FromStr for EpochFlag {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Self::Ok),
            "1" => Ok(Self::PowerFailure),
            "2" => Ok(Self::AntennaBeingMoved),
            "3" => Ok(Self::NewSiteOccupation),
            "4" => Ok(Self::HeaderInformationFollows),
            "5" => Ok(Self::ExternalEvent),
            "6" => Ok(Self::CycleSlip),
            _ => Err(ParsingError::InvalidField("epoch flag", s.to_string())),
        }
    }
}

/// First two digit year of the 20th century
const CENTURY_PIVOT: i32 = 89;

/// Completes two digit years: 89-99 => 19xx, 00-88 => 20xx.
/// Other years are returned as is.
pub(crate) fn complete_year(year: i32) -> i32 {
    match year {
        0..=99 if year >= CENTURY_PIVOT => year + 1900,
        0..=99 => year + 2000,
        _ => year,
    }
}

/// Builds an [Epoch] from calendar fields as they appear in RINEX files.
/// Two digit years are completed, see [complete_year].
/// Seconds and minutes in 60..=120 are carried over to the next
/// minute, respectively hour, preserving the elapsed time.
/// Larger values are invalid.
pub fn validate(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u32,
    second: u32,
    micros: u32,
) -> Result<Epoch, ParsingError> {
    let year = complete_year(year);

    let mut carry = 0_i64;
    let second = carry_over(second, 1, &mut carry)?;
    let minute = carry_over(minute, 60, &mut carry)?;

    if hour > 23 || micros > 999_999 {
        return Err(ParsingError::EpochOutOfRange(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
            year, month, day, hour, minute, second, micros
        )));
    }

    let epoch = Epoch::maybe_from_gregorian_utc(
        year,
        month,
        day,
        hour,
        minute,
        second,
        micros * 1_000,
    )
    .map_err(|e| ParsingError::EpochOutOfRange(e.to_string()))?;

    Ok(epoch + Duration::from_seconds(carry as f64))
}

fn carry_over(value: u32, unit: i64, carry: &mut i64) -> Result<u8, ParsingError> {
    match value {
        0..=59 => Ok(value as u8),
        60..=120 => {
            *carry += (value as i64 - 59) * unit;
            Ok(59)
        },
        _ => Err(ParsingError::EpochOutOfRange(format!(
            "{} is not a valid minute or second value",
            value
        ))),
    }
}

/// Splits a seconds field into whole seconds and microseconds
/// (rounded to a tenth of microsecond, then truncated).
pub(crate) fn split_seconds(seconds: f64) -> Result<(u32, u32), ParsingError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ParsingError::InvalidField("seconds", seconds.to_string()));
    }
    let whole = seconds.trunc();
    let tenths = ((seconds - whole) * 1.0E7).round() as u32;
    Ok((whole as u32, tenths / 10))
}

/// Calendar date, used to key data per day
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Date {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

const CUMULATED_DAYS: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

fn is_leap(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap(year) => 29,
        2 => 28,
        _ => 0,
    }
}

impl Date {
    /// Builds a new [Date], None if the day does not exist.
    pub fn new(year: i32, month: u8, day: u8) -> Option<Self> {
        if day == 0 || day > days_in_month(year, month) {
            None
        } else {
            Some(Self { year, month, day })
        }
    }

    /// Calendar date of this [Epoch] (UTC labels).
    pub fn from_epoch(epoch: Epoch) -> Self {
        let (year, month, day, _, _, _, _) = epoch.to_gregorian_utc();
        Self { year, month, day }
    }

    /// Builds a [Date] from a year and day of year (1..=366).
    pub fn from_ordinal(year: i32, doy: u16) -> Option<Self> {
        let days_in_year = if is_leap(year) { 366 } else { 365 };
        if doy == 0 || doy > days_in_year {
            return None;
        }
        let mut remaining = doy;
        for month in 1..=12 {
            let days = days_in_month(year, month) as u16;
            if remaining <= days {
                return Self::new(year, month, remaining as u8);
            }
            remaining -= days;
        }
        None
    }

    /// Day of year, starting at 1
    pub fn day_of_year(&self) -> u16 {
        let mut doy = CUMULATED_DAYS[(self.month as usize).saturating_sub(1) % 12] + self.day as u16;
        if self.month > 2 && is_leap(self.year) {
            doy += 1;
        }
        doy
    }

    /// Days since 1970-01-01
    pub(crate) fn days_since_unix(&self) -> i64 {
        let m = self.month as i64;
        let y = if m <= 2 { self.year as i64 - 1 } else { self.year as i64 };
        let era = if y >= 0 { y } else { y - 399 } / 400;
        let yoe = y - era * 400;
        let mp = if m > 2 { m - 3 } else { m + 9 };
        let doy = (153 * mp + 2) / 5 + self.day as i64 - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        era * 146_097 + doe - 719_468
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Time of day, with microsecond resolution
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TimeOfDay(u64);

impl TimeOfDay {
    pub const MIDNIGHT: Self = Self(0);
    /// Upper bound of any time of day
    pub(crate) const END: Self = Self(u64::MAX);

    pub fn new(hour: u8, minute: u8, second: u8, micros: u32) -> Self {
        Self(
            ((hour as u64 * 60 + minute as u64) * 60 + second as u64) * 1_000_000 + micros as u64,
        )
    }
    pub fn from_epoch(epoch: Epoch) -> Self {
        let (_, _, _, hh, mm, ss, ns) = epoch.to_gregorian_utc();
        Self::new(hh, mm, ss, ns / 1_000)
    }
    /// Whole seconds of day
    pub fn whole_seconds(&self) -> u32 {
        (self.0 / 1_000_000) as u32
    }
    /// Seconds of day, including the fractional part
    pub fn seconds(&self) -> f64 {
        self.0 as f64 * 1.0E-6
    }
    /// (hours, minutes, seconds, microseconds)
    pub fn components(&self) -> (u8, u8, u8, u32) {
        let s = self.whole_seconds();
        (
            (s / 3600) as u8,
            ((s / 60) % 60) as u8,
            (s % 60) as u8,
            (self.0 % 1_000_000) as u32,
        )
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = self.whole_seconds();
        write!(f, "{:02}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)?;
        let micros = self.0 % 1_000_000;
        if micros > 0 {
            write!(f, ".{:06}", micros)?;
        }
        Ok(())
    }
}

/// Splits an [Epoch] into its date and time of day
pub fn decompose(epoch: Epoch) -> (Date, TimeOfDay) {
    (Date::from_epoch(epoch), TimeOfDay::from_epoch(epoch))
}

/// Seconds of week since given origin, sub second part dropped.
/// Whole days are counted modulo 7 on the calendar.
pub(crate) fn week_seconds(epoch: Epoch, origin: Date, origin_seconds: u32) -> f64 {
    let (date, time) = decompose(epoch);
    let days = date.days_since_unix() - origin.days_since_unix();
    let total = days * 86_400 + time.whole_seconds() as i64 - origin_seconds as i64;
    total.rem_euclid(604_800) as f64
}
