//! Output records: column layout, formatting and the writer interface
use gnss_rs::prelude::SV;
use hifitime::Epoch;
use nalgebra::Vector3;

use crate::{
    epoch::TimeOfDay,
    error::Error,
    observable::{Observable, Observables},
    tec::{Combination, Form, TecValues},
    validity::Validity,
};

/// Output column
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// Time slot number: time of day over sampling interval
    Tsn,
    /// Fractional hour of day
    Hour,
    Datetime,
    Elevation,
    Azimuth,
    /// Observed value of this group
    Value(Observable),
    /// Loss of lock indicator of this group
    Lli(Observable),
    Tec(Combination),
    Validity,
    SatX,
    SatY,
    SatZ,
    SiteX,
    SiteY,
    SiteZ,
    /// Site longitude
    SiteL,
    /// Site latitude
    SiteB,
    /// Site height
    SiteH,
}

/// Numeric layout of a [Field]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    Integer(usize),
    /// Fixed point. Signed formats reserve a blank in place
    /// of the sign of positive values.
    Float {
        width: usize,
        precision: usize,
        signed: bool,
    },
    Text,
}

const fn signed(width: usize, precision: usize) -> Format {
    Format::Float {
        width,
        precision,
        signed: true,
    }
}

impl Field {
    /// Every column, in natural order
    pub const ALL: [Self; 54] = [
        Self::Tsn,
        Self::Hour,
        Self::Datetime,
        Self::Elevation,
        Self::Azimuth,
        Self::Value(Observable::P1),
        Self::Lli(Observable::P1),
        Self::Value(Observable::P2),
        Self::Lli(Observable::P2),
        Self::Tec(Combination::P1P2),
        Self::Value(Observable::L1),
        Self::Lli(Observable::L1),
        Self::Value(Observable::L2),
        Self::Lli(Observable::L2),
        Self::Tec(Combination::L1L2),
        Self::Validity,
        Self::Value(Observable::S1),
        Self::Lli(Observable::S1),
        Self::Value(Observable::S2),
        Self::Lli(Observable::S2),
        Self::Value(Observable::S5),
        Self::Lli(Observable::S5),
        Self::Value(Observable::C1),
        Self::Lli(Observable::C1),
        Self::Value(Observable::C2),
        Self::Lli(Observable::C2),
        Self::Tec(Combination::C1P2),
        Self::Tec(Combination::L1C1),
        Self::Value(Observable::L5),
        Self::Lli(Observable::L5),
        Self::Tec(Combination::L1L5),
        Self::Value(Observable::C5),
        Self::Lli(Observable::C5),
        Self::Tec(Combination::C1C5),
        Self::Tec(Combination::L2L5),
        Self::Tec(Combination::C1C2),
        Self::Tec(Combination::C2C5),
        Self::SatX,
        Self::SatY,
        Self::SatZ,
        Self::SiteX,
        Self::SiteY,
        Self::SiteZ,
        Self::SiteL,
        Self::SiteB,
        Self::SiteH,
        Self::Tec(Combination::L2L6),
        Self::Tec(Combination::L2L7),
        Self::Tec(Combination::L6L7),
        Self::Tec(Combination::C2C6),
        Self::Tec(Combination::C2C7),
        Self::Tec(Combination::C6C7),
        Self::Tec(Combination::L2C2),
        Self::Tec(Combination::L8C8),
    ];

    pub fn label(&self) -> String {
        match self {
            Self::Tsn => "tsn".to_string(),
            Self::Hour => "hour".to_string(),
            Self::Datetime => "datetime".to_string(),
            Self::Elevation => "el".to_string(),
            Self::Azimuth => "az".to_string(),
            Self::Value(o) => o.to_string().to_lowercase(),
            Self::Lli(o) => format!("{}.lli", o.to_string().to_lowercase()),
            Self::Tec(c) => format!("tec.{}", c),
            Self::Validity => "validity".to_string(),
            Self::SatX => "sat.x".to_string(),
            Self::SatY => "sat.y".to_string(),
            Self::SatZ => "sat.z".to_string(),
            Self::SiteX => "site.x".to_string(),
            Self::SiteY => "site.y".to_string(),
            Self::SiteZ => "site.z".to_string(),
            Self::SiteL => "site.l".to_string(),
            Self::SiteB => "site.b".to_string(),
            Self::SiteH => "site.h".to_string(),
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().find(|f| f.label() == label).copied()
    }

    pub fn format(&self) -> Format {
        match self {
            Self::Tsn => Format::Integer(11),
            Self::Hour => Format::Float {
                width: 14,
                precision: 11,
                signed: false,
            },
            Self::Datetime => Format::Text,
            Self::Elevation => signed(10, 5),
            Self::Azimuth => signed(11, 5),
            Self::Value(_) => signed(16, 3),
            Self::Lli(_) => Format::Integer(1),
            Self::Tec(c) => match c.form() {
                Form::Code => signed(10, 3),
                Form::Phase | Form::PhaseCode => signed(21, 3),
            },
            Self::Validity => Format::Integer(7),
            Self::SatX | Self::SatY | Self::SatZ => signed(23, 12),
            Self::SiteX | Self::SiteY | Self::SiteZ => signed(23, 12),
            Self::SiteL => signed(17, 12),
            Self::SiteB => signed(16, 12),
            Self::SiteH => signed(18, 12),
        }
    }

    /// Fortran edit descriptor. `datetime_width` is the length
    /// of formatted datetimes.
    pub fn fortran(&self, datetime_width: usize) -> String {
        match self {
            Self::SiteL | Self::SiteB | Self::SiteH => "F23.12".to_string(),
            _ => match self.format() {
                Format::Integer(width) => format!("I{}", width),
                Format::Float {
                    width, precision, ..
                } => format!("F{}.{}", width, precision),
                Format::Text => format!("A{}", datetime_width),
            },
        }
    }

    /// [Combination] this column requires
    pub fn combination(&self) -> Option<Combination> {
        match self {
            Self::Tec(c) => Some(*c),
            _ => None,
        }
    }
}

/// Time slot number: seconds of day over `interval`,
/// fractions above one half round up.
pub fn time_slot(time: TimeOfDay, interval: f64) -> i64 {
    if interval <= 0.0 {
        return 0;
    }
    let tsn = time.seconds() / interval;
    if tsn.fract() > 0.5 {
        tsn.ceil() as i64
    } else {
        tsn.floor() as i64
    }
}

/// Fractional hour of day
pub fn fractional_hour(time: TimeOfDay) -> f64 {
    let (h, m, s, us) = time.components();
    ((us as f64 * 1.0E-6 + s as f64) / 60.0 + m as f64) / 60.0 + h as f64
}

fn format_float(value: f64, width: usize, precision: usize, signed: bool) -> String {
    let text = if signed && !value.is_sign_negative() {
        format!(" {:.*}", precision, value)
    } else {
        format!("{:.*}", precision, value)
    };
    format!("{:>width$}", text, width = width)
}

/// Data of one satellite at one epoch
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub epoch: Epoch,
    pub sv: SV,
    /// Elevation (degrees)
    pub elevation: f64,
    /// Azimuth (degrees)
    pub azimuth: f64,
    pub observables: Observables,
    pub tec: TecValues,
    pub validity: Validity,
    /// Satellite ECEF position (m)
    pub satellite: Vector3<f64>,
    /// Site ECEF position (m)
    pub site: Vector3<f64>,
    /// Site longitude, latitude (degrees) and height (m)
    pub site_geodetic: (f64, f64, f64),
}

enum Value<'a> {
    Integer(i64),
    Float(f64),
    Text(&'a str),
}

/// Record layout: the ordered list of output columns
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    fields: Vec<Field>,
}

impl Layout {
    /// Parses a comma separated list of column labels.
    /// Whitespaces are ignored, `all` selects every column (alphabetical order).
    pub fn parse(description: &str) -> Result<Self, Error> {
        let cleaned = description
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        let labels = cleaned.split(',').collect::<Vec<_>>();

        if labels.contains(&"all") {
            let mut fields = Field::ALL.to_vec();
            fields.sort_by_key(|f| f.label());
            return Ok(Self { fields });
        }

        let fields = labels
            .iter()
            .map(|label| {
                Field::from_label(label)
                    .ok_or_else(|| Error::ConfigError(format!("wrong format value: <{}>", label)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn labels(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.label()).collect()
    }

    /// TEC combinations this layout displays
    pub fn combinations(&self) -> impl Iterator<Item = Combination> + '_ {
        self.fields.iter().filter_map(|f| f.combination())
    }

    /// Fortran format of one record, "(I11,1X,F14.11,...)"
    pub fn fortran(&self, datetime_width: usize) -> String {
        let descriptors = self
            .fields
            .iter()
            .map(|f| f.fortran(datetime_width))
            .collect::<Vec<_>>();
        format!("({})", descriptors.join(",1X,"))
    }

    fn value<'a>(field: &Field, row: &OutputRow, interval: f64, datetime: &'a str) -> Value<'a> {
        let time = TimeOfDay::from_epoch(row.epoch);
        match field {
            Field::Tsn => Value::Integer(time_slot(time, interval)),
            Field::Hour => Value::Float(fractional_hour(time)),
            Field::Datetime => Value::Text(datetime),
            Field::Elevation => Value::Float(row.elevation),
            Field::Azimuth => Value::Float(row.azimuth),
            Field::Value(o) => Value::Float(row.observables.get(*o).value.unwrap_or(0.0)),
            Field::Lli(o) => Value::Integer(row.observables.lli(*o) as i64),
            Field::Tec(c) => Value::Float(row.tec.get(c).copied().unwrap_or(0.0)),
            Field::Validity => Value::Integer(row.validity.bits() as i64),
            Field::SatX => Value::Float(row.satellite.x),
            Field::SatY => Value::Float(row.satellite.y),
            Field::SatZ => Value::Float(row.satellite.z),
            Field::SiteX => Value::Float(row.site.x),
            Field::SiteY => Value::Float(row.site.y),
            Field::SiteZ => Value::Float(row.site.z),
            Field::SiteL => Value::Float(row.site_geodetic.0),
            Field::SiteB => Value::Float(row.site_geodetic.1),
            Field::SiteH => Value::Float(row.site_geodetic.2),
        }
    }

    /// Formats one record line (newline terminated). `interval` is the
    /// observation interval, `datetime` the formatted epoch.
    pub fn format(&self, row: &OutputRow, interval: f64, datetime: &str) -> String {
        let mut line = self
            .fields
            .iter()
            .map(|field| {
                let value = Self::value(field, row, interval, datetime);
                match (field.format(), value) {
                    (
                        Format::Float {
                            width,
                            precision,
                            signed,
                        },
                        Value::Float(v),
                    ) => format_float(v, width, precision, signed),
                    (Format::Integer(width), Value::Integer(v)) => {
                        format!("{:>width$}", v, width = width)
                    },
                    (_, Value::Integer(v)) => v.to_string(),
                    (_, Value::Float(v)) => v.to_string(),
                    (_, Value::Text(s)) => s.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        line.push('\n');
        line
    }
}

/// Output sink of the processing chain. One writer
/// is created per observation file.
pub trait Writer {
    /// Site position changed at `epoch`: ECEF (m) and
    /// geodetic (degrees, degrees, m) coordinates
    fn update_position(
        &mut self,
        epoch: Epoch,
        xyz: (f64, f64, f64),
        lbh: (f64, f64, f64),
    ) -> Result<(), Error>;

    /// New satellite: its description and the navigation file in use
    fn update_satellite(
        &mut self,
        sv: SV,
        definition: &str,
        navigation: Option<&str>,
    ) -> Result<(), Error>;

    fn write(&mut self, row: &OutputRow) -> Result<(), Error>;

    /// Observation file fully processed
    fn end_of_file(&mut self) -> Result<(), Error>;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::observation::ObsValue;
    use gnss_rs::prelude::Constellation;
    use std::collections::HashMap;

    #[test]
    fn labels() {
        assert_eq!(Field::ALL.len(), 54);
        let labels = Field::ALL.iter().map(|f| f.label()).collect::<Vec<_>>();
        assert_eq!(labels[5], "p1");
        assert_eq!(labels[6], "p1.lli");
        assert_eq!(labels[9], "tec.p1p2");
        assert_eq!(labels[53], "tec.l8c8");
        for label in &labels {
            assert_eq!(Field::from_label(label).map(|f| f.label()), Some(label.clone()));
        }
        assert_eq!(Field::from_label("tec.l1l3"), None);
    }

    #[test]
    fn layouts() {
        let layout = Layout::parse(" datetime, EL,az , tec.l1l2,validity").unwrap();
        assert_eq!(layout.labels(), ["datetime", "el", "az", "tec.l1l2", "validity"]);
        assert_eq!(layout.combinations().collect::<Vec<_>>(), [Combination::L1L2]);
        assert_eq!(layout.fortran(17), "(A17,1X,F10.5,1X,F11.5,1X,F21.3,1X,I7)");

        let all = Layout::parse("tsn, all").unwrap();
        assert_eq!(all.fields().len(), 54);
        assert_eq!(all.labels()[0], "az");
        assert_eq!(all.labels()[1], "c1");
        assert_eq!(all.labels()[2], "c1.lli");
        assert_eq!(all.combinations().count(), 17);

        assert!(Layout::parse("el, tec.l9l9").is_err());
        assert!(Layout::parse("").is_err());
        assert!(Layout::parse("el,,az").is_err());

        let layout = Layout::parse("site.l,site.b,site.h,hour,p1.lli").unwrap();
        assert_eq!(layout.fortran(0), "(F23.12,1X,F23.12,1X,F23.12,1X,F14.11,1X,I1)");
    }

    #[test]
    fn time_columns() {
        assert_eq!(time_slot(TimeOfDay::new(0, 0, 30, 0), 30.0), 1);
        assert_eq!(time_slot(TimeOfDay::new(1, 0, 0, 0), 30.0), 120);
        assert_eq!(time_slot(TimeOfDay::new(0, 0, 45, 0), 30.0), 1);
        assert_eq!(time_slot(TimeOfDay::new(0, 0, 46, 0), 30.0), 2);
        assert_eq!(time_slot(TimeOfDay::new(0, 0, 15, 0), 0.0), 0);
        assert_eq!(fractional_hour(TimeOfDay::new(1, 30, 0, 0)), 1.5);
        assert_eq!(fractional_hour(TimeOfDay::new(0, 0, 36, 0)), 0.01);
    }

    #[test]
    fn signed_floats() {
        assert_eq!(format_float(12.3, 10, 5, true), "  12.30000");
        assert_eq!(format_float(-12.3, 10, 5, true), " -12.30000");
        assert_eq!(format_float(0.0, 10, 3, true), "     0.000");
        assert_eq!(format_float(123456.0, 5, 1, true), " 123456.0");
        assert_eq!(format_float(0.25, 14, 11, false), " 0.25000000000");
    }

    #[test]
    fn record_lines() {
        let mut values = HashMap::new();
        values.insert("L1".to_string(), ObsValue::new(Some(110158208.244), 1, 8));
        values.insert("C1".to_string(), ObsValue::new(Some(20962406.617), 0, 0));
        let mut tec = TecValues::new();
        tec.insert(Combination::L1L2, -12.5);

        let row = OutputRow {
            epoch: Epoch::from_gregorian_utc(2016, 4, 9, 0, 1, 30, 0),
            sv: SV::new(Constellation::GPS, 1),
            elevation: 45.25,
            azimuth: 300.0,
            observables: Observables::resolve(&values),
            tec,
            validity: Validity::LLI1 | Validity::P2,
            satellite: Vector3::new(1.0, -2.0, 3.0),
            site: Vector3::zeros(),
            site_geodetic: (7.5, 46.0, 956.0),
        };

        let layout =
            Layout::parse("tsn,hour,datetime,el,az,l1,l1.lli,l2,tec.l1l2,tec.c1p2,validity")
                .unwrap();
        assert_eq!(
            layout.format(&row, 30.0, "2016-100 00:01:30"),
            "          3  0.02500000000 2016-100 00:01:30   45.25000   300.00000    110158208.244 1            0.000               -12.500      0.000      65\n"
        );

        let layout = Layout::parse("sat.y,site.b").unwrap();
        assert_eq!(
            layout.format(&row, 30.0, ""),
            "        -2.000000000000  46.000000000000\n"
        );
    }
}
