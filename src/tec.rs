//! Slant TEC from dual frequency observables.
//! Values are expressed in TEC units (1E16 el.m-2).
use std::collections::BTreeMap;

use gnss_rs::prelude::Constellation;

use crate::{
    constants::{Carrier, IONO_K, SPEED_OF_LIGHT},
    observable::{Observable, Observables},
};

/// Carrier frequency slot, named after the RINEX band number
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Band {
    B1,
    B2,
    B5,
    B6,
    B7,
    B8,
}

/// Carrier frequencies (Hz) of one satellite, per [Band].
/// Bands a system does not transmit on are left unset.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Frequencies {
    pub f1: Option<f64>,
    pub f2: Option<f64>,
    pub f5: Option<f64>,
    pub f6: Option<f64>,
    pub f7: Option<f64>,
    pub f8: Option<f64>,
}

impl Frequencies {
    /// Frequency plan of CDMA systems. Glonass frequencies
    /// depend on the satellite, see [Self::glonass].
    pub fn of(constellation: Constellation) -> Option<Self> {
        match constellation {
            Constellation::GPS => Some(Self {
                f1: Some(Carrier::L1),
                f2: Some(Carrier::L2),
                f5: Some(Carrier::L5),
                ..Default::default()
            }),
            // band 1 codes are relabeled as band 2
            Constellation::BeiDou => Some(Self {
                f2: Some(Carrier::B1),
                f6: Some(Carrier::B3),
                f7: Some(Carrier::B2),
                ..Default::default()
            }),
            Constellation::Galileo => Some(Self {
                f1: Some(Carrier::L1),
                f5: Some(Carrier::L5),
                f6: Some(Carrier::E6),
                f7: Some(Carrier::E5B),
                f8: Some(Carrier::E5),
                ..Default::default()
            }),
            c if c.is_sbas() => Some(Self {
                f1: Some(Carrier::L1),
                f5: Some(Carrier::L5),
                ..Default::default()
            }),
            _ => None,
        }
    }

    /// Frequencies of the Glonass satellite on channel `k`
    pub fn glonass(k: i8) -> Self {
        Self {
            f1: Some(Carrier::G1 + k as f64 * Carrier::G1_STEP),
            f2: Some(Carrier::G2 + k as f64 * Carrier::G2_STEP),
            ..Default::default()
        }
    }

    pub fn get(&self, band: Band) -> Option<f64> {
        match band {
            Band::B1 => self.f1,
            Band::B2 => self.f2,
            Band::B5 => self.f5,
            Band::B6 => self.f6,
            Band::B7 => self.f7,
            Band::B8 => self.f8,
        }
    }
}

/// Frequency dependent factor f1²f2² / (K (f1² - f2²)), in TECU.m-1
pub fn tec_factor(f1: f64, f2: f64) -> f64 {
    let (f1, f2) = (f1.powi(2), f2.powi(2));
    f1 * f2 / (IONO_K * (f1 - f2)) * 1.0E-16
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && v.is_finite())
}

/// TEC from two carrier phases (cycles)
pub fn phase_tec(
    l1: Option<f64>,
    l2: Option<f64>,
    f1: Option<f64>,
    f2: Option<f64>,
) -> Option<f64> {
    let (f1, f2) = (usable(f1)?, usable(f2)?);
    let (l1, l2) = (usable(l1)?, usable(l2)?);
    Some(tec_factor(f1, f2) * (SPEED_OF_LIGHT / f1 * l1 - SPEED_OF_LIGHT / f2 * l2))
}

/// TEC from two pseudo ranges (m)
pub fn code_tec(
    p1: Option<f64>,
    p2: Option<f64>,
    f1: Option<f64>,
    f2: Option<f64>,
) -> Option<f64> {
    let (f1, f2) = (usable(f1)?, usable(f2)?);
    let (p1, p2) = (usable(p1)?, usable(p2)?);
    Some(tec_factor(f1, f2) * (p2 - p1))
}

/// Single frequency TEC, from code minus phase divergence
pub fn phase_code_tec(l: Option<f64>, c: Option<f64>, f: Option<f64>) -> Option<f64> {
    let f = usable(f)?;
    let (l, c) = (usable(l)?, usable(c)?);
    Some(0.5 * f.powi(2) / IONO_K * (c - l * SPEED_OF_LIGHT / f) * 1.0E-16)
}

/// How a [Combination] combines its observables
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Form {
    /// Two carrier phases
    Phase,
    /// Two pseudo ranges
    Code,
    /// Phase and pseudo range on one frequency
    PhaseCode,
}

/// Observable pairs TEC is derived from
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Combination {
    L1L2,
    L1L5,
    L2L5,
    L2L6,
    L2L7,
    L6L7,
    P1P2,
    C1P2,
    C1C5,
    C1C2,
    C2C5,
    C2C6,
    C2C7,
    C6C7,
    L1C1,
    L2C2,
    L8C8,
}

impl Combination {
    pub const ALL: [Self; 17] = [
        Self::L1L2,
        Self::L1L5,
        Self::L2L5,
        Self::L2L6,
        Self::L2L7,
        Self::L6L7,
        Self::P1P2,
        Self::C1P2,
        Self::C1C5,
        Self::C1C2,
        Self::C2C5,
        Self::C2C6,
        Self::C2C7,
        Self::C6C7,
        Self::L1C1,
        Self::L2C2,
        Self::L8C8,
    ];

    /// Form, first (observable, band), second (observable, band)
    fn definition(&self) -> (Form, (Observable, Band), (Observable, Band)) {
        use Band::*;
        use Observable as O;
        match self {
            Self::L1L2 => (Form::Phase, (O::L1, B1), (O::L2, B2)),
            Self::L1L5 => (Form::Phase, (O::L1, B1), (O::L5, B5)),
            Self::L2L5 => (Form::Phase, (O::L2, B2), (O::L5, B5)),
            Self::L2L6 => (Form::Phase, (O::L2, B2), (O::L6, B6)),
            Self::L2L7 => (Form::Phase, (O::L2, B2), (O::L7, B7)),
            Self::L6L7 => (Form::Phase, (O::L6, B6), (O::L7, B7)),
            Self::P1P2 => (Form::Code, (O::P1, B1), (O::P2, B2)),
            Self::C1P2 => (Form::Code, (O::C1, B1), (O::P2, B2)),
            Self::C1C5 => (Form::Code, (O::C1, B1), (O::C5, B5)),
            Self::C1C2 => (Form::Code, (O::C1, B1), (O::C2, B2)),
            Self::C2C5 => (Form::Code, (O::C2, B2), (O::C5, B5)),
            Self::C2C6 => (Form::Code, (O::C2, B2), (O::C6, B6)),
            Self::C2C7 => (Form::Code, (O::C2, B2), (O::C7, B7)),
            Self::C6C7 => (Form::Code, (O::C6, B6), (O::C7, B7)),
            Self::L1C1 => (Form::PhaseCode, (O::L1, B1), (O::C1, B1)),
            Self::L2C2 => (Form::PhaseCode, (O::L2, B2), (O::C2, B2)),
            Self::L8C8 => (Form::PhaseCode, (O::L8, B8), (O::C8, B8)),
        }
    }

    pub fn form(&self) -> Form {
        self.definition().0
    }

    /// Evaluates this combination. None when an observable
    /// or a frequency is missing.
    pub fn evaluate(&self, observables: &Observables, frequencies: &Frequencies) -> Option<f64> {
        let (form, (o1, b1), (o2, b2)) = self.definition();
        let (v1, v2) = (observables.value(o1), observables.value(o2));
        let (f1, f2) = (frequencies.get(b1), frequencies.get(b2));
        match form {
            Form::Phase => phase_tec(v1, v2, f1, f2),
            Form::Code => code_tec(v1, v2, f1, f2),
            Form::PhaseCode => phase_code_tec(v1, v2, f1),
        }
    }
}

impl std::fmt::Display for Combination {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

/// TEC values of one record, per [Combination]
pub type TecValues = BTreeMap<Combination, f64>;

/// [TecEngine] evaluates the combinations it was built with.
/// Other combinations are never computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TecEngine {
    enabled: Vec<Combination>,
}

impl TecEngine {
    pub fn new(combinations: impl IntoIterator<Item = Combination>) -> Self {
        let mut enabled = combinations.into_iter().collect::<Vec<_>>();
        enabled.sort();
        enabled.dedup();
        Self { enabled }
    }

    pub fn is_enabled(&self, combination: Combination) -> bool {
        self.enabled.contains(&combination)
    }

    pub fn enabled(&self) -> &[Combination] {
        &self.enabled
    }

    pub fn compute(&self, observables: &Observables, frequencies: &Frequencies) -> TecValues {
        self.enabled
            .iter()
            .filter_map(|c| c.evaluate(observables, frequencies).map(|tec| (*c, tec)))
            .collect()
    }
}
