//! Record validity: observables expected from the header,
//! compared against what each record provides
use std::collections::HashMap;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    observable::{Observable, Observables},
    observation::ObsValue,
};

bitflags! {
    /// Each bit is set when the expected and actual states of
    /// the observable differ. LLI bits are set on loss of lock.
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Validity: u32 {
        const LLI1 = 0x00001;
        const LLI2 = 0x00002;
        const C1 = 0x00004;
        const L1 = 0x00008;
        const L2 = 0x00010;
        const P1 = 0x00020;
        const P2 = 0x00040;
        const S1 = 0x00080;
        const S2 = 0x00100;
        const D1 = 0x00200;
        const D2 = 0x00400;
        const D5 = 0x00800;
        const C2 = 0x01000;
        const C5 = 0x02000;
        const L5 = 0x04000;
        const S5 = 0x08000;
        const LLI5 = 0x10000;
    }
}

impl Validity {
    /// Bit of given [Observable], empty for observables
    /// that are not monitored
    pub fn of(observable: Observable) -> Self {
        match observable {
            Observable::C1 => Self::C1,
            Observable::L1 => Self::L1,
            Observable::L2 => Self::L2,
            Observable::P1 => Self::P1,
            Observable::P2 => Self::P2,
            Observable::S1 => Self::S1,
            Observable::S2 => Self::S2,
            Observable::D1 => Self::D1,
            Observable::D2 => Self::D2,
            Observable::D5 => Self::D5,
            Observable::C2 => Self::C2,
            Observable::C5 => Self::C5,
            Observable::L5 => Self::L5,
            Observable::S5 => Self::S5,
            _ => Self::empty(),
        }
    }

    /// Bits of a list of observation codes. Unknown codes are ignored.
    pub fn from_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> Self {
        codes
            .into_iter()
            .filter_map(Observable::from_code)
            .fold(Self::empty(), |acc, observable| acc | Self::of(observable))
    }

    /// Bits describing one record: observation codes holding a value,
    /// plus loss of lock on the first, second and fifth carrier phases.
    pub fn actual(values: &HashMap<String, ObsValue>, observables: &Observables) -> Self {
        let mut bits = Self::from_codes(
            values
                .iter()
                .filter(|(_, value)| value.measurement().is_some())
                .map(|(code, _)| code.as_str()),
        );
        for (phase, lli) in [
            (Observable::L1, Self::LLI1),
            (Observable::L2, Self::LLI2),
            (Observable::L5, Self::LLI5),
        ] {
            if observables.lli(phase) & 0x01 != 0 {
                bits |= lli;
            }
        }
        bits
    }

    /// Compares the record against the declared observation codes
    pub fn evaluate<'a>(
        declared: impl IntoIterator<Item = &'a str>,
        values: &HashMap<String, ObsValue>,
        observables: &Observables,
    ) -> Self {
        Self::from_codes(declared) ^ Self::actual(values, observables)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(values: &[(&str, Option<f64>, u8)]) -> HashMap<String, ObsValue> {
        values
            .iter()
            .map(|(code, value, lli)| (code.to_string(), ObsValue::new(*value, *lli, 0)))
            .collect()
    }

    #[test]
    fn declared_codes() {
        let bits = Validity::from_codes(["L1", "L2", "C1", "P2", "S1", "T1", "C7"]);
        assert_eq!(
            bits,
            Validity::L1 | Validity::L2 | Validity::C1 | Validity::P2 | Validity::S1
        );
        assert_eq!(Validity::from_codes(["C1C", "C1W", "L5Q"]).bits(), 4 + 32 + 16384);
    }

    #[test]
    fn record_validity() {
        let declared = ["L1", "L2", "C1", "P2"];
        let values = record(&[
            ("L1", Some(1.0E8), 0),
            ("L2", Some(8.0E7), 0),
            ("C1", Some(2.0E7), 0),
            ("P2", Some(2.0E7), 0),
        ]);
        let observables = Observables::resolve(&values);
        assert_eq!(
            Validity::evaluate(declared, &values, &observables),
            Validity::empty()
        );

        let values = record(&[
            ("L1", Some(1.0E8), 1),
            ("L2", Some(8.0E7), 5),
            ("C1", Some(2.0E7), 0),
            ("P2", None, 0),
        ]);
        let observables = Observables::resolve(&values);
        let validity = Validity::evaluate(declared, &values, &observables);
        assert_eq!(validity, Validity::LLI1 | Validity::LLI2 | Validity::P2);
        assert_eq!(validity.bits(), 67);

        let values = record(&[("L1", Some(1.0E8), 2), ("S2", Some(40.0), 0)]);
        let observables = Observables::resolve(&values);
        let validity = Validity::evaluate(declared, &values, &observables);
        assert_eq!(
            validity,
            Validity::L2 | Validity::C1 | Validity::P2 | Validity::S2
        );
    }
}
