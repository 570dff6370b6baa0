//! Observable groups: observation codes sharing a physical
//! meaning (kind of measurement and frequency band).
use std::collections::HashMap;

use crate::observation::ObsValue;

/// Kind of measurement and frequency band
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Observable {
    C1,
    C2,
    C3,
    C5,
    C6,
    C7,
    C8,
    P1,
    P2,
    P5,
    P6,
    P7,
    P8,
    L1,
    L2,
    L3,
    L5,
    L6,
    L7,
    L8,
    S1,
    S2,
    S3,
    S5,
    S6,
    S7,
    S8,
    D1,
    D2,
    D3,
    D5,
    D6,
    D7,
    D8,
}

/// (group, bare code, attributes appended to the bare code, extra codes)
struct Membership {
    group: Observable,
    bare: Option<&'static str>,
    attributes: &'static str,
    extra: &'static [&'static str],
}

const fn member(
    group: Observable,
    bare: &'static str,
    attributes: &'static str,
) -> Membership {
    Membership {
        group,
        bare: Some(bare),
        attributes,
        extra: &[],
    }
}

const fn listed(group: Observable, extra: &'static [&'static str]) -> Membership {
    Membership {
        group,
        bare: None,
        attributes: "",
        extra,
    }
}

const MEMBERSHIPS: [Membership; 34] = [
    member(Observable::C1, "C1", "CSLXYMABCZ"),
    member(Observable::C2, "C2", "CDSLXYMIQ"),
    listed(Observable::C3, &["C3I", "C3Q", "C3X"]),
    member(Observable::C5, "C5", "IQX"),
    member(Observable::C6, "C6", "IQXABCZ"),
    member(Observable::C7, "C7", "IQX"),
    member(Observable::C8, "C8", "IQX"),
    listed(Observable::P1, &["P1", "C1P", "C1W"]),
    listed(Observable::P2, &["P2", "C2P", "C2W"]),
    listed(Observable::P5, &["P5"]),
    listed(Observable::P6, &["P6"]),
    listed(Observable::P7, &["P7"]),
    listed(Observable::P8, &["P8"]),
    member(Observable::L1, "L1", "CSLXPWYMNABCZ"),
    member(Observable::L2, "L2", "CDSLXPWYMNIQ"),
    listed(Observable::L3, &["L3I", "L3Q", "L3X"]),
    member(Observable::L5, "L5", "IQX"),
    member(Observable::L6, "L6", "IQXABCZ"),
    member(Observable::L7, "L7", "IQX"),
    member(Observable::L8, "L8", "IQX"),
    member(Observable::S1, "S1", "CSLXPWYMNABCZ"),
    member(Observable::S2, "S2", "CDSLXPWYMNIQ"),
    listed(Observable::S3, &["S3I", "S3Q", "S3X"]),
    member(Observable::S5, "S5", "IQX"),
    member(Observable::S6, "S6", "IQXABCZ"),
    member(Observable::S7, "S7", "IQX"),
    member(Observable::S8, "S8", "IQX"),
    member(Observable::D1, "D1", "CSLXPWYMNABCZ"),
    member(Observable::D2, "D2", "CDSLXPWYMNIQ"),
    listed(Observable::D3, &["D3I", "D3Q", "D3X"]),
    member(Observable::D5, "D5", "IQX"),
    member(Observable::D6, "D6", "ABCXZ"),
    member(Observable::D7, "D7", "IQX"),
    member(Observable::D8, "D8", "IQX"),
];

impl Membership {
    fn contains(&self, code: &str) -> bool {
        if self.extra.contains(&code) {
            return true;
        }
        match self.bare {
            Some(bare) => {
                if code == bare {
                    return true;
                }
                match code.strip_prefix(bare) {
                    Some(attr) if attr.len() == 1 => self.attributes.contains(attr),
                    _ => false,
                }
            },
            None => false,
        }
    }
}

impl Observable {
    /// All groups, in resolution order
    pub fn all() -> impl Iterator<Item = Observable> {
        MEMBERSHIPS.iter().map(|m| m.group)
    }

    /// Group of given observation code, None if the code is unknown
    pub fn from_code(code: &str) -> Option<Self> {
        MEMBERSHIPS
            .iter()
            .find(|m| m.contains(code))
            .map(|m| m.group)
    }

    /// True if given observation code belongs to this group
    pub fn contains(&self, code: &str) -> bool {
        MEMBERSHIPS
            .iter()
            .any(|m| m.group == *self && m.contains(code))
    }
}

impl std::fmt::Display for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Record values resolved per [Observable].
/// For each group, the first code of the record (alphabetical order)
/// belonging to that group provides the value. A code feeds one group at most.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observables(HashMap<Observable, ObsValue>);

impl Observables {
    pub fn resolve(record: &HashMap<String, ObsValue>) -> Self {
        let mut codes = record.keys().map(|k| k.as_str()).collect::<Vec<_>>();
        codes.sort_unstable();

        let mut resolved = HashMap::new();
        for group in Observable::all() {
            if let Some(pos) = codes.iter().position(|code| group.contains(code)) {
                let code = codes.remove(pos);
                if let Some(value) = record.get(code) {
                    resolved.insert(group, *value);
                }
            }
        }
        Self(resolved)
    }

    /// Value of given group, absent groups read as blank values
    pub fn get(&self, group: Observable) -> ObsValue {
        self.0.get(&group).copied().unwrap_or_default()
    }

    /// Measured value of given group, zero reads as absent.
    pub fn value(&self, group: Observable) -> Option<f64> {
        self.get(group).measurement()
    }

    /// Loss of lock indicator of given group
    pub fn lli(&self, group: Observable) -> u8 {
        self.get(group).lli
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn code_groups() {
        assert_eq!(Observable::from_code("C1"), Some(Observable::C1));
        assert_eq!(Observable::from_code("C1C"), Some(Observable::C1));
        assert_eq!(Observable::from_code("C1W"), Some(Observable::P1));
        assert_eq!(Observable::from_code("C2P"), Some(Observable::P2));
        assert_eq!(Observable::from_code("C2I"), Some(Observable::C2));
        assert_eq!(Observable::from_code("L1C"), Some(Observable::L1));
        assert_eq!(Observable::from_code("L2W"), Some(Observable::L2));
        assert_eq!(Observable::from_code("L3X"), Some(Observable::L3));
        assert_eq!(Observable::from_code("L8Q"), Some(Observable::L8));
        assert_eq!(Observable::from_code("S5X"), Some(Observable::S5));
        assert_eq!(Observable::from_code("D6B"), Some(Observable::D6));
        assert_eq!(Observable::from_code("D6I"), None);
        assert_eq!(Observable::from_code("C3"), None);
        assert_eq!(Observable::from_code("T1"), None);
        assert_eq!(Observable::from_code("C1CC"), None);
        assert_eq!(Observable::all().count(), 34);
    }
    #[test]
    fn record_resolution() {
        let mut record = HashMap::new();
        record.insert("C1C".to_string(), ObsValue::new(Some(20.0), 0, 0));
        record.insert("C1X".to_string(), ObsValue::new(Some(30.0), 0, 0));
        record.insert("C1W".to_string(), ObsValue::new(Some(21.0), 0, 0));
        record.insert("L1C".to_string(), ObsValue::new(Some(1.0), 1, 7));
        record.insert("L2W".to_string(), ObsValue::new(None, 0, 0));

        let observables = Observables::resolve(&record);
        assert_eq!(observables.value(Observable::C1), Some(20.0));
        assert_eq!(observables.value(Observable::P1), Some(21.0));
        assert_eq!(observables.value(Observable::L1), Some(1.0));
        assert_eq!(observables.lli(Observable::L1), 1);
        assert_eq!(observables.value(Observable::L2), None);
        assert_eq!(observables.value(Observable::C5), None);
        assert_eq!(observables.get(Observable::C5), ObsValue::default());
    }
}
