//! Ephemeris frames indexed by satellite and time of clock
use std::collections::BTreeMap;

use gnss_rs::prelude::{Constellation, SV};

use crate::{
    epoch::{decompose, Date, TimeOfDay},
    navigation::Ephemeris,
};

/// [EphemerisStore] indexes frames by (satellite, date, time of day).
/// The first frame published at a given time is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EphemerisStore(BTreeMap<(SV, Date, TimeOfDay), Ephemeris>);

impl EphemerisStore {
    /// Stores a new frame. Returns false if a frame
    /// already exists at this time of clock.
    pub fn insert(&mut self, ephemeris: Ephemeris) -> bool {
        let (date, time) = decompose(ephemeris.epoch);
        let key = (ephemeris.sv, date, time);
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, ephemeris);
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if at least one frame describes this [Constellation]
    pub fn contains_system(&self, constellation: Constellation) -> bool {
        self.0.keys().any(|(sv, _, _)| sv.constellation == constellation)
    }

    /// Returns true if at least one frame was published by this [SV]
    pub fn contains_satellite(&self, sv: SV) -> bool {
        self.0.keys().any(|(key, _, _)| *key == sv)
    }

    /// Frame published at given time, if any
    pub fn get(&self, sv: SV, date: Date, time: TimeOfDay) -> Option<&Ephemeris> {
        self.0.get(&(sv, date, time))
    }

    /// Frames published by this [SV] on given day, in chronological order
    pub fn broadcasts(&self, sv: SV, date: Date) -> impl Iterator<Item = (TimeOfDay, &Ephemeris)> {
        self.0
            .range((sv, date, TimeOfDay::MIDNIGHT)..=(sv, date, TimeOfDay::END))
            .map(|((_, _, time), eph)| (*time, eph))
    }

    /// All frames, sorted by satellite then time of clock
    pub fn iter(&self) -> impl Iterator<Item = &Ephemeris> {
        self.0.values()
    }
}
