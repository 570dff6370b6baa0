//! Per run satellite caches
use std::collections::HashMap;

use gnss_rs::prelude::SV;
use nalgebra::Vector3;

use crate::{
    epoch::{Date, TimeOfDay},
    tec::Frequencies,
};

/// Satellite at one instant
pub type SatelliteKey = (SV, Date, TimeOfDay);

/// Carrier frequencies of a Glonass satellite and its channel number
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlonassChannel {
    pub k: i8,
    pub frequencies: Frequencies,
}

impl GlonassChannel {
    pub fn new(k: i8) -> Self {
        Self {
            k,
            frequencies: Frequencies::glonass(k),
        }
    }
}

/// Outcome of a satellite position request
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Resolution {
    /// ECEF position (m)
    Position(Vector3<f64>),
    /// No navigation file or no usable ephemeris
    Unavailable,
    /// Ephemeris found but propagation failed
    Failed,
}

impl Resolution {
    pub fn position(&self) -> Option<Vector3<f64>> {
        match self {
            Self::Position(position) => Some(*position),
            _ => None,
        }
    }
}

/// Satellite positions and Glonass channels, computed once per
/// (satellite, date, time). Unavailable and failed positions
/// are cached as well.
#[derive(Debug, Clone, Default)]
pub struct SatelliteCache {
    positions: HashMap<SatelliteKey, Resolution>,
    channels: HashMap<SatelliteKey, GlonassChannel>,
}

impl SatelliteCache {
    /// Cached position, `f` is only invoked on first request
    pub fn position_or_insert_with<F>(&mut self, key: SatelliteKey, f: F) -> Resolution
    where
        F: FnOnce() -> Resolution,
    {
        *self.positions.entry(key).or_insert_with(f)
    }

    /// Stores the channel of a Glonass satellite. The first
    /// channel stored for this key is kept.
    pub fn insert_channel(&mut self, key: SatelliteKey, k: i8) -> GlonassChannel {
        *self
            .channels
            .entry(key)
            .or_insert_with(|| GlonassChannel::new(k))
    }

    pub fn channel(&self, key: &SatelliteKey) -> Option<GlonassChannel> {
        self.channels.get(key).copied()
    }

    /// Number of positions requested so far
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::Carrier;
    use gnss_rs::prelude::Constellation;

    fn key(prn: u8, hour: u8) -> SatelliteKey {
        (
            SV::new(Constellation::Glonass, prn),
            Date::new(2016, 4, 9).unwrap(),
            TimeOfDay::new(hour, 0, 0, 0),
        )
    }

    #[test]
    fn positions_are_computed_once() {
        let mut cache = SatelliteCache::default();
        let mut calls = 0;
        for _ in 0..3 {
            let pos = cache.position_or_insert_with(key(5, 0), || {
                calls += 1;
                Resolution::Position(Vector3::new(1.0, 2.0, 3.0))
            });
            assert_eq!(pos.position(), Some(Vector3::new(1.0, 2.0, 3.0)));
        }
        assert_eq!(calls, 1);

        let pos = cache.position_or_insert_with(key(5, 1), || Resolution::Unavailable);
        assert_eq!(pos, Resolution::Unavailable);
        let pos = cache.position_or_insert_with(key(5, 1), || {
            Resolution::Position(Vector3::zeros())
        });
        assert_eq!(pos, Resolution::Unavailable);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_unavailable() {
        let mut cache = SatelliteCache::default();
        let pos = cache.position_or_insert_with(key(5, 2), || Resolution::Failed);
        assert_eq!(pos, Resolution::Failed);
        assert_eq!(pos.position(), None);
        assert_ne!(pos, Resolution::Unavailable);

        let pos = cache.position_or_insert_with(key(5, 2), || Resolution::Unavailable);
        assert_eq!(pos, Resolution::Failed);
    }

    #[test]
    fn glonass_channels() {
        let mut cache = SatelliteCache::default();
        assert_eq!(cache.channel(&key(5, 0)), None);

        let channel = cache.insert_channel(key(5, 0), -4);
        assert_eq!(channel.k, -4);
        assert_eq!(
            channel.frequencies.f1,
            Some(Carrier::G1 - 4.0 * Carrier::G1_STEP)
        );
        assert_eq!(channel.frequencies.f2, Some(1_244_250_000.0));

        assert_eq!(cache.insert_channel(key(5, 0), 2).k, -4);
        assert_eq!(cache.insert_channel(key(5, 1), 2).k, 2);
        assert_eq!(cache.channel(&key(5, 1)).map(|c| c.k), Some(2));
    }
}
