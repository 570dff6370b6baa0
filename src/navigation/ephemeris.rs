//! Broadcast ephemeris frames
use std::collections::HashMap;

use gnss_rs::prelude::{Constellation, SV};
use hifitime::Epoch;

/// Orbit description family: how the broadcast orbit
/// is encoded and propagated
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Family {
    /// Keplerian elements (GPS, Galileo, BeiDou, QZSS, IRNSS)
    Keplerian,
    /// Position, velocity and acceleration in an Earth fixed frame (Glonass, SBAS)
    Cartesian,
}

/// Keplerian broadcast orbit fields, in order of appearance
const KEPLERIAN_FIELDS: [&str; 26] = [
    "iode",
    "crs",
    "deltaN",
    "m0",
    "cuc",
    "e",
    "cus",
    "sqrta",
    "toe",
    "cic",
    "omega0",
    "cis",
    "i0",
    "crc",
    "omega",
    "omegaDot",
    "idot",
    "l2Codes",
    "week",
    "l2pDataFlag",
    "svAccuracy",
    "health",
    "tgd",
    "iodc",
    "t_tm",
    "fitInt",
];

/// Cartesian broadcast orbit fields, in order of appearance
const CARTESIAN_FIELDS: [&str; 12] = [
    "satPosX", "velX", "accelX", "health", "satPosY", "velY", "accelY", "channel", "satPosZ",
    "velZ", "accelZ", "ageOp",
];

impl Family {
    /// Family of given [Constellation], None for mixed descriptors
    pub fn of(constellation: Constellation) -> Option<Self> {
        match constellation {
            Constellation::GPS
            | Constellation::Galileo
            | Constellation::BeiDou
            | Constellation::QZSS
            | Constellation::IRNSS => Some(Self::Keplerian),
            Constellation::Glonass => Some(Self::Cartesian),
            c if c.is_sbas() => Some(Self::Cartesian),
            _ => None,
        }
    }
    /// Number of values found on each broadcast orbit line
    pub(crate) fn values_per_line(&self) -> &'static [usize] {
        match self {
            Self::Keplerian => &[4, 4, 4, 4, 4, 4, 2],
            Self::Cartesian => &[4, 4, 4],
        }
    }
    /// Broadcast orbit field names, in order of appearance
    pub(crate) fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::Keplerian => &KEPLERIAN_FIELDS,
            Self::Cartesian => &CARTESIAN_FIELDS,
        }
    }
}

/// Ephemeris frame, as broadcast by one satellite
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Ephemeris {
    pub sv: SV,
    /// Time of clock
    pub epoch: Epoch,
    /// Clock bias (in seconds)
    pub clock_bias: f64,
    /// Clock drift (s.s⁻¹)
    pub clock_drift: f64,
    /// Clock drift rate (s.s⁻²)
    pub clock_drift_rate: f64,
    /// Broadcast orbit, indexed by field name.
    /// Blank fields read as zero.
    pub orbits: HashMap<String, f64>,
}

/// Keplerian orbit parameters
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct Kepler {
    /// semi major axis (m)
    pub a: f64,
    /// Eccentricity (n.a)
    pub e: f64,
    /// Inclination angle at reference time (rad)
    pub i_0: f64,
    /// Longitude of ascending node at reference time (rad)
    pub omega_0: f64,
    /// Mean anomaly at reference time (rad)
    pub m_0: f64,
    /// argument of perigee (rad)
    pub omega: f64,
    /// Time of ephemeris, in seconds of week
    pub toe: f64,
}

/// Orbit [Perturbations]
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct Perturbations {
    /// Mean motion difference from computed value [rad.s-1]
    pub dn: f64,
    /// Inclination rate of change [rad.s-1]
    pub i_dot: f64,
    /// Right ascension rate of change [rad.s^-1]
    pub omega_dot: f64,
    /// Amplitude of sine harmonic correction term of the argument
    /// of latitude [rad]
    pub cus: f64,
    /// Amplitude of cosine harmonic correction term of the argument
    /// of latitude [rad]
    pub cuc: f64,
    /// Amplitude of sine harmonic correction term of the angle of inclination [rad]
    pub cis: f64,
    /// Amplitude of cosine harmonic correction term of the angle of inclination [rad]
    pub cic: f64,
    /// Amplitude of sine harmonic correction term of the orbit radius [m]
    pub crs: f64,
    /// Amplitude of cosine harmonic correction term of the orbit radius [m]
    pub crc: f64,
}

/// Earth fixed state vector at reference time, in km, km/s and km/s²
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct CartesianState {
    pub position: (f64, f64, f64),
    pub velocity: (f64, f64, f64),
    pub acceleration: (f64, f64, f64),
}

impl Ephemeris {
    /// Returns [SV] onboard clock (bias [s], drift [s/s], drift rate [s/s]).
    pub fn sv_clock(&self) -> (f64, f64, f64) {
        (self.clock_bias, self.clock_drift, self.clock_drift_rate)
    }

    /// Orbit [Family] of this frame
    pub fn family(&self) -> Option<Family> {
        Family::of(self.sv.constellation)
    }

    /// Broadcast orbit field, zero when not broadcast
    pub fn get_orbit_f64(&self, field: &str) -> f64 {
        self.orbits.get(field).copied().unwrap_or(0.0)
    }

    pub(crate) fn set_orbit_f64(&mut self, field: &str, value: f64) {
        self.orbits.insert(field.to_string(), value);
    }

    /// Retrieves Orbit Keplerian parameters.
    /// This only applies to Keplerian frames.
    pub fn kepler(&self) -> Option<Kepler> {
        if self.family()? != Family::Keplerian {
            return None;
        }
        Some(Kepler {
            a: self.get_orbit_f64("sqrta").powi(2),
            e: self.get_orbit_f64("e"),
            i_0: self.get_orbit_f64("i0"),
            omega: self.get_orbit_f64("omega"),
            omega_0: self.get_orbit_f64("omega0"),
            m_0: self.get_orbit_f64("m0"),
            toe: self.get_orbit_f64("toe"),
        })
    }

    /// Retrieves Orbit [Perturbations] of Keplerian frames
    pub fn perturbations(&self) -> Option<Perturbations> {
        if self.family()? != Family::Keplerian {
            return None;
        }
        Some(Perturbations {
            cuc: self.get_orbit_f64("cuc"),
            cus: self.get_orbit_f64("cus"),
            cic: self.get_orbit_f64("cic"),
            cis: self.get_orbit_f64("cis"),
            crc: self.get_orbit_f64("crc"),
            crs: self.get_orbit_f64("crs"),
            dn: self.get_orbit_f64("deltaN"),
            i_dot: self.get_orbit_f64("idot"),
            omega_dot: self.get_orbit_f64("omegaDot"),
        })
    }

    /// Retrieves the reference state vector of Cartesian frames
    pub fn cartesian(&self) -> Option<CartesianState> {
        if self.family()? != Family::Cartesian {
            return None;
        }
        Some(CartesianState {
            position: (
                self.get_orbit_f64("satPosX"),
                self.get_orbit_f64("satPosY"),
                self.get_orbit_f64("satPosZ"),
            ),
            velocity: (
                self.get_orbit_f64("velX"),
                self.get_orbit_f64("velY"),
                self.get_orbit_f64("velZ"),
            ),
            acceleration: (
                self.get_orbit_f64("accelX"),
                self.get_orbit_f64("accelY"),
                self.get_orbit_f64("accelZ"),
            ),
        })
    }

    /// Health flag as broadcast
    pub fn health(&self) -> f64 {
        self.get_orbit_f64("health")
    }

    /// Glonass frequency channel number
    pub fn glonass_channel(&self) -> Option<i8> {
        if self.sv.constellation != Constellation::Glonass {
            return None;
        }
        Some(self.get_orbit_f64("channel").round() as i8)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn families() {
        assert_eq!(Family::of(Constellation::GPS), Some(Family::Keplerian));
        assert_eq!(Family::of(Constellation::BeiDou), Some(Family::Keplerian));
        assert_eq!(Family::of(Constellation::Glonass), Some(Family::Cartesian));
        assert_eq!(Family::of(Constellation::SBAS), Some(Family::Cartesian));
        assert_eq!(Family::of(Constellation::EGNOS), Some(Family::Cartesian));
        assert_eq!(Family::of(Constellation::Mixed), None);
        for family in [Family::Keplerian, Family::Cartesian] {
            assert_eq!(
                family.values_per_line().iter().sum::<usize>(),
                family.fields().len()
            );
        }
    }
    #[test]
    fn frame_views() {
        let mut eph = Ephemeris {
            sv: SV::new(Constellation::Glonass, 5),
            ..Default::default()
        };
        eph.set_orbit_f64("satPosX", 1.0);
        eph.set_orbit_f64("velZ", -2.0);
        eph.set_orbit_f64("channel", -4.0);
        assert!(eph.kepler().is_none());
        let state = eph.cartesian().unwrap();
        assert_eq!(state.position, (1.0, 0.0, 0.0));
        assert_eq!(state.velocity, (0.0, 0.0, -2.0));
        assert_eq!(eph.glonass_channel(), Some(-4));

        let mut eph = Ephemeris {
            sv: SV::new(Constellation::GPS, 1),
            ..Default::default()
        };
        eph.set_orbit_f64("sqrta", 5153.0);
        assert_eq!(eph.kepler().unwrap().a, 5153.0 * 5153.0);
        assert!(eph.cartesian().is_none());
        assert_eq!(eph.glonass_channel(), None);
    }
}
