//! Satellite position from broadcast ephemeris
use nalgebra::Vector3;

use crate::{
    error::ArithmeticError,
    navigation::{Ephemeris, Family},
};

pub mod glonass;
pub mod kepler;

/// ECEF position (m) of the satellite described by this frame.
/// `offset` is the second of week for Keplerian frames and the
/// time elapsed since the broadcast for Cartesian frames,
/// as returned by [crate::navigation::select_ephemeris].
pub fn satellite_position(eph: &Ephemeris, offset: f64) -> Result<Vector3<f64>, ArithmeticError> {
    match eph.family() {
        Some(Family::Keplerian) => {
            let (kepler, perturbations) = eph
                .kepler()
                .zip(eph.perturbations())
                .ok_or(ArithmeticError::Degenerate("keplerian frame"))?;
            kepler::position(&kepler, &perturbations, offset)
        },
        Some(Family::Cartesian) => {
            let state = eph
                .cartesian()
                .ok_or(ArithmeticError::Degenerate("cartesian frame"))?;
            glonass::position(&state, offset)
        },
        None => Err(ArithmeticError::Degenerate("orbit family")),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss_rs::prelude::{Constellation, SV};

    #[test]
    fn family_dispatch() {
        let mut eph = Ephemeris {
            sv: SV::new(Constellation::SBAS, 25),
            ..Default::default()
        };
        eph.set_orbit_f64("satPosX", 42_164.0);
        let pos = satellite_position(&eph, 0.0).unwrap();
        assert_eq!(pos, Vector3::new(42_164.0E3, 0.0, 0.0));

        let eph = Ephemeris {
            sv: SV::new(Constellation::GPS, 1),
            ..Default::default()
        };
        assert_eq!(
            satellite_position(&eph, 0.0),
            Err(ArithmeticError::Degenerate("semi major axis"))
        );

        let eph = Ephemeris {
            sv: SV::new(Constellation::Mixed, 1),
            ..Default::default()
        };
        assert!(satellite_position(&eph, 0.0).is_err());
    }
}
