use nalgebra::{Rotation3, Vector3};

use crate::{
    constants::{Constants, Earth},
    error::ArithmeticError,
    navigation::{Kepler, Perturbations},
};

/// [Helper] holds the corrected orbital state at the desired time of week
#[derive(Debug, Clone, Copy)]
pub struct Helper {
    /// Time from ephemeris reference epoch (s)
    pub t_k: f64,
    /// Eccentric anomaly (rad)
    pub e_k: f64,
    /// Argument of latitude (corrected)
    pub u_k: f64,
    /// Radius (corrected)
    pub r_k: f64,
    /// Orbital inclination (corrected)
    pub i_k: f64,
    /// Longitude of the ascending node, Earth fixed
    pub omega_k: f64,
}

/// Wraps a time difference into a half week
fn wrap_half_week(dt: f64) -> f64 {
    if dt > Constants::HALF_WEEK {
        dt - Constants::WEEK
    } else if dt < -Constants::HALF_WEEK {
        dt + Constants::WEEK
    } else {
        dt
    }
}

/// Solves Kepler's equation E - e.sin(E) = M by Newton iterations,
/// until successive corrections stop changing.
fn eccentric_anomaly(m_k: f64, e: f64) -> Result<f64, ArithmeticError> {
    let mut e_k = m_k;
    let mut previous = f64::NAN;
    let mut correction = f64::INFINITY;
    for _ in 0..Constants::MAX_KEPLER_ITER {
        let next = e_k - (e_k - e * e_k.sin() - m_k) / (1.0 - e * e_k.cos());
        correction = (next - e_k).abs();
        e_k = next;
        if correction == previous {
            break;
        }
        previous = correction;
    }
    if !e_k.is_finite() {
        return Err(ArithmeticError::NonFinite("eccentric anomaly"));
    }
    if correction > 1.0E-12 {
        return Err(ArithmeticError::KeplerConvergence);
    }
    Ok(e_k)
}

impl Helper {
    /// Propagates the Keplerian elements to given second of week
    pub fn new(
        kepler: &Kepler,
        perturbations: &Perturbations,
        week_second: f64,
    ) -> Result<Self, ArithmeticError> {
        let a = kepler.a;
        if !a.is_finite() || a <= 0.0 {
            return Err(ArithmeticError::Degenerate("semi major axis"));
        }
        let e = kepler.e;

        let t_k = wrap_half_week(week_second - kepler.toe);
        let n = (Earth::MU / a.powi(3)).sqrt() + perturbations.dn;
        let m_k = kepler.m_0 + n * t_k;
        let e_k = eccentric_anomaly(m_k, e)?;

        let (sin_e_k, cos_e_k) = e_k.sin_cos();
        let denominator = 1.0 - e * cos_e_k;
        let nu_k = ((1.0 - e.powi(2)).sqrt() * sin_e_k / denominator)
            .atan2((cos_e_k - e) / denominator);

        let phi_k = nu_k + kepler.omega;
        let (sin_2phi, cos_2phi) = (2.0 * phi_k).sin_cos();

        let u_k = phi_k + perturbations.cuc * cos_2phi + perturbations.cus * sin_2phi;
        let r_k = a * (1.0 - e * cos_e_k)
            + perturbations.crc * cos_2phi
            + perturbations.crs * sin_2phi;
        let i_k = kepler.i_0
            + perturbations.cic * cos_2phi
            + perturbations.cis * sin_2phi
            + perturbations.i_dot * t_k;
        let omega_k = kepler.omega_0 + (perturbations.omega_dot - Earth::OMEGA) * t_k
            - Earth::OMEGA * kepler.toe;

        for value in [u_k, r_k, i_k, omega_k] {
            if !value.is_finite() {
                return Err(ArithmeticError::NonFinite("keplerian propagation"));
            }
        }

        Ok(Self {
            t_k,
            e_k,
            u_k,
            r_k,
            i_k,
            omega_k,
        })
    }

    /// Returns orbital plane to ECEF [Rotation3] matrix
    fn orbit_to_ecef_rotation_matrix(&self) -> Rotation3<f64> {
        // Positive angles mean counterclockwise rotation
        let rotation_x = Rotation3::from_axis_angle(&Vector3::x_axis(), self.i_k);
        let rotation_z = Rotation3::from_axis_angle(&Vector3::z_axis(), self.omega_k);
        rotation_z * rotation_x
    }

    /// ECEF position (m)
    pub fn ecef_position(&self) -> Vector3<f64> {
        let (sin_u_k, cos_u_k) = self.u_k.sin_cos();
        let orbit_xyz = Vector3::new(self.r_k * cos_u_k, self.r_k * sin_u_k, 0.0);
        self.orbit_to_ecef_rotation_matrix() * orbit_xyz
    }
}

/// ECEF position (m) at given second of week
pub fn position(
    kepler: &Kepler,
    perturbations: &Perturbations,
    week_second: f64,
) -> Result<Vector3<f64>, ArithmeticError> {
    Ok(Helper::new(kepler, perturbations, week_second)?.ecef_position())
}
