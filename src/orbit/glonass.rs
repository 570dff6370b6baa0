use nalgebra::Vector3;

use crate::{constants::Earth, error::ArithmeticError, navigation::CartesianState};

fn km_to_m(v: (f64, f64, f64)) -> Vector3<f64> {
    Vector3::new(v.0, v.1, v.2) * 1.0E3
}

/// Earth fixed equations of motion, linearized around the reference state:
/// the central term and the J2 term use the reference radius,
/// the Coriolis term uses the reference velocity.
struct Dynamics {
    velocity: Vector3<f64>,
    acceleration: Vector3<f64>,
    r2: f64,
    central: f64,
    oblateness: f64,
}

impl Dynamics {
    fn new(
        position: &Vector3<f64>,
        velocity: Vector3<f64>,
        acceleration: Vector3<f64>,
    ) -> Result<Self, ArithmeticError> {
        let r = position.norm();
        if !r.is_finite() || r == 0.0 {
            return Err(ArithmeticError::Degenerate("orbit radius"));
        }
        Ok(Self {
            velocity,
            acceleration,
            r2: r.powi(2),
            central: -Earth::MU / r.powi(3),
            oblateness: 1.5 * Earth::J2 * Earth::MU * Earth::AE.powi(2) / r.powi(5),
        })
    }

    fn eval(&self, p: &Vector3<f64>) -> Vector3<f64> {
        let w = Earth::OMEGA;
        let z2 = 5.0 * p.z.powi(2) / self.r2;
        Vector3::new(
            self.central * p.x - self.oblateness * p.x * (1.0 - z2)
                + w.powi(2) * p.x
                + 2.0 * w * self.velocity.y
                + self.acceleration.x,
            self.central * p.y - self.oblateness * p.y * (1.0 - z2) + w.powi(2) * p.y
                - 2.0 * w * self.velocity.x
                + self.acceleration.y,
            self.central * p.z - self.oblateness * p.z * (3.0 - z2) + self.acceleration.z,
        )
    }
}

/// Propagates a broadcast state vector by `dt` seconds, with a three stage
/// integration of the J2 perturbed equations of motion. Returns the ECEF
/// position (m). A null `dt` returns the reference position.
pub fn position(state: &CartesianState, dt: f64) -> Result<Vector3<f64>, ArithmeticError> {
    let x0 = km_to_m(state.position);
    if dt == 0.0 {
        return Ok(x0);
    }
    if !dt.is_finite() {
        return Err(ArithmeticError::NonFinite("propagation time"));
    }

    let v0 = km_to_m(state.velocity);
    let dynamics = Dynamics::new(&x0, v0, km_to_m(state.acceleration))?;

    let midpoint = x0 + v0 * dt / 2.0;
    let k1 = dynamics.eval(&x0) * dt;
    let k2 = dynamics.eval(&(midpoint + k1 * dt / 8.0)) * dt;
    let k3 = dynamics.eval(&(midpoint + k2 * dt / 8.0)) * dt;

    let position = x0 + v0 * dt + (k1 + k2 + k3) * dt / 6.0;
    if position.iter().any(|c| !c.is_finite()) {
        return Err(ArithmeticError::NonFinite("cartesian propagation"));
    }
    Ok(position)
}
