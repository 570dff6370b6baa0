//! Geodetic coordinates and line of sight geometry
use std::f64::consts::{FRAC_PI_2, PI};

use log::error;
use nalgebra::Vector3;

use crate::{
    constants::{Constants, Earth, Ellipsoid},
    error::ArithmeticError,
};

/// Converts ECEF coordinates (m) to geodetic (longitude, latitude, height),
/// angles in radians. The latitude is iterated until it stabilizes.
pub fn cartesian_to_geodetic(p: &Vector3<f64>) -> Result<(f64, f64, f64), ArithmeticError> {
    let (x, y, z) = (p.x, p.y, p.z);
    let e2 = Ellipsoid::E2;
    let q = (x.powi(2) + y.powi(2)).sqrt();
    if !q.is_finite() || !z.is_finite() {
        return Err(ArithmeticError::NonFinite("geodetic conversion"));
    }
    if q == 0.0 {
        return Err(ArithmeticError::Degenerate("distance to the polar axis"));
    }

    let lon = if x == 0.0 {
        if y > 0.0 {
            FRAC_PI_2
        } else {
            3.0 * FRAC_PI_2
        }
    } else {
        y.atan2(x)
    };

    let mut lat = z / q / (1.0 - e2);
    let mut n = 0.0;
    let mut converged = false;
    for _ in 0..Constants::MAX_GEODETIC_ITER {
        let sin_lat = lat.sin();
        n = Ellipsoid::A / (1.0 - e2 * sin_lat.powi(2)).sqrt();
        let next = (z + n * e2 * sin_lat).atan2(q);
        let delta = (next - lat).abs();
        lat = next;
        if delta <= Constants::GEODETIC_TOLERANCE {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(ArithmeticError::GeodeticConvergence);
    }

    let (sin_lat, cos_lat) = lat.sin_cos();
    let h = q * cos_lat + z * sin_lat - n * (1.0 - e2 * sin_lat.powi(2));
    Ok((lon, lat, h))
}

/// Geodetic coordinates in degrees, longitude in [0, 360).
/// Failures are logged and read as zeros.
pub fn geodetic_degrees(p: &Vector3<f64>) -> (f64, f64, f64) {
    match cartesian_to_geodetic(p) {
        Ok((lon, lat, h)) => {
            let mut lon = lon.to_degrees();
            if lon < 0.0 {
                lon += 360.0;
            }
            (lon, lat.to_degrees(), h)
        },
        Err(e) => {
            error!("geodetic coordinates of ({}, {}, {}): {}", p.x, p.y, p.z, e);
            (0.0, 0.0, 0.0)
        },
    }
}

/// Elevation and azimuth (degrees) of `satellite` seen from `observer`,
/// on a spherical Earth. Azimuth lies in [0, 360).
pub fn elevation_azimuth(
    observer: &Vector3<f64>,
    satellite: &Vector3<f64>,
) -> Result<(f64, f64), ArithmeticError> {
    let d = satellite - observer;
    if d.norm() == 0.0 {
        return Err(ArithmeticError::Degenerate("line of sight"));
    }

    let (l0, b0, _) = cartesian_to_geodetic(observer)?;
    let (ls, bs, _) = cartesian_to_geodetic(satellite)?;
    let rk = satellite.norm();

    // geocentric separation
    let cos_sigma = b0.sin() * bs.sin() + b0.cos() * bs.cos() * (ls - l0).cos();
    let sigma = ((1.0 - cos_sigma.powi(2)).max(0.0).sqrt() / cos_sigma).atan();
    let sin_sigma = sigma.sin();
    if sin_sigma == 0.0 || !sin_sigma.is_finite() {
        return Err(ArithmeticError::Degenerate("line of sight"));
    }

    let (sin_l0, cos_l0) = l0.sin_cos();
    let (sin_b0, cos_b0) = b0.sin_cos();
    let xt = -d.x * sin_l0 + d.y * cos_l0;
    let yt = -d.x * cos_l0 * sin_b0 - d.y * sin_l0 * sin_b0 + d.z * cos_b0;

    let el = ((sigma.cos() - Earth::MEAN_RADIUS / rk) / sin_sigma).atan();
    let mut az = xt.atan2(yt);
    if az < 0.0 {
        az += 2.0 * PI;
    }

    let (el, az) = (el.to_degrees(), az.to_degrees());
    if !el.is_finite() || !az.is_finite() {
        return Err(ArithmeticError::NonFinite("elevation"));
    }
    Ok((el, az))
}
