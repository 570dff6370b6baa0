//! Physical and geodetic constants

/// Speed of light in vacuum (m.s-1)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Ionospheric refraction constant (m3.s-2), scaled to TECU with 1E-16.
pub const IONO_K: f64 = 40.308;

/// Reference ellipsoid used for geodetic conversions (WGS84)
pub(crate) struct Ellipsoid;

impl Ellipsoid {
    /// Semi major axis (m)
    pub const A: f64 = 6_378_137.0;
    /// Semi minor axis (m)
    pub const B: f64 = 6_356_752.314245;
    /// First eccentricity
    pub const E: f64 = 0.08181919084296556;
    /// First eccentricity, squared
    pub const E2: f64 = 0.0066943799901976195;
}

/// Earth model used by the orbit propagators
pub(crate) struct Earth;

impl Earth {
    /// Mean radius (m)
    pub const MEAN_RADIUS: f64 = 6_371e3;
    /// Gravitational constant (m3.s-2)
    pub const MU: f64 = 398_600.44e9;
    /// Equatorial radius (m), GLONASS ICD
    pub const AE: f64 = 6_378_136.0;
    /// Second zonal harmonic
    pub const J2: f64 = 1_082_625.7e-9;
    /// Rotation rate (rad.s-1)
    pub const OMEGA: f64 = 7.2921151467e-5;
}

/// Const values used by the solvers
pub(crate) struct Constants;

impl Constants {
    /// Maximal iteration in the iterative Kepler solver
    pub const MAX_KEPLER_ITER: u8 = 30;

    /// Maximal iteration in the geodetic latitude solver
    pub const MAX_GEODETIC_ITER: u8 = 100;

    /// Geodetic latitude convergence threshold (rad)
    pub const GEODETIC_TOLERANCE: f64 = 1.0e-12;

    /// Half a GPS week (s)
    pub const HALF_WEEK: f64 = 302_400.0;

    /// One week (s)
    pub const WEEK: f64 = 604_800.0;
}

/// Carrier frequencies (Hz)
pub(crate) struct Carrier;

impl Carrier {
    pub const L1: f64 = 1575.42e6;
    pub const L2: f64 = 1227.60e6;
    pub const L5: f64 = 1176.45e6;

    pub const E6: f64 = 1278.75e6;
    pub const E5B: f64 = 1207.14e6;
    pub const E5: f64 = 1191.795e6;

    pub const B1: f64 = 1561.098e6;
    pub const B2: f64 = 1207.14e6;
    pub const B3: f64 = 1268.52e6;

    /// GLONASS L1 base frequency
    pub const G1: f64 = 1602.0e6;
    /// GLONASS L1 channel spacing
    pub const G1_STEP: f64 = 0.5625e6;
    /// GLONASS L2 base frequency
    pub const G2: f64 = 1246.0e6;
    /// GLONASS L2 channel spacing
    pub const G2_STEP: f64 = 0.4375e6;
}
