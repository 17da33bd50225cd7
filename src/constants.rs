//! Physical and geodetic constants shared by the propagation chain.

/// Earth gravitational parameter (km³/s²), WGS84.
pub const MU_EARTH: f64 = 398_600.4418;

/// Earth equatorial radius (km), WGS84.
pub const R_EARTH: f64 = 6378.137;

/// Mean Earth radius (km).
pub const R_EARTH_MEAN: f64 = 6371.0;

/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Earth J2 zonal harmonic.
pub const J2: f64 = 1.082_626_68e-3;

/// Earth rotation rate (rad/s).
pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Lowest and highest geocentric radius accepted for a LEO state (km):
/// mean Earth radius plus 200 km and 2000 km.
pub const LEO_MIN_RADIUS_KM: f64 = R_EARTH_MEAN + 200.0;
pub const LEO_MAX_RADIUS_KM: f64 = R_EARTH_MEAN + 2000.0;
