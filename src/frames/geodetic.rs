use serde::Serialize;

use super::FrameError;
use crate::constants::{EARTH_ROTATION_RAD_S, R_EARTH, WGS84_E2};

const MAX_ITERATIONS: usize = 20;
// 1 mm in km.
const HEIGHT_TOLERANCE_KM: f64 = 1e-6;

/// WGS84 geodetic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// Rotate an inertial position into the Earth-fixed frame by `gmst` radians.
pub fn eci_to_ecef_position(pos_eci: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin_g, cos_g) = gmst.sin_cos();
    [
        pos_eci[0] * cos_g + pos_eci[1] * sin_g,
        -pos_eci[0] * sin_g + pos_eci[1] * cos_g,
        pos_eci[2],
    ]
}

/// Inverse of [`eci_to_ecef_position`].
pub fn ecef_to_eci_position(pos_ecef: [f64; 3], gmst: f64) -> [f64; 3] {
    eci_to_ecef_position(pos_ecef, -gmst)
}

/// Earth-fixed velocity, removing the ω × r frame-rotation term.
pub fn eci_to_ecef_velocity(pos_eci: [f64; 3], vel_eci: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = eci_to_ecef_position(pos_eci, gmst);
    let rotated = eci_to_ecef_position(vel_eci, gmst);
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

pub fn geodetic_to_ecef(latitude_deg: f64, longitude_deg: f64, altitude_km: f64) -> [f64; 3] {
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = longitude_deg.to_radians().sin_cos();
    let n = R_EARTH / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    [
        (n + altitude_km) * cos_lat * cos_lon,
        (n + altitude_km) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + altitude_km) * sin_lat,
    ]
}

/// Iterative ECEF to WGS84 conversion, converged to millimetre height.
pub fn ecef_to_geodetic(ecef: [f64; 3]) -> Result<Geodetic, FrameError> {
    let [x, y, z] = ecef;
    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
        return Err(FrameError::NonFinite("ECEF position"));
    }

    let p = x.hypot(y);
    let longitude_deg = y.atan2(x).to_degrees();
    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    let mut height = f64::NAN;

    for _ in 0..MAX_ITERATIONS {
        let (sin_lat, cos_lat) = lat.sin_cos();
        let n = R_EARTH / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        // Valid at every latitude, including the poles.
        let next_height =
            p * cos_lat + z * sin_lat - R_EARTH * (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let next_lat = z.atan2(p * (1.0 - WGS84_E2 * n / (n + next_height)));

        let settled = (next_height - height).abs() < HEIGHT_TOLERANCE_KM
            && (next_lat - lat).abs() < 1e-12;
        lat = next_lat;
        height = next_height;
        if settled {
            return Ok(Geodetic {
                latitude_deg: lat.to_degrees(),
                longitude_deg,
                altitude_km: height,
            });
        }
    }

    Err(FrameError::GeodeticNonConvergence(x, y, z))
}
