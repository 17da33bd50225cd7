use chrono::{DateTime, Utc};
use serde::Serialize;

use super::geodetic::{ecef_to_geodetic, eci_to_ecef_position, eci_to_ecef_velocity, Geodetic};
use super::sidereal::gmst;
use super::{FrameError, ObserverLocation};
use crate::orbit::OrbitalState;

/// Where a satellite appears from the observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObserverRelativeGeometry {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub range_km: f64,
    /// Positive when the satellite is moving away.
    pub range_rate_km_s: f64,
    pub is_visible: bool,
}

/// Inertial to Earth-fixed, geodetic and topocentric conversions for one
/// fixed observer. The observer's Earth-fixed position and local axes are
/// computed once at construction.
#[derive(Debug, Clone, Copy)]
pub struct FrameTransformer {
    observer: ObserverLocation,
    observer_ecef: [f64; 3],
    sin_lat: f64,
    cos_lat: f64,
    sin_lon: f64,
    cos_lon: f64,
    min_elevation_deg: f64,
}

impl FrameTransformer {
    /// Transformer whose visibility flag uses the geometric horizon.
    pub fn new(observer: ObserverLocation) -> Self {
        let (sin_lat, cos_lat) = observer.lat_rad().sin_cos();
        let (sin_lon, cos_lon) = observer.lon_rad().sin_cos();
        Self {
            observer,
            observer_ecef: observer.position_ecef_km(),
            sin_lat,
            cos_lat,
            sin_lon,
            cos_lon,
            min_elevation_deg: 0.0,
        }
    }

    pub fn with_min_elevation(mut self, min_elevation_deg: f64) -> Self {
        self.min_elevation_deg = min_elevation_deg;
        self
    }

    pub fn observer(&self) -> &ObserverLocation {
        &self.observer
    }

    pub fn observer_ecef_km(&self) -> [f64; 3] {
        self.observer_ecef
    }

    pub fn min_elevation_deg(&self) -> f64 {
        self.min_elevation_deg
    }

    /// Sub-satellite point and height for an inertial position at `at`.
    pub fn to_geodetic(
        &self,
        eci_position_km: [f64; 3],
        at: DateTime<Utc>,
    ) -> Result<Geodetic, FrameError> {
        ecef_to_geodetic(eci_to_ecef_position(eci_position_km, gmst(at)))
    }

    pub fn state_to_geodetic(&self, state: &OrbitalState) -> Result<Geodetic, FrameError> {
        self.to_geodetic(state.position_eci_km, state.timestamp)
    }

    pub fn to_topocentric(
        &self,
        eci_position_km: [f64; 3],
        eci_velocity_km_s: [f64; 3],
        at: DateTime<Utc>,
    ) -> Result<ObserverRelativeGeometry, FrameError> {
        if !eci_position_km.iter().all(|v| v.is_finite()) {
            return Err(FrameError::NonFinite("position"));
        }
        if !eci_velocity_km_s.iter().all(|v| v.is_finite()) {
            return Err(FrameError::NonFinite("velocity"));
        }

        let theta = gmst(at);
        let sat_ecef = eci_to_ecef_position(eci_position_km, theta);
        // The observer is at rest in the Earth-fixed frame.
        let sat_vel_ecef = eci_to_ecef_velocity(eci_position_km, eci_velocity_km_s, theta);

        let dr = [
            sat_ecef[0] - self.observer_ecef[0],
            sat_ecef[1] - self.observer_ecef[1],
            sat_ecef[2] - self.observer_ecef[2],
        ];
        let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();
        if range_km <= 0.0 {
            return Err(FrameError::DegenerateGeometry);
        }

        let (east, north, up) = self.ecef_to_enu(dr);
        let elevation_deg = (up / range_km).clamp(-1.0, 1.0).asin().to_degrees();
        let mut azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
        if azimuth_deg >= 360.0 {
            azimuth_deg = 0.0;
        }

        let projected = sat_vel_ecef[0] * dr[0] + sat_vel_ecef[1] * dr[1] + sat_vel_ecef[2] * dr[2];
        let range_rate_km_s = projected / range_km;

        Ok(ObserverRelativeGeometry {
            elevation_deg,
            azimuth_deg,
            range_km,
            range_rate_km_s,
            is_visible: elevation_deg >= self.min_elevation_deg,
        })
    }

    pub fn state_to_topocentric(
        &self,
        state: &OrbitalState,
    ) -> Result<ObserverRelativeGeometry, FrameError> {
        self.to_topocentric(state.position_eci_km, state.velocity_eci_km_s, state.timestamp)
    }

    /// Rotate an Earth-fixed offset into the observer's East-North-Up axes.
    pub fn ecef_to_enu(&self, dr: [f64; 3]) -> (f64, f64, f64) {
        let (sin_lat, cos_lat) = (self.sin_lat, self.cos_lat);
        let (sin_lon, cos_lon) = (self.sin_lon, self.cos_lon);
        let east = -sin_lon * dr[0] + cos_lon * dr[1];
        let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
        let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
        (east, north, up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::geodetic::{ecef_to_eci_position, geodetic_to_ecef};
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn eci_above(lat: f64, lon: f64, alt_km: f64, at: DateTime<Utc>) -> [f64; 3] {
        ecef_to_eci_position(geodetic_to_ecef(lat, lon, alt_km), gmst(at))
    }

    #[test]
    fn test_overhead_satellite_from_ntpu() {
        let obs = ObserverLocation::ntpu();
        let tf = FrameTransformer::new(obs);
        let at = epoch();
        let pos = eci_above(obs.latitude_deg, obs.longitude_deg, 550.0, at);

        let geo = tf.to_topocentric(pos, [0.0; 3], at).unwrap();
        assert_abs_diff_eq!(geo.elevation_deg, 90.0, epsilon = 1e-3);
        assert_abs_diff_eq!(geo.range_km, 550.0, epsilon = 5.0);
        assert!(geo.is_visible);
    }

    #[test]
    fn test_cardinal_azimuths() {
        let obs = ObserverLocation::new(0.0, 0.0, 0.0).unwrap();
        let tf = FrameTransformer::new(obs);
        let at = epoch();

        let north = tf.to_topocentric(eci_above(5.0, 0.0, 550.0, at), [0.0; 3], at).unwrap();
        assert!(north.azimuth_deg < 1e-6 || north.azimuth_deg > 360.0 - 1e-6);

        let east = tf.to_topocentric(eci_above(0.0, 5.0, 550.0, at), [0.0; 3], at).unwrap();
        assert_abs_diff_eq!(east.azimuth_deg, 90.0, epsilon = 1e-6);

        let south = tf.to_topocentric(eci_above(-5.0, 0.0, 550.0, at), [0.0; 3], at).unwrap();
        assert_abs_diff_eq!(south.azimuth_deg, 180.0, epsilon = 1e-6);

        let west = tf.to_topocentric(eci_above(0.0, -5.0, 550.0, at), [0.0; 3], at).unwrap();
        assert_abs_diff_eq!(west.azimuth_deg, 270.0, epsilon = 1e-6);
    }

    #[test]
    fn test_angle_ranges_hold_everywhere() {
        let tf = FrameTransformer::new(ObserverLocation::ntpu());
        let at = epoch();
        for lat in (-80..=80).step_by(20) {
            for lon in (-180..180).step_by(20) {
                let pos = eci_above(lat as f64, lon as f64, 800.0, at);
                let geo = tf.to_topocentric(pos, [1.0, 2.0, 3.0], at).unwrap();
                assert!((-90.0..=90.0).contains(&geo.elevation_deg));
                assert!((0.0..360.0).contains(&geo.azimuth_deg));
                assert!(geo.range_km > 0.0);
            }
        }
    }

    #[test]
    fn test_horizon_is_visible_at_zero_threshold() {
        let tf = FrameTransformer::new(ObserverLocation::new(0.0, 0.0, 0.0).unwrap());
        let at = epoch();
        // A point due east on the local horizontal plane.
        let obs = tf.observer_ecef_km();
        let ecef = [obs[0], obs[1] + 1000.0, obs[2]];
        let pos = ecef_to_eci_position(ecef, gmst(at));
        let geo = tf.to_topocentric(pos, [0.0; 3], at).unwrap();
        assert_abs_diff_eq!(geo.elevation_deg, 0.0, epsilon = 1e-9);
        assert_eq!(geo.is_visible, geo.elevation_deg >= 0.0);
    }

    #[test]
    fn test_range_rate_sign() {
        let obs = ObserverLocation::ntpu();
        let tf = FrameTransformer::new(obs);
        let at = epoch();
        let pos = eci_above(obs.latitude_deg, obs.longitude_deg, 550.0, at);
        let r = (pos[0] * pos[0] + pos[1] * pos[1] + pos[2] * pos[2]).sqrt();
        let radial_out = [pos[0] / r, pos[1] / r, pos[2] / r];

        let receding = tf.to_topocentric(pos, radial_out, at).unwrap();
        assert!(receding.range_rate_km_s > 0.9);

        let inbound = [-radial_out[0], -radial_out[1], -radial_out[2]];
        let approaching = tf.to_topocentric(pos, inbound, at).unwrap();
        assert!(approaching.range_rate_km_s < -0.9);
    }

    #[test]
    fn test_geodetic_of_overhead_point() {
        let obs = ObserverLocation::ntpu();
        let tf = FrameTransformer::new(obs);
        let at = epoch();
        let geo = tf
            .to_geodetic(eci_above(obs.latitude_deg, obs.longitude_deg, 550.0, at), at)
            .unwrap();
        assert_abs_diff_eq!(geo.latitude_deg, obs.latitude_deg, epsilon = 1e-6);
        assert_abs_diff_eq!(geo.longitude_deg, obs.longitude_deg, epsilon = 1e-6);
        assert_abs_diff_eq!(geo.altitude_km, 550.0, epsilon = 1e-3);
    }
}
