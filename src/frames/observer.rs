use serde::{Deserialize, Serialize};

use super::geodetic::geodetic_to_ecef;
use super::FrameError;

/// Fixed ground location the geometry is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverLocation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl Default for ObserverLocation {
    fn default() -> Self {
        Self::ntpu()
    }
}

impl ObserverLocation {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Result<Self, FrameError> {
        if !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(FrameError::InvalidObserver(format!(
                "latitude {} outside [-90, 90]",
                latitude_deg
            )));
        }
        if !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(FrameError::InvalidObserver(format!(
                "longitude {} outside [-180, 180]",
                longitude_deg
            )));
        }
        if !(altitude_m >= 0.0 && altitude_m.is_finite()) {
            return Err(FrameError::InvalidObserver(format!(
                "altitude {} m must be a non-negative number",
                altitude_m
            )));
        }
        Ok(Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        })
    }

    /// National Taipei University ground station.
    pub fn ntpu() -> Self {
        Self {
            latitude_deg: 24.944_166_7,
            longitude_deg: 121.371_388_9,
            altitude_m: 50.0,
        }
    }

    /// Parse `"lat, lon"` as written in station configs.
    pub fn from_coordinates(
        coordinates: &str,
        altitude_m: Option<f64>,
    ) -> Result<Self, FrameError> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return Err(FrameError::InvalidObserver(format!(
                "expected 'lat, lon', got '{}'",
                coordinates
            )));
        }
        let parse = |s: &str| {
            s.parse::<f64>()
                .map_err(|_| FrameError::InvalidObserver(format!("'{}' is not a number", s)))
        };
        Self::new(parse(parts[0])?, parse(parts[1])?, altitude_m.unwrap_or(0.0))
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        geodetic_to_ecef(self.latitude_deg, self.longitude_deg, self.altitude_m / 1000.0)
    }
}
