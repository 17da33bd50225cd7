use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::{LEO_MAX_RADIUS_KM, LEO_MIN_RADIUS_KM, R_EARTH_MEAN};
use crate::orbit::PropagationError;

/// Satellite kinematics at one instant in the Earth-centred inertial frame.
///
/// SGP4 output is in TEME, which this crate treats as its inertial frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbitalState {
    pub timestamp: DateTime<Utc>,
    pub position_eci_km: [f64; 3],
    pub velocity_eci_km_s: [f64; 3],
}

impl OrbitalState {
    /// Build a state, rejecting radii outside the LEO band.
    pub fn new(
        timestamp: DateTime<Utc>,
        position_eci_km: [f64; 3],
        velocity_eci_km_s: [f64; 3],
    ) -> Result<Self, PropagationError> {
        let state = Self {
            timestamp,
            position_eci_km,
            velocity_eci_km_s,
        };
        let radius_km = state.radius_km();
        if !(LEO_MIN_RADIUS_KM..=LEO_MAX_RADIUS_KM).contains(&radius_km) {
            return Err(PropagationError::ImplausibleRadius {
                radius_km,
                min_km: LEO_MIN_RADIUS_KM,
                max_km: LEO_MAX_RADIUS_KM,
            });
        }
        Ok(state)
    }

    pub fn radius_km(&self) -> f64 {
        norm(self.position_eci_km)
    }

    pub fn speed_km_s(&self) -> f64 {
        norm(self.velocity_eci_km_s)
    }

    /// Height above a spherical Earth of mean radius.
    pub fn altitude_km(&self) -> f64 {
        self.radius_km() - R_EARTH_MEAN
    }
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}
