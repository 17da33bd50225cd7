use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Surroundings of the ground station; rougher terrain raises the
/// elevation a link needs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Environment {
    #[default]
    Open,
    Urban,
    Mountainous,
}

impl Environment {
    pub fn elevation_factor(&self) -> f64 {
        match self {
            Environment::Open => 1.0,
            Environment::Urban => 1.1,
            Environment::Mountainous => 1.3,
        }
    }
}

/// Elevation bands a visible satellite can fall into, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VisibilityTier {
    Critical,
    Standard,
    Preferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayeredThresholds {
    pub critical_deg: f64,
    pub standard_deg: f64,
    pub preferred_deg: f64,
}

impl Default for LayeredThresholds {
    fn default() -> Self {
        Self {
            critical_deg: 5.0,
            standard_deg: 10.0,
            preferred_deg: 15.0,
        }
    }
}

/// A predicted satellite pass
#[derive(Debug, Clone, Serialize)]
pub struct Pass {
    pub satellite: String,
    pub norad_id: u32,
    pub aos: DateTime<Utc>,
    pub los: DateTime<Utc>,
    pub tca: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub aos_azimuth_deg: f64,
    pub los_azimuth_deg: f64,
    pub duration_seconds: i64,
}
