use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RainError {
    #[error("frequency must be a positive number of GHz, got {0}")]
    InvalidFrequency(f64),
    #[error("non-finite {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error(
        "heights must be non-negative: rain {rain_height_km} km, station {station_height_km} km"
    )]
    InvalidHeights {
        rain_height_km: f64,
        station_height_km: f64,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LinkError {
    #[error("rain attenuation: {0}")]
    Rain(#[from] RainError),
    #[error("distance must be a positive number of km, got {0}")]
    InvalidDistance(f64),
    #[error("frequency must be a positive number of GHz, got {0}")]
    InvalidFrequency(f64),
    #[error("bandwidth must be positive, got {0} MHz")]
    InvalidBandwidth(f64),
    #[error("non-finite {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },
}
