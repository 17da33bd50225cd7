use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropagationError {
    #[error("eccentricity {0} does not describe a closed orbit")]
    InvalidEccentricity(f64),
    #[error(
        "Kepler solver did not converge after {iterations} iterations \
         (e = {eccentricity}, M = {mean_anomaly} rad)"
    )]
    KeplerNonConvergence {
        eccentricity: f64,
        mean_anomaly: f64,
        iterations: usize,
    },
    #[error("geocentric radius {radius_km:.1} km is outside the LEO band [{min_km}, {max_km}] km")]
    ImplausibleRadius {
        radius_km: f64,
        min_km: f64,
        max_km: f64,
    },
    #[error("SGP4 initialisation failed: {0}")]
    Sgp4Init(String),
    #[error("SGP4 propagation failed: {0}")]
    Sgp4(String),
    #[error("invalid time argument: {0}")]
    InvalidTime(String),
    #[error("requested time is {days:.1} days from the element epoch (limit {limit_days} days)")]
    EpochTooFar { days: f64, limit_days: f64 },
}

impl From<sgp4::ElementsError> for PropagationError {
    fn from(err: sgp4::ElementsError) -> Self {
        PropagationError::Sgp4Init(err.to_string())
    }
}

impl From<sgp4::Error> for PropagationError {
    fn from(err: sgp4::Error) -> Self {
        PropagationError::Sgp4(err.to_string())
    }
}
