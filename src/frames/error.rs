use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("invalid observer: {0}")]
    InvalidObserver(String),
    #[error("geodetic conversion did not converge for ECEF ({0:.3}, {1:.3}, {2:.3}) km")]
    GeodeticNonConvergence(f64, f64, f64),
    #[error("satellite and observer positions coincide")]
    DegenerateGeometry,
    #[error("non-finite {0} vector")]
    NonFinite(&'static str),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}
