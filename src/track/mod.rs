mod error;
mod pipeline;
mod types;

pub use error::TrackError;
pub use pipeline::{Pipeline, DEFAULT_CHUNK_SIZE};
pub use types::{
    BatchReport, BatchSummary, SatelliteFailure, SatelliteTrack, StepFailure, TrackPoint,
};
