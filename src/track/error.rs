use thiserror::Error;

use crate::frames::FrameError;
use crate::link::LinkError;
use crate::orbit::PropagationError;
use crate::visibility::VisibilityError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackError {
    #[error("propagation error: {0}")]
    Propagation(#[from] PropagationError),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("visibility error: {0}")]
    Visibility(#[from] VisibilityError),
    #[error("link error: {0}")]
    Link(#[from] LinkError),
    #[error("invalid batch size {0}")]
    InvalidChunkSize(usize),
}
