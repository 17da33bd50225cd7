use thiserror::Error;

use crate::frames::FrameError;
use crate::orbit::PropagationError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VisibilityError {
    #[error("propagation error: {0}")]
    Propagation(#[from] PropagationError),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("invalid search window: {0}")]
    InvalidWindow(String),
}
