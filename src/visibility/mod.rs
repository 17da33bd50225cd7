//! Elevation thresholds, visibility tiers and pass search.

mod error;
mod evaluator;
mod pass_finder;
mod types;

pub use error::VisibilityError;
pub use evaluator::{VisibilityEvaluator, DEFAULT_MIN_ELEVATION_DEG};
pub use pass_finder::predict_passes;
pub use types::{Environment, LayeredThresholds, Pass, VisibilityTier};
