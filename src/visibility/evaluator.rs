use crate::frames::{FrameTransformer, ObserverLocation, ObserverRelativeGeometry};
use crate::orbit::OrbitalState;

use super::types::{Environment, LayeredThresholds, VisibilityTier};
use super::VisibilityError;

pub const DEFAULT_MIN_ELEVATION_DEG: f64 = 10.0;

/// Decides whether a satellite is usable from the observer.
///
/// The configured minimum elevation and the tier thresholds are scaled by
/// the environment factor; with the default open environment they apply
/// unchanged.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityEvaluator {
    transformer: FrameTransformer,
    min_elevation_deg: f64,
    thresholds: LayeredThresholds,
    environment: Environment,
}

impl VisibilityEvaluator {
    pub fn new(observer: ObserverLocation, min_elevation_deg: f64) -> Self {
        Self::with_environment(
            observer,
            min_elevation_deg,
            Environment::Open,
            LayeredThresholds::default(),
        )
    }

    pub fn with_environment(
        observer: ObserverLocation,
        min_elevation_deg: f64,
        environment: Environment,
        thresholds: LayeredThresholds,
    ) -> Self {
        let effective = min_elevation_deg * environment.elevation_factor();
        Self {
            transformer: FrameTransformer::new(observer).with_min_elevation(effective),
            min_elevation_deg,
            thresholds,
            environment,
        }
    }

    pub fn transformer(&self) -> &FrameTransformer {
        &self.transformer
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn configured_min_elevation_deg(&self) -> f64 {
        self.min_elevation_deg
    }

    /// Threshold actually applied to `is_visible`.
    pub fn effective_min_elevation_deg(&self) -> f64 {
        self.transformer.min_elevation_deg()
    }

    pub fn is_visible(&self, elevation_deg: f64) -> bool {
        elevation_deg >= self.effective_min_elevation_deg()
    }

    /// Geometry of `state` with the visibility flag set.
    pub fn evaluate(
        &self,
        state: &OrbitalState,
    ) -> Result<ObserverRelativeGeometry, VisibilityError> {
        let geometry = self.transformer.state_to_topocentric(state)?;
        if !(-90.0..=90.0).contains(&geometry.elevation_deg) {
            return Err(crate::frames::FrameError::OutOfRange {
                field: "elevation_deg",
                value: geometry.elevation_deg,
            }
            .into());
        }
        if !(0.0..360.0).contains(&geometry.azimuth_deg) {
            return Err(crate::frames::FrameError::OutOfRange {
                field: "azimuth_deg",
                value: geometry.azimuth_deg,
            }
            .into());
        }
        Ok(geometry)
    }

    /// Highest tier the elevation reaches, if any.
    pub fn classify(&self, elevation_deg: f64) -> Option<VisibilityTier> {
        let factor = self.environment.elevation_factor();
        if elevation_deg >= self.thresholds.preferred_deg * factor {
            Some(VisibilityTier::Preferred)
        } else if elevation_deg >= self.thresholds.standard_deg * factor {
            Some(VisibilityTier::Standard)
        } else if elevation_deg >= self.thresholds.critical_deg * factor {
            Some(VisibilityTier::Critical)
        } else {
            None
        }
    }
}
