use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::frames::{Geodetic, ObserverRelativeGeometry};
use crate::link::LinkBudgetResult;
use crate::orbit::OrbitalState;
use crate::visibility::VisibilityTier;

/// One instant of a satellite track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackPoint {
    pub state: OrbitalState,
    pub geodetic: Geodetic,
    pub geometry: ObserverRelativeGeometry,
    pub tier: Option<VisibilityTier>,
    /// Only computed while the satellite is visible.
    pub link: Option<LinkBudgetResult>,
}

/// A time step that could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepFailure {
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatelliteTrack {
    pub satellite: String,
    pub norad_id: u32,
    pub points: Vec<TrackPoint>,
    pub failures: Vec<StepFailure>,
}

impl SatelliteTrack {
    pub fn visible_points(&self) -> impl Iterator<Item = &TrackPoint> {
        self.points.iter().filter(|p| p.geometry.is_visible)
    }
}

/// A satellite that produced no track at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatelliteFailure {
    pub satellite: String,
    pub norad_id: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub satellites: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub chunks: usize,
    pub points: usize,
    pub failed_steps: usize,
}

impl BatchSummary {
    pub fn merge(self, other: BatchSummary) -> BatchSummary {
        BatchSummary {
            satellites: self.satellites + other.satellites,
            succeeded: self.succeeded + other.succeeded,
            failed: self.failed + other.failed,
            chunks: self.chunks + other.chunks,
            points: self.points + other.points,
            failed_steps: self.failed_steps + other.failed_steps,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub tracks: Vec<SatelliteTrack>,
    pub failures: Vec<SatelliteFailure>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn merge(mut self, other: BatchReport) -> BatchReport {
        self.tracks.extend(other.tracks);
        self.failures.extend(other.failures);
        self.summary = self.summary.merge(other.summary);
        self
    }
}
