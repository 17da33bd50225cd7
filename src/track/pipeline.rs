use chrono::{DateTime, Duration, Utc};

use super::types::{
    BatchReport, BatchSummary, SatelliteFailure, SatelliteTrack, StepFailure, TrackPoint,
};
use super::TrackError;
use crate::link::{LinkBudgetModel, Weather};
use crate::orbit::{OrbitalPropagator, OrbitalState};
use crate::tle::TleRecord;
use crate::visibility::VisibilityEvaluator;

pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Element set to link budget, one satellite and one instant at a time.
///
/// Holds only read-only configuration, so one pipeline can be shared by
/// reference across worker threads.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub propagator: OrbitalPropagator,
    pub evaluator: VisibilityEvaluator,
    pub link: LinkBudgetModel,
    pub weather: Weather,
    pub rain_rate_mm_h: Option<f64>,
}

impl Pipeline {
    pub fn new(
        propagator: OrbitalPropagator,
        evaluator: VisibilityEvaluator,
        link: LinkBudgetModel,
    ) -> Self {
        Self {
            propagator,
            evaluator,
            link,
            weather: Weather::default(),
            rain_rate_mm_h: None,
        }
    }

    pub fn with_weather(mut self, weather: Weather, rain_rate_mm_h: Option<f64>) -> Self {
        self.weather = weather;
        self.rain_rate_mm_h = rain_rate_mm_h;
        self
    }

    /// Everything derived from one state.
    pub fn point(&self, state: OrbitalState) -> Result<TrackPoint, TrackError> {
        let geodetic = self.evaluator.transformer().state_to_geodetic(&state)?;
        let geometry = self.evaluator.evaluate(&state)?;
        let (tier, link) = if geometry.is_visible {
            let link = self.link.evaluate(&geometry, self.weather, self.rain_rate_mm_h)?;
            (self.evaluator.classify(geometry.elevation_deg), Some(link))
        } else {
            (None, None)
        };
        Ok(TrackPoint {
            state,
            geodetic,
            geometry,
            tier,
            link,
        })
    }

    /// `count` points from `start`, `step_seconds` apart. Failed steps are
    /// recorded and skipped; only model initialisation fails the call.
    pub fn track_satellite(
        &self,
        tle: &TleRecord,
        start: DateTime<Utc>,
        step_seconds: f64,
        count: usize,
    ) -> Result<SatelliteTrack, TrackError> {
        let prepared = self.propagator.prepare(tle)?;
        let mut track = SatelliteTrack {
            satellite: tle.satellite_name.clone(),
            norad_id: tle.norad_id,
            points: Vec::with_capacity(count),
            failures: Vec::new(),
        };

        for (index, step) in prepared.series(start, step_seconds, count)?.enumerate() {
            match step.map_err(TrackError::from).and_then(|state| self.point(state)) {
                Ok(point) => track.points.push(point),
                Err(err) => {
                    let offset_ms = (step_seconds * 1000.0 * index as f64).round() as i64;
                    let offset = Duration::milliseconds(offset_ms);
                    log::debug!("{}: step {} failed: {}", tle.satellite_name, index, err);
                    track.failures.push(StepFailure {
                        timestamp: start + offset,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(track)
    }

    /// Track many satellites in chunks. A satellite that cannot be tracked
    /// is reported and the rest of the batch carries on.
    pub fn run_batch(
        &self,
        tles: &[TleRecord],
        start: DateTime<Utc>,
        step_seconds: f64,
        count: usize,
        chunk_size: usize,
    ) -> Result<BatchReport, TrackError> {
        if chunk_size == 0 {
            return Err(TrackError::InvalidChunkSize(chunk_size));
        }

        let mut report = BatchReport::default();
        let total_chunks = tles.len().div_ceil(chunk_size);
        for (chunk_index, chunk) in tles.chunks(chunk_size).enumerate() {
            let mut summary = BatchSummary {
                satellites: chunk.len(),
                chunks: 1,
                ..BatchSummary::default()
            };

            for tle in chunk {
                match self.track_satellite(tle, start, step_seconds, count) {
                    Ok(track) if track.points.is_empty() && !track.failures.is_empty() => {
                        let reason = track.failures[0].reason.clone();
                        log::warn!(
                            "{} ({}): no usable steps: {}",
                            tle.satellite_name,
                            tle.norad_id,
                            reason
                        );
                        summary.failed += 1;
                        summary.failed_steps += track.failures.len();
                        report.failures.push(SatelliteFailure {
                            satellite: tle.satellite_name.clone(),
                            norad_id: tle.norad_id,
                            reason,
                        });
                    }
                    Ok(track) => {
                        summary.succeeded += 1;
                        summary.points += track.points.len();
                        summary.failed_steps += track.failures.len();
                        report.tracks.push(track);
                    }
                    Err(err) => {
                        log::warn!("{} ({}): {}", tle.satellite_name, tle.norad_id, err);
                        summary.failed += 1;
                        report.failures.push(SatelliteFailure {
                            satellite: tle.satellite_name.clone(),
                            norad_id: tle.norad_id,
                            reason: err.to_string(),
                        });
                    }
                }
            }

            log::info!(
                "chunk {}/{}: {} ok, {} failed",
                chunk_index + 1,
                total_chunks,
                summary.succeeded,
                summary.failed
            );
            report.summary = report.summary.merge(summary);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::ObserverLocation;
    use crate::orbit::PropagatorKind;
    use crate::tle::TleParser;
    use chrono::TimeZone;

    const CATALOG: &str = "SAT-A
1 55001U 24001A   24001.50000000  .00001000  00000-0  10000-3 0  9995
2 55001  53.0000 120.0000 0001000  90.0000   0.0000 15.05000000 12345
GEO-SAT
1 55003U 24001A   24001.50000000  .00000000  00000-0  00000-0 0  9992
2 55003   0.0000   0.0000 0000000   0.0000   0.0000  1.00270000  1006
SAT-B
1 55002U 24001A   24001.50000000  .00001000  00000-0  10000-3 0  9996
2 55002  53.0000 150.0000 0001000  90.0000  45.0000 15.08000000 12341
";

    fn pipeline(kind: PropagatorKind) -> Pipeline {
        Pipeline::new(
            OrbitalPropagator::new(kind),
            VisibilityEvaluator::new(ObserverLocation::ntpu(), 10.0),
            LinkBudgetModel::default(),
        )
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_track_points_are_consistent() {
        let tles: Vec<_> = TleParser::default().parse(CATALOG).collect();
        let track = pipeline(PropagatorKind::Sgp4)
            .track_satellite(&tles[0], start(), 60.0, 200)
            .unwrap();
        assert_eq!(track.points.len(), 200);
        assert!(track.failures.is_empty());
        for p in &track.points {
            assert_eq!(p.link.is_some(), p.geometry.is_visible);
            assert_eq!(p.tier.is_some(), p.geometry.is_visible);
            assert!(p.geodetic.altitude_km > 500.0 && p.geodetic.altitude_km < 600.0);
        }
    }

    #[test]
    fn test_batch_isolates_failures() {
        let tles: Vec<_> = TleParser::default().parse(CATALOG).collect();
        assert_eq!(tles.len(), 3);
        for kind in [PropagatorKind::Sgp4, PropagatorKind::KeplerJ2] {
            let report = pipeline(kind).run_batch(&tles, start(), 120.0, 10, 2).unwrap();
            assert_eq!(report.summary.satellites, 3);
            assert_eq!(report.summary.succeeded, 2);
            assert_eq!(report.summary.failed, 1);
            assert_eq!(report.summary.chunks, 2);
            assert_eq!(report.failures[0].norad_id, 55003);
            let ids: Vec<_> = report.tracks.iter().map(|t| t.norad_id).collect();
            assert_eq!(ids, vec![55001, 55002]);
        }
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let tles: Vec<_> = TleParser::default().parse(CATALOG).collect();
        assert_eq!(
            pipeline(PropagatorKind::Sgp4).run_batch(&tles, start(), 60.0, 1, 0),
            Err(TrackError::InvalidChunkSize(0))
        );
    }
}
