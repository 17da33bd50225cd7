use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sgp4::{Classification, Constants, Elements, MinutesSinceEpoch};
use strum_macros::{Display, EnumString};

use super::kepler::KeplerElements;
use super::{OrbitalState, PropagationError};
use crate::tle::TleRecord;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropagatorKind {
    /// Full SGP4/SDP4 theory.
    #[default]
    Sgp4,
    /// Two-body motion with J2 secular drift.
    KeplerJ2,
}

/// Per-step outcome of a series; a failed step does not end the series.
pub type StepResult = Result<OrbitalState, PropagationError>;

/// Turns element sets into inertial states at requested instants.
///
/// Time is always measured from the element set's own epoch. There is no
/// notion of "now" anywhere in this type.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitalPropagator {
    pub kind: PropagatorKind,
    /// Reject requests further than this from the element epoch.
    pub max_epoch_offset_days: Option<f64>,
}

impl OrbitalPropagator {
    pub fn new(kind: PropagatorKind) -> Self {
        Self {
            kind,
            max_epoch_offset_days: None,
        }
    }

    pub fn with_max_epoch_offset_days(mut self, days: f64) -> Self {
        self.max_epoch_offset_days = Some(days);
        self
    }

    /// Run model initialisation once so a satellite can be propagated many times.
    pub fn prepare<'a>(
        &self,
        tle: &'a TleRecord,
    ) -> Result<PreparedSatellite<'a>, PropagationError> {
        if !(0.0..1.0).contains(&tle.eccentricity) {
            return Err(PropagationError::InvalidEccentricity(tle.eccentricity));
        }

        let model = match self.kind {
            PropagatorKind::Sgp4 => {
                let elements = sgp4_elements(tle);
                let constants = Constants::from_elements(&elements)?;
                Model::Sgp4 {
                    elements: Box::new(elements),
                    constants: Box::new(constants),
                }
            }
            PropagatorKind::KeplerJ2 => Model::Kepler(KeplerElements::from_tle(tle)?),
        };

        Ok(PreparedSatellite {
            tle,
            model,
            max_epoch_offset_days: self.max_epoch_offset_days,
        })
    }

    pub fn propagate(&self, tle: &TleRecord, at: DateTime<Utc>) -> StepResult {
        self.prepare(tle)?.propagate(at)
    }

    /// Propagate to an epoch-anchored offset in minutes.
    pub fn propagate_minutes(&self, tle: &TleRecord, minutes_since_epoch: f64) -> StepResult {
        self.prepare(tle)?.propagate_minutes(minutes_since_epoch)
    }

    /// `count` states starting at `start`, `step_seconds` apart.
    ///
    /// The outer error covers bad arguments and model initialisation; each
    /// step carries its own result.
    pub fn propagate_series(
        &self,
        tle: &TleRecord,
        start: DateTime<Utc>,
        step_seconds: f64,
        count: usize,
    ) -> Result<Vec<StepResult>, PropagationError> {
        let prepared = self.prepare(tle)?;
        Ok(prepared.series(start, step_seconds, count)?.collect())
    }
}

enum Model {
    Sgp4 {
        elements: Box<Elements>,
        constants: Box<Constants>,
    },
    Kepler(KeplerElements),
}

/// A satellite whose model constants have been computed.
pub struct PreparedSatellite<'a> {
    tle: &'a TleRecord,
    model: Model,
    max_epoch_offset_days: Option<f64>,
}

impl<'a> PreparedSatellite<'a> {
    pub fn tle(&self) -> &'a TleRecord {
        self.tle
    }

    pub fn propagate(&self, at: DateTime<Utc>) -> StepResult {
        let minutes = match &self.model {
            Model::Sgp4 { elements, .. } => elements
                .datetime_to_minutes_since_epoch(&at.naive_utc())
                .map_err(|e| PropagationError::InvalidTime(e.to_string()))?
                .0,
            Model::Kepler(_) => self.tle.minutes_since_epoch(at),
        };
        self.propagate_at(at, minutes)
    }

    pub fn propagate_minutes(&self, minutes_since_epoch: f64) -> StepResult {
        if !minutes_since_epoch.is_finite() {
            return Err(PropagationError::InvalidTime(format!(
                "{} minutes since epoch",
                minutes_since_epoch
            )));
        }
        let at = self.tle.epoch + micros(minutes_since_epoch * 60.0)?;
        self.propagate_at(at, minutes_since_epoch)
    }

    fn propagate_at(&self, at: DateTime<Utc>, minutes: f64) -> StepResult {
        if let Some(limit_days) = self.max_epoch_offset_days {
            let days = minutes.abs() / 1440.0;
            if days > limit_days {
                return Err(PropagationError::EpochTooFar { days, limit_days });
            }
        }

        let (position, velocity) = match &self.model {
            Model::Sgp4 { constants, .. } => {
                let prediction = constants.propagate(MinutesSinceEpoch(minutes))?;
                (prediction.position, prediction.velocity)
            }
            Model::Kepler(elements) => elements.propagate(minutes * 60.0)?,
        };

        OrbitalState::new(at, position, velocity)
    }

    pub fn series(
        &self,
        start: DateTime<Utc>,
        step_seconds: f64,
        count: usize,
    ) -> Result<StateSeries<'_, 'a>, PropagationError> {
        if !(step_seconds.is_finite() && step_seconds > 0.0) {
            return Err(PropagationError::InvalidTime(format!(
                "step of {} s",
                step_seconds
            )));
        }
        Ok(StateSeries {
            satellite: self,
            start,
            step_seconds,
            index: 0,
            count,
        })
    }
}

/// Lazily propagated, fixed-length series of states.
#[derive(Clone)]
pub struct StateSeries<'p, 'a> {
    satellite: &'p PreparedSatellite<'a>,
    start: DateTime<Utc>,
    step_seconds: f64,
    index: usize,
    count: usize,
}

impl Iterator for StateSeries<'_, '_> {
    type Item = StepResult;

    fn next(&mut self) -> Option<StepResult> {
        if self.index >= self.count {
            return None;
        }
        let offset = micros(self.step_seconds * self.index as f64);
        self.index += 1;
        Some(offset.and_then(|o| self.satellite.propagate(self.start + o)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for StateSeries<'_, '_> {}

/// SGP4 elements from the already validated record fields.
///
/// The raw lines are not re-parsed: records accepted with checksum
/// verification off would be rejected a second time.
fn sgp4_elements(tle: &TleRecord) -> Elements {
    let classification = match tle.classification {
        'C' => Classification::Classified,
        'S' => Classification::Secret,
        _ => Classification::Unclassified,
    };
    Elements {
        object_name: Some(tle.satellite_name.clone()),
        international_designator: Some(tle.international_designator.clone())
            .filter(|d| !d.is_empty()),
        norad_id: u64::from(tle.norad_id),
        classification,
        datetime: tle.epoch.naive_utc(),
        mean_motion_dot: tle.mean_motion_dot,
        mean_motion_ddot: tle.mean_motion_ddot,
        drag_term: tle.bstar,
        element_set_number: u64::from(tle.element_set),
        inclination: tle.inclination_deg,
        right_ascension: tle.raan_deg,
        eccentricity: tle.eccentricity,
        argument_of_perigee: tle.arg_perigee_deg,
        mean_anomaly: tle.mean_anomaly_deg,
        mean_motion: tle.mean_motion_rev_per_day,
        revolution_number: u64::from(tle.revolution_number),
        ephemeris_type: 0,
    }
}

fn micros(seconds: f64) -> Result<Duration, PropagationError> {
    let us = (seconds * 1.0e6).round();
    if !us.is_finite() || us.abs() > i64::MAX as f64 / 2.0 {
        return Err(PropagationError::InvalidTime(format!("{} s offset", seconds)));
    }
    Ok(Duration::microseconds(us as i64))
}
