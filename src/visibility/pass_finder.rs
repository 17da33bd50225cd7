use chrono::{DateTime, Duration, Utc};

use crate::frames::ObserverRelativeGeometry;
use crate::orbit::PreparedSatellite;
use crate::tle::TleRecord;

use super::types::Pass;
use super::{VisibilityError, VisibilityEvaluator};

const COARSE_STEP_SECONDS: i64 = 60; // initial scan
const FINE_STEP_SECONDS: i64 = 1; // crossing refinement

fn sample(
    evaluator: &VisibilityEvaluator,
    satellite: &PreparedSatellite<'_>,
    at: DateTime<Utc>,
) -> Result<ObserverRelativeGeometry, VisibilityError> {
    let state = satellite.propagate(at)?;
    evaluator.evaluate(&state)
}

/// Find every window in `[start, end]` where the satellite is above the
/// evaluator's effective minimum elevation.
///
/// A pass already in progress at `start` opens at `start`; one still in
/// progress at `end` closes at `end`. A pass that sets between the last
/// coarse sample and `end` closes at its refined LOS.
pub fn predict_passes(
    evaluator: &VisibilityEvaluator,
    satellite: &PreparedSatellite<'_>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Pass>, VisibilityError> {
    if end <= start {
        return Err(VisibilityError::InvalidWindow(format!(
            "end {} is not after start {}",
            end, start
        )));
    }

    let tle = satellite.tle();
    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);
    let mut passes = Vec::new();
    let mut cursor = start;

    let mut prev_visible = false;
    let mut pass_start: Option<(DateTime<Utc>, f64)> = None;
    let mut max_el = f64::MIN;
    let mut max_el_time = cursor;
    let mut last_sample = cursor;

    while cursor <= end {
        let geometry = sample(evaluator, satellite, cursor)?;
        let visible = geometry.is_visible;

        if visible && !prev_visible {
            let aos = if cursor == start {
                (cursor, geometry.azimuth_deg)
            } else {
                refine_crossing(evaluator, satellite, cursor - coarse_step, cursor, true)?
            };
            pass_start = Some(aos);
            max_el = geometry.elevation_deg;
            max_el_time = cursor;
        } else if visible {
            if geometry.elevation_deg > max_el {
                max_el = geometry.elevation_deg;
                max_el_time = cursor;
            }
        } else if prev_visible {
            if let Some((aos, aos_az)) = pass_start.take() {
                let (los, los_az) =
                    refine_crossing(evaluator, satellite, cursor - coarse_step, cursor, false)?;
                let (tca, tca_el) =
                    refine_culmination(evaluator, satellite, max_el_time, max_el, aos, los)?;
                passes.push(make_pass(tle, (aos, aos_az), (los, los_az), (tca, tca_el)));
            }
        }

        prev_visible = visible;
        last_sample = cursor;
        cursor += coarse_step;
    }

    if let Some(aos) = pass_start {
        let geometry = sample(evaluator, satellite, end)?;
        let pass = if geometry.is_visible {
            let tca = if geometry.elevation_deg > max_el {
                (end, geometry.elevation_deg)
            } else {
                (max_el_time, max_el)
            };
            make_pass(tle, aos, (end, geometry.azimuth_deg), tca)
        } else {
            // Set after the last coarse sample.
            let (los, los_az) = refine_crossing(evaluator, satellite, last_sample, end, false)?;
            let tca = refine_culmination(evaluator, satellite, max_el_time, max_el, aos.0, los)?;
            make_pass(tle, aos, (los, los_az), tca)
        };
        passes.push(pass);
    }

    log::debug!(
        "{} passes of {} between {} and {}",
        passes.len(),
        tle.satellite_name,
        start,
        end
    );
    Ok(passes)
}

fn make_pass(
    tle: &TleRecord,
    (aos, aos_az): (DateTime<Utc>, f64),
    (los, los_az): (DateTime<Utc>, f64),
    (tca, tca_el): (DateTime<Utc>, f64),
) -> Pass {
    Pass {
        satellite: tle.satellite_name.clone(),
        norad_id: tle.norad_id,
        aos,
        los,
        tca,
        max_elevation_deg: round2(tca_el),
        aos_azimuth_deg: round2(aos_az),
        los_azimuth_deg: round2(los_az),
        duration_seconds: (los - aos).num_seconds(),
    }
}

/// Binary search for the threshold crossing between `before` and `after`.
fn refine_crossing(
    evaluator: &VisibilityEvaluator,
    satellite: &PreparedSatellite<'_>,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    rising: bool,
) -> Result<(DateTime<Utc>, f64), VisibilityError> {
    let mut low = before;
    let mut high = after;

    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let mid = low + (high - low) / 2;
        let above = sample(evaluator, satellite, mid)?.is_visible;
        if above == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    // Rising: first visible instant. Setting: last visible instant.
    let edge = if rising { high } else { low };
    let geometry = sample(evaluator, satellite, edge)?;
    Ok((edge, geometry.azimuth_deg))
}

/// Ternary search around the coarse maximum, kept inside the pass.
fn refine_culmination(
    evaluator: &VisibilityEvaluator,
    satellite: &PreparedSatellite<'_>,
    coarse_time: DateTime<Utc>,
    coarse_el: f64,
    aos: DateTime<Utc>,
    los: DateTime<Utc>,
) -> Result<(DateTime<Utc>, f64), VisibilityError> {
    let span = Duration::seconds(COARSE_STEP_SECONDS);
    let mut low = (coarse_time - span).max(aos);
    let mut high = (coarse_time + span).min(los);

    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let third = (high - low) / 3;
        let m1 = low + third;
        let m2 = high - third;
        let el1 = sample(evaluator, satellite, m1)?.elevation_deg;
        let el2 = sample(evaluator, satellite, m2)?.elevation_deg;
        if el1 < el2 {
            low = m1;
        } else {
            high = m2;
        }
    }

    let mid = low + (high - low) / 2;
    let el = sample(evaluator, satellite, mid)?.elevation_deg;
    if el >= coarse_el {
        Ok((mid, el))
    } else {
        Ok((coarse_time, coarse_el))
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
