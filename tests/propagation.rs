use approx::assert_abs_diff_eq;
use chrono::{Duration, TimeZone, Utc};

use leo_link::constants::{LEO_MAX_RADIUS_KM, LEO_MIN_RADIUS_KM};
use leo_link::frames::geodetic::eci_to_ecef_position;
use leo_link::frames::{
    ecef_to_geodetic, geodetic_to_ecef, gmst, FrameTransformer, ObserverLocation,
};
use leo_link::orbit::{OrbitalPropagator, PropagationError, PropagatorKind};
use leo_link::tle::{TleParser, TleRecord};

const CATALOG: &str = "\
STARLINK-TEST-A
1 55001U 24001A   24001.50000000  .00001000  00000-0  10000-3 0  9995
2 55001  53.0000 120.0000 0001000  90.0000   0.0000 15.05000000 12345
ISS (ZARYA)
1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537
";

fn catalog() -> Vec<TleRecord> {
    TleParser::default().parse(CATALOG).collect()
}

#[test]
fn test_550_km_orbit_at_epoch() {
    let tle = &catalog()[0];
    let sgp4 = OrbitalPropagator::new(PropagatorKind::Sgp4)
        .propagate_minutes(tle, 0.0)
        .unwrap();
    assert_abs_diff_eq!(sgp4.radius_km(), 6921.0, epsilon = 5.0);

    // The two-body fallback reads mean elements as osculating ones.
    let kepler = OrbitalPropagator::new(PropagatorKind::KeplerJ2)
        .propagate_minutes(tle, 0.0)
        .unwrap();
    assert_abs_diff_eq!(kepler.radius_km(), 6921.0, epsilon = 15.0);
}

#[test]
fn test_models_agree_near_epoch() {
    let tle = &catalog()[0];
    let sgp4 = OrbitalPropagator::new(PropagatorKind::Sgp4)
        .propagate(tle, tle.epoch)
        .unwrap();
    let kepler = OrbitalPropagator::new(PropagatorKind::KeplerJ2)
        .propagate(tle, tle.epoch)
        .unwrap();
    let d: f64 = (0..3)
        .map(|k| (sgp4.position_eci_km[k] - kepler.position_eci_km[k]).powi(2))
        .sum::<f64>()
        .sqrt();
    assert!(d < 50.0, "models differ by {} km", d);
}

#[test]
fn test_radius_stays_in_leo_band() {
    for tle in &catalog() {
        for kind in [PropagatorKind::Sgp4, PropagatorKind::KeplerJ2] {
            let propagator = OrbitalPropagator::new(kind);
            // Two periods, every 30 s, starting half a day after epoch.
            let start = tle.epoch + Duration::hours(12);
            let count = (2.0 * tle.period_minutes() * 2.0) as usize;
            for step in propagator.propagate_series(tle, start, 30.0, count).unwrap() {
                let state = step.unwrap();
                let r = state.radius_km();
                assert!(
                    (LEO_MIN_RADIUS_KM..=LEO_MAX_RADIUS_KM).contains(&r),
                    "{} {:?}: {}",
                    tle.norad_id,
                    kind,
                    r
                );
            }
        }
    }
}

#[test]
fn test_propagation_is_deterministic() {
    let tles = catalog();
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    for kind in [PropagatorKind::Sgp4, PropagatorKind::KeplerJ2] {
        let propagator = OrbitalPropagator::new(kind);
        let a = propagator.propagate(&tles[0], at).unwrap();
        let b = propagator.propagate(&tles[0], at).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.position_eci_km.map(f64::to_bits), b.position_eci_km.map(f64::to_bits));
    }
}

#[test]
fn test_iss_reference_altitude() {
    let tle = &catalog()[1];
    let state = OrbitalPropagator::new(PropagatorKind::Sgp4)
        .propagate(tle, tle.epoch)
        .unwrap();
    let transformer = FrameTransformer::new(ObserverLocation::ntpu());
    let geodetic = transformer.state_to_geodetic(&state).unwrap();
    let altitude = geodetic.altitude_km;
    assert!(altitude > 330.0 && altitude < 380.0, "{}", altitude);
    assert!(geodetic.latitude_deg.abs() <= 51.7);
}

#[test]
fn test_geodetic_round_trip_of_propagated_positions() {
    let tle = &catalog()[0];
    let propagator = OrbitalPropagator::new(PropagatorKind::Sgp4);
    let transformer = FrameTransformer::new(ObserverLocation::ntpu());
    for step in propagator.propagate_series(tle, tle.epoch, 300.0, 40).unwrap() {
        let state = step.unwrap();
        let geodetic = transformer.state_to_geodetic(&state).unwrap();
        let direct = eci_to_ecef_position(state.position_eci_km, gmst(state.timestamp));
        let back = geodetic_to_ecef(
            geodetic.latitude_deg,
            geodetic.longitude_deg,
            geodetic.altitude_km,
        );
        let err_m = (0..3).map(|k| (direct[k] - back[k]).powi(2)).sum::<f64>().sqrt() * 1000.0;
        assert!(err_m < 1.0, "{} m", err_m);
        assert_eq!(ecef_to_geodetic(direct).unwrap(), geodetic);
    }
}

#[test]
fn test_geostationary_elements_rejected() {
    let text = "\
GEO-TEST
1 55003U 24001A   24001.50000000  .00000000  00000-0  00000-0 0  9992
2 55003   0.0000   0.0000 0000000   0.0000   0.0000  1.00270000  1006
";
    let tle = TleParser::default().parse(text).next().unwrap();
    for kind in [PropagatorKind::Sgp4, PropagatorKind::KeplerJ2] {
        assert!(matches!(
            OrbitalPropagator::new(kind).propagate(&tle, tle.epoch),
            Err(PropagationError::ImplausibleRadius { .. })
        ));
    }
}
