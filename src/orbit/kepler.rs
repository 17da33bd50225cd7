//! Two-body propagation with J2 secular drift.
//!
//! Used when the SGP4 model is not selected. Elements are taken straight from
//! the TLE (treated as osculating at epoch), the mean anomaly advances
//! linearly, and the node and perigee drift under J2 once the requested time
//! is more than one period away from epoch.

use std::f64::consts::{PI, TAU};

use crate::constants::{J2, MU_EARTH, R_EARTH, SECONDS_PER_DAY};
use crate::orbit::PropagationError;
use crate::tle::TleRecord;

pub const MAX_ITERATIONS: usize = 50;
pub const TOLERANCE_RAD: f64 = 1e-8;

/// Solve `M = E - e sin E` for the eccentric anomaly by Newton-Raphson.
///
/// `mean_anomaly` may be any angle; the result lies in the same revolution
/// as `mean_anomaly` wrapped to [0, 2π).
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> Result<f64, PropagationError> {
    if !(0.0..1.0).contains(&eccentricity) {
        return Err(PropagationError::InvalidEccentricity(eccentricity));
    }
    if !mean_anomaly.is_finite() {
        return Err(PropagationError::InvalidTime(format!(
            "mean anomaly {} is not finite",
            mean_anomaly
        )));
    }

    let m = mean_anomaly.rem_euclid(TAU);
    let mut e_anom = if eccentricity < 0.8 { m } else { PI };

    for _ in 0..MAX_ITERATIONS {
        let residual = e_anom - eccentricity * e_anom.sin() - m;
        if residual.abs() < TOLERANCE_RAD {
            return Ok(e_anom);
        }
        e_anom -= residual / (1.0 - eccentricity * e_anom.cos());
    }

    let residual = e_anom - eccentricity * e_anom.sin() - m;
    if residual.abs() < TOLERANCE_RAD {
        return Ok(e_anom);
    }
    Err(PropagationError::KeplerNonConvergence {
        eccentricity,
        mean_anomaly: m,
        iterations: MAX_ITERATIONS,
    })
}

/// Mean elements in radians and kilometres.
#[derive(Debug, Clone, Copy)]
pub struct KeplerElements {
    pub a: f64,
    pub e: f64,
    pub i: f64,
    pub raan: f64,
    pub aop: f64,
    pub ma: f64,
    /// Mean motion (rad/s).
    pub n: f64,
}

impl KeplerElements {
    pub fn from_tle(tle: &TleRecord) -> Result<Self, PropagationError> {
        if !(0.0..1.0).contains(&tle.eccentricity) {
            return Err(PropagationError::InvalidEccentricity(tle.eccentricity));
        }
        let n = tle.mean_motion_rev_per_day * TAU / SECONDS_PER_DAY;
        Ok(Self {
            a: (MU_EARTH / (n * n)).cbrt(),
            e: tle.eccentricity,
            i: tle.inclination_deg.to_radians(),
            raan: tle.raan_deg.to_radians(),
            aop: tle.arg_perigee_deg.to_radians(),
            ma: tle.mean_anomaly_deg.to_radians(),
            n,
        })
    }

    pub fn period_s(&self) -> f64 {
        TAU / self.n
    }

    fn semi_latus_rectum(&self) -> f64 {
        self.a * (1.0 - self.e * self.e)
    }

    /// dΩ/dt = -3/2 n J2 (R/p)² cos i
    pub fn raan_rate(&self) -> f64 {
        let ratio = R_EARTH / self.semi_latus_rectum();
        -1.5 * self.n * J2 * ratio * ratio * self.i.cos()
    }

    /// dω/dt = 3/4 n J2 (R/p)² (5 cos² i - 1)
    pub fn aop_rate(&self) -> f64 {
        let ratio = R_EARTH / self.semi_latus_rectum();
        let cos_i = self.i.cos();
        0.75 * self.n * J2 * ratio * ratio * (5.0 * cos_i * cos_i - 1.0)
    }

    /// Position (km) and velocity (km/s) `dt_s` seconds after epoch.
    pub fn propagate(&self, dt_s: f64) -> Result<([f64; 3], [f64; 3]), PropagationError> {
        if !dt_s.is_finite() {
            return Err(PropagationError::InvalidTime(format!(
                "{} s since epoch",
                dt_s
            )));
        }

        let (raan, aop) = if dt_s.abs() > self.period_s() {
            (
                (self.raan + self.raan_rate() * dt_s).rem_euclid(TAU),
                (self.aop + self.aop_rate() * dt_s).rem_euclid(TAU),
            )
        } else {
            (self.raan, self.aop)
        };

        let m = (self.ma + self.n * dt_s).rem_euclid(TAU);
        let e = self.e;
        let ecc_anom = solve_kepler(m, e)?;

        let nu = 2.0
            * ((1.0 + e).sqrt() * (ecc_anom / 2.0).sin())
                .atan2((1.0 - e).sqrt() * (ecc_anom / 2.0).cos());
        let r = self.a * (1.0 - e * ecc_anom.cos());
        let p = self.semi_latus_rectum();

        let (sin_nu, cos_nu) = nu.sin_cos();
        let r_pqw = [r * cos_nu, r * sin_nu];
        let v_factor = (MU_EARTH / p).sqrt();
        let v_pqw = [-v_factor * sin_nu, v_factor * (e + cos_nu)];

        let (sin_raan, cos_raan) = raan.sin_cos();
        let (sin_aop, cos_aop) = aop.sin_cos();
        let (sin_i, cos_i) = self.i.sin_cos();

        // Columns of the perifocal-to-inertial rotation (P and Q axes).
        let p_axis = [
            cos_raan * cos_aop - sin_raan * sin_aop * cos_i,
            sin_raan * cos_aop + cos_raan * sin_aop * cos_i,
            sin_aop * sin_i,
        ];
        let q_axis = [
            -cos_raan * sin_aop - sin_raan * cos_aop * cos_i,
            -sin_raan * sin_aop + cos_raan * cos_aop * cos_i,
            cos_aop * sin_i,
        ];

        let mut pos = [0.0; 3];
        let mut vel = [0.0; 3];
        for k in 0..3 {
            pos[k] = p_axis[k] * r_pqw[0] + q_axis[k] * r_pqw[1];
            vel[k] = p_axis[k] * v_pqw[0] + q_axis[k] * v_pqw[1];
        }
        Ok((pos, vel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solver_converges_over_grid() {
        let mut e = 0.0;
        while e < 0.95 {
            let mut m = 0.0;
            while m < TAU {
                let ecc = solve_kepler(m, e)
                    .unwrap_or_else(|err| panic!("e={} M={} failed: {}", e, m, err));
                let residual = ecc - e * ecc.sin() - m;
                assert!(residual.abs() < TOLERANCE_RAD, "e={} M={} r={}", e, m, residual);
                m += 0.05;
            }
            e += 0.01;
        }
    }

    #[test]
    fn test_solver_rejects_open_orbits() {
        assert_eq!(
            solve_kepler(1.0, 1.0),
            Err(PropagationError::InvalidEccentricity(1.0))
        );
        assert!(matches!(
            solve_kepler(1.0, 1.5),
            Err(PropagationError::InvalidEccentricity(_))
        ));
        assert!(solve_kepler(1.0, -0.1).is_err());
    }

    #[test]
    fn test_circular_orbit_is_identity() {
        let e_anom = solve_kepler(1.234, 0.0).unwrap();
        assert_relative_eq!(e_anom, 1.234, epsilon = 1e-12);
    }

    #[test]
    fn test_iss_like_raan_rate() {
        let elems = KeplerElements {
            a: R_EARTH + 420.0,
            e: 0.0001,
            i: 51.6_f64.to_radians(),
            raan: 0.0,
            aop: 0.0,
            ma: 0.0,
            n: (MU_EARTH / (R_EARTH + 420.0).powi(3)).sqrt(),
        };
        let deg_per_day = elems.raan_rate().to_degrees() * SECONDS_PER_DAY;
        assert_relative_eq!(deg_per_day, -5.0, epsilon = 0.5);
    }

    #[test]
    fn test_circular_radius_and_speed() {
        let a = R_EARTH_PLUS_550;
        let elems = KeplerElements {
            a,
            e: 0.0,
            i: 53_f64.to_radians(),
            raan: 0.3,
            aop: 0.0,
            ma: 0.0,
            n: (MU_EARTH / a.powi(3)).sqrt(),
        };
        for dt in [0.0, 600.0, 1800.0, 9000.0] {
            let (r, v) = elems.propagate(dt).unwrap();
            let r_mag = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt();
            let v_mag = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert_relative_eq!(r_mag, a, epsilon = 1e-6);
            assert_relative_eq!(v_mag, (MU_EARTH / a).sqrt(), epsilon = 1e-9);
        }
    }

    const R_EARTH_PLUS_550: f64 = 6921.0;
}
