use chrono::{DateTime, Utc};

/// Greenwich mean sidereal time (rad, [0, 2π)) from the IAU 1982 polynomial
/// in Julian centuries since J2000, with UTC standing in for UT1.
pub fn gmst(at: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&at.naive_utc()))
        .rem_euclid(std::f64::consts::TAU)
}
