use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::error::TleError;
use crate::constants::SECONDS_PER_DAY;

const LINE_LEN: usize = 69;
// Everything up to and including the mean motion field.
const LINE1_MIN: usize = 61;
const LINE2_MIN: usize = 63;

/// Orbital elements of one satellite as published in a two-line element set.
///
/// Built only through [`TleRecord::from_lines`], which checks the column
/// layout and the physical ranges of every element. The raw lines are kept
/// as read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TleRecord {
    pub satellite_name: String,
    pub norad_id: u32,
    pub classification: char,
    pub international_designator: String,
    pub epoch_year: i32,
    pub epoch_day: f64,
    pub epoch: DateTime<Utc>,
    /// First derivative of mean motion / 2 (rev/day²).
    pub mean_motion_dot: f64,
    /// Second derivative of mean motion / 6 (rev/day³).
    pub mean_motion_ddot: f64,
    /// B* drag term (1/earth radii).
    pub bstar: f64,
    pub element_set: u32,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub eccentricity: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    pub mean_motion_rev_per_day: f64,
    pub revolution_number: u32,
    pub line1: String,
    pub line2: String,
}

impl TleRecord {
    /// Parse and validate one element set.
    ///
    /// `name` is the optional title line; unnamed sets are called `NORAD <id>`.
    pub fn from_lines(
        name: Option<&str>,
        line1: &str,
        line2: &str,
        verify_checksum: bool,
    ) -> Result<Self, TleError> {
        let line1 = line1.trim_end();
        let line2 = line2.trim_end();

        if !line1.is_ascii() {
            return Err(TleError::NonAscii(1));
        }
        if !line2.is_ascii() {
            return Err(TleError::NonAscii(2));
        }
        if !line1.starts_with("1 ") {
            return Err(TleError::InvalidLineStart {
                line: 1,
                expected: '1',
            });
        }
        if !line2.starts_with("2 ") {
            return Err(TleError::InvalidLineStart {
                line: 2,
                expected: '2',
            });
        }

        let min1 = if verify_checksum { LINE_LEN } else { LINE1_MIN };
        let min2 = if verify_checksum { LINE_LEN } else { LINE2_MIN };
        if line1.len() < min1 {
            return Err(TleError::LineTooShort {
                line: 1,
                len: line1.len(),
                min: min1,
            });
        }
        if line2.len() < min2 {
            return Err(TleError::LineTooShort {
                line: 2,
                len: line2.len(),
                min: min2,
            });
        }

        if verify_checksum {
            check_line(1, line1)?;
            check_line(2, line2)?;
        }

        // Short lines (checksum off) are padded so optional trailing fields read as blank.
        let l1 = format!("{:<width$}", line1, width = LINE_LEN);
        let l2 = format!("{:<width$}", line2, width = LINE_LEN);

        let norad_id = parse_int("norad_id", &l1[2..7])?;
        let norad_id_2 = parse_int("norad_id", &l2[2..7])?;
        if norad_id != norad_id_2 {
            return Err(TleError::NoradMismatch(norad_id, norad_id_2));
        }
        if norad_id < 1 {
            return Err(TleError::OutOfRange {
                field: "norad_id",
                value: norad_id as f64,
            });
        }

        let classification = l1.as_bytes()[7] as char;
        let international_designator = l1[9..17].trim().to_string();

        let year_2d = parse_int("epoch_year", &l1[18..20])? as i32;
        let epoch_year = if year_2d < 57 { 2000 + year_2d } else { 1900 + year_2d };
        let epoch_day = parse_float("epoch_day", &l1[20..32])?;
        if !(1.0..367.0).contains(&epoch_day) {
            return Err(TleError::OutOfRange {
                field: "epoch_day",
                value: epoch_day,
            });
        }
        let epoch = epoch_from_year_day(epoch_year, epoch_day)?;

        let mean_motion_dot = parse_float_or_zero("mean_motion_dot", &l1[33..43])?;
        let mean_motion_ddot = parse_exponent("mean_motion_ddot", &l1[44..52])?;
        let bstar = parse_exponent("bstar", &l1[53..61])?;
        let element_set = parse_int_or_zero("element_set", &l1[64..68])?;

        let inclination_deg = parse_float("inclination", &l2[8..16])?;
        let raan_deg = parse_float("raan", &l2[17..25])?;
        let eccentricity = parse_float("eccentricity", &format!("0.{}", l2[26..33].trim()))?;
        let arg_perigee_deg = parse_float("arg_perigee", &l2[34..42])?;
        let mean_anomaly_deg = parse_float("mean_anomaly", &l2[43..51])?;
        let mean_motion_rev_per_day = parse_float("mean_motion", &l2[52..63])?;
        let revolution_number = parse_int_or_zero("revolution_number", &l2[63..68])?;

        check_range("inclination", inclination_deg, 0.0, 180.0, true)?;
        check_range("raan", raan_deg, 0.0, 360.0, false)?;
        check_range("eccentricity", eccentricity, 0.0, 1.0, false)?;
        check_range("arg_perigee", arg_perigee_deg, 0.0, 360.0, false)?;
        check_range("mean_anomaly", mean_anomaly_deg, 0.0, 360.0, false)?;
        if !(mean_motion_rev_per_day > 0.0) {
            return Err(TleError::OutOfRange {
                field: "mean_motion",
                value: mean_motion_rev_per_day,
            });
        }

        let satellite_name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.strip_prefix("0 ").unwrap_or(n).trim().to_string(),
            None => format!("NORAD {}", norad_id),
        };

        Ok(Self {
            satellite_name,
            norad_id,
            classification,
            international_designator,
            epoch_year,
            epoch_day,
            epoch,
            mean_motion_dot,
            mean_motion_ddot,
            bstar,
            element_set,
            inclination_deg,
            raan_deg,
            eccentricity,
            arg_perigee_deg,
            mean_anomaly_deg,
            mean_motion_rev_per_day,
            revolution_number,
            line1: line1.to_string(),
            line2: line2.to_string(),
        })
    }

    /// Orbital period in minutes.
    pub fn period_minutes(&self) -> f64 {
        1440.0 / self.mean_motion_rev_per_day
    }

    /// Signed minutes from the element epoch to `at`.
    pub fn minutes_since_epoch(&self, at: DateTime<Utc>) -> f64 {
        let delta = at - self.epoch;
        match delta.num_microseconds() {
            Some(us) => us as f64 / 60.0e6,
            None => delta.num_milliseconds() as f64 / 60.0e3,
        }
    }
}

/// Modulo-10 checksum over the first 68 columns: digits count their value,
/// minus signs count 1.
pub fn checksum(line: &str) -> u8 {
    line.bytes()
        .take(68)
        .map(|b| match b {
            b'0'..=b'9' => b - b'0',
            b'-' => 1,
            _ => 0,
        })
        .fold(0u32, |acc, d| (acc + d as u32) % 10) as u8
}

fn check_line(line: u8, text: &str) -> Result<(), TleError> {
    let expected = text.as_bytes()[68];
    if !expected.is_ascii_digit() {
        return Err(TleError::Field {
            field: "checksum",
            value: (expected as char).to_string(),
        });
    }
    let expected = expected - b'0';
    let computed = checksum(text);
    if expected != computed {
        return Err(TleError::Checksum {
            line,
            expected,
            computed,
        });
    }
    Ok(())
}

fn epoch_from_year_day(year: i32, day: f64) -> Result<DateTime<Utc>, TleError> {
    let jan1 = NaiveDate::from_yo_opt(year, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or(TleError::OutOfRange {
            field: "epoch_year",
            value: year as f64,
        })?;
    let micros = ((day - 1.0) * SECONDS_PER_DAY * 1.0e6).round() as i64;
    Ok((jan1 + Duration::microseconds(micros)).and_utc())
}

fn check_range(
    field: &'static str,
    value: f64,
    low: f64,
    high: f64,
    inclusive_high: bool,
) -> Result<(), TleError> {
    let ok = value >= low && if inclusive_high { value <= high } else { value < high };
    if ok {
        Ok(())
    } else {
        Err(TleError::OutOfRange { field, value })
    }
}

fn parse_float(field: &'static str, s: &str) -> Result<f64, TleError> {
    let t = s.trim();
    t.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TleError::Field {
            field,
            value: t.to_string(),
        })
}

fn parse_float_or_zero(field: &'static str, s: &str) -> Result<f64, TleError> {
    if s.trim().is_empty() {
        Ok(0.0)
    } else {
        parse_float(field, s)
    }
}

fn parse_int(field: &'static str, s: &str) -> Result<u32, TleError> {
    let t = s.trim();
    t.parse::<u32>().map_err(|_| TleError::Field {
        field,
        value: t.to_string(),
    })
}

fn parse_int_or_zero(field: &'static str, s: &str) -> Result<u32, TleError> {
    if s.trim().is_empty() {
        Ok(0)
    } else {
        parse_int(field, s)
    }
}

/// Fields like ` 10270-3` meaning 0.10270e-3.
fn parse_exponent(field: &'static str, s: &str) -> Result<f64, TleError> {
    let t = s.trim();
    if t.is_empty() {
        return Ok(0.0);
    }
    let err = || TleError::Field {
        field,
        value: t.to_string(),
    };

    let (sign, body) = match t.as_bytes()[0] {
        b'-' => (-1.0, &t[1..]),
        b'+' => (1.0, &t[1..]),
        _ => (1.0, t),
    };
    let split = body.rfind(['-', '+']).filter(|&i| i > 0).ok_or_else(err)?;
    let mantissa: f64 = format!("0.{}", body[..split].trim())
        .parse()
        .map_err(|_| err())?;
    let exponent: i32 = body[split..].parse().map_err(|_| err())?;
    Ok(sign * mantissa * 10f64.powi(exponent))
}
