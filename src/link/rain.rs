use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::RainError;
use crate::constants::R_EARTH_MEAN;

pub const DEFAULT_RAIN_HEIGHT_KM: f64 = 2.0;

/// Below this elevation the slant path is computed on a curved Earth.
const FLAT_EARTH_MIN_ELEVATION_DEG: f64 = 5.0;

/// Effective Earth radius for the low-elevation triangle (4/3 Earth).
const EFFECTIVE_EARTH_RADIUS_KM: f64 = 4.0 / 3.0 * R_EARTH_MEAN;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Polarization {
    #[strum(to_string = "horizontal", serialize = "h")]
    Horizontal,
    #[strum(to_string = "vertical", serialize = "v")]
    Vertical,
    #[default]
    Circular,
}

/// Power-law regression coefficients at one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RainCoefficients {
    pub k: f64,
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TableRow {
    frequency_ghz: f64,
    k_h: f64,
    alpha_h: f64,
    k_v: f64,
    alpha_v: f64,
}

// ITU-R P.838-3 regression coefficients, 1 to 100 GHz.
#[rustfmt::skip]
const ITU_R_P838: [(f64, f64, f64, f64, f64); 20] = [
    // f GHz   k_H        alpha_H  k_V        alpha_V
    (1.0,   0.0000259, 0.9691, 0.0000308, 0.8592),
    (2.0,   0.0000847, 1.0664, 0.0000998, 0.9490),
    (4.0,   0.0001071, 1.6009, 0.0002461, 1.2476),
    (6.0,   0.0007056, 1.5900, 0.0004878, 1.5728),
    (8.0,   0.004115,  1.3905, 0.003450,  1.3797),
    (10.0,  0.01217,   1.2571, 0.01129,   1.2156),
    (12.0,  0.02386,   1.1825, 0.02455,   1.1216),
    (15.0,  0.04481,   1.1233, 0.05008,   1.0440),
    (20.0,  0.09164,   1.0568, 0.09611,   0.9847),
    (25.0,  0.1571,    0.9991, 0.1533,    0.9491),
    (30.0,  0.2403,    0.9485, 0.2291,    0.9129),
    (35.0,  0.3374,    0.9047, 0.3224,    0.8761),
    (40.0,  0.4431,    0.8673, 0.4274,    0.8421),
    (45.0,  0.5521,    0.8355, 0.5375,    0.8123),
    (50.0,  0.6600,    0.8084, 0.6472,    0.7871),
    (60.0,  0.8606,    0.7656, 0.8515,    0.7486),
    (70.0,  1.0315,    0.7345, 1.0253,    0.7215),
    (80.0,  1.1704,    0.7115, 1.1668,    0.7021),
    (90.0,  1.2807,    0.6944, 1.2795,    0.6876),
    (100.0, 1.3671,    0.6815, 1.3680,    0.6765),
];

/// Frequency-indexed k/alpha table.
///
/// Built once and never mutated, so a single table can be shared by
/// reference across threads. Frequencies outside the tabulated range are
/// clamped to the nearest endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    rows: Vec<TableRow>,
}

impl Default for CoefficientTable {
    fn default() -> Self {
        Self::itu_r_p838()
    }
}

impl CoefficientTable {
    pub fn itu_r_p838() -> Self {
        let rows = ITU_R_P838
            .iter()
            .map(|&(frequency_ghz, k_h, alpha_h, k_v, alpha_v)| TableRow {
                frequency_ghz,
                k_h,
                alpha_h,
                k_v,
                alpha_v,
            })
            .collect();
        Self { rows }
    }

    pub fn min_frequency_ghz(&self) -> f64 {
        self.rows[0].frequency_ghz
    }

    pub fn max_frequency_ghz(&self) -> f64 {
        self.rows[self.rows.len() - 1].frequency_ghz
    }

    /// Horizontal and vertical coefficients at `frequency_ghz`.
    fn lookup(&self, frequency_ghz: f64) -> TableRow {
        let first = self.rows[0];
        let last = self.rows[self.rows.len() - 1];
        if frequency_ghz <= first.frequency_ghz {
            if frequency_ghz < first.frequency_ghz {
                log::debug!(
                    "{} GHz below coefficient table, clamped to {} GHz",
                    frequency_ghz,
                    first.frequency_ghz
                );
            }
            return first;
        }
        if frequency_ghz >= last.frequency_ghz {
            if frequency_ghz > last.frequency_ghz {
                log::debug!(
                    "{} GHz above coefficient table, clamped to {} GHz",
                    frequency_ghz,
                    last.frequency_ghz
                );
            }
            return last;
        }

        let upper = self.rows.partition_point(|row| row.frequency_ghz < frequency_ghz);
        let hi = self.rows[upper];
        if hi.frequency_ghz == frequency_ghz {
            return hi;
        }
        let lo = self.rows[upper - 1];
        let t = (frequency_ghz - lo.frequency_ghz) / (hi.frequency_ghz - lo.frequency_ghz);
        let lerp = |a: f64, b: f64| a + t * (b - a);
        TableRow {
            frequency_ghz,
            k_h: lerp(lo.k_h, hi.k_h),
            alpha_h: lerp(lo.alpha_h, hi.alpha_h),
            k_v: lerp(lo.k_v, hi.k_v),
            alpha_v: lerp(lo.alpha_v, hi.alpha_v),
        }
    }

    /// Coefficients for a polarization. A non-zero tilt blends the
    /// horizontal and vertical sets for circular polarization.
    pub fn coefficients(
        &self,
        frequency_ghz: f64,
        polarization: Polarization,
        tilt_deg: f64,
    ) -> RainCoefficients {
        let row = self.lookup(frequency_ghz);
        match polarization {
            Polarization::Horizontal => RainCoefficients {
                k: row.k_h,
                alpha: row.alpha_h,
            },
            Polarization::Vertical => RainCoefficients {
                k: row.k_v,
                alpha: row.alpha_v,
            },
            Polarization::Circular if tilt_deg == 0.0 => RainCoefficients {
                k: (row.k_h + row.k_v) / 2.0,
                alpha: (row.alpha_h + row.alpha_v) / 2.0,
            },
            Polarization::Circular => {
                let (sin_t, cos_t) = tilt_deg.to_radians().sin_cos();
                let blend = |h: f64, v: f64| {
                    h * cos_t * cos_t + v * sin_t * sin_t + 2.0 * (h * v).sqrt() * cos_t * sin_t
                };
                RainCoefficients {
                    k: blend(row.k_h, row.k_v),
                    alpha: blend(row.alpha_h, row.alpha_v),
                }
            }
        }
    }
}

/// Rain attenuation along the slant path for one frequency and rain rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RainAttenuationResult {
    pub frequency_ghz: f64,
    pub rain_rate_mm_h: f64,
    pub polarization: Polarization,
    pub specific_attenuation_db_km: f64,
    pub effective_path_length_km: f64,
    pub rain_attenuation_db: f64,
}

/// ITU-R P.618 slant-path rain attenuation.
#[derive(Debug, Clone, PartialEq)]
pub struct RainAttenuationModel {
    table: CoefficientTable,
    pub rain_height_km: f64,
    pub station_height_km: f64,
    pub tilt_deg: f64,
}

impl Default for RainAttenuationModel {
    fn default() -> Self {
        Self::new(CoefficientTable::default())
    }
}

impl RainAttenuationModel {
    pub fn new(table: CoefficientTable) -> Self {
        Self {
            table,
            rain_height_km: DEFAULT_RAIN_HEIGHT_KM,
            station_height_km: 0.0,
            tilt_deg: 0.0,
        }
    }

    pub fn with_heights(mut self, rain_height_km: f64, station_height_km: f64) -> Self {
        self.rain_height_km = rain_height_km;
        self.station_height_km = station_height_km;
        self
    }

    pub fn with_tilt(mut self, tilt_deg: f64) -> Self {
        self.tilt_deg = tilt_deg;
        self
    }

    pub fn table(&self) -> &CoefficientTable {
        &self.table
    }

    /// `k * R^alpha` in dB/km. No rain means no attenuation.
    pub fn specific_attenuation(
        &self,
        frequency_ghz: f64,
        rain_rate_mm_h: f64,
        polarization: Polarization,
        tilt_deg: f64,
    ) -> Result<f64, RainError> {
        if !(frequency_ghz.is_finite() && frequency_ghz > 0.0) {
            return Err(RainError::InvalidFrequency(frequency_ghz));
        }
        finite("rain rate", rain_rate_mm_h)?;
        finite("polarization tilt", tilt_deg)?;
        if rain_rate_mm_h <= 0.0 {
            return Ok(0.0);
        }
        let c = self.table.coefficients(frequency_ghz, polarization, tilt_deg);
        Ok(c.k * rain_rate_mm_h.powf(c.alpha))
    }

    /// Slant length of the path through rain, in km.
    ///
    /// At or below the horizon the path contributes nothing. Under 5
    /// degrees the station, Earth centre and rain top are solved as a
    /// triangle on an effective 4/3 Earth.
    pub fn effective_path_length(
        &self,
        elevation_deg: f64,
        rain_height_km: f64,
        station_height_km: f64,
    ) -> Result<f64, RainError> {
        finite("elevation", elevation_deg)?;
        finite("rain height", rain_height_km)?;
        finite("station height", station_height_km)?;
        if rain_height_km < 0.0 || station_height_km < 0.0 {
            return Err(RainError::InvalidHeights {
                rain_height_km,
                station_height_km,
            });
        }
        if elevation_deg <= 0.0 || rain_height_km <= station_height_km {
            return Ok(0.0);
        }

        let el = elevation_deg.to_radians();
        if elevation_deg >= FLAT_EARTH_MIN_ELEVATION_DEG {
            return Ok((rain_height_km - station_height_km) / el.sin());
        }

        let r_station = EFFECTIVE_EARTH_RADIUS_KM + station_height_km;
        let r_rain = EFFECTIVE_EARTH_RADIUS_KM + rain_height_km;
        // Angle at the rain top, opposite the station radius.
        let at_rain_top = (r_station * el.cos() / r_rain).asin();
        // Angle at the Earth centre.
        let central = std::f64::consts::FRAC_PI_2 - el - at_rain_top;
        Ok(r_rain * central.sin() / el.cos())
    }

    pub fn total_attenuation(
        &self,
        frequency_ghz: f64,
        rain_rate_mm_h: f64,
        elevation_deg: f64,
        polarization: Polarization,
    ) -> Result<RainAttenuationResult, RainError> {
        let specific =
            self.specific_attenuation(frequency_ghz, rain_rate_mm_h, polarization, self.tilt_deg)?;
        let path = self.effective_path_length(
            elevation_deg,
            self.rain_height_km,
            self.station_height_km,
        )?;
        Ok(RainAttenuationResult {
            frequency_ghz,
            rain_rate_mm_h: rain_rate_mm_h.max(0.0),
            polarization,
            specific_attenuation_db_km: specific,
            effective_path_length_km: path,
            rain_attenuation_db: specific * path,
        })
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), RainError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RainError::NonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_monotonic_in_rain_rate() {
        let model = RainAttenuationModel::default();
        for pol in [Polarization::Horizontal, Polarization::Vertical, Polarization::Circular] {
            for f in [1.0, 7.3, 20.0, 55.0, 100.0] {
                let mut prev = 0.0;
                for rate in [0.1, 1.0, 5.0, 10.0, 25.0, 50.0, 150.0] {
                    let a = model.specific_attenuation(f, rate, pol, 0.0).unwrap();
                    assert!(a > prev, "f={} rate={} {:?}", f, rate, pol);
                    prev = a;
                }
            }
        }
    }

    #[test]
    fn test_no_rain_no_attenuation() {
        let model = RainAttenuationModel::default();
        for el in [-10.0, 0.0, 2.0, 30.0, 90.0] {
            for f in [1.0, 20.0, 100.0] {
                let r = model.total_attenuation(f, 0.0, el, Polarization::Circular).unwrap();
                assert_eq!(r.rain_attenuation_db, 0.0);
            }
        }
        assert_eq!(model.specific_attenuation(20.0, -3.0, Polarization::Horizontal, 0.0), Ok(0.0));
    }

    #[test]
    fn test_tabulated_frequency_is_exact() {
        let model = RainAttenuationModel::default();
        let a = model.specific_attenuation(10.0, 10.0, Polarization::Horizontal, 0.0).unwrap();
        assert_eq!(a, 0.01217 * 10f64.powf(1.2571));

        let a = model.specific_attenuation(10.0, 10.0, Polarization::Vertical, 0.0).unwrap();
        assert_eq!(a, 0.01129 * 10f64.powf(1.2156));
    }

    #[test]
    fn test_interpolates_between_rows() {
        let table = CoefficientTable::default();
        let c = table.coefficients(11.0, Polarization::Horizontal, 0.0);
        assert_relative_eq!(c.k, (0.01217 + 0.02386) / 2.0, max_relative = 1e-12);
        assert_relative_eq!(c.alpha, (1.2571 + 1.1825) / 2.0, max_relative = 1e-12);
    }

    #[test]
    fn test_frequency_clamped_to_table() {
        let model = RainAttenuationModel::default();
        for pol in [Polarization::Horizontal, Polarization::Vertical, Polarization::Circular] {
            assert_eq!(
                model.specific_attenuation(0.5, 10.0, pol, 0.0),
                model.specific_attenuation(1.0, 10.0, pol, 0.0)
            );
            assert_eq!(
                model.specific_attenuation(150.0, 10.0, pol, 0.0),
                model.specific_attenuation(100.0, 10.0, pol, 0.0)
            );
        }
    }

    #[test]
    fn test_tilt_blends_circular() {
        let table = CoefficientTable::default();
        let flat = table.coefficients(20.0, Polarization::Circular, 0.0);
        assert_relative_eq!(flat.k, (0.09164 + 0.09611) / 2.0, max_relative = 1e-12);

        let tilted = table.coefficients(20.0, Polarization::Circular, 45.0);
        let expected = 0.5 * 0.09164 + 0.5 * 0.09611 + (0.09164f64 * 0.09611).sqrt();
        assert_relative_eq!(tilted.k, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_path_length_above_five_degrees() {
        let model = RainAttenuationModel::default();
        let slant = model.effective_path_length(30.0, 2.0, 0.0).unwrap();
        assert_relative_eq!(slant, 4.0, max_relative = 1e-12);
        let zenith = model.effective_path_length(90.0, 2.0, 0.5).unwrap();
        assert_relative_eq!(zenith, 1.5, max_relative = 1e-12);
    }

    #[test]
    fn test_path_length_low_elevation() {
        let model = RainAttenuationModel::default();
        assert_eq!(model.effective_path_length(0.0, 2.0, 0.0), Ok(0.0));
        assert_eq!(model.effective_path_length(-5.0, 2.0, 0.0), Ok(0.0));

        // Shorter than flat Earth, and close to it at the 5 degree switch.
        let curved = model.effective_path_length(2.0, 2.0, 0.0).unwrap();
        assert!(curved > 0.0 && curved < 2.0 / 2f64.to_radians().sin());
        let below = model.effective_path_length(4.999_999, 2.0, 0.0).unwrap();
        let above = model.effective_path_length(5.0, 2.0, 0.0).unwrap();
        assert!(below < above);
        assert_abs_diff_eq!(below, above, epsilon = 0.5);

        // Grazing paths stay finite.
        let grazing = model.effective_path_length(0.01, 2.0, 0.0).unwrap();
        assert!(grazing.is_finite() && grazing < 200.0);
    }

    #[test]
    fn test_twenty_ghz_moderate_rain() {
        let model = RainAttenuationModel::default();
        let r = model.total_attenuation(20.0, 10.0, 30.0, Polarization::Circular).unwrap();
        assert_relative_eq!(r.effective_path_length_km, 4.0, max_relative = 1e-12);
        assert!(r.rain_attenuation_db.is_finite() && r.rain_attenuation_db > 0.0);
        assert_relative_eq!(
            r.rain_attenuation_db,
            r.specific_attenuation_db_km * 4.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_invalid_inputs() {
        let model = RainAttenuationModel::default();
        assert_eq!(
            model.specific_attenuation(0.0, 10.0, Polarization::Circular, 0.0),
            Err(RainError::InvalidFrequency(0.0))
        );
        assert!(model.specific_attenuation(20.0, f64::NAN, Polarization::Circular, 0.0).is_err());
        assert!(model.effective_path_length(30.0, -1.0, 0.0).is_err());
    }

    #[test]
    fn test_polarization_labels() {
        assert_eq!("h".parse::<Polarization>().unwrap(), Polarization::Horizontal);
        assert_eq!("Vertical".parse::<Polarization>().unwrap(), Polarization::Vertical);
        assert_eq!(Polarization::Circular.to_string(), "circular");
    }
}
