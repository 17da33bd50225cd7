//! Simplified gaseous absorption after ITU-R P.676.

/// Assumed thickness of the absorbing atmosphere.
pub const ATMOSPHERE_THICKNESS_KM: f64 = 10.0;

/// Cap on the slant factor `1/sin(el)` near the horizon.
pub const MAX_SLANT_FACTOR: f64 = 10.0;

/// Surface water-vapour density in g/m^3.
pub const WATER_VAPOUR_DENSITY: f64 = 7.5;

/// Oxygen absorption in dB/km.
pub fn oxygen_absorption(frequency_ghz: f64) -> f64 {
    let f = frequency_ghz;
    if f < 54.0 {
        0.0067 * f * f / 1000.0
    } else if f < 60.0 {
        (0.5 + 0.1 * (f - 54.0)) / 1000.0
    } else {
        0.5 * (-(f - 60.0) / 5.0).exp() / 1000.0
    }
}

/// Water-vapour absorption in dB/km, with the 22.235 GHz line folded into
/// the 22 to 25 GHz band.
pub fn water_vapour_absorption(frequency_ghz: f64, density: f64) -> f64 {
    let f = frequency_ghz;
    if f < 22.0 {
        0.001 * density * f * f / 1000.0
    } else if f < 25.0 {
        0.05 * density * (f - 22.0).powi(2) / 1000.0
    } else {
        0.01 * density * f / 1000.0
    }
}

/// `1/sin(el)`, capped. Zero and negative elevations take the cap.
pub fn slant_factor(elevation_deg: f64) -> f64 {
    let s = elevation_deg.to_radians().sin();
    if s <= 0.0 {
        return MAX_SLANT_FACTOR;
    }
    (1.0 / s).min(MAX_SLANT_FACTOR)
}

/// Total gaseous attenuation along the slant path in dB.
pub fn atmospheric_attenuation(frequency_ghz: f64, elevation_deg: f64) -> f64 {
    let specific = oxygen_absorption(frequency_ghz)
        + water_vapour_absorption(frequency_ghz, WATER_VAPOUR_DENSITY);
    specific * slant_factor(elevation_deg) * ATMOSPHERE_THICKNESS_KM
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_slant_factor() {
        assert_relative_eq!(slant_factor(90.0), 1.0, max_relative = 1e-12);
        assert_relative_eq!(slant_factor(30.0), 2.0, max_relative = 1e-12);
        assert_eq!(slant_factor(1.0), MAX_SLANT_FACTOR);
        assert_eq!(slant_factor(0.0), MAX_SLANT_FACTOR);
        assert_eq!(slant_factor(-20.0), MAX_SLANT_FACTOR);
    }

    #[test]
    fn test_zenith_attenuation_at_twenty_ghz() {
        let o2 = 0.0067 * 400.0 / 1000.0;
        let h2o = 0.001 * 7.5 * 400.0 / 1000.0;
        assert_relative_eq!(
            atmospheric_attenuation(20.0, 90.0),
            (o2 + h2o) * 10.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_low_elevation_costs_more() {
        for f in [2.0, 12.0, 20.0, 28.0, 40.0] {
            assert!(atmospheric_attenuation(f, 5.0) > atmospheric_attenuation(f, 45.0));
            assert!(atmospheric_attenuation(f, 45.0) > 0.0);
        }
    }
}
