use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Qualitative weather label supplied in place of a measured rain rate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Weather {
    #[default]
    Clear,
    Cloudy,
    Rainy,
    Stormy,
}

impl Weather {
    /// Representative rain rate in mm/h. These are a labelling policy
    /// (moderate and heavy rain), not measurements.
    pub fn default_rain_rate_mm_h(&self) -> f64 {
        match self {
            Weather::Clear | Weather::Cloudy => 0.0,
            Weather::Rainy => 10.0,
            Weather::Stormy => 25.0,
        }
    }

    /// An explicit rain rate wins over the label.
    pub fn rain_rate_mm_h(&self, explicit: Option<f64>) -> f64 {
        explicit.unwrap_or_else(|| self.default_rain_rate_mm_h())
    }
}
