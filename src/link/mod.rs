//! Radio link: ITU-R rain attenuation, gaseous absorption and the
//! composed link budget.

pub mod atmosphere;
mod budget;
mod error;
mod rain;
mod weather;

pub use budget::{
    doppler_shift_hz, elevation_gain, free_space_path_loss, multipath_loss, propagation_delay_ms,
    ChannelConfig, LinkBudgetModel, LinkBudgetResult,
};
pub use error::{LinkError, RainError};
pub use rain::{
    CoefficientTable, Polarization, RainAttenuationModel, RainAttenuationResult, RainCoefficients,
    DEFAULT_RAIN_HEIGHT_KM,
};
pub use weather::Weather;
