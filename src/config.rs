use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::frames::{FrameError, ObserverLocation};
use crate::link::{ChannelConfig, LinkBudgetModel, RainAttenuationModel, Weather};
use crate::orbit::{OrbitalPropagator, PropagatorKind};
use crate::track::Pipeline;
use crate::visibility::{
    Environment, LayeredThresholds, VisibilityEvaluator, DEFAULT_MIN_ELEVATION_DEG,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("observer: {0}")]
    Observer(#[from] FrameError),
}

/// Run configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub observer: ObserverConfig,
    pub propagator: PropagatorConfig,
    pub visibility: VisibilityConfig,
    pub channel: ChannelConfig,
    pub weather: WeatherConfig,
}

/// Missing fields keep the NTPU station values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub name: Option<String>,
    /// `"lat, lon"` in degrees.
    pub coordinates: String,
    pub altitude_m: f64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        let ntpu = ObserverLocation::ntpu();
        Self {
            name: Some("NTPU".to_string()),
            coordinates: format!("{}, {}", ntpu.latitude_deg, ntpu.longitude_deg),
            altitude_m: ntpu.altitude_m,
        }
    }
}

impl ObserverConfig {
    pub fn location(&self) -> Result<ObserverLocation, FrameError> {
        ObserverLocation::from_coordinates(&self.coordinates, Some(self.altitude_m))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PropagatorConfig {
    pub model: PropagatorKind,
    pub max_epoch_offset_days: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    pub min_elevation_deg: f64,
    pub environment: Environment,
    pub thresholds: LayeredThresholds,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            min_elevation_deg: DEFAULT_MIN_ELEVATION_DEG,
            environment: Environment::default(),
            thresholds: LayeredThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub label: Weather,
    /// Overrides the label's representative rate.
    pub rain_rate_mm_h: Option<f64>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        // Reject a bad observer at load time rather than on first use.
        config.observer.location()?;
        Ok(config)
    }

    pub fn propagator(&self) -> OrbitalPropagator {
        let propagator = OrbitalPropagator::new(self.propagator.model);
        match self.propagator.max_epoch_offset_days {
            Some(days) => propagator.with_max_epoch_offset_days(days),
            None => propagator,
        }
    }

    pub fn evaluator(&self) -> Result<VisibilityEvaluator, ConfigError> {
        Ok(VisibilityEvaluator::with_environment(
            self.observer.location()?,
            self.visibility.min_elevation_deg,
            self.visibility.environment,
            self.visibility.thresholds,
        ))
    }

    pub fn link_model(&self) -> LinkBudgetModel {
        LinkBudgetModel::new(self.channel, RainAttenuationModel::default())
    }

    pub fn pipeline(&self) -> Result<Pipeline, ConfigError> {
        Ok(Pipeline::new(self.propagator(), self.evaluator()?, self.link_model())
            .with_weather(self.weather.label, self.weather.rain_rate_mm_h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        let obs = config.observer.location().unwrap();
        assert_eq!(obs, ObserverLocation::ntpu());
        assert_eq!(config.propagator.model, PropagatorKind::Sgp4);
        assert_eq!(config.visibility.min_elevation_deg, 10.0);
        assert_eq!(config.channel, ChannelConfig::default());
        assert_eq!(config.weather.label, Weather::Clear);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
observer:
  name: Cape Town
  coordinates: "-33.9249, 18.4241"
  altitude_m: 12
propagator:
  model: kepler_j2
  max_epoch_offset_days: 14
visibility:
  min_elevation_deg: 5
  environment: urban
channel:
  frequency_ghz: 12
  polarization: horizontal
  interference_dbm: -110
weather:
  label: stormy
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let obs = config.observer.location().unwrap();
        assert_eq!(obs.latitude_deg, -33.9249);
        assert_eq!(obs.altitude_m, 12.0);
        assert_eq!(config.propagator().kind, PropagatorKind::KeplerJ2);
        assert_eq!(config.propagator().max_epoch_offset_days, Some(14.0));

        let evaluator = config.evaluator().unwrap();
        assert!((evaluator.effective_min_elevation_deg() - 5.5).abs() < 1e-12);
        assert_eq!(evaluator.environment(), Environment::Urban);

        assert_eq!(config.channel.frequency_ghz, 12.0);
        assert_eq!(config.channel.interference_dbm, Some(-110.0));
        assert_eq!(config.channel.bandwidth_mhz, 10.0);
        assert_eq!(config.weather.label, Weather::Stormy);
        assert_eq!(config.weather.rain_rate_mm_h, None);
    }

    #[test]
    fn test_partial_observer_keeps_default_coordinates() {
        let config = Config::from_yaml("observer:\n  altitude_m: 120\n").unwrap();
        let obs = config.observer.location().unwrap();
        let ntpu = ObserverLocation::ntpu();
        assert_eq!(obs.latitude_deg, ntpu.latitude_deg);
        assert_eq!(obs.longitude_deg, ntpu.longitude_deg);
        assert_eq!(obs.altitude_m, 120.0);

        let config = Config::from_yaml("observer:\n  name: Rooftop\n").unwrap();
        assert_eq!(config.observer.name.as_deref(), Some("Rooftop"));
        assert_eq!(config.observer.location().unwrap(), ntpu);
    }

    #[test]
    fn test_bad_observer_rejected() {
        let yaml = "observer:\n  coordinates: \"95.0, 10.0\"\n";
        assert!(matches!(Config::from_yaml(yaml), Err(ConfigError::Observer(_))));
    }
}
