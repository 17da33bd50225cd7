use serde::{Deserialize, Serialize};

use super::atmosphere::atmospheric_attenuation;
use super::rain::{Polarization, RainAttenuationModel, DEFAULT_RAIN_HEIGHT_KM};
use super::{LinkError, Weather};
use crate::constants::SPEED_OF_LIGHT_KM_S;
use crate::frames::ObserverRelativeGeometry;

/// Thermal noise density at 290 K in dBm/Hz.
const THERMAL_NOISE_DBM_HZ: f64 = -174.0;

/// Radio parameters of the ground-to-satellite channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub frequency_ghz: f64,
    pub tx_power_dbm: f64,
    /// Combined terminal and satellite antenna gain.
    pub antenna_gain_db: f64,
    pub bandwidth_mhz: f64,
    pub noise_figure_db: f64,
    /// Aggregate interference at the receiver; `None` means none.
    pub interference_dbm: Option<f64>,
    pub protocol_efficiency: f64,
    pub processing_delay_ms: f64,
    pub polarization: Polarization,
    pub polarization_tilt_deg: f64,
    pub rain_height_km: f64,
    pub station_height_km: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            frequency_ghz: 20.0,
            tx_power_dbm: 43.0,
            antenna_gain_db: 75.0,
            bandwidth_mhz: 10.0,
            noise_figure_db: 7.0,
            interference_dbm: None,
            protocol_efficiency: 0.7,
            processing_delay_ms: 2.0,
            polarization: Polarization::Circular,
            polarization_tilt_deg: 0.0,
            rain_height_km: DEFAULT_RAIN_HEIGHT_KM,
            station_height_km: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkBudgetResult {
    pub free_space_path_loss_db: f64,
    pub atmospheric_attenuation_db: f64,
    pub rain_attenuation_db: f64,
    pub elevation_gain_db: f64,
    pub multipath_loss_db: f64,
    pub total_path_loss_db: f64,
    pub received_power_dbm: f64,
    pub sinr_db: f64,
    pub doppler_shift_hz: f64,
    pub estimated_throughput_mbps: f64,
    pub total_latency_ms: f64,
}

/// Composes path loss, received power, SINR, throughput, Doppler and
/// latency for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkBudgetModel {
    channel: ChannelConfig,
    rain: RainAttenuationModel,
}

impl Default for LinkBudgetModel {
    fn default() -> Self {
        Self::new(ChannelConfig::default(), RainAttenuationModel::default())
    }
}

impl LinkBudgetModel {
    /// The rain model takes its heights and tilt from the channel.
    pub fn new(channel: ChannelConfig, rain: RainAttenuationModel) -> Self {
        let rain = rain
            .with_heights(channel.rain_height_km, channel.station_height_km)
            .with_tilt(channel.polarization_tilt_deg);
        Self { channel, rain }
    }

    pub fn channel(&self) -> &ChannelConfig {
        &self.channel
    }

    pub fn rain_model(&self) -> &RainAttenuationModel {
        &self.rain
    }

    /// Path loss and derived metrics for a link of known length. Doppler is
    /// zero because no relative velocity is given.
    pub fn total_path_loss(
        &self,
        distance_km: f64,
        elevation_deg: f64,
        frequency_ghz: f64,
        weather: Weather,
        rain_rate_mm_h: Option<f64>,
    ) -> Result<LinkBudgetResult, LinkError> {
        self.compose(distance_km, elevation_deg, frequency_ghz, 0.0, weather, rain_rate_mm_h)
    }

    /// Budget for an observed geometry at the channel's carrier frequency.
    pub fn evaluate(
        &self,
        geometry: &ObserverRelativeGeometry,
        weather: Weather,
        rain_rate_mm_h: Option<f64>,
    ) -> Result<LinkBudgetResult, LinkError> {
        self.compose(
            geometry.range_km,
            geometry.elevation_deg,
            self.channel.frequency_ghz,
            geometry.range_rate_km_s,
            weather,
            rain_rate_mm_h,
        )
    }

    fn compose(
        &self,
        distance_km: f64,
        elevation_deg: f64,
        frequency_ghz: f64,
        range_rate_km_s: f64,
        weather: Weather,
        rain_rate_mm_h: Option<f64>,
    ) -> Result<LinkBudgetResult, LinkError> {
        if !elevation_deg.is_finite() {
            return Err(LinkError::NonFinite {
                field: "elevation",
                value: elevation_deg,
            });
        }
        if !range_rate_km_s.is_finite() {
            return Err(LinkError::NonFinite {
                field: "range rate",
                value: range_rate_km_s,
            });
        }
        if !(self.channel.bandwidth_mhz.is_finite() && self.channel.bandwidth_mhz > 0.0) {
            return Err(LinkError::InvalidBandwidth(self.channel.bandwidth_mhz));
        }

        let fspl = free_space_path_loss(distance_km, frequency_ghz)?;
        let atmospheric = atmospheric_attenuation(frequency_ghz, elevation_deg);
        let rain_rate = weather.rain_rate_mm_h(rain_rate_mm_h);
        let rain = self
            .rain
            .total_attenuation(frequency_ghz, rain_rate, elevation_deg, self.channel.polarization)?;
        let elevation_gain = elevation_gain(elevation_deg);
        let multipath = multipath_loss(elevation_deg);
        let total = fspl + atmospheric + rain.rain_attenuation_db - elevation_gain + multipath;

        let received_power_dbm = self.channel.tx_power_dbm + self.channel.antenna_gain_db - total;
        let sinr_db = self.sinr_db(received_power_dbm);
        let sinr_linear = 10f64.powf(sinr_db / 10.0);
        let throughput = self.channel.bandwidth_mhz
            * (1.0 + sinr_linear).log2()
            * self.channel.protocol_efficiency;

        Ok(LinkBudgetResult {
            free_space_path_loss_db: fspl,
            atmospheric_attenuation_db: atmospheric,
            rain_attenuation_db: rain.rain_attenuation_db,
            elevation_gain_db: elevation_gain,
            multipath_loss_db: multipath,
            total_path_loss_db: total,
            received_power_dbm,
            sinr_db,
            doppler_shift_hz: doppler_shift_hz(frequency_ghz, range_rate_km_s),
            estimated_throughput_mbps: throughput,
            total_latency_ms: propagation_delay_ms(distance_km) + self.channel.processing_delay_ms,
        })
    }

    pub fn noise_power_dbm(&self) -> f64 {
        THERMAL_NOISE_DBM_HZ
            + 10.0 * (self.channel.bandwidth_mhz * 1.0e6).log10()
            + self.channel.noise_figure_db
    }

    /// SINR in dB, summing noise and interference in milliwatts.
    pub fn sinr_db(&self, received_power_dbm: f64) -> f64 {
        let signal = dbm_to_mw(received_power_dbm);
        let noise = dbm_to_mw(self.noise_power_dbm());
        let interference = self.channel.interference_dbm.map_or(0.0, dbm_to_mw);
        10.0 * (signal / (noise + interference)).log10()
    }
}

pub fn free_space_path_loss(distance_km: f64, frequency_ghz: f64) -> Result<f64, LinkError> {
    if !(distance_km.is_finite() && distance_km > 0.0) {
        return Err(LinkError::InvalidDistance(distance_km));
    }
    if !(frequency_ghz.is_finite() && frequency_ghz > 0.0) {
        return Err(LinkError::InvalidFrequency(frequency_ghz));
    }
    Ok(20.0 * distance_km.log10() + 20.0 * frequency_ghz.log10() + 92.45)
}

/// Empirical antenna-pattern correction: strongly negative below the
/// horizon, rising through low elevations, flat from 30 degrees.
pub fn elevation_gain(elevation_deg: f64) -> f64 {
    if elevation_deg < 0.0 {
        -15.0 + 0.3 * elevation_deg
    } else if elevation_deg < 10.0 {
        -15.0 + 1.5 * elevation_deg
    } else if elevation_deg < 30.0 {
        (elevation_deg - 10.0) * 0.3
    } else {
        6.0
    }
}

/// Ground clutter penalty, vanishing from 10 degrees.
pub fn multipath_loss(elevation_deg: f64) -> f64 {
    if elevation_deg < 5.0 {
        3.0
    } else if elevation_deg < 10.0 {
        3.0 * (10.0 - elevation_deg) / 5.0
    } else {
        0.0
    }
}

/// Shift seen by the receiver. Positive while the satellite approaches
/// (negative range rate).
pub fn doppler_shift_hz(frequency_ghz: f64, range_rate_km_s: f64) -> f64 {
    -frequency_ghz * 1.0e9 * range_rate_km_s / SPEED_OF_LIGHT_KM_S
}

pub fn propagation_delay_ms(distance_km: f64) -> f64 {
    distance_km / SPEED_OF_LIGHT_KM_S * 1000.0
}

fn dbm_to_mw(dbm: f64) -> f64 {
    10f64.powf(dbm / 10.0)
}
