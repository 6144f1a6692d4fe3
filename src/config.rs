//! Buoy configuration parameters
//!
//! All tunable parameters for the sensor core and the poll loop.
//! Values can be overridden from a JSON file (simulator) or a persisted
//! postcard blob (see [`ConfigStore`](crate::ports::ConfigStore)).

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ports::ConfigStore;

/// Analog pH probe parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhConfig {
    /// ADC full-scale count (12-bit on the buoy board)
    pub adc_resolution: u16,
    /// ADC reference voltage in mV
    pub reference_mv: f32,
    /// ADC samples averaged per read
    pub samples: u8,
    /// Delay between samples (milliseconds)
    pub sample_delay_ms: u32,
    /// Probe amplifier settle time after power-on (milliseconds)
    pub power_on_delay_ms: u32,
    /// Rail discharge time after power-off (milliseconds)
    pub power_off_delay_ms: u32,
    /// Plausible pH window; readings outside are logged, not dropped
    pub ph_min: f32,
    pub ph_max: f32,
    /// Compensation temperature until a real one is supplied (Celsius)
    pub default_temperature_c: f32,
    /// Stored calibration points (mV in pH 7.0 / pH 4.0 buffer)
    pub neutral_mv: f32,
    pub acid_mv: f32,
}

impl Default for PhConfig {
    fn default() -> Self {
        Self {
            adc_resolution: 4096,
            reference_mv: 3300.0,
            samples: 10,
            sample_delay_ms: 10,
            power_on_delay_ms: 2000,
            power_off_delay_ms: 1000,
            ph_min: 0.0,
            ph_max: 14.0,
            default_temperature_c: 25.0,
            neutral_mv: 1500.0,
            acid_mv: 2032.44,
        }
    }
}

impl PhConfig {
    /// Averaged ADC counts to probe voltage in mV.
    pub fn raw_to_millivolts(&self, raw: f32) -> f32 {
        raw / f32::from(self.adc_resolution) * self.reference_mv
    }
}

/// Ultrasonic ranger parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// Pings averaged per read
    pub samples: u8,
    /// Give up on an echo after this long (microseconds)
    pub echo_timeout_us: u32,
    /// Gap between pings so echoes do not overlap (milliseconds)
    pub ping_interval_ms: u32,
    /// HC-SR04 rated range (centimetres)
    pub min_cm: f32,
    pub max_cm: f32,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            samples: 5,
            echo_timeout_us: 30_000, // ~5 m round trip
            ping_interval_ms: 60,
            min_cm: 2.0,
            max_cm: 400.0,
        }
    }
}

/// Core buoy configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuoyConfig {
    pub ph: PhConfig,
    pub distance: DistanceConfig,

    // --- Timing ---
    /// Sensor poll / uplink interval (seconds)
    pub poll_interval_secs: u32,
    /// Re-probe unavailable sensors every N poll cycles (0 = never)
    pub retry_every_cycles: u32,

    /// Log the decoder mirror and byte map at boot
    pub show_decoder: bool,
}

impl Default for BuoyConfig {
    fn default() -> Self {
        Self {
            ph: PhConfig::default(),
            distance: DistanceConfig::default(),
            poll_interval_secs: 600, // 10 min, fair-use friendly
            retry_every_cycles: 1,
            show_decoder: false,
        }
    }
}

impl BuoyConfig {
    /// Range-check every field.  Called before a config is used or stored.
    pub fn validate(&self) -> Result<()> {
        let ph = &self.ph;
        if ph.adc_resolution == 0 {
            return Err(Error::Config("ph.adc_resolution must be non-zero"));
        }
        if !(ph.reference_mv > 0.0) {
            return Err(Error::Config("ph.reference_mv must be positive"));
        }
        if ph.samples == 0 {
            return Err(Error::Config("ph.samples must be at least 1"));
        }
        if !(ph.ph_min < ph.ph_max) {
            return Err(Error::Config("ph.ph_min must be below ph.ph_max"));
        }
        if (ph.neutral_mv - ph.acid_mv).abs() < f32::EPSILON {
            return Err(Error::Config("ph calibration points must differ"));
        }
        if ph.power_on_delay_ms > 60_000 {
            return Err(Error::Config("ph.power_on_delay_ms must be at most 60000"));
        }

        let d = &self.distance;
        if d.samples == 0 {
            return Err(Error::Config("distance.samples must be at least 1"));
        }
        if d.echo_timeout_us == 0 {
            return Err(Error::Config("distance.echo_timeout_us must be non-zero"));
        }
        if !(d.min_cm < d.max_cm) {
            return Err(Error::Config("distance.min_cm must be below distance.max_cm"));
        }

        if !(10..=86_400).contains(&self.poll_interval_secs) {
            return Err(Error::Config("poll_interval_secs must be 10-86400"));
        }
        Ok(())
    }

    /// Compact binary form for non-volatile storage.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::Config("config could not be serialised"))
    }

    /// Inverse of [`to_blob`](Self::to_blob).  The result is validated.
    pub fn from_blob(bytes: &[u8]) -> Result<Self> {
        let cfg: Self =
            postcard::from_bytes(bytes).map_err(|_| Error::Config("stored config is corrupted"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Load the stored config, falling back to defaults when nothing is stored
/// or the blob does not validate.
pub fn load(store: &mut impl ConfigStore) -> BuoyConfig {
    let Some(bytes) = store.load_blob() else {
        info!("Config: no stored config, using defaults");
        return BuoyConfig::default();
    };
    match BuoyConfig::from_blob(&bytes) {
        Ok(cfg) => {
            info!("Config: loaded {} bytes from store", bytes.len());
            cfg
        }
        Err(e) => {
            warn!("Config: {}, using defaults", e);
            BuoyConfig::default()
        }
    }
}

/// Validate and persist.
pub fn save(store: &mut impl ConfigStore, config: &BuoyConfig) -> Result<()> {
    config.validate()?;
    let blob = config.to_blob()?;
    store.save_blob(&blob)?;
    info!("Config: saved {} bytes", blob.len());
    Ok(())
}
