//! Port traits: the boundary between the sensor core and the chips.
//!
//! ```text
//!   board HAL / sim ──▶ port trait ──▶ driver (sensors::*)
//! ```
//!
//! Pin-level output and blocking delays use the `embedded-hal` 1.0 traits
//! directly (`OutputPin`, `DelayNs`).  Everything below is the part of each
//! chip that lives under register or bit-timing level: the core only needs
//! the decoded transfer, not how it was clocked out of the device.

use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Analog input (pH probe)
// ───────────────────────────────────────────────────────────────

/// One-shot ADC channel.
pub trait AnalogInput {
    /// Raw conversion result, `0..resolution`.
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// BME280 (I²C)
// ───────────────────────────────────────────────────────────────

/// Compensated sample as produced by the chip's trimming formulas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentSample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub pressure_pa: f32,
}

/// Combined temperature / humidity / pressure chip.
pub trait EnvironmentChip {
    /// Read the chip-id register.
    fn chip_id(&mut self) -> Result<u8, SensorError>;

    /// Force one measurement and return the compensated values.
    fn measure(&mut self) -> Result<EnvironmentSample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// DS18B20 (one-wire)
// ───────────────────────────────────────────────────────────────

/// Single-drop one-wire thermometer.
pub trait OneWireThermometer {
    /// Issue a bus reset; true if a device answered with a presence pulse.
    fn reset(&mut self) -> Result<bool, SensorError>;

    /// Start a conversion, wait for it, and read the 9-byte scratchpad.
    fn convert_and_read_scratchpad(&mut self) -> Result<[u8; 9], SensorError>;
}

// ───────────────────────────────────────────────────────────────
// HC-SR04 echo
// ───────────────────────────────────────────────────────────────

/// Echo-pin pulse timer.
pub trait EchoTimer {
    /// Width of the next echo pulse in microseconds, or `Timeout` if none
    /// arrives within `timeout_us`.
    fn echo_width_us(&mut self, timeout_us: u32) -> Result<u32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// DHT single-wire
// ───────────────────────────────────────────────────────────────

/// DHT11 / DHT22 data line.
pub trait DhtLine {
    /// Run the start handshake and return the 40-bit frame, checksum byte
    /// included and unchecked.
    fn read_frame(&mut self) -> Result<[u8; 5], SensorError>;
}

// ───────────────────────────────────────────────────────────────
// pH calibration input
// ───────────────────────────────────────────────────────────────

/// Operator console the calibration commands arrive on.
pub trait CalibrationInput {
    /// True if inbound calibration data is waiting.
    fn pending(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Persistent configuration
// ───────────────────────────────────────────────────────────────

/// Non-volatile blob storage for [`BuoyConfig`](crate::config::BuoyConfig).
pub trait ConfigStore {
    /// The stored blob, or `None` on first boot.
    fn load_blob(&mut self) -> Option<Vec<u8>>;

    fn save_blob(&mut self, blob: &[u8]) -> Result<(), crate::error::Error>;
}
