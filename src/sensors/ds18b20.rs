//! Maxim DS18B20 one-wire thermometer: water temperature at 1 m depth.

use log::{info, warn};

use super::reading::Reading;
use super::{Availability, AvailabilityState, Sensor, SensorKind};
use crate::error::SensorError;
use crate::ports::OneWireThermometer;

/// Scratchpad value after power-on, before any conversion has run.
const POWER_ON_RESET_RAW: i16 = 0x0550; // 85.0 °C

const WATER_RANGE_C: (f32, f32) = (-5.0, 40.0);

/// Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1, reflected).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

/// Validate a scratchpad and return the temperature register.
pub fn temperature_raw(scratchpad: &[u8; 9]) -> Result<i16, SensorError> {
    if crc8(&scratchpad[..8]) != scratchpad[8] {
        return Err(SensorError::ChecksumMismatch);
    }
    Ok(i16::from_le_bytes([scratchpad[0], scratchpad[1]]))
}

pub struct Ds18b20Sensor<W> {
    bus: W,
    availability: AvailabilityState,
    bus_gpio: i32,
}

impl<W: OneWireThermometer> Ds18b20Sensor<W> {
    pub fn new(bus: W, bus_gpio: i32) -> Self {
        Self {
            bus,
            availability: AvailabilityState::new(),
            bus_gpio,
        }
    }

    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        let scratchpad = self.bus.convert_and_read_scratchpad()?;
        let raw = temperature_raw(&scratchpad)?;
        if raw == POWER_ON_RESET_RAW {
            return Err(SensorError::PowerNotSettled);
        }
        Ok(f32::from(raw) / 16.0)
    }
}

impl<W: OneWireThermometer> Sensor for Ds18b20Sensor<W> {
    fn kind(&self) -> SensorKind {
        SensorKind::Ds18b20
    }

    fn availability(&self) -> Availability {
        self.availability.get()
    }

    fn init(&mut self) -> Result<(), SensorError> {
        let name = self.name();
        info!("DS18B20: one-wire bus on GPIO{}", self.bus_gpio);
        let outcome = match self.bus.reset() {
            Ok(true) => Ok(()),
            Ok(false) => Err(SensorError::NotResponding),
            Err(e) => Err(e),
        };
        self.availability.record_init(name, outcome)
    }

    fn read_all(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        if let Err(e) = self.availability.ensure_available() {
            reading.mark_failed(self.fields());
            return Err(e);
        }
        match self.read_celsius() {
            Ok(celsius) => {
                let (lo, hi) = WATER_RANGE_C;
                if !(lo..=hi).contains(&celsius) {
                    warn!("DS18B20: water temperature out of range: {:.2} C", celsius);
                }
                info!("DS18B20: {:.2} C", celsius);
                reading.temperature_water = Some(celsius);
                Ok(())
            }
            Err(e) => {
                reading.mark_failed(self.fields());
                Err(e)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_available_for_testing(&mut self, available: bool) {
        let name = self.name();
        self.availability.force(name, available);
    }
}
