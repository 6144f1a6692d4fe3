//! DHT22 / DHT11 generic temperature and humidity sensors.
//!
//! Both models answer with the same 40-bit frame: four data bytes and an
//! additive checksum.  They differ only in how the data bytes are packed.

use log::{info, warn};

use super::reading::Reading;
use super::{Availability, AvailabilityState, Sensor, SensorKind};
use crate::error::SensorError;
use crate::payload::Field;
use crate::ports::DhtLine;

const TEMPERATURE_RANGE_C: (f32, f32) = (-40.0, 80.0);
const HUMIDITY_RANGE_PCT: (f32, f32) = (0.0, 100.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtModel {
    /// 0.1 resolution, sign bit on temperature.
    Dht22,
    /// Integer part and decimal part in separate bytes.
    Dht11,
}

impl DhtModel {
    pub const fn kind(self) -> SensorKind {
        match self {
            Self::Dht22 => SensorKind::Dht22,
            Self::Dht11 => SensorKind::Dht11,
        }
    }
}

/// Decode a frame into (°C, %RH).
pub fn decode_frame(model: DhtModel, frame: &[u8; 5]) -> Result<(f32, f32), SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }

    let decoded = match model {
        DhtModel::Dht22 => {
            let humidity = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
            let raw_temp = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]);
            let mut temperature = f32::from(raw_temp) / 10.0;
            if frame[2] & 0x80 != 0 {
                temperature = -temperature;
            }
            (temperature, humidity)
        }
        DhtModel::Dht11 => {
            let humidity = f32::from(frame[0]) + f32::from(frame[1]) / 10.0;
            let mut temperature = f32::from(frame[2]) + f32::from(frame[3] & 0x7F) / 10.0;
            if frame[3] & 0x80 != 0 {
                temperature = -temperature;
            }
            (temperature, humidity)
        }
    };
    Ok(decoded)
}

pub struct DhtSensor<L> {
    line: L,
    model: DhtModel,
    availability: AvailabilityState,
}

impl<L: DhtLine> DhtSensor<L> {
    pub fn new(line: L, model: DhtModel) -> Self {
        Self {
            line,
            model,
            availability: AvailabilityState::new(),
        }
    }

    fn read(&mut self) -> Result<(f32, f32), SensorError> {
        let frame = self.line.read_frame()?;
        decode_frame(self.model, &frame)
    }
}

impl<L: DhtLine> Sensor for DhtSensor<L> {
    fn kind(&self) -> SensorKind {
        self.model.kind()
    }

    fn availability(&self) -> Availability {
        self.availability.get()
    }

    fn init(&mut self) -> Result<(), SensorError> {
        let name = self.name();
        let outcome = self.read().map(|_| ());
        self.availability.record_init(name, outcome)
    }

    fn read_all(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        if let Err(e) = self.availability.ensure_available() {
            reading.mark_failed(self.fields());
            return Err(e);
        }
        let name = self.name();
        match self.read() {
            Ok((temperature, humidity)) => {
                let (lo, hi) = TEMPERATURE_RANGE_C;
                if !(lo..=hi).contains(&temperature) {
                    warn!("{}: temperature out of range: {:.1} C", name, temperature);
                }
                let (lo, hi) = HUMIDITY_RANGE_PCT;
                if !(lo..=hi).contains(&humidity) {
                    warn!("{}: humidity out of range: {:.1} %", name, humidity);
                }
                info!("{}: {:.1} C, {:.1} %RH", name, temperature, humidity);
                reading.set(Field::TemperatureExt, temperature);
                reading.set(Field::Humidity, humidity);
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
