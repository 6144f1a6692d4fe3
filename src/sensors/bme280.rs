//! Bosch BME280: external air temperature, humidity and pressure.
//!
//! Mounted in the buoy mast above the waterline, on the shared I²C bus.
//! The chip's trimming and compensation live behind [`EnvironmentChip`];
//! this driver owns identification, unit conversion and plausibility.

use log::{info, warn};

use super::reading::Reading;
use super::{Availability, AvailabilityState, Sensor, SensorKind};
use crate::error::SensorError;
use crate::payload::Field;
use crate::ports::{EnvironmentChip, EnvironmentSample};

pub const BME280_CHIP_ID: u8 = 0x60;
/// A BMP280 answers at the same addresses but has no humidity channel.
pub const BMP280_CHIP_ID: u8 = 0x58;

const TEMPERATURE_RANGE_C: (f32, f32) = (-40.0, 85.0);
const HUMIDITY_RANGE_PCT: (f32, f32) = (0.0, 100.0);
const PRESSURE_RANGE_HPA: (f32, f32) = (300.0, 1100.0);

pub struct Bme280Sensor<I> {
    chip: I,
    address: u8,
    availability: AvailabilityState,
}

impl<I: EnvironmentChip> Bme280Sensor<I> {
    pub fn new(chip: I, address: u8) -> Self {
        Self {
            chip,
            address,
            availability: AvailabilityState::new(),
        }
    }

    fn probe(&mut self) -> Result<(), SensorError> {
        match self.chip.chip_id()? {
            BME280_CHIP_ID => Ok(()),
            BMP280_CHIP_ID => {
                warn!("BME280: found BMP280 at 0x{:02X}, humidity unsupported", self.address);
                Err(SensorError::UnexpectedChipId(BMP280_CHIP_ID))
            }
            other => Err(SensorError::UnexpectedChipId(other)),
        }
    }
}

fn check_range(label: &str, value: f32, (lo, hi): (f32, f32)) {
    if !(lo..=hi).contains(&value) {
        warn!("BME280: {} out of range: {:.2}", label, value);
    }
}

impl<I: EnvironmentChip> Sensor for Bme280Sensor<I> {
    fn kind(&self) -> SensorKind {
        SensorKind::Bme280
    }

    fn availability(&self) -> Availability {
        self.availability.get()
    }

    fn init(&mut self) -> Result<(), SensorError> {
        let name = self.name();
        info!("BME280: probing I2C address 0x{:02X}", self.address);
        let outcome = self.probe();
        self.availability.record_init(name, outcome)
    }

    fn read_all(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        if let Err(e) = self.availability.ensure_available() {
            reading.mark_failed(self.fields());
            return Err(e);
        }
        let EnvironmentSample {
            temperature_c,
            humidity_pct,
            pressure_pa,
        } = match self.chip.measure() {
            Ok(sample) => sample,
            Err(e) => {
                reading.mark_failed(self.fields());
                return Err(e);
            }
        };
        let pressure_hpa = pressure_pa / 100.0;

        check_range("temperature", temperature_c, TEMPERATURE_RANGE_C);
        check_range("humidity", humidity_pct, HUMIDITY_RANGE_PCT);
        check_range("pressure", pressure_hpa, PRESSURE_RANGE_HPA);

        reading.set(Field::TemperatureExt, temperature_c);
        reading.set(Field::Humidity, humidity_pct);
        reading.set(Field::Pressure, pressure_hpa);
        info!(
            "BME280: {:.2} C, {:.2} %RH, {:.1} hPa",
            temperature_c, humidity_pct, pressure_hpa
        );
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_available_for_testing(&mut self, available: bool) {
        let name = self.name();
        self.availability.force(name, available);
    }
}
