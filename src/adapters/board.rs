//! Simulated sensor board: one sim device per socket, wired to drivers the
//! way the real board wires them to the HAL.

use crate::config::BuoyConfig;
use crate::error::RegistryError;
use crate::hub::SensorHub;
use crate::pins;
use crate::registry::ACTIVE_SENSORS;
use crate::sensors::bme280::Bme280Sensor;
use crate::sensors::dht::{DhtModel, DhtSensor};
use crate::sensors::ds18b20::Ds18b20Sensor;
use crate::sensors::hcsr04::Hcsr04Sensor;
use crate::sensors::none::NoSensor;
use crate::sensors::ph::PhSensor;
use crate::sensors::{Sensor, SensorKind};

use super::sim::{SimAdc, SimConsole, SimDelay, SimDhtLine, SimEcho, SimEnvChip, SimOneWire, SimPin};

/// Handles onto every simulated device.  Clones share state with the
/// drivers built from this board.
#[derive(Debug, Clone)]
pub struct SimBoard {
    pub ph_power: SimPin,
    pub ph_adc: SimAdc,
    pub console: SimConsole,
    pub env: SimEnvChip,
    pub one_wire: SimOneWire,
    pub trigger: SimPin,
    pub echo: SimEcho,
    pub dht22: SimDhtLine,
    pub dht11: SimDhtLine,
    pub delay: SimDelay,
}

impl Default for SimBoard {
    fn default() -> Self {
        let ph_power = SimPin::new();
        Self {
            ph_adc: SimAdc::powered_by(&ph_power),
            ph_power,
            console: SimConsole::new(),
            env: SimEnvChip::new(),
            one_wire: SimOneWire::new(),
            trigger: SimPin::new(),
            echo: SimEcho::new(),
            dht22: SimDhtLine::new(DhtModel::Dht22),
            dht11: SimDhtLine::new(DhtModel::Dht11),
            delay: SimDelay::new(),
        }
    }
}

impl SimBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver for `kind`, wired to this board's sim devices.
    pub fn driver(&self, kind: SensorKind, config: &BuoyConfig) -> Box<dyn Sensor> {
        match kind {
            SensorKind::Ph => Box::new(PhSensor::new(
                self.ph_adc.clone(),
                self.ph_power.clone(),
                self.delay.clone(),
                self.console.clone(),
                config.ph,
                pins::PH_ANALOG_GPIO,
            )),
            SensorKind::Bme280 => Box::new(Bme280Sensor::new(self.env.clone(), pins::BME280_I2C_ADDR)),
            SensorKind::Ds18b20 => Box::new(Ds18b20Sensor::new(self.one_wire.clone(), pins::ONE_WIRE_GPIO)),
            SensorKind::Hcsr04 => Box::new(Hcsr04Sensor::new(
                self.trigger.clone(),
                self.echo.clone(),
                self.delay.clone(),
                config.distance,
            )),
            SensorKind::Dht22 => Box::new(DhtSensor::new(self.dht22.clone(), DhtModel::Dht22)),
            SensorKind::Dht11 => Box::new(DhtSensor::new(self.dht11.clone(), DhtModel::Dht11)),
            SensorKind::None => Box::new(NoSensor::new()),
        }
    }

    /// A hub holding a driver per entry of `kinds`, in that order.
    pub fn hub(&self, kinds: &[SensorKind], config: &BuoyConfig) -> Result<SensorHub, RegistryError> {
        let mut hub = SensorHub::new();
        for &kind in kinds {
            hub.register(self.driver(kind, config))?;
        }
        Ok(hub)
    }

    /// A hub for the drivers compiled into this build.
    pub fn build_hub(&self, config: &BuoyConfig) -> Result<SensorHub, RegistryError> {
        self.hub(ACTIVE_SENSORS, config)
    }
}
