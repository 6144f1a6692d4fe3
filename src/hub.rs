//! Sensor hub: the aggregator over every driver compiled into a build.
//!
//! The hub owns its drivers as trait objects and never branches on the
//! concrete variant.  Drivers own disjoint field sets (enforced at
//! [`register`](SensorHub::register)), so the per-driver results can be
//! merged in any order and the payload layout depends only on which
//! fields are present.

use log::{debug, info, warn};

use crate::error::{PayloadError, RegistryError};
use crate::payload::{self, Field, FieldSet, Payload, PayloadConfig};
use crate::sensors::reading::Reading;
use crate::sensors::{Sensor, read_or_sentinel};

/// Upper bound on registered drivers.  There are six field-owning kinds.
pub const MAX_SENSORS: usize = 6;

#[derive(Default)]
pub struct SensorHub {
    sensors: heapless::Vec<Box<dyn Sensor>, MAX_SENSORS>,
}

impl SensorHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a driver.  Rejects a second driver of the same kind, or one whose
    /// fields overlap an already registered driver.
    pub fn register(&mut self, sensor: Box<dyn Sensor>) -> Result<(), RegistryError> {
        let incoming = sensor.kind();
        for existing in &self.sensors {
            if existing.kind() == incoming {
                return Err(RegistryError::DuplicateSensor(incoming));
            }
            if existing.fields().intersects(sensor.fields()) {
                return Err(RegistryError::FieldConflict {
                    existing: existing.kind(),
                    incoming,
                });
            }
        }
        self.sensors.push(sensor).map_err(|_| RegistryError::Full)?;
        debug!("Hub: registered {}", incoming.name());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Registered driver names joined with `+`, e.g. `"DFRobot pH+BME280"`.
    pub fn names(&self) -> String {
        if self.sensors.is_empty() {
            return "NONE".to_string();
        }
        let names: Vec<&str> = self.sensors.iter().map(|s| s.name()).collect();
        names.join("+")
    }

    /// Initialise every driver.  True if at least one came up.
    pub fn init_all(&mut self) -> bool {
        info!("Hub: initialising {}", self.names());
        let mut any = false;
        for sensor in &mut self.sensors {
            any |= sensor.init().is_ok();
        }
        if !any {
            warn!("Hub: no sensor available");
        }
        any
    }

    pub fn is_any_available(&self) -> bool {
        self.sensors.iter().any(|s| s.is_available())
    }

    /// Re-probe every driver that is not available.  True if at least one
    /// driver is available afterwards.
    pub fn retry_init_all(&mut self) -> bool {
        for sensor in &mut self.sensors {
            if let Err(e) = sensor.retry_init() {
                debug!("Hub: {} still unavailable: {}", sensor.name(), e);
            }
        }
        self.is_any_available()
    }

    /// Fields that go on air this cycle: battery plus every available
    /// driver's fields.
    pub fn payload_fields(&self) -> FieldSet {
        self.sensors
            .iter()
            .filter(|s| s.is_available())
            .fold(FieldSet::EMPTY.with(Field::Battery), |acc, s| acc.union(s.fields()))
    }

    /// Read every available driver into `reading`.
    ///
    /// Sensor fields are cleared first, so fields of unavailable drivers
    /// end up `None`; the battery byte is left alone.  True if at least one
    /// driver that owns fields read successfully.
    pub fn read_all(&mut self, reading: &mut Reading) -> bool {
        *reading = Reading {
            battery_percent: reading.battery_percent,
            ..Reading::default()
        };

        let mut any = false;
        for sensor in &mut self.sensors {
            if !sensor.is_available() {
                continue;
            }
            let mut own = Reading::default();
            let ok = read_or_sentinel(sensor.as_mut(), &mut own);
            let fields = sensor.fields();
            reading.merge_from(&own, fields);
            // The placeholder succeeds without contributing anything.
            any |= ok && !fields.is_empty();
        }
        any
    }

    /// Encode an already collected `reading`.  Returns the payload length.
    pub fn encode_payload(
        &self,
        reading: &Reading,
        config: &PayloadConfig,
        out: &mut Payload,
    ) -> Result<usize, PayloadError> {
        let reading = Reading {
            battery_percent: config.battery_percent,
            ..*reading
        };
        out.clear();
        payload::encode(&reading, self.payload_fields(), out)
    }

    /// Read all available drivers and encode the full uplink into `out`.
    pub fn get_payload(
        &mut self,
        out: &mut Payload,
        config: &PayloadConfig,
    ) -> Result<usize, PayloadError> {
        let mut reading = Reading::default();
        self.read_all(&mut reading);
        let len = self.encode_payload(&reading, config, out)?;
        debug!("Hub: {} byte payload", len);
        Ok(len)
    }

    /// Forward the best available temperature to compensated drivers:
    /// water temperature if valid, otherwise external temperature.
    pub fn apply_temperature_compensation(&mut self, reading: &Reading) {
        let celsius = [Field::TemperatureWater, Field::TemperatureExt]
            .into_iter()
            .find(|f| reading.is_valid(*f))
            .and_then(|f| reading.get(f));
        let Some(celsius) = celsius else {
            return;
        };
        for sensor in &mut self.sensors {
            sensor.set_compensation_temperature(celsius);
        }
    }

    /// Main-loop housekeeping for drivers that need it (console polling).
    pub fn service_all(&mut self) {
        for sensor in &mut self.sensors {
            sensor.service();
        }
    }

    /// Force every driver's availability (host builds only).
    #[cfg(not(target_os = "espidf"))]
    pub fn set_available_for_testing(&mut self, available: bool) {
        for sensor in &mut self.sensors {
            sensor.set_available_for_testing(available);
        }
    }
}
