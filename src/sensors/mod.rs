//! Sensor subsystem: the driver contract, per-driver availability state,
//! and the individual drivers.
//!
//! Every driver implements [`Sensor`].  The [`SensorHub`](crate::hub::SensorHub)
//! owns the drivers compiled into a build and never needs to know which
//! concrete variant it is talking to.
//!
//! ## Dual-target design
//!
//! Drivers talk to hardware only through the port traits in
//! [`crate::ports`].  On the firmware target those are backed by the board
//! HAL; on host they are backed by [`crate::adapters::sim`].  The
//! availability override used by tests is compiled only off-target.

pub mod bme280;
pub mod dht;
pub mod ds18b20;
#[cfg(not(target_os = "espidf"))]
pub mod fake;
pub mod hcsr04;
pub mod none;
pub mod ph;
pub mod power;
pub mod reading;

use log::{info, warn};

use crate::error::{PayloadError, SensorError};
use crate::payload::{self, Field, FieldSet, Payload};
use reading::Reading;

// ---------------------------------------------------------------------------
// Sensor kinds
// ---------------------------------------------------------------------------

/// The closed set of driver variants a build can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// DFRobot analog pH probe.
    Ph,
    /// External temperature, humidity and pressure.
    Bme280,
    /// One-wire water temperature probe at 1 m.
    Ds18b20,
    /// Ultrasonic distance.
    Hcsr04,
    Dht22,
    Dht11,
    /// Placeholder when no sensor is compiled in.
    None,
}

impl SensorKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ph => "DFRobot pH",
            Self::Bme280 => "BME280",
            Self::Ds18b20 => "DS18B20",
            Self::Hcsr04 => "HC-SR04",
            Self::Dht22 => "DHT22",
            Self::Dht11 => "DHT11",
            Self::None => "NONE",
        }
    }

    /// What the sensor measures, for the layout report.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ph => "water pH",
            Self::Bme280 => "external temperature, humidity, pressure",
            Self::Ds18b20 => "water temperature 1m",
            Self::Hcsr04 => "distance",
            Self::Dht22 | Self::Dht11 => "external temperature, humidity",
            Self::None => "no sensor",
        }
    }

    /// Payload fields this variant owns.
    pub const fn fields(self) -> FieldSet {
        match self {
            Self::Ph => FieldSet::of(&[Field::Ph]),
            Self::Bme280 => FieldSet::of(&[Field::TemperatureExt, Field::Humidity, Field::Pressure]),
            Self::Ds18b20 => FieldSet::of(&[Field::TemperatureWater]),
            Self::Hcsr04 => FieldSet::of(&[Field::Distance]),
            Self::Dht22 | Self::Dht11 => FieldSet::of(&[Field::TemperatureExt, Field::Humidity]),
            Self::None => FieldSet::EMPTY,
        }
    }
}

// ---------------------------------------------------------------------------
// Availability state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    #[default]
    Uninitialized,
    Available,
    Unavailable,
}

/// Per-driver availability, held for the lifetime of the process.
///
/// `Available` is sticky: nothing but the test override moves a driver back
/// to `Unavailable`.  A driver whose reads start failing keeps reporting
/// `Available` and emits sentinels, so it is never picked up by
/// `retry_init`.  That gap is deliberate for now; demoting on repeated read
/// failures would change which bytes go on air.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityState {
    state: Availability,
}

impl AvailabilityState {
    pub const fn new() -> Self {
        Self {
            state: Availability::Uninitialized,
        }
    }

    pub fn get(&self) -> Availability {
        self.state
    }

    pub fn is_available(&self) -> bool {
        self.state == Availability::Available
    }

    /// Gate for `read_all`: drivers never touch hardware before a good init.
    pub fn ensure_available(&self) -> Result<(), SensorError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(SensorError::NotAvailable)
        }
    }

    /// `retry_init` only re-probes when this is true.
    pub fn needs_retry(&self) -> bool {
        self.state != Availability::Available
    }

    /// Apply the outcome of an `init()` attempt and return it unchanged.
    pub fn record_init(
        &mut self,
        name: &str,
        outcome: Result<(), SensorError>,
    ) -> Result<(), SensorError> {
        let next = match (self.state, &outcome) {
            (_, Ok(())) => Availability::Available,
            (Availability::Available, Err(e)) => {
                warn!("{}: re-init failed ({}), keeping last-known-good state", name, e);
                Availability::Available
            }
            (_, Err(e)) => {
                warn!("{}: init failed: {}", name, e);
                Availability::Unavailable
            }
        };
        if next != self.state {
            info!("{}: {:?} -> {:?}", name, self.state, next);
            self.state = next;
        }
        outcome
    }

    /// Test-only escape hatch: jump straight to a state.
    #[cfg(not(target_os = "espidf"))]
    pub fn force(&mut self, name: &str, available: bool) {
        self.state = if available {
            Availability::Available
        } else {
            Availability::Unavailable
        };
        info!(
            "TESTING: {} forced {}",
            name,
            if available { "available" } else { "unavailable" }
        );
    }
}

// ---------------------------------------------------------------------------
// Capability contract
// ---------------------------------------------------------------------------

/// The capability set every sensor driver provides.
///
/// Drivers are not reentrant; the hub calls them one at a time from the
/// main loop.  Reads may block for device-specific durations.
pub trait Sensor {
    fn kind(&self) -> SensorKind;

    /// Static identity string.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Fields this driver writes.  No two drivers in a hub may overlap.
    fn fields(&self) -> FieldSet {
        self.kind().fields()
    }

    fn availability(&self) -> Availability;

    /// One-time hardware setup.  Not guaranteed idempotent.
    fn init(&mut self) -> Result<(), SensorError>;

    fn is_available(&self) -> bool {
        self.availability() == Availability::Available
    }

    /// Re-run `init()` unless already available.
    fn retry_init(&mut self) -> Result<(), SensorError> {
        if self.is_available() {
            return Ok(());
        }
        info!("{}: retrying init", self.name());
        self.init()
    }

    /// Full physical read into the owned fields of `reading`.
    ///
    /// On `Err` the owned fields must hold
    /// [`SENSOR_ERROR`](reading::SENSOR_ERROR).  Implausible but successfully
    /// read values are logged and returned as `Ok`.
    fn read_all(&mut self, reading: &mut Reading) -> Result<(), SensorError>;

    /// Read, then append this driver's slice of the payload to `out`.
    ///
    /// Unavailable drivers write nothing.  A failed read still occupies the
    /// full width, filled with sentinels.
    fn get_payload(&mut self, out: &mut Payload) -> Result<usize, PayloadError> {
        if !self.is_available() {
            return Ok(0);
        }
        let mut reading = Reading::default();
        read_or_sentinel(self, &mut reading);
        payload::encode(&reading, self.fields(), out)
    }

    /// External temperature input for compensated sensors.
    fn set_compensation_temperature(&mut self, _celsius: f32) {}

    /// Called once per main-loop pass, between reads.
    fn service(&mut self) {}

    /// Test-only override of the availability state.
    #[cfg(not(target_os = "espidf"))]
    fn set_available_for_testing(&mut self, available: bool);
}

/// Read `sensor` into `reading`, enforcing the sentinel rule on failure.
///
/// Returns true if the read completed.
pub fn read_or_sentinel<S: Sensor + ?Sized>(sensor: &mut S, reading: &mut Reading) -> bool {
    match sensor.read_all(reading) {
        Ok(()) => true,
        Err(e) => {
            warn!("{}: read failed: {}", sensor.name(), e);
            reading.mark_failed(sensor.fields());
            false
        }
    }
}
