//! Placeholder driver for builds with no sensor selected.
//!
//! Owns no fields and never fails, so a battery-only build still has a
//! registry entry and a well-defined 1-byte payload.

use super::reading::Reading;
use super::{Availability, AvailabilityState, Sensor, SensorKind};
use crate::error::SensorError;

#[derive(Default)]
pub struct NoSensor {
    availability: AvailabilityState,
}

impl NoSensor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sensor for NoSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::None
    }

    fn availability(&self) -> Availability {
        self.availability.get()
    }

    fn init(&mut self) -> Result<(), SensorError> {
        let name = self.name();
        self.availability.record_init(name, Ok(()))
    }

    fn read_all(&mut self, _reading: &mut Reading) -> Result<(), SensorError> {
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_available_for_testing(&mut self, available: bool) {
        let name = self.name();
        self.availability.force(name, available);
    }
}
