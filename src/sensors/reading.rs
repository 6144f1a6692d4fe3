//! The per-cycle reading record.

use serde::{Deserialize, Serialize};

use crate::payload::{Field, FieldSet};

/// Value written into an owned field when its driver fails to communicate.
/// Encoded on the wire as raw `0x8000`.
pub const SENSOR_ERROR: f32 = f32::NAN;

/// Canonical aggregate of one poll cycle.
///
/// `None` means no available driver owns the field this cycle;
/// `Some(SENSOR_ERROR)` means the owner tried and failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Set by the power monitor, outside the sensor core.
    pub battery_percent: u8,
    pub ph: Option<f32>,
    /// °C
    pub temperature_ext: Option<f32>,
    /// %RH
    pub humidity: Option<f32>,
    /// hPa
    pub pressure: Option<f32>,
    /// °C at 1 m depth
    pub temperature_water: Option<f32>,
    pub distance_cm: Option<f32>,
}

impl Reading {
    pub fn get(&self, field: Field) -> Option<f32> {
        match field {
            Field::Battery => Some(f32::from(self.battery_percent)),
            Field::Ph => self.ph,
            Field::TemperatureExt => self.temperature_ext,
            Field::TemperatureWater => self.temperature_water,
            Field::Humidity => self.humidity,
            Field::Pressure => self.pressure,
            Field::Distance => self.distance_cm,
        }
    }

    /// Write a sensor field.  Battery is owned by the caller and ignored.
    pub fn set(&mut self, field: Field, value: f32) {
        let slot = match field {
            Field::Battery => return,
            Field::Ph => &mut self.ph,
            Field::TemperatureExt => &mut self.temperature_ext,
            Field::TemperatureWater => &mut self.temperature_water,
            Field::Humidity => &mut self.humidity,
            Field::Pressure => &mut self.pressure,
            Field::Distance => &mut self.distance_cm,
        };
        *slot = Some(value);
    }

    /// Overwrite every field in `fields` with [`SENSOR_ERROR`].
    pub fn mark_failed(&mut self, fields: FieldSet) {
        for spec in fields.iter() {
            self.set(spec.field, SENSOR_ERROR);
        }
    }

    /// True if the field holds a real value, not missing and not the sentinel.
    pub fn is_valid(&self, field: Field) -> bool {
        self.get(field).is_some_and(f32::is_finite)
    }

    /// Copy every field in `fields` from `other` into `self`.
    pub fn merge_from(&mut self, other: &Reading, fields: FieldSet) {
        for spec in fields.iter() {
            if let Some(v) = other.get(spec.field) {
                self.set(spec.field, v);
            }
        }
    }
}
