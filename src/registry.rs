//! Compile-time sensor selection.
//!
//! Each `sensor-*` cargo feature compiles one driver kind into
//! [`ACTIVE_SENSORS`].  The list drives which drivers a board registers
//! and which fields the generated decoder expects.

use crate::payload::{Field, FieldSet};
use crate::sensors::SensorKind;

#[cfg(all(
    feature = "sensor-bme280",
    any(feature = "sensor-dht22", feature = "sensor-dht11")
))]
compile_error!("sensor-bme280 and sensor-dht* both own temperature_ext and humidity; pick one");

#[cfg(all(feature = "sensor-dht22", feature = "sensor-dht11"))]
compile_error!("sensor-dht22 and sensor-dht11 are mutually exclusive");

/// Driver kinds compiled into this build.  Never empty: a build with no
/// sensor feature gets the battery-only placeholder.
pub const ACTIVE_SENSORS: &[SensorKind] = &[
    #[cfg(feature = "sensor-ph")]
    SensorKind::Ph,
    #[cfg(feature = "sensor-bme280")]
    SensorKind::Bme280,
    #[cfg(feature = "sensor-ds18b20")]
    SensorKind::Ds18b20,
    #[cfg(feature = "sensor-hcsr04")]
    SensorKind::Hcsr04,
    #[cfg(feature = "sensor-dht22")]
    SensorKind::Dht22,
    #[cfg(feature = "sensor-dht11")]
    SensorKind::Dht11,
    #[cfg(not(any(
        feature = "sensor-ph",
        feature = "sensor-bme280",
        feature = "sensor-ds18b20",
        feature = "sensor-hcsr04",
        feature = "sensor-dht22",
        feature = "sensor-dht11"
    )))]
    SensorKind::None,
];

/// Battery plus the fields owned by `kinds`.
pub const fn fields_of(kinds: &[SensorKind]) -> FieldSet {
    let mut set = FieldSet::EMPTY.with(Field::Battery);
    let mut i = 0;
    while i < kinds.len() {
        set = set.union(kinds[i].fields());
        i += 1;
    }
    set
}

/// Full payload layout when every compiled driver is available.
pub const ACTIVE_FIELDS: FieldSet = fields_of(ACTIVE_SENSORS);

pub fn is_compiled(kind: SensorKind) -> bool {
    ACTIVE_SENSORS.contains(&kind)
}

/// Compiled driver names joined with `+`.
pub fn active_names() -> String {
    let names: Vec<&str> = ACTIVE_SENSORS.iter().map(|k| k.name()).collect();
    names.join("+")
}
