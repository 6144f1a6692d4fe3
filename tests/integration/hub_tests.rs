//! SensorHub aggregation and payload scenarios over fake drivers.

use buoy::error::SensorError;
use buoy::payload::{self, Field, FieldSet, Payload, PayloadConfig};
use buoy::sensors::SensorKind;
use buoy::sensors::reading::SENSOR_ERROR;
use buoy::{Reading, SensorHub};

use crate::fixtures::{assert_close, fake, fake_with_fields, full_reading, temperature_only};

const BATTERY_87: PayloadConfig = PayloadConfig { battery_percent: 87 };

#[test]
fn reference_scenario_with_missing_humidity_and_pressure() {
    let values = Reading {
        ph: Some(7.42),
        temperature_ext: Some(21.35),
        temperature_water: Some(18.0),
        ..Reading::default()
    };
    let mut hub = SensorHub::new();
    let (ph, _) = fake(SensorKind::Ph, values);
    let (ext, _) = fake_with_fields(SensorKind::Bme280, temperature_only(), values);
    let (water, _) = fake(SensorKind::Ds18b20, values);
    hub.register(ph).unwrap();
    hub.register(ext).unwrap();
    hub.register(water).unwrap();
    assert!(hub.init_all());

    let mut out = Payload::new();
    assert_eq!(hub.get_payload(&mut out, &BATTERY_87), Ok(7));
    assert_eq!(out.as_slice(), &[87, 0xE6, 0x02, 0x57, 0x08, 0x08, 0x07]);

    let decoded = payload::decode(&out, hub.payload_fields());
    assert!(decoded.warnings.is_empty());
    assert_eq!(decoded.data.len(), 4);
    assert_close(decoded.value("battery_percent"), 87.0, 0.0);
    assert_close(decoded.value("ph"), 7.42, 0.01);
    assert_close(decoded.value("temperature_ext"), 21.35, 0.01);
    assert_close(decoded.value("temperature_water_1m"), 18.0, 0.01);
}

#[test]
fn full_reference_set_is_eleven_bytes() {
    let mut hub = SensorHub::new();
    for kind in crate::fixtures::REFERENCE {
        hub.register(fake(kind, full_reading()).0).unwrap();
    }
    hub.init_all();

    let mut out = Payload::new();
    assert_eq!(hub.get_payload(&mut out, &BATTERY_87), Ok(11));
    let decoded = payload::decode(&out, hub.payload_fields());
    assert_close(decoded.value("humidity"), 64.5, 0.01);
    assert_close(decoded.value("pressure"), 1013.2, 0.1);
}

#[test]
fn all_sensors_unavailable_sends_battery_only() {
    let mut hub = SensorHub::new();
    for kind in crate::fixtures::REFERENCE {
        let (sensor, ctl) = fake(kind, full_reading());
        ctl.set_init_result(Some(SensorError::NotResponding));
        hub.register(sensor).unwrap();
    }
    assert!(!hub.init_all());
    assert!(!hub.is_any_available());

    let mut reading = Reading::default();
    assert!(!hub.read_all(&mut reading));
    assert_eq!(reading.ph, None);

    let mut out = Payload::new();
    assert_eq!(hub.get_payload(&mut out, &PayloadConfig { battery_percent: 42 }), Ok(1));
    assert_eq!(out.as_slice(), &[42]);
}

#[test]
fn ph_read_failure_is_sentinel_at_full_width() {
    let mut hub = SensorHub::new();
    let (ph, ph_ctl) = fake(SensorKind::Ph, full_reading());
    let (water, _) = fake(SensorKind::Ds18b20, full_reading());
    hub.register(ph).unwrap();
    hub.register(water).unwrap();
    hub.init_all();
    ph_ctl.set_read_error(Some(SensorError::AdcReadFailed));

    let mut reading = Reading::default();
    assert!(hub.read_all(&mut reading), "water temperature still read");
    assert!(reading.ph.is_some_and(f32::is_nan));
    assert!(hub.is_any_available(), "a failed read does not demote");

    let mut out = Payload::new();
    hub.encode_payload(&reading, &BATTERY_87, &mut out).unwrap();
    assert_eq!(out.len(), 5);
    assert_eq!(&out[1..3], &[0x00, 0x80]);

    let decoded = payload::decode(&out, hub.payload_fields());
    assert_eq!(decoded.data.get("ph"), Some(&None));
    assert_close(decoded.value("temperature_water_1m"), 18.0, 0.01);
}

#[test]
fn every_read_failing_still_encodes() {
    let mut hub = SensorHub::new();
    let (ph, ctl) = fake(SensorKind::Ph, full_reading());
    hub.register(ph).unwrap();
    hub.init_all();
    ctl.set_read_error(Some(SensorError::Timeout));

    let mut reading = Reading::default();
    assert!(!hub.read_all(&mut reading));
    let mut out = Payload::new();
    hub.encode_payload(&reading, &BATTERY_87, &mut out).unwrap();
    assert_eq!(out.as_slice(), &[87, 0x00, 0x80]);
}

#[test]
fn registration_order_does_not_change_the_payload() {
    let orders = [
        [SensorKind::Ph, SensorKind::Bme280, SensorKind::Ds18b20, SensorKind::Hcsr04],
        [SensorKind::Hcsr04, SensorKind::Ds18b20, SensorKind::Bme280, SensorKind::Ph],
        [SensorKind::Bme280, SensorKind::Hcsr04, SensorKind::Ph, SensorKind::Ds18b20],
    ];
    let payloads: Vec<Vec<u8>> = orders
        .iter()
        .map(|order| {
            let mut hub = SensorHub::new();
            for &kind in order {
                hub.register(fake(kind, full_reading()).0).unwrap();
            }
            hub.init_all();
            let mut out = Payload::new();
            hub.get_payload(&mut out, &BATTERY_87).unwrap();
            out.to_vec()
        })
        .collect();

    assert_eq!(payloads[0].len(), 13);
    assert_eq!(payloads[0], payloads[1]);
    assert_eq!(payloads[0], payloads[2]);
}

#[test]
fn unavailable_driver_shifts_later_fields() {
    let mut hub = SensorHub::new();
    let (ph, ph_ctl) = fake(SensorKind::Ph, full_reading());
    let (water, _) = fake(SensorKind::Ds18b20, full_reading());
    hub.register(ph).unwrap();
    hub.register(water).unwrap();
    ph_ctl.set_init_result(Some(SensorError::NotResponding));
    hub.init_all();

    let mut out = Payload::new();
    hub.get_payload(&mut out, &BATTERY_87).unwrap();
    // Water temperature moves up to offset 1.
    assert_eq!(out.as_slice(), &[87, 0x08, 0x07]);
    assert_eq!(
        hub.payload_fields(),
        FieldSet::of(&[Field::Battery, Field::TemperatureWater])
    );
}

#[test]
fn retry_recovers_only_unavailable_drivers() {
    let mut hub = SensorHub::new();
    let (ph, ph_ctl) = fake(SensorKind::Ph, full_reading());
    let (water, water_ctl) = fake(SensorKind::Ds18b20, full_reading());
    ph_ctl.script_init([Err(SensorError::NotResponding), Err(SensorError::NotResponding)]);
    hub.register(ph).unwrap();
    hub.register(water).unwrap();

    assert!(hub.init_all());
    assert_eq!(hub.payload_fields().payload_len(), 3);

    // pH still failing, water left alone.
    assert!(hub.retry_init_all());
    assert_eq!(ph_ctl.init_calls(), 2);
    assert_eq!(water_ctl.init_calls(), 1);

    // Script exhausted: pH comes up.
    hub.retry_init_all();
    assert_eq!(ph_ctl.init_calls(), 3);
    assert_eq!(water_ctl.init_calls(), 1);
    assert_eq!(hub.payload_fields().payload_len(), 5);
}

#[test]
fn unavailable_drivers_are_not_read() {
    let mut hub = SensorHub::new();
    let (ph, ctl) = fake(SensorKind::Ph, full_reading());
    ctl.set_init_result(Some(SensorError::NotResponding));
    hub.register(ph).unwrap();
    hub.init_all();

    let mut reading = full_reading();
    hub.read_all(&mut reading);
    assert_eq!(ctl.read_calls(), 0);
    assert_eq!(reading.ph, None, "stale values are cleared");
}

#[test]
fn testing_override_forces_every_driver() {
    let mut hub = SensorHub::new();
    let (ph, ctl) = fake(SensorKind::Ph, full_reading());
    ctl.set_init_result(Some(SensorError::NotResponding));
    hub.register(ph).unwrap();
    hub.register(fake(SensorKind::Hcsr04, full_reading()).0).unwrap();
    hub.init_all();

    hub.set_available_for_testing(true);
    assert_eq!(hub.payload_fields().payload_len(), 5);
    hub.set_available_for_testing(false);
    assert!(!hub.is_any_available());
    assert_eq!(hub.payload_fields(), FieldSet::EMPTY.with(Field::Battery));
}

#[test]
fn compensation_skips_sentinels() {
    let mut hub = SensorHub::new();
    let (ph, ctl) = fake(SensorKind::Ph, full_reading());
    hub.register(ph).unwrap();

    let reading = Reading {
        temperature_water: Some(SENSOR_ERROR),
        temperature_ext: Some(SENSOR_ERROR),
        ..Reading::default()
    };
    hub.apply_temperature_compensation(&reading);
    assert_eq!(ctl.compensation(), None);
}
