//! BME280, DS18B20, HC-SR04 and DHT drivers against simulated chips, and a
//! full reference board through the hub.

use buoy::adapters::board::SimBoard;
use buoy::error::SensorError;
use buoy::payload::{self, Payload, PayloadConfig};
use buoy::sensors::bme280::BMP280_CHIP_ID;
use buoy::sensors::{Availability, Sensor, SensorKind};
use buoy::Reading;

use crate::fixtures::{REFERENCE, assert_close, config};

#[test]
fn bme280_reads_three_fields_in_hpa() {
    let board = SimBoard::new();
    board.env.set_sample(-2.5, 81.0, 998.4);
    let mut bme = board.driver(SensorKind::Bme280, &config());
    bme.init().unwrap();

    let mut reading = Reading::default();
    bme.read_all(&mut reading).unwrap();
    assert_eq!(reading.temperature_ext, Some(-2.5));
    assert_eq!(reading.humidity, Some(81.0));
    assert!((reading.pressure.unwrap() - 998.4).abs() < 0.01);
    assert_eq!(reading.ph, None);
}

#[test]
fn bme280_rejects_a_bmp280() {
    let board = SimBoard::new();
    board.env.set_chip_id(Ok(BMP280_CHIP_ID));
    let mut bme = board.driver(SensorKind::Bme280, &config());
    assert_eq!(bme.init(), Err(SensorError::UnexpectedChipId(BMP280_CHIP_ID)));
    assert_eq!(bme.availability(), Availability::Unavailable);
}

#[test]
fn bme280_bus_failure_fills_all_three_fields_with_sentinels() {
    let board = SimBoard::new();
    let mut bme = board.driver(SensorKind::Bme280, &config());
    bme.init().unwrap();
    board.env.set_error(Some(SensorError::Timeout));

    let mut reading = Reading::default();
    assert_eq!(bme.read_all(&mut reading), Err(SensorError::Timeout));
    for v in [reading.temperature_ext, reading.humidity, reading.pressure] {
        assert!(v.is_some_and(f32::is_nan));
    }
}

#[test]
fn ds18b20_needs_a_presence_pulse() {
    let board = SimBoard::new();
    board.one_wire.set_present(false);
    let mut ds = board.driver(SensorKind::Ds18b20, &config());
    assert_eq!(ds.init(), Err(SensorError::NotResponding));

    board.one_wire.set_present(true);
    assert!(ds.retry_init().is_ok());
    board.one_wire.set_celsius(-1.25);
    let mut reading = Reading::default();
    ds.read_all(&mut reading).unwrap();
    assert_eq!(reading.temperature_water, Some(-1.25));
}

#[test]
fn ds18b20_power_on_value_and_bad_crc_are_failures() {
    let board = SimBoard::new();
    let mut ds = board.driver(SensorKind::Ds18b20, &config());
    ds.init().unwrap();
    let mut reading = Reading::default();

    board.one_wire.set_raw(0x0550);
    assert_eq!(ds.read_all(&mut reading), Err(SensorError::PowerNotSettled));
    assert!(reading.temperature_water.is_some_and(f32::is_nan));

    board.one_wire.set_celsius(12.0);
    board.one_wire.set_corrupt(true);
    assert_eq!(ds.read_all(&mut reading), Err(SensorError::ChecksumMismatch));
}

#[test]
fn hcsr04_averages_pings_and_times_out() {
    let board = SimBoard::new();
    board.echo.set_distance_cm(250.0);
    let mut sonar = board.driver(SensorKind::Hcsr04, &config());
    sonar.init().unwrap();

    let mut reading = Reading::default();
    sonar.read_all(&mut reading).unwrap();
    assert!((reading.distance_cm.unwrap() - 250.0).abs() < 0.1);
    // Each ping is a low-high-low trigger pulse.
    assert_eq!(&board.trigger.history()[..3], &[false, true, false]);

    board.echo.set_echo_us(None);
    assert_eq!(sonar.read_all(&mut reading), Err(SensorError::Timeout));
    assert!(reading.distance_cm.is_some_and(f32::is_nan));
}

#[test]
fn dht_models_decode_and_reject_bad_frames() {
    let board = SimBoard::new();
    board.dht22.set_values(-4.2, 88.1);
    board.dht11.set_values(24.0, 40.0);

    let mut dht22 = board.driver(SensorKind::Dht22, &config());
    let mut dht11 = board.driver(SensorKind::Dht11, &config());
    dht22.init().unwrap();
    dht11.init().unwrap();

    let mut reading = Reading::default();
    dht22.read_all(&mut reading).unwrap();
    assert!((reading.temperature_ext.unwrap() + 4.2).abs() < 0.01);
    assert!((reading.humidity.unwrap() - 88.1).abs() < 0.01);

    dht11.read_all(&mut reading).unwrap();
    assert_eq!(reading.temperature_ext, Some(24.0));

    board.dht11.set_bad_checksum(true);
    assert_eq!(dht11.read_all(&mut reading), Err(SensorError::ChecksumMismatch));
    assert!(reading.humidity.is_some_and(f32::is_nan));
}

#[test]
fn placeholder_driver_is_always_available_and_owns_nothing() {
    let board = SimBoard::new();
    let mut hub = board.hub(&[SensorKind::None], &config()).unwrap();
    assert!(hub.init_all());
    assert_eq!(hub.names(), "NONE");

    let mut reading = Reading::default();
    assert!(!hub.read_all(&mut reading), "nothing was measured");
    assert_eq!(reading, Reading::default());

    let mut out = Payload::new();
    assert_eq!(hub.get_payload(&mut out, &PayloadConfig { battery_percent: 3 }), Ok(1));
    assert_eq!(out.as_slice(), &[3]);
}

#[test]
fn reference_board_end_to_end() {
    let cfg = config();
    let board = SimBoard::new();
    board.ph_adc.set_millivolts(1500.0, &cfg.ph);
    board.env.set_sample(21.35, 64.5, 1013.2);
    board.one_wire.set_celsius(18.0);

    let mut hub = board.hub(&REFERENCE, &cfg).unwrap();
    assert_eq!(hub.names(), "DFRobot pH+BME280+DS18B20");
    assert!(hub.init_all());

    let mut reading = Reading::default();
    assert!(hub.read_all(&mut reading));
    hub.apply_temperature_compensation(&reading);

    let mut out = Payload::new();
    let len = hub
        .encode_payload(&reading, &PayloadConfig { battery_percent: 87 }, &mut out)
        .unwrap();
    assert_eq!(len, 11);

    let decoded = payload::decode(&out, hub.payload_fields());
    assert!(decoded.warnings.is_empty());
    assert_close(decoded.value("ph"), 7.0, 0.02);
    assert_close(decoded.value("temperature_ext"), 21.35, 0.01);
    assert_close(decoded.value("temperature_water_1m"), 18.0, 0.01);
    assert_close(decoded.value("humidity"), 64.5, 0.01);
    assert_close(decoded.value("pressure"), 1013.2, 0.1);
    assert!(!board.ph_power.is_high());
}

#[test]
fn board_rejects_conflicting_kinds() {
    let board = SimBoard::new();
    assert!(board.hub(&[SensorKind::Bme280, SensorKind::Dht11], &config()).is_err());
}

#[test]
fn drivers_do_not_touch_hardware_before_init() {
    let board = SimBoard::new();
    let cfg = config();
    for kind in [SensorKind::Bme280, SensorKind::Ds18b20, SensorKind::Hcsr04, SensorKind::Dht22] {
        let mut sensor = board.driver(kind, &cfg);
        let mut reading = Reading::default();
        assert_eq!(sensor.read_all(&mut reading), Err(SensorError::NotAvailable), "{kind:?}");
        for field in kind.fields().iter() {
            assert!(reading.get(field.field).is_some_and(f32::is_nan), "{kind:?}");
        }
    }
    assert!(board.trigger.history().is_empty());
}

#[test]
fn hcsr04_releases_trigger_when_the_pulse_end_fails() {
    let board = SimBoard::new();
    let mut sonar = board.driver(SensorKind::Hcsr04, &config());
    sonar.init().unwrap();

    // Low, high, then the falling edge fails once.
    board.trigger.fail_once_after(2);
    let mut reading = Reading::default();
    assert_eq!(sonar.read_all(&mut reading), Err(SensorError::GpioWriteFailed));
    assert!(!board.trigger.is_high());
    assert_eq!(board.trigger.history().last(), Some(&false));
}
