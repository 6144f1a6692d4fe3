//! pH driver against the simulated board: power sequencing, calibration
//! and failure handling.

use buoy::adapters::board::SimBoard;
use buoy::adapters::sim::{SimAdc, SimConsole, SimDelay, SimPin};
use buoy::config::{BuoyConfig, PhConfig};
use buoy::error::SensorError;
use buoy::sensors::ph::{CalibrationOutcome, PhSensor, TEMPERATURE_MAX_C};
use buoy::sensors::{Availability, Sensor, SensorKind};
use buoy::Reading;

type SimPh = PhSensor<SimAdc, SimPin, SimDelay, SimConsole>;

fn ph_sensor(board: &SimBoard, config: PhConfig) -> SimPh {
    PhSensor::new(
        board.ph_adc.clone(),
        board.ph_power.clone(),
        board.delay.clone(),
        board.console.clone(),
        config,
        1,
    )
}

#[test]
fn neutral_buffer_reads_ph_seven() {
    let board = SimBoard::new();
    let config = PhConfig::default();
    board.ph_adc.set_millivolts(1500.0, &config);
    let mut ph = ph_sensor(&board, config);
    ph.init().unwrap();

    let mut reading = Reading::default();
    ph.read_all(&mut reading).unwrap();
    let value = reading.ph.unwrap();
    assert!((value - 7.0).abs() < 0.02, "got {value}");
}

#[test]
fn rail_is_powered_only_while_sampling() {
    let board = SimBoard::new();
    let config = PhConfig::default();
    board.ph_adc.set_millivolts(1700.0, &config);
    let mut ph = ph_sensor(&board, config);
    ph.init().unwrap();
    assert!(!board.ph_power.is_high());

    let mut reading = Reading::default();
    ph.read_all(&mut reading).unwrap();

    assert!(!ph.is_powered());
    assert_eq!(board.ph_power.history(), vec![false, true, false]);
    assert_eq!(board.ph_adc.reads(), usize::from(config.samples));
    // The unpowered ADC reads 0, so a value near 1700 mV proves sampling
    // happened with the rail up.
    assert!(reading.ph.is_some_and(|v| v < 7.0));

    let expected_ms = u64::from(config.power_on_delay_ms)
        + u64::from(config.samples) * u64::from(config.sample_delay_ms)
        + u64::from(config.power_off_delay_ms);
    assert_eq!(board.delay.total_ms(), expected_ms);
}

#[test]
fn adc_failure_writes_sentinel_and_powers_down() {
    let board = SimBoard::new();
    let mut ph = ph_sensor(&board, PhConfig::default());
    ph.init().unwrap();
    board.ph_adc.set_error(Some(SensorError::AdcReadFailed));

    let mut reading = Reading::default();
    assert_eq!(ph.read_all(&mut reading), Err(SensorError::AdcReadFailed));
    assert!(reading.ph.is_some_and(f32::is_nan));
    assert!(!board.ph_power.is_high());
    assert!(!ph.is_powered());
    assert!(ph.is_available(), "read failures do not demote");
}

#[test]
fn power_pin_failure_at_init_makes_driver_unavailable() {
    let board = SimBoard::new();
    board.ph_power.set_fail_writes(true);
    let mut ph = ph_sensor(&board, PhConfig::default());

    assert_eq!(ph.init(), Err(SensorError::GpioWriteFailed));
    assert_eq!(ph.availability(), Availability::Unavailable);

    let mut reading = Reading::default();
    assert_eq!(ph.read_all(&mut reading), Err(SensorError::NotAvailable));
    assert!(reading.ph.is_some_and(f32::is_nan));

    board.ph_power.set_fail_writes(false);
    assert!(ph.retry_init().is_ok());
    assert!(ph.is_available());
}

#[test]
fn out_of_range_ph_is_still_reported() {
    let board = SimBoard::new();
    let config = PhConfig::default();
    board.ph_adc.set_millivolts(3200.0, &config);
    let mut ph = ph_sensor(&board, config);
    ph.init().unwrap();

    let mut reading = Reading::default();
    assert!(ph.read_all(&mut reading).is_ok());
    let value = reading.ph.unwrap();
    assert!(value.is_finite() && value < 0.0, "got {value}");
}

#[test]
fn set_temperature_ignores_implausible_values() {
    let board = SimBoard::new();
    let mut ph = ph_sensor(&board, PhConfig::default());
    assert_eq!(ph.temperature(), 25.0);

    ph.set_temperature(12.5);
    assert_eq!(ph.temperature(), 12.5);
    ph.set_temperature(TEMPERATURE_MAX_C + 1.0);
    assert_eq!(ph.temperature(), 12.5);
    ph.set_temperature(-80.0);
    assert_eq!(ph.temperature(), 12.5);
    ph.set_compensation_temperature(f32::NAN);
    assert_eq!(ph.temperature(), 12.5);
}

#[test]
fn process_serial_captures_calibration_points() {
    let board = SimBoard::new();
    let config = PhConfig::default();
    let mut ph = ph_sensor(&board, config);
    ph.init().unwrap();

    // Nothing pending.
    assert_eq!(ph.process_serial(), None);

    board.ph_adc.set_millivolts(1480.0, &config);
    board.console.queue_command();
    let outcome = ph.process_serial();
    assert!(matches!(outcome, Some(CalibrationOutcome::Neutral { .. })), "{outcome:?}");
    assert!((ph.calibration().neutral_mv - 1480.0).abs() < 1.0);
    assert!(!board.ph_power.is_high());

    board.ph_adc.set_millivolts(2020.0, &config);
    board.console.queue_command();
    assert!(matches!(ph.process_serial(), Some(CalibrationOutcome::Acid { .. })));

    board.ph_adc.set_millivolts(500.0, &config);
    board.console.queue_command();
    assert!(matches!(ph.process_serial(), Some(CalibrationOutcome::Rejected { .. })));
    assert!((ph.calibration().acid_mv - 2020.0).abs() < 1.0);
}

#[test]
fn process_serial_does_nothing_while_unavailable() {
    let board = SimBoard::new();
    let mut ph = ph_sensor(&board, PhConfig::default());
    board.console.queue_command();
    assert_eq!(ph.process_serial(), None);
    assert_eq!(board.ph_adc.reads(), 0);
}

#[test]
fn stored_calibration_is_used_from_boot() {
    let board = SimBoard::new();
    let config = PhConfig {
        neutral_mv: 1450.0,
        acid_mv: 1990.0,
        ..PhConfig::default()
    };
    board.ph_adc.set_millivolts(1450.0, &config);
    let mut ph = ph_sensor(&board, config);
    ph.init().unwrap();

    let mut reading = Reading::default();
    ph.read_all(&mut reading).unwrap();
    assert!((reading.ph.unwrap() - 7.0).abs() < 0.02);
}

#[test]
fn hub_service_pass_recalibrates_only_on_command() {
    let board = SimBoard::new();
    let cfg = BuoyConfig::default();
    board.ph_adc.set_millivolts(1480.0, &cfg.ph);
    let mut hub = board.hub(&[SensorKind::Ph], &cfg).unwrap();
    assert!(hub.init_all());

    // Nothing queued: the probe stays unpowered.
    hub.service_all();
    assert_eq!(board.ph_adc.reads(), 0);
    assert!(board.ph_power.history().iter().all(|high| !high));

    board.console.queue_command();
    hub.service_all();
    assert_eq!(board.ph_adc.reads(), 1);
    assert!(!board.ph_power.is_high());

    // 1480 mV is now the neutral point.
    let mut reading = Reading::default();
    assert!(hub.read_all(&mut reading));
    let value = reading.ph.unwrap();
    assert!((value - 7.0).abs() < 0.02, "got {value}");
}
