//! DFRobot analog pH probe (SEN0161 / SEN0169 family).
//!
//! The probe amplifier sits on the switched sensor rail.  Every read powers
//! the rail, lets it settle, averages a burst of ADC samples and powers it
//! down again.  The averaged voltage goes through a two-point calibration
//! (pH 7.0 and pH 4.0 buffers) to give pH.
//!
//! Out-of-range pH is a data-quality warning only: the probe drifts as the
//! electrode ages and the raw value is still worth sending.
//!
//! Calibration is operator driven.  [`PhSensor::process_serial`] is polled
//! from the main loop; when the console has pending input it takes one
//! quick sample and hands it to the calibration routine.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use super::power::{PowerRail, PoweredScope};
use super::reading::{Reading, SENSOR_ERROR};
use super::{Availability, AvailabilityState, Sensor, SensorKind};
use crate::config::PhConfig;
use crate::error::SensorError;
use crate::ports::{AnalogInput, CalibrationInput};

/// Accepted range for the compensation temperature, °C.
pub const TEMPERATURE_MIN_C: f32 = -50.0;
pub const TEMPERATURE_MAX_C: f32 = 100.0;

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// Buffer point a calibration sample was accepted as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationOutcome {
    /// Stored as the pH 7.0 point.
    Neutral { voltage_mv: f32 },
    /// Stored as the pH 4.0 point.
    Acid { voltage_mv: f32 },
    /// Voltage matched neither buffer window; nothing stored.
    Rejected { voltage_mv: f32 },
}

/// Voltage → pH conversion and capture of new calibration points.
pub trait PhCalibration {
    fn ph_from_voltage(&self, voltage_mv: f32, temperature_c: f32) -> f32;

    fn calibrate(&mut self, voltage_mv: f32, temperature_c: f32) -> CalibrationOutcome;
}

/// Linear two-point calibration with the probe's factory defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPointCalibration {
    /// Probe output in the pH 7.0 buffer, mV.
    pub neutral_mv: f32,
    /// Probe output in the pH 4.0 buffer, mV.
    pub acid_mv: f32,
}

impl Default for TwoPointCalibration {
    fn default() -> Self {
        Self {
            neutral_mv: 1500.0,
            acid_mv: 2032.44,
        }
    }
}

impl TwoPointCalibration {
    const NEUTRAL_WINDOW_MV: (f32, f32) = (1322.0, 1678.0);
    const ACID_WINDOW_MV: (f32, f32) = (1854.0, 2210.0);
}

impl PhCalibration for TwoPointCalibration {
    // The amplifier output is already temperature-stable over the buoy's
    // operating range; the input is kept for chips that need it.
    fn ph_from_voltage(&self, voltage_mv: f32, _temperature_c: f32) -> f32 {
        let neutral = (self.neutral_mv - 1500.0) / 3.0;
        let acid = (self.acid_mv - 1500.0) / 3.0;
        let slope = (7.0 - 4.0) / (neutral - acid);
        let intercept = 7.0 - slope * neutral;
        slope * (voltage_mv - 1500.0) / 3.0 + intercept
    }

    fn calibrate(&mut self, voltage_mv: f32, temperature_c: f32) -> CalibrationOutcome {
        let within = |(lo, hi): (f32, f32)| voltage_mv > lo && voltage_mv < hi;
        if within(Self::NEUTRAL_WINDOW_MV) {
            self.neutral_mv = voltage_mv;
            info!("pH: pH 7.0 point captured at {:.1} mV ({:.1} C)", voltage_mv, temperature_c);
            CalibrationOutcome::Neutral { voltage_mv }
        } else if within(Self::ACID_WINDOW_MV) {
            self.acid_mv = voltage_mv;
            info!("pH: pH 4.0 point captured at {:.1} mV ({:.1} C)", voltage_mv, temperature_c);
            CalibrationOutcome::Acid { voltage_mv }
        } else {
            warn!("pH: {:.1} mV matches no calibration buffer, ignored", voltage_mv);
            CalibrationOutcome::Rejected { voltage_mv }
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct PhSensor<A, P, D, S, C = TwoPointCalibration> {
    adc: A,
    power: PowerRail<P>,
    delay: D,
    console: S,
    calibration: C,
    config: PhConfig,
    availability: AvailabilityState,
    temperature_c: f32,
    adc_gpio: i32,
}

impl<A, P, D, S> PhSensor<A, P, D, S, TwoPointCalibration>
where
    A: AnalogInput,
    P: OutputPin,
    D: DelayNs,
    S: CalibrationInput,
{
    pub fn new(adc: A, power_pin: P, delay: D, console: S, config: PhConfig, adc_gpio: i32) -> Self {
        let calibration = TwoPointCalibration {
            neutral_mv: config.neutral_mv,
            acid_mv: config.acid_mv,
        };
        Self::with_calibration(
            adc,
            power_pin,
            delay,
            console,
            calibration,
            config,
            adc_gpio,
        )
    }
}

impl<A, P, D, S, C> PhSensor<A, P, D, S, C>
where
    A: AnalogInput,
    P: OutputPin,
    D: DelayNs,
    S: CalibrationInput,
    C: PhCalibration,
{
    pub fn with_calibration(
        adc: A,
        power_pin: P,
        delay: D,
        console: S,
        calibration: C,
        config: PhConfig,
        adc_gpio: i32,
    ) -> Self {
        let temperature_c = config.default_temperature_c;
        Self {
            adc,
            power: PowerRail::new(power_pin, "pH"),
            delay,
            console,
            calibration,
            config,
            availability: AvailabilityState::new(),
            temperature_c,
            adc_gpio,
        }
    }

    /// Update the compensation temperature.  Values outside
    /// [`TEMPERATURE_MIN_C`]..=[`TEMPERATURE_MAX_C`] are ignored.
    pub fn set_temperature(&mut self, celsius: f32) {
        if (TEMPERATURE_MIN_C..=TEMPERATURE_MAX_C).contains(&celsius) {
            self.temperature_c = celsius;
            debug!("pH: compensation temperature {:.2} C", celsius);
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature_c
    }

    pub fn is_powered(&self) -> bool {
        self.power.is_energized()
    }

    pub fn calibration(&self) -> &C {
        &self.calibration
    }

    /// Poll the calibration console.  Call at a steady cadence from the main
    /// loop; does nothing unless input is pending.
    pub fn process_serial(&mut self) -> Option<CalibrationOutcome> {
        if !self.availability.is_available() || !self.console.pending() {
            return None;
        }

        let scope = match self.power.energize(
            &mut self.delay,
            self.config.power_on_delay_ms,
            self.config.power_off_delay_ms,
        ) {
            Ok(scope) => scope,
            Err(e) => {
                warn!("pH: calibration skipped: {}", e);
                return None;
            }
        };
        let raw = self.adc.read_raw();
        drop(scope);

        match raw {
            Ok(raw) => {
                let voltage = self.config.raw_to_millivolts(f32::from(raw));
                Some(self.calibration.calibrate(voltage, self.temperature_c))
            }
            Err(e) => {
                warn!("pH: calibration sample failed: {}", e);
                None
            }
        }
    }

    /// Averaged probe voltage in mV.
    fn read_voltage(&mut self) -> Result<f32, SensorError> {
        let mut scope = self.power.energize(
            &mut self.delay,
            self.config.power_on_delay_ms,
            self.config.power_off_delay_ms,
        )?;
        let average = sample_average(
            &mut self.adc,
            &mut scope,
            self.config.samples,
            self.config.sample_delay_ms,
        )?;
        drop(scope);

        let voltage = self.config.raw_to_millivolts(average);
        debug!("pH: ADC average {:.1}, {:.1} mV", average, voltage);
        Ok(voltage)
    }
}

fn sample_average<A: AnalogInput, P: OutputPin, D: DelayNs>(
    adc: &mut A,
    scope: &mut PoweredScope<'_, P, D>,
    samples: u8,
    sample_delay_ms: u32,
) -> Result<f32, SensorError> {
    let samples = samples.max(1);
    let mut sum: u32 = 0;
    for _ in 0..samples {
        sum += u32::from(adc.read_raw()?);
        scope.delay_ms(sample_delay_ms);
    }
    Ok(sum as f32 / f32::from(samples))
}

impl<A, P, D, S, C> Sensor for PhSensor<A, P, D, S, C>
where
    A: AnalogInput,
    P: OutputPin,
    D: DelayNs,
    S: CalibrationInput,
    C: PhCalibration,
{
    fn kind(&self) -> SensorKind {
        SensorKind::Ph
    }

    fn availability(&self) -> Availability {
        self.availability.get()
    }

    fn init(&mut self) -> Result<(), SensorError> {
        let name = self.name();
        info!("pH: init, ADC on GPIO{}", self.adc_gpio);
        let outcome = self.power.force_off();
        self.availability.record_init(name, outcome)
    }

    fn read_all(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        if let Err(e) = self.availability.ensure_available() {
            reading.ph = Some(SENSOR_ERROR);
            return Err(e);
        }

        let voltage = match self.read_voltage() {
            Ok(v) => v,
            Err(e) => {
                reading.ph = Some(SENSOR_ERROR);
                return Err(e);
            }
        };

        let ph = self.calibration.ph_from_voltage(voltage, self.temperature_c);
        if !(self.config.ph_min..=self.config.ph_max).contains(&ph) {
            warn!("pH: reading out of range: {:.2}", ph);
        }
        info!("pH: {:.2}", ph);
        reading.ph = Some(ph);
        Ok(())
    }

    fn set_compensation_temperature(&mut self, celsius: f32) {
        self.set_temperature(celsius);
    }

    fn service(&mut self) {
        if let Some(outcome) = self.process_serial() {
            debug!("pH: calibration {:?}", outcome);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_available_for_testing(&mut self, available: bool) {
        let name = self.name();
        self.availability.force(name, available);
    }
}
