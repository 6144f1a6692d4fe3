//! Simulated hardware for host builds.
//!
//! Every sim device is a cheap `Clone` handle onto shared state: hand one
//! clone to a driver, keep another to steer the "hardware" and inspect
//! what the driver did.  Values are set in engineering units and encoded
//! the way the real chip would deliver them.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};

use crate::config::PhConfig;
use crate::error::{Error, SensorError};
use crate::ports::{
    AnalogInput, CalibrationInput, ConfigStore, DhtLine, EchoTimer, EnvironmentChip,
    EnvironmentSample, OneWireThermometer,
};
use crate::sensors::bme280::BME280_CHIP_ID;
use crate::sensors::dht::DhtModel;
use crate::sensors::ds18b20::crc8;

// ── GPIO ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinError;

impl digital::Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
struct PinState {
    high: bool,
    fail_writes: bool,
    /// Writes left before a single injected failure.
    fail_once_after: Option<usize>,
    /// Every level successfully driven, oldest first.
    history: Vec<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct SimPin(Rc<RefCell<PinState>>);

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.0.borrow().high
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.0.borrow_mut().fail_writes = fail;
    }

    /// Let `ok_writes` more writes through, fail the next one, then recover.
    pub fn fail_once_after(&self, ok_writes: usize) {
        self.0.borrow_mut().fail_once_after = Some(ok_writes);
    }

    pub fn history(&self) -> Vec<bool> {
        self.0.borrow().history.clone()
    }

    fn drive(&mut self, high: bool) -> Result<(), SimPinError> {
        let mut state = self.0.borrow_mut();
        if state.fail_writes {
            return Err(SimPinError);
        }
        match state.fail_once_after {
            Some(0) => {
                state.fail_once_after = None;
                return Err(SimPinError);
            }
            Some(n) => state.fail_once_after = Some(n - 1),
            None => {}
        }
        state.high = high;
        state.history.push(high);
        Ok(())
    }
}

impl ErrorType for SimPin {
    type Error = SimPinError;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

// ── Delay ─────────────────────────────────────────────────────

/// Records requested delays instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct SimDelay(Rc<RefCell<u64>>);

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        *self.0.borrow() / 1_000_000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.0.borrow_mut() += u64::from(ns);
    }
}

// ── ADC ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct AdcState {
    raw: u16,
    error: Option<SensorError>,
    reads: usize,
    /// Reads return 0 unless this rail is high.
    rail: Option<SimPin>,
}

#[derive(Debug, Clone, Default)]
pub struct SimAdc(Rc<RefCell<AdcState>>);

impl SimAdc {
    pub fn new() -> Self {
        Self::default()
    }

    /// An ADC whose input is only driven while `rail` is high.
    pub fn powered_by(rail: &SimPin) -> Self {
        let adc = Self::default();
        adc.0.borrow_mut().rail = Some(rail.clone());
        adc
    }

    pub fn set_raw(&self, raw: u16) {
        self.0.borrow_mut().raw = raw;
    }

    /// Set the input so a reading converts back to `mv` under `config`.
    pub fn set_millivolts(&self, mv: f32, config: &PhConfig) {
        let raw = (mv / config.reference_mv * f32::from(config.adc_resolution)).round();
        self.set_raw(raw.clamp(0.0, f32::from(u16::MAX)) as u16);
    }

    pub fn set_error(&self, error: Option<SensorError>) {
        self.0.borrow_mut().error = error;
    }

    pub fn reads(&self) -> usize {
        self.0.borrow().reads
    }
}

impl AnalogInput for SimAdc {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let mut state = self.0.borrow_mut();
        state.reads += 1;
        if let Some(e) = state.error {
            return Err(e);
        }
        let powered = state.rail.as_ref().is_none_or(SimPin::is_high);
        Ok(if powered { state.raw } else { 0 })
    }
}

// ── BME280 ────────────────────────────────────────────────────

#[derive(Debug)]
struct EnvState {
    chip_id: Result<u8, SensorError>,
    sample: EnvironmentSample,
    error: Option<SensorError>,
}

#[derive(Debug, Clone)]
pub struct SimEnvChip(Rc<RefCell<EnvState>>);

impl Default for SimEnvChip {
    fn default() -> Self {
        Self(Rc::new(RefCell::new(EnvState {
            chip_id: Ok(BME280_CHIP_ID),
            sample: EnvironmentSample {
                temperature_c: 20.0,
                humidity_pct: 60.0,
                pressure_pa: 101_325.0,
            },
            error: None,
        })))
    }
}

impl SimEnvChip {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Err` simulates a bus NACK on the id register.
    pub fn set_chip_id(&self, id: Result<u8, SensorError>) {
        self.0.borrow_mut().chip_id = id;
    }

    pub fn set_sample(&self, temperature_c: f32, humidity_pct: f32, pressure_hpa: f32) {
        self.0.borrow_mut().sample = EnvironmentSample {
            temperature_c,
            humidity_pct,
            pressure_pa: pressure_hpa * 100.0,
        };
    }

    pub fn set_error(&self, error: Option<SensorError>) {
        self.0.borrow_mut().error = error;
    }
}

impl EnvironmentChip for SimEnvChip {
    fn chip_id(&mut self) -> Result<u8, SensorError> {
        self.0.borrow().chip_id
    }

    fn measure(&mut self) -> Result<EnvironmentSample, SensorError> {
        let state = self.0.borrow();
        match state.error {
            Some(e) => Err(e),
            None => Ok(state.sample),
        }
    }
}

// ── DS18B20 ───────────────────────────────────────────────────

#[derive(Debug)]
struct OneWireState {
    present: bool,
    raw: i16,
    corrupt: bool,
    error: Option<SensorError>,
}

#[derive(Debug, Clone)]
pub struct SimOneWire(Rc<RefCell<OneWireState>>);

impl Default for SimOneWire {
    fn default() -> Self {
        Self(Rc::new(RefCell::new(OneWireState {
            present: true,
            raw: 15 * 16,
            corrupt: false,
            error: None,
        })))
    }
}

impl SimOneWire {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_present(&self, present: bool) {
        self.0.borrow_mut().present = present;
    }

    pub fn set_celsius(&self, celsius: f32) {
        self.set_raw((celsius * 16.0).round() as i16);
    }

    pub fn set_raw(&self, raw: i16) {
        self.0.borrow_mut().raw = raw;
    }

    /// Flip a bit after the CRC is computed.
    pub fn set_corrupt(&self, corrupt: bool) {
        self.0.borrow_mut().corrupt = corrupt;
    }

    pub fn set_error(&self, error: Option<SensorError>) {
        self.0.borrow_mut().error = error;
    }
}

impl OneWireThermometer for SimOneWire {
    fn reset(&mut self) -> Result<bool, SensorError> {
        Ok(self.0.borrow().present)
    }

    fn convert_and_read_scratchpad(&mut self) -> Result<[u8; 9], SensorError> {
        let state = self.0.borrow();
        if let Some(e) = state.error {
            return Err(e);
        }
        if !state.present {
            return Err(SensorError::NotResponding);
        }
        let [lo, hi] = state.raw.to_le_bytes();
        // TH/TL alarm registers and 12-bit config at their reset values.
        let mut sp = [lo, hi, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00];
        sp[8] = crc8(&sp[..8]);
        if state.corrupt {
            sp[0] ^= 0x01;
        }
        Ok(sp)
    }
}

// ── HC-SR04 echo ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SimEcho(Rc<RefCell<Option<u32>>>);

impl Default for SimEcho {
    fn default() -> Self {
        Self(Rc::new(RefCell::new(Some(5831)))) // ~1 m
    }
}

impl SimEcho {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` means no echo ever arrives.
    pub fn set_echo_us(&self, echo_us: Option<u32>) {
        *self.0.borrow_mut() = echo_us;
    }

    pub fn set_distance_cm(&self, cm: f32) {
        let us = (cm * 2.0 / 0.0343).round() as u32;
        self.set_echo_us(Some(us));
    }
}

impl EchoTimer for SimEcho {
    fn echo_width_us(&mut self, timeout_us: u32) -> Result<u32, SensorError> {
        match *self.0.borrow() {
            Some(us) if us <= timeout_us => Ok(us),
            _ => Err(SensorError::Timeout),
        }
    }
}

// ── DHT ───────────────────────────────────────────────────────

#[derive(Debug)]
struct DhtState {
    model: DhtModel,
    temperature_c: f32,
    humidity_pct: f32,
    bad_checksum: bool,
    error: Option<SensorError>,
}

#[derive(Debug, Clone)]
pub struct SimDhtLine(Rc<RefCell<DhtState>>);

impl SimDhtLine {
    pub fn new(model: DhtModel) -> Self {
        Self(Rc::new(RefCell::new(DhtState {
            model,
            temperature_c: 20.0,
            humidity_pct: 55.0,
            bad_checksum: false,
            error: None,
        })))
    }

    pub fn set_values(&self, temperature_c: f32, humidity_pct: f32) {
        let mut state = self.0.borrow_mut();
        state.temperature_c = temperature_c;
        state.humidity_pct = humidity_pct;
    }

    pub fn set_bad_checksum(&self, bad: bool) {
        self.0.borrow_mut().bad_checksum = bad;
    }

    pub fn set_error(&self, error: Option<SensorError>) {
        self.0.borrow_mut().error = error;
    }
}

fn dht_data(model: DhtModel, temperature_c: f32, humidity_pct: f32) -> [u8; 4] {
    let negative = temperature_c < 0.0;
    let t = temperature_c.abs();
    match model {
        DhtModel::Dht22 => {
            let [h_hi, h_lo] = ((humidity_pct * 10.0).round() as u16).to_be_bytes();
            let mut raw_t = (t * 10.0).round() as u16 & 0x7FFF;
            if negative {
                raw_t |= 0x8000;
            }
            let [t_hi, t_lo] = raw_t.to_be_bytes();
            [h_hi, h_lo, t_hi, t_lo]
        }
        DhtModel::Dht11 => {
            let h_int = humidity_pct.trunc();
            let t_int = t.trunc();
            let h_dec = ((humidity_pct - h_int) * 10.0).round() as u8;
            let mut t_dec = ((t - t_int) * 10.0).round() as u8 & 0x7F;
            if negative {
                t_dec |= 0x80;
            }
            [h_int as u8, h_dec, t_int as u8, t_dec]
        }
    }
}

impl DhtLine for SimDhtLine {
    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        let state = self.0.borrow();
        if let Some(e) = state.error {
            return Err(e);
        }
        let d = dht_data(state.model, state.temperature_c, state.humidity_pct);
        let mut sum = d.iter().fold(0u8, |a, b| a.wrapping_add(*b));
        if state.bad_checksum {
            sum = sum.wrapping_add(1);
        }
        Ok([d[0], d[1], d[2], d[3], sum])
    }
}

// ── Calibration console ───────────────────────────────────────

/// Counts queued operator commands.
#[derive(Debug, Clone, Default)]
pub struct SimConsole(Rc<RefCell<u32>>);

impl SimConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_command(&self) {
        *self.0.borrow_mut() += 1;
    }
}

impl CalibrationInput for SimConsole {
    fn pending(&mut self) -> bool {
        let mut queued = self.0.borrow_mut();
        if *queued == 0 {
            return false;
        }
        *queued -= 1;
        true
    }
}

// ── Config store ──────────────────────────────────────────────

/// In-memory stand-in for the NVS config blob.
#[derive(Debug, Clone, Default)]
pub struct SimConfigStore {
    blob: Rc<RefCell<Option<Vec<u8>>>>,
    fail_writes: Rc<RefCell<bool>>,
}

impl SimConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_blob(&self, blob: Option<Vec<u8>>) {
        *self.blob.borrow_mut() = blob;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.borrow_mut() = fail;
    }
}

impl ConfigStore for SimConfigStore {
    fn load_blob(&mut self) -> Option<Vec<u8>> {
        self.blob.borrow().clone()
    }

    fn save_blob(&mut self, blob: &[u8]) -> Result<(), Error> {
        if *self.fail_writes.borrow() {
            return Err(Error::Config("config store write failed"));
        }
        *self.blob.borrow_mut() = Some(blob.to_vec());
        Ok(())
    }
}
