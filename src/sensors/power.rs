//! Switched sensor power rail.
//!
//! Analog probes share a rail that must only be energised while sampling:
//! left on, it drains the battery and accelerates probe electrode wear.
//! [`PowerRail::energize`] returns a guard; the rail is switched off and
//! allowed to discharge when the guard drops, on every exit path.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::error::SensorError;

pub struct PowerRail<P> {
    pin: P,
    energized: bool,
    label: &'static str,
}

impl<P: OutputPin> PowerRail<P> {
    pub fn new(pin: P, label: &'static str) -> Self {
        Self {
            pin,
            energized: false,
            label,
        }
    }

    pub fn is_energized(&self) -> bool {
        self.energized
    }

    /// Drive the rail low without the discharge delay.  Used once at init.
    pub fn force_off(&mut self) -> Result<(), SensorError> {
        self.pin.set_low().map_err(|_| SensorError::GpioWriteFailed)?;
        self.energized = false;
        Ok(())
    }

    /// Switch the rail on and wait `settle_ms` for the probe to stabilise.
    pub fn energize<'a, D: DelayNs>(
        &'a mut self,
        delay: &'a mut D,
        settle_ms: u32,
        discharge_ms: u32,
    ) -> Result<PoweredScope<'a, P, D>, SensorError> {
        if !self.energized {
            if self.pin.set_high().is_err() {
                // A half-driven rail is still a drain; try to park it low.
                let _ = self.pin.set_low();
                return Err(SensorError::GpioWriteFailed);
            }
            self.energized = true;
            info!("{}: sensor power on, settling {} ms", self.label, settle_ms);
            delay.delay_ms(settle_ms);
        }
        Ok(PoweredScope {
            rail: self,
            delay,
            discharge_ms,
        })
    }
}

/// Live power scope.  Sampling code delays through it so it can keep
/// holding the shared delay provider.
pub struct PoweredScope<'a, P: OutputPin, D: DelayNs> {
    rail: &'a mut PowerRail<P>,
    delay: &'a mut D,
    discharge_ms: u32,
}

impl<P: OutputPin, D: DelayNs> PoweredScope<'_, P, D> {
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

impl<P: OutputPin, D: DelayNs> Drop for PoweredScope<'_, P, D> {
    fn drop(&mut self) {
        if self.rail.pin.set_low().is_err() {
            warn!("{}: failed to switch sensor power off", self.rail.label);
        }
        self.rail.energized = false;
        info!("{}: sensor power off", self.rail.label);
        self.delay.delay_ms(self.discharge_ms);
    }
}
