//! HC-SR04 ultrasonic ranger: distance from the hull to the surface below.
//!
//! A 10 µs trigger pulse starts a ping; the echo pin stays high for the
//! round-trip time.  Several pings are averaged.  A ping without an echo is
//! a communication failure, a distance outside the ranger's spec is only a
//! warning.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use super::reading::Reading;
use super::{Availability, AvailabilityState, Sensor, SensorKind};
use crate::config::DistanceConfig;
use crate::error::SensorError;
use crate::ports::EchoTimer;

/// Speed of sound at ~20 °C, cm/µs.
const SPEED_OF_SOUND_CM_PER_US: f32 = 0.0343;

/// Round-trip echo width to one-way distance.
pub fn echo_to_cm(echo_us: u32) -> f32 {
    echo_us as f32 * SPEED_OF_SOUND_CM_PER_US / 2.0
}

pub struct Hcsr04Sensor<T, E, D> {
    trigger: T,
    echo: E,
    delay: D,
    config: DistanceConfig,
    availability: AvailabilityState,
}

impl<T: OutputPin, E: EchoTimer, D: DelayNs> Hcsr04Sensor<T, E, D> {
    pub fn new(trigger: T, echo: E, delay: D, config: DistanceConfig) -> Self {
        Self {
            trigger,
            echo,
            delay,
            config,
            availability: AvailabilityState::new(),
        }
    }

    fn ping(&mut self) -> Result<u32, SensorError> {
        let gpio = |_| SensorError::GpioWriteFailed;
        self.trigger.set_low().map_err(gpio)?;
        self.delay.delay_us(2);
        self.trigger.set_high().map_err(gpio)?;
        self.delay.delay_us(10);
        if self.trigger.set_low().is_err() {
            // Never leave the trigger held high.
            let _ = self.trigger.set_low();
            return Err(SensorError::GpioWriteFailed);
        }
        self.echo.echo_width_us(self.config.echo_timeout_us)
    }

    fn measure_cm(&mut self) -> Result<f32, SensorError> {
        let samples = self.config.samples.max(1);
        let mut total = 0.0;
        for i in 0..samples {
            let echo_us = self.ping()?;
            debug!("HC-SR04: ping {} echo {} us", i, echo_us);
            total += echo_to_cm(echo_us);
            self.delay.delay_ms(self.config.ping_interval_ms);
        }
        Ok(total / f32::from(samples))
    }
}

impl<T: OutputPin, E: EchoTimer, D: DelayNs> Sensor for Hcsr04Sensor<T, E, D> {
    fn kind(&self) -> SensorKind {
        SensorKind::Hcsr04
    }

    fn availability(&self) -> Availability {
        self.availability.get()
    }

    fn init(&mut self) -> Result<(), SensorError> {
        let name = self.name();
        let outcome = self.ping().map(|_| ());
        self.availability.record_init(name, outcome)
    }

    fn read_all(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        if let Err(e) = self.availability.ensure_available() {
            reading.mark_failed(self.fields());
            return Err(e);
        }
        match self.measure_cm() {
            Ok(cm) => {
                if !(self.config.min_cm..=self.config.max_cm).contains(&cm) {
                    warn!("HC-SR04: distance out of range: {:.1} cm", cm);
                }
                info!("HC-SR04: {:.1} cm", cm);
                reading.distance_cm = Some(cm);
                Ok(())
            }
            Err(e) => {
                reading.mark_failed(self.fields());
                Err(e)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_available_for_testing(&mut self, available: bool) {
        let name = self.name();
        self.availability.force(name, available);
    }
}
