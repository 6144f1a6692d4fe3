//! Unified error types for the buoy firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! main loop's error handling uniform.  All variants are `Copy` so they can
//! be passed through the hub and logged without allocation.
//!
//! Note the split the drivers rely on: [`SensorError`] only ever describes a
//! *communication* failure.  An implausible value is a data-quality warning
//! and is logged, never returned as an error.

use core::fmt;

use crate::payload::Field;
use crate::sensors::SensorKind;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be initialised or read.
    Sensor(SensorError),
    /// The payload could not be encoded.
    Payload(PayloadError),
    /// A driver could not be added to the hub.
    Registry(RegistryError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Payload(e) => write!(f, "payload: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Communication failures.  Returning one of these marks the reading as the
/// error sentinel for this cycle; during `init()` it makes the driver
/// `Unavailable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The device did not answer (no presence pulse, NACK, no echo ever).
    NotResponding,
    /// A transfer started but did not complete in time.
    Timeout,
    /// ADC conversion failed.
    AdcReadFailed,
    /// Driving a control or power pin failed.
    GpioWriteFailed,
    /// Frame or scratchpad integrity check failed.
    ChecksumMismatch,
    /// The device at the configured address is not the expected chip.
    UnexpectedChipId(u8),
    /// The device answered with its power-on reset value.
    PowerNotSettled,
    /// Operation attempted on a driver that is not available.
    NotAvailable,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotResponding => write!(f, "device not responding"),
            Self::Timeout => write!(f, "transfer timed out"),
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::UnexpectedChipId(id) => write!(f, "unexpected chip id 0x{id:02X}"),
            Self::PowerNotSettled => write!(f, "power not settled"),
            Self::NotAvailable => write!(f, "sensor not available"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Payload errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// The output buffer cannot hold the next field.
    BufferFull { field: Field, capacity: usize },
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferFull { field, capacity } => {
                write!(f, "no room for {} in {capacity}-byte buffer", field.spec().key)
            }
        }
    }
}

impl From<PayloadError> for Error {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// A driver of this kind is already registered.
    DuplicateSensor(SensorKind),
    /// Two drivers would own the same payload field.
    FieldConflict { existing: SensorKind, incoming: SensorKind },
    /// The hub is full.
    Full,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSensor(kind) => write!(f, "{} registered twice", kind.name()),
            Self::FieldConflict { existing, incoming } => write!(
                f,
                "{} overlaps fields already owned by {}",
                incoming.name(),
                existing.name()
            ),
            Self::Full => write!(f, "sensor hub full"),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
