//! Buoy firmware library.
//!
//! Sensor abstraction and uplink payload encoding for a battery-powered
//! environmental buoy.  A build selects its drivers through `sensor-*`
//! cargo features; the hub reads whichever of them are available and
//! encodes one compact LoRaWAN uplink per poll cycle.
//!
//! ```text
//!   ports (HAL / sim) ──▶ sensors::* ──▶ SensorHub ──▶ payload::encode ──▶ radio
//!                                            │
//!                     registry ──▶ decoder (console formatter, byte map)
//! ```
//!
//! Host-only pieces (simulated hardware, the fake driver, availability
//! overrides) are guarded by `#[cfg(not(target_os = "espidf"))]`.

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod decoder;
pub mod error;
pub mod hub;
pub mod payload;
pub mod pins;
pub mod ports;
pub mod registry;
pub mod sensors;

pub use error::{Error, Result};
pub use hub::SensorHub;
pub use payload::{Field, FieldSet, Payload, PayloadConfig};
pub use sensors::reading::{Reading, SENSOR_ERROR};
pub use sensors::{Sensor, SensorKind};
