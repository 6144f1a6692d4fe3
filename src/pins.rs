//! GPIO / peripheral pin assignments for the buoy sensor board.
//!
//! Single source of truth: drivers and the board bring-up reference this
//! module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// pH probe (DFRobot analog amplifier)
// ---------------------------------------------------------------------------

/// Probe amplifier output.  ADC1 channel (GPIO 1 on ESP32-S3).
pub const PH_ANALOG_GPIO: i32 = 1;
/// Digital output: switched sensor rail, HIGH = probe powered.
pub const PH_POWER_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// One-wire bus (DS18B20 water temperature, 4.7 kΩ pull-up)
// ---------------------------------------------------------------------------

pub const ONE_WIRE_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// I²C bus (BME280)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// SDO tied low.  0x77 when tied high.
pub const BME280_I2C_ADDR: u8 = 0x76;

// ---------------------------------------------------------------------------
// HC-SR04 ultrasonic ranger
// ---------------------------------------------------------------------------

pub const HCSR04_TRIGGER_GPIO: i32 = 5;
/// Echo is 5 V; level-shifted to 3.3 V on the board.
pub const HCSR04_ECHO_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// DHT22 / DHT11 single-wire
// ---------------------------------------------------------------------------

pub const DHT_GPIO: i32 = 7;
