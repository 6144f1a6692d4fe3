//! Uplink payload encoder and its Rust decoder mirror.
//!
//! Wire format (little-endian, fields of absent sensors omitted):
//! ```text
//! ┌─────────┬──────┬──────────┬────────────┬──────────┬──────────┬──────────┐
//! │ battery │  pH  │ temp ext │ temp water │ humidity │ pressure │ distance │
//! │ u8  %   │ ×100 │   ×100   │    ×100    │   ×100   │   ×10    │   ×10    │
//! │ 1 B     │ 2 B  │   2 B    │    2 B     │   2 B    │   2 B    │   2 B    │
//! └─────────┴──────┴──────────┴────────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Order is fixed by field, never by driver or registration order.  A field
//! whose owner is missing or unavailable contributes zero bytes, so every
//! later offset shifts; decoders must walk [`FIELD_TABLE`] with the same
//! presence set rather than use absolute offsets.
//!
//! Two-byte fields are two's-complement `i16`.  Raw `0x8000` is reserved
//! for [`SENSOR_ERROR`](crate::sensors::reading::SENSOR_ERROR).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::PayloadError;
use crate::sensors::reading::Reading;

/// Battery byte plus six two-byte sensor fields.
pub const MAX_PAYLOAD_LEN: usize = 13;

/// Raw value transmitted for a failed read.
pub const SENTINEL_RAW: i16 = i16::MIN;

/// Encoded uplink, sized for the largest possible sensor set.
pub type Payload = heapless::Vec<u8, MAX_PAYLOAD_LEN>;

// ---------------------------------------------------------------------------
// Field table
// ---------------------------------------------------------------------------

/// Every field the payload can carry, in canonical wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Field {
    Battery = 0,
    Ph = 1,
    TemperatureExt = 2,
    TemperatureWater = 3,
    Humidity = 4,
    Pressure = 5,
    Distance = 6,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Battery,
        Field::Ph,
        Field::TemperatureExt,
        Field::TemperatureWater,
        Field::Humidity,
        Field::Pressure,
        Field::Distance,
    ];

    /// Single-bit mask used by [`FieldSet`].
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }

    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_TABLE[self as usize]
    }
}

/// How one field is laid out on the wire and named downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub field: Field,
    /// Key used in the decoded uplink object.
    pub key: &'static str,
    /// Human-readable description for the layout report.
    pub label: &'static str,
    /// Width in bytes (1 = unsigned byte, 2 = LE i16).
    pub width: usize,
    /// Multiplier applied before rounding to the raw integer.
    pub scale: f32,
}

/// The single source of truth for both the encoder and every decoder
/// mirror.  Indexed by `Field as usize`.
pub static FIELD_TABLE: [FieldSpec; 7] = [
    FieldSpec {
        field: Field::Battery,
        key: "battery_percent",
        label: "Battery (%)",
        width: 1,
        scale: 1.0,
    },
    FieldSpec {
        field: Field::Ph,
        key: "ph",
        label: "pH (x100)",
        width: 2,
        scale: 100.0,
    },
    FieldSpec {
        field: Field::TemperatureExt,
        key: "temperature_ext",
        label: "External temperature (\u{00b0}C x100)",
        width: 2,
        scale: 100.0,
    },
    FieldSpec {
        field: Field::TemperatureWater,
        key: "temperature_water_1m",
        label: "Water temperature 1m (\u{00b0}C x100)",
        width: 2,
        scale: 100.0,
    },
    FieldSpec {
        field: Field::Humidity,
        key: "humidity",
        label: "Humidity (%RH x100)",
        width: 2,
        scale: 100.0,
    },
    FieldSpec {
        field: Field::Pressure,
        key: "pressure",
        label: "Pressure (hPa x10)",
        width: 2,
        scale: 10.0,
    },
    FieldSpec {
        field: Field::Distance,
        key: "distance_cm",
        label: "Distance (cm x10)",
        width: 2,
        scale: 10.0,
    },
];

// ---------------------------------------------------------------------------
// FieldSet
// ---------------------------------------------------------------------------

/// Bitmask of fields present in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FieldSet(u8);

impl FieldSet {
    pub const EMPTY: FieldSet = FieldSet(0);
    pub const ALL: FieldSet = FieldSet(0b0111_1111);

    pub const fn from_bits(bits: u8) -> Self {
        FieldSet(bits & Self::ALL.0)
    }

    pub const fn of(fields: &[Field]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < fields.len() {
            bits |= fields[i].mask();
            i += 1;
        }
        FieldSet(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, field: Field) -> bool {
        self.0 & field.mask() != 0
    }

    pub const fn with(self, field: Field) -> Self {
        FieldSet(self.0 | field.mask())
    }

    pub const fn union(self, other: FieldSet) -> Self {
        FieldSet(self.0 | other.0)
    }

    pub const fn intersects(self, other: FieldSet) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Present fields in canonical wire order.
    pub fn iter(self) -> impl Iterator<Item = &'static FieldSpec> {
        FIELD_TABLE.iter().filter(move |s| self.contains(s.field))
    }

    /// Total encoded width of the present fields.
    pub fn payload_len(self) -> usize {
        self.iter().map(|s| s.width).sum()
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Caller-supplied values that are not produced by any sensor driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayloadConfig {
    /// Battery state of charge, 0–100 %.
    pub battery_percent: u8,
}

/// Scale a reading to its raw wire integer.
///
/// Missing or non-finite values map to [`SENTINEL_RAW`]; everything else
/// rounds to nearest and saturates one step inside the sentinel.
pub fn to_raw(spec: &FieldSpec, value: Option<f32>) -> i16 {
    match value {
        Some(v) if v.is_finite() => {
            let scaled = (v * spec.scale).round();
            scaled.clamp(-f32::from(i16::MAX), f32::from(i16::MAX)) as i16
        }
        _ => SENTINEL_RAW,
    }
}

/// Append the present fields of `reading` to `out` in canonical order.
///
/// Returns the number of bytes written.  On failure `out` is left holding
/// only the fields that fit.
pub fn encode(reading: &Reading, fields: FieldSet, out: &mut Payload) -> Result<usize, PayloadError> {
    let start = out.len();
    for spec in fields.iter() {
        let result = if spec.field == Field::Battery {
            out.push(reading.battery_percent).map_err(|_| ())
        } else {
            let raw = to_raw(spec, reading.get(spec.field));
            out.extend_from_slice(&raw.to_le_bytes())
        };
        result.map_err(|()| PayloadError::BufferFull {
            field: spec.field,
            capacity: out.capacity(),
        })?;
    }
    Ok(out.len() - start)
}

// ---------------------------------------------------------------------------
// Decoder mirror
// ---------------------------------------------------------------------------

/// Result of decoding an uplink, shaped like the network console's
/// `decodeUplink` return value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedUplink {
    /// Field key → scaled value; `None` for a transmitted sentinel.
    pub data: BTreeMap<&'static str, Option<f64>>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl DecodedUplink {
    pub fn value(&self, key: &str) -> Option<f64> {
        self.data.get(key).copied().flatten()
    }

    pub fn to_json(&self) -> String {
        // Serialising a map of plain keys and numbers cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Inverse of [`encode`] for the given presence set.
///
/// A length mismatch is reported as a warning and decoding continues with
/// whatever whole fields are available.
pub fn decode(bytes: &[u8], fields: FieldSet) -> DecodedUplink {
    let mut decoded = DecodedUplink::default();
    let expected = fields.payload_len();
    if bytes.len() != expected {
        decoded.warnings.push(format!(
            "Payload size should be {} bytes, got {}",
            expected,
            bytes.len()
        ));
    }

    let mut offset = 0;
    for spec in fields.iter() {
        let Some(chunk) = bytes.get(offset..offset + spec.width) else {
            decoded
                .warnings
                .push(format!("Payload truncated before {}", spec.key));
            break;
        };
        offset += spec.width;

        let value = if spec.width == 1 {
            Some(f64::from(chunk[0]))
        } else {
            let raw = i16::from_le_bytes([chunk[0], chunk[1]]);
            (raw != SENTINEL_RAW).then(|| f64::from(raw) / f64::from(spec.scale))
        };
        decoded.data.insert(spec.key, value);
    }
    decoded
}
