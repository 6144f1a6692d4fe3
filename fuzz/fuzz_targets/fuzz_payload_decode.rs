//! Fuzz target: `payload::decode`
//!
//! The first byte picks a presence set, the rest is the uplink.  The
//! decoder must never panic, must warn on any length mismatch, and must
//! never report more fields than the presence set holds.  Whatever it
//! decodes must re-encode to the same bytes.
//!
//! cargo fuzz run fuzz_payload_decode

#![no_main]

use buoy::payload::{self, FieldSet, Payload};
use buoy::Reading;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&bits, bytes)) = data.split_first() else {
        return;
    };
    let fields = FieldSet::from_bits(bits);
    let decoded = payload::decode(bytes, fields);

    assert!(decoded.data.len() <= fields.iter().count());
    if bytes.len() != fields.payload_len() {
        assert!(!decoded.warnings.is_empty(), "length mismatch must warn");
        return;
    }

    // Exact-length input: rebuild a reading and re-encode.
    let mut reading = Reading::default();
    for spec in fields.iter() {
        let value = decoded.value(spec.key);
        match spec.field {
            payload::Field::Battery => {
                reading.battery_percent = value.map_or(0, |v| v as u8);
            }
            field => reading.set(field, value.map_or(f32::NAN, |v| v as f32)),
        }
    }
    let mut out = Payload::new();
    payload::encode(&reading, fields, &mut out).expect("max payload fits");
    assert_eq!(out.as_slice(), bytes);
});
