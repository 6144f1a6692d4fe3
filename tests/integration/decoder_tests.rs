//! Decoder mirror against payloads produced by the hub.

use buoy::config::BuoyConfig;
use buoy::decoder::DecoderMirror;
use buoy::payload::{Payload, PayloadConfig};
use buoy::registry::{self, ACTIVE_SENSORS};
use buoy::sensors::SensorKind;
use buoy::SensorHub;

use crate::fixtures::{assert_close, fake, full_reading};

#[test]
fn mirror_decodes_what_the_hub_encodes() {
    let kinds = [SensorKind::Ph, SensorKind::Bme280, SensorKind::Ds18b20, SensorKind::Hcsr04];
    let mut hub = SensorHub::new();
    for kind in kinds {
        hub.register(fake(kind, full_reading()).0).unwrap();
    }
    hub.init_all();
    let mut out = Payload::new();
    hub.get_payload(&mut out, &PayloadConfig { battery_percent: 99 }).unwrap();

    let mirror = DecoderMirror::new(&kinds);
    assert_eq!(mirror.fields(), hub.payload_fields());
    assert_eq!(mirror.expected_len(), 13);

    let decoded = mirror.decode(&out);
    assert!(decoded.warnings.is_empty());
    assert_close(decoded.value("battery_percent"), 99.0, 0.0);
    assert_close(decoded.value("distance_cm"), 152.3, 0.1);
    assert!(mirror.js().contains("data.distance_cm = distance_cm_raw === -32768"));
}

#[test]
fn short_payload_warns_but_keeps_decoded_fields() {
    let mirror = DecoderMirror::new(&[SensorKind::Ph, SensorKind::Bme280, SensorKind::Ds18b20]);
    // A build whose BME280 dropped out: battery, pH, water.
    let decoded = mirror.decode(&[87, 0xE6, 0x02, 0x08, 0x07]);
    assert_eq!(decoded.warnings[0], "Payload size should be 11 bytes, got 5");
    assert_close(decoded.value("battery_percent"), 87.0, 0.0);
    assert_close(decoded.value("ph"), 7.42, 0.01);
    assert!(decoded.errors.is_empty());
    assert!(mirror.js().contains("Payload size should be 11 bytes, got "));
}

#[test]
fn build_mirror_follows_compiled_features() {
    let mirror = DecoderMirror::for_build();
    assert_eq!(mirror.fields(), registry::ACTIVE_FIELDS);
    let layout = mirror.layout();
    for kind in ACTIVE_SENSORS {
        assert!(layout.contains(kind.name()), "{} missing from layout", kind.name());
    }
}

#[test]
fn log_decoder_respects_show_decoder() {
    // Only checks that both paths run; output goes to the log facade.
    let mirror = DecoderMirror::for_build();
    mirror.log_decoder(&BuoyConfig::default());
    mirror.log_decoder(&BuoyConfig {
        show_decoder: true,
        ..BuoyConfig::default()
    });
}
