//! Network-console decoder mirror.
//!
//! Emits the JavaScript `decodeUplink` formatter matching a build's sensor
//! set, plus a human-readable byte map.  Both walk [`FIELD_TABLE`] exactly
//! like [`payload::encode`], so the generated decoder cannot drift from the
//! encoder.  Output is diagnostic text only; nothing here runs on air.
//!
//! [`FIELD_TABLE`]: crate::payload::FIELD_TABLE

use core::fmt::{self, Write};

use log::info;

use crate::config::BuoyConfig;
use crate::payload::{self, DecodedUplink, FieldSet};
use crate::registry::{self, ACTIVE_SENSORS};
use crate::sensors::SensorKind;

pub struct DecoderMirror {
    kinds: Vec<SensorKind>,
    fields: FieldSet,
}

impl DecoderMirror {
    pub fn new(kinds: &[SensorKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            fields: registry::fields_of(kinds),
        }
    }

    /// Mirror for the drivers compiled into this build.
    pub fn for_build() -> Self {
        Self::new(ACTIVE_SENSORS)
    }

    pub fn fields(&self) -> FieldSet {
        self.fields
    }

    pub fn expected_len(&self) -> usize {
        self.fields.payload_len()
    }

    /// Decode in Rust with the same layout the JavaScript expects.
    pub fn decode(&self, bytes: &[u8]) -> DecodedUplink {
        payload::decode(bytes, self.fields)
    }

    /// Write the `decodeUplink(input)` formatter.
    pub fn write_js<W: Write>(&self, w: &mut W) -> fmt::Result {
        let expected = self.expected_len();
        writeln!(w, "function decodeUplink(input) {{")?;
        writeln!(w, "  var bytes = input.bytes;")?;
        writeln!(w, "  var data = {{}};")?;
        writeln!(w, "  var warnings = [];")?;
        writeln!(w, "  var offset = 0;")?;
        writeln!(w)?;
        writeln!(w, "  function int16le(i) {{")?;
        writeln!(w, "    var v = bytes[i] | (bytes[i + 1] << 8);")?;
        writeln!(w, "    return v & 0x8000 ? v - 0x10000 : v;")?;
        writeln!(w, "  }}")?;
        writeln!(w)?;
        writeln!(w, "  if (bytes.length !== {expected}) {{")?;
        writeln!(
            w,
            "    warnings.push('Payload size should be {expected} bytes, got ' + bytes.length);"
        )?;
        writeln!(w, "  }}")?;
        writeln!(w)?;

        let mut offset = 0;
        for slot in self.fields.iter() {
            writeln!(w, "  // {} {}", byte_range(offset, slot.width), slot.label)?;
            writeln!(w, "  if (offset + {} > bytes.length) {{", slot.width)?;
            writeln!(w, "    warnings.push('Payload truncated before {}');", slot.key)?;
            writeln!(w, "    return {{ data: data, warnings: warnings, errors: [] }};")?;
            writeln!(w, "  }}")?;
            if slot.width == 1 {
                writeln!(w, "  data.{} = bytes[offset];", slot.key)?;
            } else {
                writeln!(w, "  var {}_raw = int16le(offset);", slot.key)?;
                writeln!(
                    w,
                    "  data.{key} = {key}_raw === -32768 ? null : {key}_raw / {scale};",
                    key = slot.key,
                    scale = slot.scale
                )?;
            }
            writeln!(w, "  offset += {};", slot.width)?;
            writeln!(w)?;
            offset += slot.width;
        }

        writeln!(w, "  return {{ data: data, warnings: warnings, errors: [] }};")?;
        writeln!(w, "}}")
    }

    /// Write the configuration report: active sensors and the byte map.
    pub fn write_layout<W: Write>(&self, w: &mut W) -> fmt::Result {
        writeln!(w, "=== BUOY SENSOR CONFIGURATION ===")?;
        writeln!(w, "Active sensors:")?;
        for kind in &self.kinds {
            writeln!(w, "  + {} ({})", kind.name(), kind.description())?;
        }
        writeln!(w, "Payload size: {} bytes", self.expected_len())?;
        writeln!(w, "Payload layout:")?;
        let mut offset = 0;
        for slot in self.fields.iter() {
            let range = byte_range(offset, slot.width);
            let endian = if slot.width > 1 { " - little-endian" } else { "" };
            writeln!(w, "  {range:<12} {}{endian}", slot.label)?;
            offset += slot.width;
        }
        Ok(())
    }

    pub fn js(&self) -> String {
        let mut s = String::new();
        let _ = self.write_js(&mut s);
        s
    }

    pub fn layout(&self) -> String {
        let mut s = String::new();
        let _ = self.write_layout(&mut s);
        s
    }

    /// Log the report and the formatter line by line when enabled.
    pub fn log_decoder(&self, config: &BuoyConfig) {
        if !config.show_decoder {
            return;
        }
        for line in self.layout().lines() {
            info!("{}", line);
        }
        info!("==================== UPLINK DECODER ====================");
        info!("// Paste into the application's custom JavaScript uplink formatter");
        for line in self.js().lines() {
            info!("{}", line);
        }
        info!("==================== END DECODER ====================");
    }
}

fn byte_range(offset: usize, width: usize) -> String {
    if width == 1 {
        format!("Byte {offset}:")
    } else {
        format!("Byte {}-{}:", offset, offset + width - 1)
    }
}
