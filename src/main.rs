//! Buoy host simulator: main entry point
//!
//! Runs the firmware poll loop against simulated hardware:
//!
//! ```text
//!   boot ─▶ load config ─▶ build hub ─▶ init_all ─▶ (log decoder)
//!                                           │
//!        ┌──────────────────────────────────┘
//!        ▼
//!   retry_init_all ─▶ read_all ─▶ compensate ─▶ encode ─▶ "uplink"
//! ```
//!
//! Usage: `buoy-sim [config.json] [cycles]`.  `RUST_LOG` controls verbosity.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use log::{info, warn};

use buoy::adapters::board::SimBoard;
use buoy::adapters::sim::SimConfigStore;
use buoy::config::{self, BuoyConfig};
use buoy::decoder::DecoderMirror;
use buoy::payload::{self, Payload, PayloadConfig};
use buoy::{Reading, registry};

const DEFAULT_CYCLES: u32 = 3;

fn load_config(path: Option<&str>) -> Result<BuoyConfig> {
    let Some(path) = path else {
        // No file: go through the same store path the target boots with.
        let mut store = SimConfigStore::new();
        return Ok(config::load(&mut store));
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let cfg: BuoyConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    cfg.validate().map_err(anyhow::Error::msg)?;
    info!("Config loaded from {}", path);
    Ok(cfg)
}

/// Give the simulated sea something plausible to report, drifting a little
/// each cycle.
fn stir(board: &SimBoard, cfg: &BuoyConfig, cycle: u32) {
    let drift = cycle as f32 * 0.1;
    board.ph_adc.set_millivolts(1420.0 + drift * 10.0, &cfg.ph);
    board.env.set_sample(21.35 + drift, 78.0 - drift, 1013.2);
    board.one_wire.set_celsius(18.0 - drift);
    board.echo.set_distance_cm(120.0 + drift * 5.0);
    board.dht22.set_values(21.0 + drift, 70.0);
    board.dht11.set_values(21.0 + drift, 70.0);
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut s, b| {
        let _ = write!(s, "{b:02X}");
        s
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  Buoy sim v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cfg = load_config(args.first().map(String::as_str))?;
    let cycles = match args.get(1) {
        Some(n) => n.parse().with_context(|| format!("invalid cycle count {n}"))?,
        None => DEFAULT_CYCLES,
    };

    // ── Sensor bring-up ───────────────────────────────────────
    let board = SimBoard::new();
    stir(&board, &cfg, 0);
    let mut hub = board.build_hub(&cfg).map_err(anyhow::Error::msg)?;
    info!("Sensors compiled in: {}", registry::active_names());
    if !hub.init_all() {
        warn!("No sensor available at boot; sending battery only");
    }

    let mirror = DecoderMirror::for_build();
    mirror.log_decoder(&cfg);

    // ── Poll loop ─────────────────────────────────────────────
    let payload_cfg = PayloadConfig { battery_percent: 87 };
    let mut reading = Reading::default();
    let mut out = Payload::new();
    for cycle in 0..cycles {
        stir(&board, &cfg, cycle);
        if cfg.retry_every_cycles > 0 && cycle % cfg.retry_every_cycles == 0 {
            hub.retry_init_all();
        }
        hub.service_all();

        if !hub.read_all(&mut reading) {
            warn!("Cycle {}: no sensor read succeeded", cycle);
        }
        hub.apply_temperature_compensation(&reading);

        let len = hub
            .encode_payload(&reading, &payload_cfg, &mut out)
            .map_err(anyhow::Error::msg)?;
        let decoded = payload::decode(&out, hub.payload_fields());
        info!("Cycle {}: {} bytes  {}", cycle, len, hex(&out));
        info!("Cycle {}: {}", cycle, decoded.to_json());
        info!(
            "Cycle {}: next poll in {} s (simulated)",
            cycle, cfg.poll_interval_secs
        );
    }

    info!(
        "Done: {} cycles, {} ms of simulated sensor delays",
        cycles,
        board.delay.total_ms()
    );
    Ok(())
}
