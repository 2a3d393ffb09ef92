//! CO2 telemetry node: firmware entry point.
//!
//! Wires the SCD30 on I2C0 into the telemetry module and runs the
//! module's tick loop, sleeping for whatever the last tick asked for.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                    │
//! │                                                            │
//! │  Scd30<I2cDriver>   LogMeshAdapter   SystemClock           │
//! │  (AirQualitySensor) (MeshPort)       (ClockPort)           │
//! │  HeapPacketPool (PacketPool)                               │
//! │                                                            │
//! │  ──────────────── Port Trait Boundary ─────────────────    │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │        Co2TelemetryModule (pure logic)               │  │
//! │  │  schedule · last-packet cache · stats                │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Delay, FreeRtos};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use log::{info, warn};

use co2telemetry::adapters::log_mesh::LogMeshAdapter;
use co2telemetry::adapters::packet_pool::HeapPacketPool;
use co2telemetry::adapters::time::SystemClock;
use co2telemetry::app::ports::{NextRun, PeriodicTask};
use co2telemetry::app::service::Co2TelemetryModule;
use co2telemetry::config::{INITIAL_DELAY_MS, TelemetryConfig};
use co2telemetry::diagnostics;
use co2telemetry::sensors::scd30::Scd30;

/// The SCD30 clock-stretches; keep the bus slow.
const I2C_BAUDRATE_KHZ: u32 = 50;

/// Packets the module may hold at once (cache + one in flight).
const PACKET_POOL_CAPACITY: usize = 4;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    diagnostics::install_panic_handler();

    info!("CO2 telemetry node v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into()),
    )?;
    let sensor = Scd30::new(i2c, Delay::new_default());

    // ── 3. Module ─────────────────────────────────────────────
    let config = TelemetryConfig {
        air_quality_enabled: true,
        ..TelemetryConfig::default()
    };
    if let Err(e) = config.validate() {
        anyhow::bail!("invalid telemetry config: {}", e);
    }

    let mut module = Co2TelemetryModule::new(config, sensor, HeapPacketPool::new(PACKET_POOL_CAPACITY));
    let mut mesh = LogMeshAdapter::new();
    let clock = SystemClock::new();

    // ── 4. Tick loop ──────────────────────────────────────────
    let mut next = NextRun::After(INITIAL_DELAY_MS);
    while let NextRun::After(ms) = next {
        FreeRtos::delay_ms(ms);
        next = module.run_once(&mut mesh, &clock);
    }

    warn!(
        "Telemetry module stopped (sensor {:?}, {} envelopes sent); idling",
        module.sensor().state(),
        mesh.sent()
    );
    loop {
        FreeRtos::delay_ms(60_000);
    }
}
