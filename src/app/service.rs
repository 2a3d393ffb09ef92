//! The CO2 telemetry module, the hexagonal core.
//!
//! [`Co2TelemetryModule`] owns the sensor, the packet pool and the
//! last-packet cache.  The radio and clock are passed in at each call, so
//! the whole module runs on the host against mock adapters.
//!
//! ```text
//!  AirQualitySensor ──▶ ┌──────────────────────────┐ ──▶ MeshPort
//!                       │    Co2TelemetryModule    │
//!        ClockPort ──▶ │ schedule · cache · stats │ ◀─▶ PacketPool
//!                       └──────────────────────────┘
//! ```

use log::{debug, error, info, warn};

use crate::config::{ConfigError, DeviceRole, TelemetryConfig};
use crate::diagnostics::TelemetryStats;
use crate::error::{self, Error, SensorError};
use crate::scheduler::ScheduleState;
use crate::sensors::SensorState;
use crate::telemetry::{DispatchEnvelope, InboundPacket, Priority, TelemetryRecord, payload};

use super::cache::LastPacketCache;
use super::commands::ModuleCommand;
use super::ports::{
    AirQualitySensor, ClockPort, Handled, InboundHandler, MeshPort, NextRun, PacketPool,
    PeriodicTask,
};
use super::responder::{self, Request};

/// Where a sampled record goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Mesh,
    PhoneOnly,
}

// ───────────────────────────────────────────────────────────────
// Co2TelemetryModule
// ───────────────────────────────────────────────────────────────

pub struct Co2TelemetryModule<S, P: PacketPool> {
    config: TelemetryConfig,
    sensor: S,
    pool: P,
    cache: LastPacketCache<P::Packet>,
    schedule: ScheduleState,
    stats: TelemetryStats,
}

impl<S, P> Co2TelemetryModule<S, P>
where
    S: AirQualitySensor,
    P: PacketPool,
{
    /// Build the module.  Nothing touches the bus until the first tick.
    pub fn new(config: TelemetryConfig, sensor: S, pool: P) -> Self {
        Self {
            config,
            sensor,
            pool,
            cache: LastPacketCache::new(),
            schedule: ScheduleState::new(),
            stats: TelemetryStats::new(),
        }
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(&mut self, cmd: ModuleCommand) -> Result<(), ConfigError> {
        match cmd {
            ModuleCommand::UpdateConfig(new_config) => {
                if let Err(e) = new_config.validate() {
                    warn!("Rejected telemetry config: {}", e);
                    return Err(e);
                }
                self.config = new_config;
                info!("Telemetry configuration updated at runtime");
            }
            ModuleCommand::Shutdown => {
                self.cache.clear(&mut self.pool);
                info!("Telemetry module shut down");
            }
        }
        Ok(())
    }

    // ── Sampling ──────────────────────────────────────────────

    /// Take one fresh sample and wrap it in a timestamped record.
    ///
    /// Requires the sensor to be `Ready`.  Failures are counted before
    /// they are returned.
    pub fn air_quality_telemetry(&mut self, clock: &dyn ClockPort) -> error::Result<TelemetryRecord> {
        match self.sensor.read_metrics() {
            Ok(reading) => {
                self.stats.record_sample();
                Ok(TelemetryRecord::air_quality(clock.unix_time(), &reading))
            }
            Err(e) => {
                let err = Error::Sensor(e);
                self.stats.record(&err);
                Err(err)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn stats(&self) -> &TelemetryStats {
        &self.stats
    }

    pub fn schedule(&self) -> &ScheduleState {
        &self.schedule
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Most recent packet sent or observed, as held in the pool.
    pub fn last_packet(&self) -> Option<&P::Packet> {
        self.cache.get()
    }

    // ── Internal ──────────────────────────────────────────────

    /// First tick: bring the sensor up and decide whether to keep running.
    fn start_sensor(&mut self) -> NextRun {
        info!("CO2 telemetry: init");
        if self.sensor.probe() == SensorState::NotDetected {
            self.stats.record(&Error::BusUnavailable);
        }
        let state = self.sensor.initialize();
        let ready = state.is_usable();
        self.schedule.finish_first_run(ready);

        if ready {
            if let Some((major, minor)) = self.sensor.firmware_version() {
                info!("CO2 sensor firmware {}.{}", major, minor);
            }
            info!("CO2 sensor ready, first sample in {} ms", self.config.start_delay_ms);
            NextRun::After(self.config.start_delay_ms)
        } else {
            warn!("CO2 sensor {:?}, telemetry disabled", state);
            NextRun::Never
        }
    }

    fn priority(&self) -> Priority {
        if self.config.role == DeviceRole::Sensor {
            Priority::Reliable
        } else {
            Priority::Background
        }
    }

    /// Sample and dispatch.  `true` only if the envelope was handed off
    /// (for the mesh: accepted by the router).
    fn send_telemetry(&mut self, mesh: &mut dyn MeshPort, clock: &dyn ClockPort, route: Route) -> bool {
        let record = match self.air_quality_telemetry(clock) {
            Ok(r) => r,
            Err(Error::Sensor(SensorError::NotReady)) => {
                debug!("CO2 sample not ready, skipping cycle");
                return false;
            }
            Err(e) => {
                warn!("CO2 sample failed: {} ({} failures so far)", e, self.stats.failures());
                return false;
            }
        };

        let envelope = DispatchEnvelope::broadcast(record, self.priority());
        let sent = match route {
            Route::PhoneOnly => {
                info!("Sending air quality telemetry to phone");
                mesh.send_to_phone(envelope.clone());
                self.stats.phone_sends = self.stats.phone_sends.saturating_add(1);
                true
            }
            Route::Mesh => {
                info!("Sending air quality telemetry to mesh");
                if mesh.send_to_mesh(envelope.clone(), true) {
                    self.stats.mesh_sends = self.stats.mesh_sends.saturating_add(1);
                    true
                } else {
                    warn!("Mesh refused telemetry packet");
                    false
                }
            }
        };
        if sent {
            self.cache_copy(&envelope);
        }
        sent
    }

    /// Replace the cached packet with a pooled copy of `envelope`.
    ///
    /// The old packet goes back to the pool before the copy is allocated,
    /// so an exhausted pool leaves the cache empty rather than stale.
    fn cache_copy(&mut self, envelope: &DispatchEnvelope) {
        self.cache.clear(&mut self.pool);
        match self.pool.alloc_copy(envelope) {
            Some(packet) => self.cache.store(packet, &mut self.pool),
            None => warn!("Packet pool exhausted, last packet not cached"),
        }
    }
}

impl<S, P> PeriodicTask for Co2TelemetryModule<S, P>
where
    S: AirQualitySensor,
    P: PacketPool,
{
    fn run_once(&mut self, mesh: &mut dyn MeshPort, clock: &dyn ClockPort) -> NextRun {
        if !self.config.air_quality_enabled {
            self.schedule.disable();
            return NextRun::Never;
        }
        if self.schedule.is_first_run() {
            return self.start_sensor();
        }
        if self.schedule.is_disabled() {
            return NextRun::Never;
        }

        let now = clock.millis();
        let interval = self.config.broadcast_interval_ms(mesh.online_node_count());
        let polite = self.config.role != DeviceRole::Sensor;

        if self.schedule.mesh_due(now, interval) && mesh.is_tx_allowed(polite) {
            if self.send_telemetry(mesh, clock, Route::Mesh) {
                self.schedule.record_mesh_send(now);
            }
        } else if mesh.is_to_phone_queue_empty() {
            self.send_telemetry(mesh, clock, Route::PhoneOnly);
        }

        NextRun::After(self.config.send_to_phone_interval_ms)
    }
}

impl<S, P> InboundHandler for Co2TelemetryModule<S, P>
where
    S: AirQualitySensor,
    P: PacketPool,
{
    fn handle_received(&mut self, packet: &InboundPacket) -> Handled {
        let record = match payload::decode(&packet.payload) {
            Ok(r) => r,
            Err(e) => {
                debug!("Ignoring telemetry packet {:#010x}: {}", packet.id, e);
                return Handled::NotClaimed;
            }
        };
        let Some(metrics) = record.air_quality_metrics() else {
            return Handled::NotClaimed;
        };

        info!(
            "Air quality from {:#010x}: co2={:?} ppm, temperature={:?} C, humidity={:?} %",
            packet.from, metrics.co2, metrics.temperature, metrics.relative_humidity
        );

        self.cache_copy(&DispatchEnvelope::received(packet, record));
        Handled::NotClaimed
    }

    fn alloc_reply(&mut self, request: &InboundPacket, clock: &dyn ClockPort) -> Option<DispatchEnvelope> {
        match responder::parse_request(request) {
            Ok(Request::AirQuality) => {}
            Ok(Request::Other(_)) => return None,
            Err(e) => {
                error!("Error decoding telemetry request from {:#010x}: {}", request.from, e);
                self.stats.record(&Error::Decode(e));
                return None;
            }
        }

        match self.air_quality_telemetry(clock) {
            Ok(record) => {
                info!("Replying to air quality request from {:#010x}", request.from);
                self.stats.replies = self.stats.replies.saturating_add(1);
                Some(responder::reply_to(request, record))
            }
            Err(e) => {
                debug!("No air quality reply for {:#010x}: {}", request.from, e);
                None
            }
        }
    }
}
