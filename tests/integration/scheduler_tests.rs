//! Tick-level scenarios: start-up, mesh broadcasts, phone-only delivery.

use co2telemetry::app::commands::ModuleCommand;
use co2telemetry::app::ports::{NextRun, PeriodicTask};
use co2telemetry::config::{DeviceRole, TelemetryConfig};
use co2telemetry::scheduler::Phase;
use co2telemetry::sensors::SensorReading;
use co2telemetry::sensors::SensorState;
use co2telemetry::sensors::scd30::sim::SimulatedScd30;
use co2telemetry::telemetry::{Destination, Priority};

use crate::mock_hw::{CountingPool, FakeClock, FakeMesh, TestModule, enabled_config, module, module_with_pool};

const SAMPLE: SensorReading = SensorReading::new(612.5, 21.5, 45.25);

/// Run the first tick and check the sensor came up.
fn started(config: TelemetryConfig, bus: &SimulatedScd30, mesh: &mut FakeMesh, clock: &FakeClock) -> TestModule {
    let mut m = module(config, bus);
    assert_eq!(m.run_once(mesh, clock), NextRun::After(1000));
    assert_eq!(m.sensor().state(), SensorState::Ready);
    m
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn disabled_module_never_touches_the_bus() {
    let bus = SimulatedScd30::new();
    let mut m = module(TelemetryConfig::default(), &bus);
    let mut mesh = FakeMesh::new();

    assert_eq!(m.run_once(&mut mesh, &FakeClock::at(10_000)), NextRun::Never);
    assert_eq!(bus.transactions(), 0);
    assert_eq!(m.schedule().phase(), Phase::Disabled);
}

#[test]
fn absent_sensor_stops_scheduling() {
    let bus = SimulatedScd30::absent();
    let mut m = module(enabled_config(), &bus);
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(10_000);

    assert_eq!(m.run_once(&mut mesh, &clock), NextRun::Never);
    assert_eq!(bus.transactions(), 1, "only the probe is attempted");
    assert_eq!(m.sensor().state(), SensorState::NotDetected);

    // A stray extra tick stays quiet.
    assert_eq!(m.run_once(&mut mesh, &clock), NextRun::Never);
    assert_eq!(bus.transactions(), 1);
    assert_eq!(mesh.total_sent(), 0);
}

#[test]
fn sensor_lost_during_init_stops_scheduling() {
    let bus = SimulatedScd30::new();
    // probe, stop, set-interval succeed; start is NACKed.
    bus.fail_writes_after(3);
    let mut m = module(enabled_config(), &bus);

    assert_eq!(m.run_once(&mut FakeMesh::new(), &FakeClock::at(0)), NextRun::Never);
    assert_eq!(m.sensor().state(), SensorState::Faulted);
}

#[test]
fn first_tick_uses_configured_start_delay() {
    let bus = SimulatedScd30::new();
    let config = TelemetryConfig {
        start_delay_ms: 2500,
        ..enabled_config()
    };
    let mut m = module(config, &bus);
    assert_eq!(m.run_once(&mut FakeMesh::new(), &FakeClock::at(0)), NextRun::After(2500));
    assert!(bus.is_measuring());
    assert_eq!(bus.measurement_interval(), Some(2));
    assert_eq!(bus.ambient_pressure(), Some(1013));
}

#[test]
fn start_up_reads_firmware_version_once() {
    let bus = SimulatedScd30::new();
    bus.set_firmware_version(3, 66);
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(0);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    let reads = bus.writes().iter().filter(|w| w.as_slice() == [0xD1, 0x00]).count();
    assert_eq!(reads, 1);
    assert_eq!(mesh.mesh_sent.len(), 1);
}

// ── Mesh broadcasts ───────────────────────────────────────────

#[test]
fn second_tick_broadcasts_and_records_send_time() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(10_000);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    bus.push_reading(SAMPLE);
    clock.set(11_000);
    assert_eq!(m.run_once(&mut mesh, &clock), NextRun::After(60_000));

    assert_eq!(mesh.mesh_sent.len(), 1);
    assert!(mesh.phone_sent.is_empty());
    assert_eq!(m.schedule().last_mesh_send_ms(), Some(11_000));

    let env = &mesh.mesh_sent[0];
    assert_eq!(env.to, Destination::Broadcast);
    assert_eq!(env.priority, Priority::Background);
    assert_eq!(env.record.time, 1_700_000_000);
    let metrics = env.record.air_quality_metrics().unwrap();
    assert_eq!(metrics.co2, Some(612));
    assert_eq!(metrics.temperature, Some(21.5));
    assert_eq!(metrics.relative_humidity, Some(45.25));
    assert_eq!(mesh.polite_checks(), vec![true]);
    assert_eq!(mesh.mesh_cc_phone, vec![true], "broadcast is copied to the phone");
    assert_eq!(m.stats().mesh_sends, 1);
}

#[test]
fn sensor_role_sends_reliably_without_politeness() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(0);
    let config = TelemetryConfig {
        role: DeviceRole::Sensor,
        ..enabled_config()
    };
    let mut m = started(config, &bus, &mut mesh, &clock);

    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert_eq!(mesh.mesh_sent[0].priority, Priority::Reliable);
    assert_eq!(mesh.polite_checks(), vec![false]);
}

#[test]
fn mesh_due_exactly_at_interval_boundary() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(0);
    // 40 online nodes: coefficient 1.0, interval 100 s.
    let config = TelemetryConfig {
        air_quality_interval_secs: 100,
        ..enabled_config()
    };
    let mut m = started(config, &bus, &mut mesh, &clock);

    clock.set(5_000);
    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert_eq!(m.schedule().last_mesh_send_ms(), Some(5_000));

    clock.set(104_999);
    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert_eq!(mesh.mesh_sent.len(), 1, "one ms early is not due");
    assert_eq!(mesh.phone_sent.len(), 1);

    clock.set(105_000);
    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert_eq!(mesh.mesh_sent.len(), 2);
    assert_eq!(m.schedule().last_mesh_send_ms(), Some(105_000));
}

#[test]
fn small_mesh_broadcasts_sooner() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    mesh.online_nodes = 5;
    let clock = FakeClock::at(0);
    let config = TelemetryConfig {
        air_quality_interval_secs: 100,
        ..enabled_config()
    };
    let mut m = started(config, &bus, &mut mesh, &clock);

    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);

    // 100 s * 0.6
    clock.set(60_000);
    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert_eq!(mesh.mesh_sent.len(), 2);
}

#[test]
fn refused_broadcast_keeps_old_timestamp() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    mesh.accept_mesh = false;
    let clock = FakeClock::at(0);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert_eq!(m.schedule().last_mesh_send_ms(), None);
    assert!(m.last_packet().is_none(), "refused packet must not be cached");
    assert!(m.pool().allocated.is_empty());

    // Still due on the next tick.
    mesh.accept_mesh = true;
    clock.advance(60_000);
    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert_eq!(mesh.mesh_sent.len(), 1);
    assert_eq!(m.schedule().last_mesh_send_ms(), Some(60_000));
    assert_eq!(m.last_packet(), Some(&1));
}

#[test]
fn refused_broadcast_keeps_previous_cached_packet() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    mesh.tx_allowed = false;
    let clock = FakeClock::at(0);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    // Phone-only delivery fills the cache.
    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert_eq!(m.last_packet(), Some(&1));

    mesh.tx_allowed = true;
    mesh.accept_mesh = false;
    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert_eq!(m.last_packet(), Some(&1));
    assert!(m.pool().released.is_empty());
}

#[test]
fn busy_channel_falls_back_to_phone() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    mesh.tx_allowed = false;
    let clock = FakeClock::at(0);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert!(mesh.mesh_sent.is_empty());
    assert_eq!(mesh.phone_sent.len(), 1);
    assert_eq!(m.schedule().last_mesh_send_ms(), None);
}

// ── Phone-only delivery ───────────────────────────────────────

#[test]
fn interval_not_elapsed_sends_to_phone_only() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(0);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    bus.push_reading(SAMPLE);
    clock.set(1_000);
    m.run_once(&mut mesh, &clock);

    bus.push_reading(SensorReading::new(700.0, 22.0, 40.0));
    clock.advance(60_000);
    assert_eq!(m.run_once(&mut mesh, &clock), NextRun::After(60_000));

    assert_eq!(mesh.mesh_sent.len(), 1);
    assert_eq!(mesh.phone_sent.len(), 1);
    assert_eq!(mesh.phone_sent[0].record.air_quality_metrics().unwrap().co2, Some(700));
    assert_eq!(m.schedule().last_mesh_send_ms(), Some(1_000));
    assert_eq!(m.stats().phone_sends, 1);
}

#[test]
fn busy_phone_queue_skips_the_cycle() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(0);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);

    mesh.phone_queue_empty = false;
    bus.push_reading(SAMPLE);
    clock.advance(60_000);
    assert_eq!(m.run_once(&mut mesh, &clock), NextRun::After(60_000));
    assert_eq!(mesh.total_sent(), 1);
    assert_eq!(bus.queued_readings(), 1, "no sample taken");
}

// ── Transient failures ────────────────────────────────────────

#[test]
fn not_ready_sensor_skips_without_sending() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(0);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    assert_eq!(m.run_once(&mut mesh, &clock), NextRun::After(60_000));
    assert_eq!(mesh.total_sent(), 0);
    assert_eq!(m.schedule().last_mesh_send_ms(), None);
    assert_eq!(m.stats().not_ready, 1);
}

#[test]
fn corrupted_readiness_word_skips_the_cycle() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(0);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    bus.push_reading(SAMPLE);
    bus.corrupt_next_read(2);
    assert_eq!(m.run_once(&mut mesh, &clock), NextRun::After(60_000));
    assert_eq!(mesh.total_sent(), 0);
    assert_eq!(m.stats().not_ready, 1);
    assert_eq!(bus.queued_readings(), 1, "sample left for the next tick");

    // The next tick picks it up.
    clock.advance(60_000);
    m.run_once(&mut mesh, &clock);
    assert_eq!(mesh.mesh_sent.len(), 1);
}

#[test]
fn bus_error_skips_the_cycle() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(0);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    bus.push_reading(SAMPLE);
    bus.fail_next_read();
    assert_eq!(m.run_once(&mut mesh, &clock), NextRun::After(60_000));
    assert_eq!(mesh.total_sent(), 0);
    assert_eq!(m.schedule().last_mesh_send_ms(), None);
}

// ── Cache and commands ────────────────────────────────────────

#[test]
fn cache_holds_only_the_latest_packet() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(0);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    for _ in 0..3 {
        bus.push_reading(SAMPLE);
        m.run_once(&mut mesh, &clock);
        clock.advance(60_000);
    }
    assert_eq!(m.pool().allocated, vec![1, 2, 3]);
    assert_eq!(m.pool().released, vec![1, 2]);
    assert_eq!(m.last_packet(), Some(&3));

    m.handle_command(ModuleCommand::Shutdown).unwrap();
    assert_eq!(m.pool().outstanding(), 0);
}

#[test]
fn exhausted_pool_empties_the_cache() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(0);
    let mut m = module_with_pool(enabled_config(), &bus, CountingPool::new(8).exhausted_after(1));
    assert_eq!(m.run_once(&mut mesh, &clock), NextRun::After(1000));

    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert_eq!(m.last_packet(), Some(&1));

    // The newer record still goes out, but nothing stale stays cached.
    bus.push_reading(SAMPLE);
    m.run_once(&mut mesh, &clock);
    assert_eq!(mesh.total_sent(), 2);
    assert!(m.last_packet().is_none());
    assert_eq!(m.pool().released, vec![1]);
}

#[test]
fn disabling_at_runtime_stops_the_task() {
    let bus = SimulatedScd30::new();
    let mut mesh = FakeMesh::new();
    let clock = FakeClock::at(0);
    let mut m = started(enabled_config(), &bus, &mut mesh, &clock);

    m.handle_command(ModuleCommand::UpdateConfig(TelemetryConfig::default()))
        .unwrap();
    bus.push_reading(SAMPLE);
    assert_eq!(m.run_once(&mut mesh, &clock), NextRun::Never);
    assert_eq!(mesh.total_sent(), 0);
}
