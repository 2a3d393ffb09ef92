//! Broadcast timing for the telemetry module.
//!
//! Pure bookkeeping: no I/O, no clock of its own.  The module feeds in the
//! current wrapping millisecond count and asks whether a mesh broadcast is
//! due.
//!
//! ```text
//!             first tick, sensor Ready
//!  Uninitialized ───────────────────────▶ Active ──┐ tick: mesh due?
//!        │                                  ▲  │    │  yes → broadcast
//!        │ disabled / sensor missing        │  └────┘  no  → phone only
//!        ▼                                  │
//!     Disabled ◀────── disabled at runtime ─┘
//! ```

use log::info;

// ═══════════════════════════════════════════════════════════════
//  Time helpers
// ═══════════════════════════════════════════════════════════════

/// Whether `now` lies strictly less than `span_ms` after `since`.
///
/// Correct across one wrap of the `u32` millisecond counter.
pub fn is_within_timespan_ms(since: u32, now: u32, span_ms: u32) -> bool {
    now.wrapping_sub(since) < span_ms
}

// ═══════════════════════════════════════════════════════════════
//  Schedule state
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No tick has run yet; the sensor has not been touched.
    Uninitialized,
    Active,
    /// Terminal: the module will not ask to run again.
    Disabled,
}

#[derive(Debug, Clone)]
pub struct ScheduleState {
    phase: Phase,
    /// Set only by a broadcast the mesh accepted.
    last_mesh_send_ms: Option<u32>,
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleState {
    pub const fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            last_mesh_send_ms: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_first_run(&self) -> bool {
        self.phase == Phase::Uninitialized
    }

    pub fn is_disabled(&self) -> bool {
        self.phase == Phase::Disabled
    }

    /// Leave `Uninitialized`.  Only the first call has any effect.
    pub fn finish_first_run(&mut self, sensor_ready: bool) {
        if self.phase != Phase::Uninitialized {
            return;
        }
        self.phase = if sensor_ready { Phase::Active } else { Phase::Disabled };
    }

    pub fn disable(&mut self) {
        if self.phase != Phase::Disabled {
            info!("Telemetry schedule disabled");
            self.phase = Phase::Disabled;
        }
    }

    pub fn last_mesh_send_ms(&self) -> Option<u32> {
        self.last_mesh_send_ms
    }

    /// A broadcast is due if none was ever sent or `interval_ms` has
    /// elapsed since the last one (boundary inclusive).
    pub fn mesh_due(&self, now_ms: u32, interval_ms: u32) -> bool {
        match self.last_mesh_send_ms {
            None => true,
            Some(last) => !is_within_timespan_ms(last, now_ms, interval_ms),
        }
    }

    pub fn record_mesh_send(&mut self, now_ms: u32) {
        self.last_mesh_send_ms = Some(now_ms);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
