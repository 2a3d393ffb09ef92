//! System clock adapter.
//!
//! Implements [`ClockPort`] for the node.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` for the monotonic
//!   millisecond counter, `gettimeofday()` for wall-clock time.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and
//!   `SystemTime` for host-side simulation.

use crate::app::ports::ClockPort;

/// Wall-clock readings before 2020-01-01 mean the clock was never set.
const EPOCH_2020: u64 = 1_577_836_800;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since the adapter was created.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    #[cfg(target_os = "espidf")]
    fn wall_clock_secs(&self) -> Option<u64> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        u64::try_from(tv.tv_sec).ok()
    }

    #[cfg(not(target_os = "espidf"))]
    fn wall_clock_secs(&self) -> Option<u64> {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs())
    }
}

impl ClockPort for SystemClock {
    fn millis(&self) -> u32 {
        // Truncation is the wrap.
        (self.uptime_us() / 1000) as u32
    }

    fn unix_time(&self) -> u32 {
        match self.wall_clock_secs() {
            Some(secs) if secs >= EPOCH_2020 => u32::try_from(secs).unwrap_or(0),
            _ => 0,
        }
    }
}
