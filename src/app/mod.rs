//! Application core: the telemetry module's domain logic, zero I/O.
//!
//! Sampling cadence, request handling and packet caching live here.  All
//! interaction with the sensor, radio, clock and allocator happens through
//! the **port traits** in [`ports`], keeping this layer testable without
//! real peripherals.

pub mod cache;
pub mod commands;
pub mod ports;
pub mod responder;
pub mod service;
