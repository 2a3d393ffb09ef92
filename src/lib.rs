//! CO2 telemetry module library.
//!
//! Exposes the SCD30 driver, the telemetry module and its adapters for
//! integration testing and for the firmware binary.  All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod scheduler;
pub mod telemetry;

pub mod adapters;
pub mod sensors;
