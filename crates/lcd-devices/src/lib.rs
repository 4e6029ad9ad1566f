//! Device-facing layer for the LCD monitor.
//!
//! Defines the capability interfaces the runtime is written against
//! (sensor provider, device locator, transport) and their real backends
//! built on `sysinfo` and `serialport`.

pub mod locator;
pub mod sensors;
pub mod serial;
pub mod transport;

pub use lcd_core as core;
