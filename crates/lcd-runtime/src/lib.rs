//! Runtime layer for the LCD monitor.
//!
//! Runs the three cooperating loops: the sensor poller, the per-device
//! display session, and the supervisor that discovers the display and
//! sequences sessions. All of them stop on one shared cancellation token.

pub mod display;
pub mod hardware_monitor;
pub mod supervisor;

#[cfg(test)]
mod testing;

pub use lcd_core as core;
pub use lcd_devices as devices;
