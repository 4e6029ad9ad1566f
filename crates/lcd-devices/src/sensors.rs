//! Sensor provider interface and its sysinfo backend.

use lcd_core::models::SensorReading;
use lcd_core::{LcdError, Result};
use sysinfo::Components;

/// Source of named, typed sensor readings.
///
/// Implementations may block; callers run them off the async executor.
pub trait SensorProvider: Send {
    /// Query every sensor the provider knows about.
    fn readings(&mut self) -> Result<Vec<SensorReading>>;
}

// ── SysinfoProvider ───────────────────────────────────────────────────────────

/// Temperature sensors exposed by the OS through `sysinfo`.
///
/// Each component becomes one temperature reading named after its label,
/// e.g. `"coretemp Package id 0"` or `"amdgpu edge"` on Linux.
pub struct SysinfoProvider {
    components: Components,
}

impl SysinfoProvider {
    /// Discover the available sensor components.
    ///
    /// Fails with [`LcdError::PlatformUnsupported`] where sysinfo has no
    /// sensor backend.
    pub fn new() -> Result<Self> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(LcdError::PlatformUnsupported(format!(
                "no sensor provider for {}",
                std::env::consts::OS
            )));
        }

        let components = Components::new_with_refreshed_list();
        tracing::debug!(count = components.len(), "sensor components discovered");
        Ok(Self { components })
    }
}

impl SensorProvider for SysinfoProvider {
    fn readings(&mut self) -> Result<Vec<SensorReading>> {
        self.components.refresh();
        Ok(self
            .components
            .iter()
            .filter(|c| !c.temperature().is_nan())
            .map(|c| SensorReading::temperature(c.label(), f64::from(c.temperature())))
            .collect())
    }
}
