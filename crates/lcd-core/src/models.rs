use std::fmt;

use serde::{Deserialize, Serialize};

// ── SensorKind ────────────────────────────────────────────────────────────────

/// What a sensor reading measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Load,
    Fan,
    Other,
}

// ── SensorReading ─────────────────────────────────────────────────────────────

/// A single named, typed value reported by a sensor provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Provider-assigned sensor name, e.g. `"CPU Package"`.
    pub name: String,
    pub kind: SensorKind,
    /// Raw value in the sensor's unit (degrees Celsius for temperatures).
    pub value: f64,
}

impl SensorReading {
    pub fn temperature(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            kind: SensorKind::Temperature,
            value,
        }
    }

    /// Value rounded to the nearest whole degree, half away from zero.
    pub fn rounded(&self) -> i32 {
        self.value.round() as i32
    }
}

// ── Category ──────────────────────────────────────────────────────────────────

/// Temperature group tracked and notified independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Cpu,
    Gpu,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Cpu => write!(f, "cpu"),
            Category::Gpu => write!(f, "gpu"),
        }
    }
}

// ── TemperatureSnapshot ───────────────────────────────────────────────────────

/// CPU and GPU temperatures from one poll, in provider enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemperatureSnapshot {
    pub cpu: Vec<i32>,
    pub gpu: Vec<i32>,
}

impl TemperatureSnapshot {
    /// Partition `readings` into CPU and GPU lists.
    ///
    /// Only temperature readings whose name equals `cpu_name` or `gpu_name`
    /// are kept. Order and duplicates are preserved.
    pub fn from_readings(readings: &[SensorReading], cpu_name: &str, gpu_name: &str) -> Self {
        let mut snapshot = Self::default();
        for reading in readings {
            if reading.kind != SensorKind::Temperature {
                continue;
            }
            if reading.name == cpu_name {
                snapshot.cpu.push(reading.rounded());
            } else if reading.name == gpu_name {
                snapshot.gpu.push(reading.rounded());
            }
        }
        snapshot
    }

    pub fn category(&self, category: Category) -> &[i32] {
        match category {
            Category::Cpu => &self.cpu,
            Category::Gpu => &self.gpu,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
