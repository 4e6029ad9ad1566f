use clap::{CommandFactory, FromArgMatches, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LcdError, Result};
use crate::protocol::{DEFAULT_BAUD_RATE, DEFAULT_VENDOR_PREFIX};

/// Sensor name selected into the CPU list by default.
pub const DEFAULT_CPU_SENSOR: &str = "CPU Package";
/// Sensor name selected into the GPU list by default.
pub const DEFAULT_GPU_SENSOR: &str = "GPU Core";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// CPU/GPU temperature and clock display for serial character LCDs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "lcd-monitor",
    about = "CPU/GPU temperature and clock display for serial character LCDs",
    version
)]
pub struct Settings {
    /// Device descriptor prefix identifying the display
    #[arg(long, default_value = DEFAULT_VENDOR_PREFIX)]
    pub vendor_prefix: String,

    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE, value_parser = clap::value_parser!(u32).range(1..))]
    pub baud_rate: u32,

    /// Sensor poll interval in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: u64,

    /// Clock line refresh interval in milliseconds
    #[arg(long, default_value = "200", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_interval_ms: u64,

    /// Delay between device discovery attempts in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub discovery_delay_ms: u64,

    /// Sensor name shown as the CPU temperature
    #[arg(long, default_value = DEFAULT_CPU_SENSOR)]
    pub cpu_sensor: String,

    /// Sensor name shown as the GPU temperature
    #[arg(long, default_value = DEFAULT_GPU_SENSOR)]
    pub gpu_sensor: String,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Runtime configuration ──────────────────────────────────────────────────────

/// Parameters of the sensor poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub cpu_sensor: String,
    pub gpu_sensor: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            cpu_sensor: DEFAULT_CPU_SENSOR.to_string(),
            gpu_sensor: DEFAULT_GPU_SENSOR.to_string(),
        }
    }
}

/// Parameters of device discovery and display sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub vendor_prefix: String,
    pub baud_rate: u32,
    pub discovery_delay: Duration,
    pub tick_interval: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            vendor_prefix: DEFAULT_VENDOR_PREFIX.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            discovery_delay: Duration::from_millis(1000),
            tick_interval: Duration::from_millis(200),
        }
    }
}

// ── ConfigFile ─────────────────────────────────────────────────────────────────

/// Optional overrides read from `~/.lcd-monitor/config.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baud_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_sensor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_sensor: Option<String>,
}

impl ConfigFile {
    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        Self::path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".lcd-monitor").join("config.json")
    }

    /// Load overrides from `path`.
    ///
    /// A missing file yields no overrides; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| LcdError::Config(format!("{}: {e}", path.display())))?;
        file.validate()?;
        Ok(file)
    }

    /// Atomically write the file, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let zero = [
            ("baud_rate", self.baud_rate.map(u64::from)),
            ("poll_interval_ms", self.poll_interval_ms),
            ("tick_interval_ms", self.tick_interval_ms),
            ("discovery_delay_ms", self.discovery_delay_ms),
        ]
        .into_iter()
        .find(|(_, v)| *v == Some(0));

        match zero {
            Some((name, _)) => Err(LcdError::Config(format!("{name} must be at least 1"))),
            None => Ok(()),
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and merge the config file beneath them.
    pub fn load() -> Result<Self> {
        Self::load_impl(std::env::args_os().collect(), &ConfigFile::default_path())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args(args: Vec<std::ffi::OsString>) -> Result<Self> {
        Self::load_impl(args, &ConfigFile::default_path())
    }

    /// Full implementation; `default_config` is used unless `--config` is given.
    pub fn load_impl(args: Vec<std::ffi::OsString>, default_config: &Path) -> Result<Self> {
        let matches = Settings::command().get_matches_from(args);
        let mut settings = Settings::from_arg_matches(&matches)
            .map_err(|e| LcdError::Config(e.to_string()))?;

        let path = settings
            .config
            .clone()
            .unwrap_or_else(|| default_config.to_path_buf());
        let file = ConfigFile::load_from(&path)?;

        // Explicit command-line values win over the file.
        if !is_arg_explicitly_set(&matches, "vendor_prefix") {
            if let Some(v) = file.vendor_prefix {
                settings.vendor_prefix = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "baud_rate") {
            if let Some(v) = file.baud_rate {
                settings.baud_rate = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "poll_interval_ms") {
            if let Some(v) = file.poll_interval_ms {
                settings.poll_interval_ms = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "tick_interval_ms") {
            if let Some(v) = file.tick_interval_ms {
                settings.tick_interval_ms = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "discovery_delay_ms") {
            if let Some(v) = file.discovery_delay_ms {
                settings.discovery_delay_ms = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "cpu_sensor") {
            if let Some(v) = file.cpu_sensor {
                settings.cpu_sensor = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "gpu_sensor") {
            if let Some(v) = file.gpu_sensor {
                settings.gpu_sensor = v;
            }
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        Ok(settings)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            cpu_sensor: self.cpu_sensor.clone(),
            gpu_sensor: self.gpu_sensor.clone(),
        }
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            vendor_prefix: self.vendor_prefix.clone(),
            baud_rate: self.baud_rate,
            discovery_delay: Duration::from_millis(self.discovery_delay_ms),
            tick_interval: Duration::from_millis(self.tick_interval_ms),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        std::iter::once("lcd-monitor")
            .chain(list.iter().copied())
            .map(Into::into)
            .collect()
    }

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["lcd-monitor"]);

        assert_eq!(settings.vendor_prefix, "Matrix Orbital");
        assert_eq!(settings.baud_rate, 19_200);
        assert_eq!(settings.poll_interval_ms, 1000);
        assert_eq!(settings.tick_interval_ms, 200);
        assert_eq!(settings.discovery_delay_ms, 1000);
        assert_eq!(settings.cpu_sensor, "CPU Package");
        assert_eq!(settings.gpu_sensor, "GPU Core");
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.config.is_none());
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
    }

    #[test]
    fn test_runtime_configs_match_defaults() {
        let settings = Settings::parse_from(["lcd-monitor"]);
        assert_eq!(settings.monitor_config(), MonitorConfig::default());
        assert_eq!(settings.supervisor_config(), SupervisorConfig::default());
    }

    #[test]
    fn test_zero_interval_rejected_by_cli() {
        let result = Settings::try_parse_from(["lcd-monitor", "--poll-interval-ms", "0"]);
        assert!(result.is_err());
    }

    // ── ConfigFile ────────────────────────────────────────────────────────────

    #[test]
    fn test_config_file_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = ConfigFile::path_in(tmp.path());
        let file = ConfigFile {
            vendor_prefix: Some("Acme".to_string()),
            baud_rate: Some(9600),
            cpu_sensor: Some("Tctl".to_string()),
            ..Default::default()
        };

        file.save_to(&path).expect("save");
        let loaded = ConfigFile::load_from(&path).expect("load");

        assert_eq!(loaded, file);
    }

    #[test]
    fn test_config_file_missing_is_default() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = ConfigFile::load_from(&ConfigFile::path_in(tmp.path())).expect("load");
        assert_eq!(loaded, ConfigFile::default());
    }

    #[test]
    fn test_config_file_malformed_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").expect("write");

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(err, LcdError::Config(_)));
    }

    #[test]
    fn test_config_file_zero_interval_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "tick_interval_ms": 0 }"#).expect("write");

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("tick_interval_ms"));
    }

    // ── load_impl merging ─────────────────────────────────────────────────────

    #[test]
    fn test_load_merges_file_values() {
        let tmp = TempDir::new().expect("tempdir");
        let path = ConfigFile::path_in(tmp.path());
        ConfigFile {
            gpu_sensor: Some("amdgpu edge".to_string()),
            discovery_delay_ms: Some(2500),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings = Settings::load_impl(args(&[]), &path).expect("load");
        assert_eq!(settings.gpu_sensor, "amdgpu edge");
        assert_eq!(settings.discovery_delay_ms, 2500);
        assert_eq!(settings.cpu_sensor, "CPU Package");
    }

    #[test]
    fn test_load_cli_overrides_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = ConfigFile::path_in(tmp.path());
        ConfigFile {
            baud_rate: Some(9600),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings =
            Settings::load_impl(args(&["--baud-rate", "57600"]), &path).expect("load");
        assert_eq!(settings.baud_rate, 57_600);
    }

    #[test]
    fn test_load_explicit_config_path() {
        let tmp = TempDir::new().expect("tempdir");
        let custom = tmp.path().join("custom.json");
        ConfigFile {
            vendor_prefix: Some("Crystalfontz".to_string()),
            ..Default::default()
        }
        .save_to(&custom)
        .expect("save");

        let unused_default = tmp.path().join("missing.json");
        let custom_arg = custom.to_string_lossy().to_string();
        let settings =
            Settings::load_impl(args(&["--config", &custom_arg]), &unused_default).expect("load");
        assert_eq!(settings.vendor_prefix, "Crystalfontz");
    }

    #[test]
    fn test_load_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings =
            Settings::load_impl(args(&["--debug"]), &ConfigFile::path_in(tmp.path()))
                .expect("load");
        assert_eq!(settings.log_level, "DEBUG");
    }
}
