use thiserror::Error;

/// All errors produced by the LCD monitor.
#[derive(Error, Debug)]
pub enum LcdError {
    /// No sensor provider or device locator exists for the running environment.
    #[error("Platform not supported: {0}")]
    PlatformUnsupported(String),

    /// The sensor provider failed to produce a set of readings.
    #[error("Sensor query failed: {0}")]
    SensorQuery(String),

    /// A write to the display failed or the transport reported closed.
    #[error("Transport lost: {0}")]
    TransportLost(String),

    /// The device locator could not enumerate serial endpoints.
    #[error("Device enumeration failed: {0}")]
    DeviceEnumeration(String),

    /// A discovered endpoint could not be opened.
    #[error("Failed to open {endpoint}: {reason}")]
    Open { endpoint: String, reason: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the LCD monitor crates.
pub type Result<T> = std::result::Result<T, LcdError>;
