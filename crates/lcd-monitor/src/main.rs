mod bootstrap;

use anyhow::Result;
use lcd_core::settings::Settings;
use lcd_devices::serial::{SerialConnector, SerialPortLocator};
use lcd_runtime::hardware_monitor::HardwareMonitor;
use lcd_runtime::supervisor::ConnectionSupervisor;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("LCD Monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Vendor: {}, Baud: {}, Sensors: {} / {}",
        settings.vendor_prefix,
        settings.baud_rate,
        settings.cpu_sensor,
        settings.gpu_sensor
    );

    let cancel = CancellationToken::new();

    // Fatal when the platform has no sensor provider.
    let monitor = HardwareMonitor::start(settings.monitor_config(), cancel.clone())?;

    let supervisor = ConnectionSupervisor::new(
        settings.supervisor_config(),
        monitor,
        Box::new(SerialPortLocator),
        Box::new(SerialConnector),
        cancel,
    );
    let handle = supervisor.start();

    bootstrap::shutdown_signal().await;
    tracing::info!("stop requested; waiting for the display session to close");

    // Returns once the transport has been released.
    handle.stop().await;

    Ok(())
}
