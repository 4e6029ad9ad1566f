//! Device discovery and session sequencing.
//!
//! [`ConnectionSupervisor`] owns the process-lifetime [`HardwareMonitor`] and
//! runs at most one [`DisplaySession`] at a time: find the display, open it,
//! render until the session closes, then look again. Everything unwinds from
//! one shared [`CancellationToken`].

use chrono::Local;
use lcd_core::settings::SupervisorConfig;
use lcd_devices::locator::{find_endpoint, DeviceLocator};
use lcd_devices::transport::Connector;
use tokio_util::sync::CancellationToken;

use crate::display::DisplaySession;
use crate::hardware_monitor::{pause, HardwareMonitor};

// ── ConnectionSupervisor ──────────────────────────────────────────────────────

/// Finds the display and keeps a session running on it until shutdown.
pub struct ConnectionSupervisor {
    config: SupervisorConfig,
    monitor: HardwareMonitor,
    locator: Box<dyn DeviceLocator>,
    connector: Box<dyn Connector>,
    cancel: CancellationToken,
}

impl ConnectionSupervisor {
    /// `monitor` should observe the same `cancel` token so that one stop
    /// request unwinds every loop.
    pub fn new(
        config: SupervisorConfig,
        monitor: HardwareMonitor,
        locator: Box<dyn DeviceLocator>,
        connector: Box<dyn Connector>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            monitor,
            locator,
            connector,
            cancel,
        }
    }

    /// Spawn [`ConnectionSupervisor::run`] and return a handle to stop it.
    pub fn start(self) -> SupervisorHandle {
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(self.run());
        SupervisorHandle { cancel, handle }
    }

    /// Discover, render, repeat until the cancellation token fires.
    ///
    /// Returns only after the active session (if any) has closed its
    /// transport and the sensor poll loop has exited.
    pub async fn run(self) {
        tracing::info!(at = %Local::now().to_rfc3339(), "supervisor running");

        while !self.cancel.is_cancelled() {
            let Some(endpoint) = self.discover() else {
                if !pause(&self.cancel, self.config.discovery_delay).await {
                    break;
                }
                continue;
            };

            let opened = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                opened = self.connector.open(&endpoint, self.config.baud_rate) => opened,
            };
            let mut transport = match opened {
                Ok(transport) => transport,
                Err(e) => {
                    tracing::warn!(%endpoint, error = %e, "failed to open display");
                    if !pause(&self.cancel, self.config.discovery_delay).await {
                        break;
                    }
                    continue;
                }
            };

            if self.cancel.is_cancelled() {
                if let Err(e) = transport.close().await {
                    tracing::warn!(%endpoint, error = %e, "failed to close transport");
                }
                break;
            }

            tracing::info!(%endpoint, baud_rate = self.config.baud_rate, "port opened");
            let session = DisplaySession::new(transport, &self.monitor, self.config.tick_interval);
            let end = session.run(&self.cancel).await;
            tracing::info!(%endpoint, %end, "port lost");
        }

        self.monitor.shutdown().await;
        tracing::info!("supervisor stopped");
    }

    /// Ask the locator for the display. Enumeration failures count as absence.
    fn discover(&self) -> Option<String> {
        match find_endpoint(self.locator.as_ref(), &self.config.vendor_prefix) {
            Ok(Some(endpoint)) => Some(endpoint),
            Ok(None) => {
                tracing::debug!(vendor = %self.config.vendor_prefix, "no display attached");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "device enumeration failed");
                None
            }
        }
    }
}

// ── SupervisorHandle ──────────────────────────────────────────────────────────

/// A handle to a running supervisor task.
pub struct SupervisorHandle {
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl SupervisorHandle {
    /// Signal shutdown and wait until every loop has unwound.
    pub async fn stop(self) {
        self.cancel.cancel();
        self.wait().await;
    }

    /// Wait for the supervisor to finish without signalling it.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "supervisor task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
