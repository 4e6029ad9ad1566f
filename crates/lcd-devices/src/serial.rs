//! Serial-port backends for device discovery and the display transport.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use lcd_core::{LcdError, Result};
use serialport::{SerialPort, SerialPortInfo, SerialPortType};

use crate::locator::DeviceLocator;
use crate::transport::{Connector, Transport};

/// Upper bound on a single blocking write before the device is considered gone.
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

// ── SerialPortLocator ─────────────────────────────────────────────────────────

/// Enumerates serial ports through the OS.
///
/// USB ports are described as `"<manufacturer> <product> (<port>)"`, which
/// is the form device managers show. Ports without USB metadata have no
/// descriptor and can never be selected.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialPortLocator;

impl SerialPortLocator {
    fn ports() -> Result<Vec<SerialPortInfo>> {
        serialport::available_ports().map_err(|e| LcdError::DeviceEnumeration(e.to_string()))
    }
}

impl DeviceLocator for SerialPortLocator {
    fn serial_endpoints(&self) -> Result<Vec<String>> {
        Ok(Self::ports()?.into_iter().map(|p| p.port_name).collect())
    }

    fn descriptors(&self) -> Result<Vec<String>> {
        Ok(Self::ports()?.iter().filter_map(describe).collect())
    }
}

fn describe(port: &SerialPortInfo) -> Option<String> {
    let SerialPortType::UsbPort(usb) = &port.port_type else {
        return None;
    };
    let label = [usb.manufacturer.as_deref(), usb.product.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if label.is_empty() {
        return None;
    }
    Some(format!("{label} ({})", port.port_name))
}

// ── SerialConnector ───────────────────────────────────────────────────────────

/// Opens [`SerialTransport`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

#[async_trait]
impl Connector for SerialConnector {
    async fn open(&self, endpoint: &str, baud_rate: u32) -> Result<Box<dyn Transport>> {
        let path = endpoint.to_string();
        let port = tokio::task::spawn_blocking(move || {
            serialport::new(path, baud_rate).timeout(WRITE_TIMEOUT).open()
        })
        .await
        .map_err(|e| open_failed(endpoint, e))?
        .map_err(|e| open_failed(endpoint, e))?;
        Ok(Box::new(SerialTransport::new(endpoint, port)))
    }
}

fn open_failed(endpoint: &str, reason: impl std::fmt::Display) -> LcdError {
    LcdError::Open {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    }
}

// ── SerialTransport ───────────────────────────────────────────────────────────

type SharedPort = Arc<Mutex<Box<dyn SerialPort>>>;

/// A display connected over a serial port.
///
/// Port I/O runs on the blocking pool. Writes are not flushed: a flush
/// waits for the line to drain and ignores the port timeout.
pub struct SerialTransport {
    name: String,
    port: Option<SharedPort>,
}

impl SerialTransport {
    pub fn new(name: impl Into<String>, port: Box<dyn SerialPort>) -> Self {
        Self {
            name: name.into(),
            port: Some(Arc::new(Mutex::new(port))),
        }
    }
}

fn lock(port: &SharedPort) -> MutexGuard<'_, Box<dyn SerialPort>> {
    port.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Transport for SerialTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let Some(port) = self.port.clone() else {
            return Err(LcdError::TransportLost(format!("{} is closed", self.name)));
        };
        let bytes = bytes.to_vec();
        let written = tokio::task::spawn_blocking(move || lock(&port).write_all(&bytes))
            .await
            .unwrap_or_else(|e| Err(io::Error::other(e)));
        if let Err(e) = written {
            // Drop the handle so `is_open` reports the loss.
            self.port = None;
            return Err(LcdError::TransportLost(format!("{}: {e}", self.name)));
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        // Querying the input queue fails once the OS has removed the device.
        self.port
            .as_ref()
            .is_some_and(|port| lock(port).bytes_to_read().is_ok())
    }

    async fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            tracing::debug!(endpoint = %self.name, "serial port closed");
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
