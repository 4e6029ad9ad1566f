//! The byte-level connection to the display and how one is opened.

use async_trait::async_trait;
use lcd_core::Result;

/// An open, ordered, byte-oriented connection to a display.
#[async_trait]
pub trait Transport: Send {
    /// Endpoint identifier, for logging.
    fn name(&self) -> &str;

    /// Write all of `bytes`. A failure means the device is gone.
    async fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// `false` once the connection has been closed or lost.
    fn is_open(&self) -> bool;

    /// Release the connection. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Opens a [`Transport`] for a discovered endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, endpoint: &str, baud_rate: u32) -> Result<Box<dyn Transport>>;
}
