//! Test doubles for the device interfaces.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lcd_core::models::SensorReading;
use lcd_core::{LcdError, Result};
use lcd_devices::locator::DeviceLocator;
use lcd_devices::sensors::SensorProvider;
use lcd_devices::transport::{Connector, Transport};

// ── SpyTransport ──────────────────────────────────────────────────────────────

/// Something that happened to a [`SpyTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpyEvent {
    Write(Vec<u8>),
    /// A write that was attempted and failed.
    FailedWrite(Vec<u8>),
    Close,
}

#[derive(Default)]
struct SpyState {
    events: Mutex<Vec<SpyEvent>>,
    lost: AtomicBool,
    closed: AtomicBool,
}

/// Records every write and close. Optionally sleeps after each cursor
/// command, or starts failing after a number of writes.
pub struct SpyTransport {
    name: String,
    state: Arc<SpyState>,
    cursor_delay: Option<Duration>,
    fail_after: Option<usize>,
    open_after_failure: bool,
    writes: usize,
}

/// Inspection side of a [`SpyTransport`].
#[derive(Clone)]
pub struct SpyHandle {
    state: Arc<SpyState>,
}

impl SpyTransport {
    pub fn new(name: &str) -> (Self, SpyHandle) {
        let state = Arc::new(SpyState::default());
        let spy = Self {
            name: name.to_string(),
            state: Arc::clone(&state),
            cursor_delay: None,
            fail_after: None,
            open_after_failure: false,
            writes: 0,
        };
        (spy, SpyHandle { state })
    }

    /// Sleep for `delay` after every cursor command, before its glyph.
    pub fn with_cursor_delay(mut self, delay: Duration) -> Self {
        self.cursor_delay = Some(delay);
        self
    }

    /// Fail every write after the first `writes` succeed. The transport
    /// reports closed from the first failure on.
    pub fn failing_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    /// Like [`SpyTransport::failing_after`], but `is_open` keeps returning
    /// `true`.
    pub fn rejecting_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self.open_after_failure = true;
        self
    }
}

#[async_trait]
impl Transport for SpyTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.is_open() {
            return Err(LcdError::TransportLost(format!("{} is closed", self.name)));
        }
        if self.fail_after.is_some_and(|limit| self.writes >= limit) {
            if !self.open_after_failure {
                self.state.lost.store(true, Ordering::SeqCst);
            }
            self.state.push(SpyEvent::FailedWrite(bytes.to_vec()));
            return Err(LcdError::TransportLost(format!("{}: write failed", self.name)));
        }

        self.writes += 1;
        self.state.push(SpyEvent::Write(bytes.to_vec()));

        if let Some(delay) = self.cursor_delay {
            if bytes.starts_with(&[0xFE, 0x47]) {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.state.lost.load(Ordering::SeqCst) && !self.state.closed.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<()> {
        self.state.closed.store(true, Ordering::SeqCst);
        self.state.push(SpyEvent::Close);
        Ok(())
    }
}

impl SpyState {
    fn push(&self, event: SpyEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

impl SpyHandle {
    pub fn events(&self) -> Vec<SpyEvent> {
        self.state
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SpyEvent::Write(bytes) => Some(bytes),
                SpyEvent::FailedWrite(_) | SpyEvent::Close => None,
            })
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Simulate the device being unplugged.
    pub fn disconnect(&self) {
        self.state.lost.store(true, Ordering::SeqCst);
    }

    /// Wait until at least `count` writes have been recorded.
    pub async fn wait_for_writes(&self, count: usize) {
        while self.writes().len() < count {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }
}

// ── ScriptedProvider ──────────────────────────────────────────────────────────

/// Returns scripted readings in order, then repeats the last step.
/// `None` steps fail the query.
pub struct ScriptedProvider {
    steps: VecDeque<Option<Vec<SensorReading>>>,
    last: Option<Vec<SensorReading>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Option<Vec<SensorReading>>>) -> Self {
        Self {
            steps: steps.into(),
            last: Some(Vec::new()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter of queries made so far.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl SensorProvider for ScriptedProvider {
    fn readings(&mut self) -> Result<Vec<SensorReading>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(step) = self.steps.pop_front() {
            self.last = step;
        }
        self.last
            .clone()
            .ok_or_else(|| LcdError::SensorQuery("scripted failure".to_string()))
    }
}

// ── StaticLocator ─────────────────────────────────────────────────────────────

/// Always reports the same endpoints and descriptors.
pub struct StaticLocator {
    endpoints: Vec<String>,
    descriptors: Vec<String>,
    calls: Arc<AtomicUsize>,
}

impl StaticLocator {
    pub fn new(endpoints: &[&str], descriptors: &[&str]) -> Self {
        Self {
            endpoints: endpoints.iter().map(|s| s.to_string()).collect(),
            descriptors: descriptors.iter().map(|s| s.to_string()).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self::new(&[], &[])
    }

    /// Counter of discovery attempts so far.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl DeviceLocator for StaticLocator {
    fn serial_endpoints(&self) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.endpoints.clone())
    }

    fn descriptors(&self) -> Result<Vec<String>> {
        Ok(self.descriptors.clone())
    }
}

// ── SpyConnector ──────────────────────────────────────────────────────────────

/// Hands out queued transports, one per open; fails once the queue is empty.
#[derive(Default)]
pub struct SpyConnector {
    transports: Mutex<VecDeque<SpyTransport>>,
    opened: Arc<Mutex<Vec<(String, u32)>>>,
    open_delay: Option<Duration>,
}

impl SpyConnector {
    pub fn new(transports: Vec<SpyTransport>) -> Self {
        Self {
            transports: Mutex::new(transports.into()),
            ..Self::default()
        }
    }

    /// Make every open take `delay` before it returns.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    /// Log of `(endpoint, baud rate)` for every open attempt.
    pub fn opened(&self) -> Arc<Mutex<Vec<(String, u32)>>> {
        Arc::clone(&self.opened)
    }
}

#[async_trait]
impl Connector for SpyConnector {
    async fn open(&self, endpoint: &str, baud_rate: u32) -> Result<Box<dyn Transport>> {
        self.opened
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((endpoint.to_string(), baud_rate));

        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .transports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match next {
            Some(spy) => Ok(Box::new(spy)),
            None => Err(LcdError::Open {
                endpoint: endpoint.to_string(),
                reason: "device busy".to_string(),
            }),
        }
    }
}
