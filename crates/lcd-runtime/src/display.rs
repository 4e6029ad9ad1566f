//! One display session: a transport, two text lines, and the loops that
//! keep them current.
//!
//! A session walks `Opening → Active → Closing → Closed` exactly once.
//! While active, a clock tick rewrites the top line and every temperature
//! change notification rewrites the bottom line. Both paths go through the
//! same [`Screen`] lock, which is held for a whole line update, so a cell's
//! cursor move and its glyph are never separated by another write.

use std::fmt;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use lcd_core::formatting::{clock_text, temperature_text};
use lcd_core::models::Category;
use lcd_core::protocol::{glyph_byte, Command, Row};
use lcd_core::text_line::TextLine;
use lcd_core::{LcdError, Result};
use lcd_devices::transport::Transport;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::hardware_monitor::HardwareMonitor;

/// Source of the local wall-clock time shown on the top line.
pub type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

// ── Public types ──────────────────────────────────────────────────────────────

/// Why a session reached `Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The shutdown signal fired.
    Shutdown,
    /// The transport reported closed or a write failed.
    TransportLost(String),
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::Shutdown => write!(f, "shutdown"),
            SessionEnd::TransportLost(reason) => write!(f, "transport lost: {reason}"),
        }
    }
}

/// Lifecycle phase of a [`DisplaySession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Opening,
    Active,
    Closing,
    Closed,
}

// ── Screen ────────────────────────────────────────────────────────────────────

/// The transport together with what is currently drawn on it.
struct Screen {
    transport: Box<dyn Transport>,
    lines: [TextLine; 2],
}

impl Screen {
    async fn send(&mut self, command: Command) -> Result<()> {
        self.transport.write(&command.encode()).await
    }

    /// Assign `text` to `row`, writing only the cells that changed.
    async fn set_line(&mut self, row: Row, text: String) -> Result<()> {
        let cells = self.lines[row.index()].set(text);
        for cell in cells {
            self.send(Command::SetCursor {
                column: cell.cursor_column(),
                row,
            })
            .await?;
            self.transport.write(&[glyph_byte(cell.glyph)]).await?;
        }
        Ok(())
    }
}

// ── DisplaySession ────────────────────────────────────────────────────────────

/// Renders clock and temperatures onto one transport until it is lost or
/// shutdown is signalled.
pub struct DisplaySession<'a> {
    endpoint: String,
    screen: Mutex<Screen>,
    monitor: &'a HardwareMonitor,
    tick_interval: Duration,
    clock: Clock,
    state: SessionState,
}

impl<'a> DisplaySession<'a> {
    /// Bind a session to `transport`. Nothing is written until [`run`].
    ///
    /// [`run`]: DisplaySession::run
    pub fn new(
        transport: Box<dyn Transport>,
        monitor: &'a HardwareMonitor,
        tick_interval: Duration,
    ) -> Self {
        Self {
            endpoint: transport.name().to_string(),
            screen: Mutex::new(Screen {
                transport,
                lines: [TextLine::new(), TextLine::new()],
            }),
            monitor,
            tick_interval,
            clock: Box::new(|| Local::now().naive_local()),
            state: SessionState::Opening,
        }
    }

    /// Replace the wall clock, e.g. with a fixed instant.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session from `Opening` to `Closed`.
    ///
    /// The transport is always closed before this returns, whatever ended
    /// the session. If `cancel` has already fired, nothing is written.
    pub async fn run(mut self, cancel: &CancellationToken) -> SessionEnd {
        let (end, drawn) = if cancel.is_cancelled() {
            (SessionEnd::Shutdown, false)
        } else {
            // Subscribe before the first temperature line is drawn so no
            // change slips between reading the snapshot and listening.
            let changes = self.monitor.subscribe();
            let end = match self.open().await {
                Ok(()) => {
                    self.advance(SessionState::Active);
                    self.active(changes, cancel).await
                }
                Err(e) => {
                    drop(changes);
                    SessionEnd::TransportLost(e.to_string())
                }
            };
            (end, true)
        };

        self.advance(SessionState::Closing);
        self.close(drawn).await;
        self.advance(SessionState::Closed);

        tracing::debug!(endpoint = %self.endpoint, %end, "display session closed");
        end
    }

    // ── Phases ────────────────────────────────────────────────────────────

    async fn open(&mut self) -> Result<()> {
        let top = (self.clock)();
        let bottom = self.temperature_text();
        let screen = self.screen.get_mut();

        screen.send(Command::ClearScreen).await?;
        screen.send(Command::PowerOn { timeout_minutes: 0 }).await?;
        screen.set_line(Row::Top, clock_text(&top)).await?;
        screen.set_line(Row::Bottom, bottom).await?;
        Ok(())
    }

    /// Run the tick and notification loops until either ends.
    async fn active(
        &self,
        mut changes: broadcast::Receiver<Category>,
        cancel: &CancellationToken,
    ) -> SessionEnd {
        let stop = cancel.child_token();
        let (ticks, temps) = tokio::join!(
            self.tick_loop(&stop),
            self.temperature_loop(&mut changes, &stop)
        );
        // Unsubscribe before the closing writes.
        drop(changes);

        match ticks.and(temps) {
            Ok(()) => SessionEnd::Shutdown,
            Err(e) => SessionEnd::TransportLost(e.to_string()),
        }
    }

    /// Power the display off if asked and still reachable, then release the
    /// transport regardless.
    async fn close(&mut self, power_off: bool) {
        let screen = self.screen.get_mut();
        if power_off && screen.transport.is_open() {
            if let Err(e) = screen.send(Command::PowerOff).await {
                tracing::debug!(endpoint = %self.endpoint, error = %e, "power-off failed");
            }
        }
        if let Err(e) = screen.transport.close().await {
            tracing::warn!(endpoint = %self.endpoint, error = %e, "failed to close transport");
        }
    }

    // ── Active loops ──────────────────────────────────────────────────────

    /// Refresh the clock line every tick. `Ok` when stopped from outside.
    async fn tick_loop(&self, stop: &CancellationToken) -> Result<()> {
        let mut ticker = time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the line was drawn on open.
        ticker.tick().await;

        let result = loop {
            tokio::select! {
                _ = stop.cancelled() => break Ok(()),
                _ = ticker.tick() => {}
            }

            let mut screen = self.screen.lock().await;
            if !screen.transport.is_open() {
                break Err(LcdError::TransportLost(format!(
                    "{} reported closed",
                    self.endpoint
                )));
            }
            let text = clock_text(&(self.clock)());
            if let Err(e) = screen.set_line(Row::Top, text).await {
                break Err(e);
            }
        };

        stop.cancel();
        result
    }

    /// Redraw the temperature line on every change notification.
    async fn temperature_loop(
        &self,
        changes: &mut broadcast::Receiver<Category>,
        stop: &CancellationToken,
    ) -> Result<()> {
        let result = loop {
            let received = tokio::select! {
                _ = stop.cancelled() => break Ok(()),
                received = changes.recv() => received,
            };

            match received {
                Ok(category) => tracing::trace!(%category, "redrawing temperatures"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "temperature notifications lagged; redrawing");
                }
                Err(RecvError::Closed) => {
                    // The monitor only goes away at shutdown.
                    stop.cancelled().await;
                    break Ok(());
                }
            }

            let text = self.temperature_text();
            if let Err(e) = self.screen.lock().await.set_line(Row::Bottom, text).await {
                break Err(e);
            }
        };

        stop.cancel();
        result
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn temperature_text(&self) -> String {
        temperature_text(&self.monitor.cpu_temps(), &self.monitor.gpu_temps())
    }

    fn advance(&mut self, next: SessionState) {
        debug_assert!(next > self.state, "session state cannot move backwards");
        tracing::trace!(endpoint = %self.endpoint, from = ?self.state, to = ?next, "session state");
        self.state = next;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
