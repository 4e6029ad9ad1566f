//! Background sensor polling with change notification.
//!
//! [`HardwareMonitor`] queries a [`SensorProvider`] on a fixed interval and
//! keeps the latest CPU and GPU temperature lists. Subscribers are told which
//! category changed; they never see raw readings. Each list is an immutable
//! `Arc<Vec<i32>>` swapped in whole, so readers always observe a complete
//! list no matter where the poll loop is.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use arc_swap::ArcSwap;
use lcd_core::models::{Category, TemperatureSnapshot};
use lcd_core::settings::MonitorConfig;
use lcd_core::Result;
use lcd_devices::sensors::{SensorProvider, SysinfoProvider};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Notifications buffered per subscriber before it starts lagging.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

// ── Temperatures ──────────────────────────────────────────────────────────────

/// Latest published lists, one per category.
#[derive(Default)]
struct Temperatures {
    cpu: ArcSwap<Vec<i32>>,
    gpu: ArcSwap<Vec<i32>>,
}

impl Temperatures {
    fn slot(&self, category: Category) -> &ArcSwap<Vec<i32>> {
        match category {
            Category::Cpu => &self.cpu,
            Category::Gpu => &self.gpu,
        }
    }

    /// Store every category whose list differs from the current one and
    /// return the categories that changed.
    fn apply(&self, snapshot: &TemperatureSnapshot) -> Vec<Category> {
        [Category::Cpu, Category::Gpu]
            .into_iter()
            .filter(|&category| {
                let slot = self.slot(category);
                let fresh = snapshot.category(category);
                if slot.load().as_slice() == fresh {
                    return false;
                }
                slot.store(Arc::new(fresh.to_vec()));
                true
            })
            .collect()
    }
}

// ── HardwareMonitor ───────────────────────────────────────────────────────────

/// Process-lifetime temperature poller.
pub struct HardwareMonitor {
    temperatures: Arc<Temperatures>,
    changes: broadcast::Sender<Category>,
    handle: JoinHandle<()>,
}

impl HardwareMonitor {
    /// Start polling the platform's sensors.
    ///
    /// Fails with [`lcd_core::LcdError::PlatformUnsupported`] when no sensor
    /// provider exists for this environment.
    pub fn start(config: MonitorConfig, cancel: CancellationToken) -> Result<Self> {
        let provider = SysinfoProvider::new()?;
        Ok(Self::with_provider(Box::new(provider), config, cancel))
    }

    /// Start polling `provider`. Must be called within a tokio runtime.
    ///
    /// The poll loop runs until `cancel` fires.
    pub fn with_provider(
        provider: Box<dyn SensorProvider>,
        config: MonitorConfig,
        cancel: CancellationToken,
    ) -> Self {
        let temperatures = Arc::new(Temperatures::default());
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        let poller = Poller {
            provider: Arc::new(Mutex::new(provider)),
            config,
            temperatures: Arc::clone(&temperatures),
            changes: changes.clone(),
        };
        let handle = tokio::spawn(poller.run(cancel));

        Self {
            temperatures,
            changes,
            handle,
        }
    }

    /// Latest CPU temperatures, in provider order.
    pub fn cpu_temps(&self) -> Arc<Vec<i32>> {
        self.temperatures.cpu.load_full()
    }

    /// Latest GPU temperatures, in provider order.
    pub fn gpu_temps(&self) -> Arc<Vec<i32>> {
        self.temperatures.gpu.load_full()
    }

    /// Receive a [`Category`] each time that category's list changes.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<Category> {
        self.changes.subscribe()
    }

    /// Wait for the poll loop to exit. The loop only exits once the
    /// cancellation token passed at construction has fired.
    pub async fn shutdown(self) {
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "sensor poll task ended abnormally");
        }
    }

    /// Replace the stored lists with `snapshot` and notify subscribers of
    /// the categories that changed.
    #[cfg(test)]
    pub(crate) fn publish(&self, snapshot: TemperatureSnapshot) -> Vec<Category> {
        publish(&self.temperatures, &self.changes, snapshot)
    }
}

fn publish(
    temperatures: &Temperatures,
    changes: &broadcast::Sender<Category>,
    snapshot: TemperatureSnapshot,
) -> Vec<Category> {
    let changed = temperatures.apply(&snapshot);
    for &category in &changed {
        tracing::debug!(%category, "temperatures changed");
        // No subscribers is fine; nobody is rendering right now.
        let _ = changes.send(category);
    }
    changed
}

// ── Poll loop ─────────────────────────────────────────────────────────────────

struct Poller {
    provider: Arc<Mutex<Box<dyn SensorProvider>>>,
    config: MonitorConfig,
    temperatures: Arc<Temperatures>,
    changes: broadcast::Sender<Category>,
}

impl Poller {
    async fn run(self, cancel: CancellationToken) {
        tracing::debug!(interval = ?self.config.poll_interval, "sensor poll loop started");

        loop {
            let query = tokio::select! {
                _ = cancel.cancelled() => break,
                query = self.query() => query,
            };

            match query {
                Ok(snapshot) => {
                    publish(&self.temperatures, &self.changes, snapshot);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "sensor query failed; keeping previous temperatures");
                }
            }

            if !pause(&cancel, self.config.poll_interval).await {
                break;
            }
        }

        tracing::debug!("sensor poll loop stopped");
    }

    /// Run the provider off the async executor and partition its readings.
    async fn query(&self) -> std::result::Result<TemperatureSnapshot, String> {
        let provider = Arc::clone(&self.provider);
        let readings = tokio::task::spawn_blocking(move || {
            let mut provider = provider.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            provider.readings()
        })
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())?;

        Ok(TemperatureSnapshot::from_readings(
            &readings,
            &self.config.cpu_sensor,
            &self.config.gpu_sensor,
        ))
    }
}

/// Sleep for `delay`; `false` when cancelled first.
pub(crate) async fn pause(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
