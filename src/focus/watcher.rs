use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::info;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::provider::FocusProvider;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

const DESKTOP_PROCESSES: [&str; 4] = ["Finder", "Dock", "SystemUIServer", "loginwindow"];

/// Foreground names that mean "the user clicked the desktop" rather than
/// switching to another application.
pub fn is_desktop_process(app_name: &str) -> bool {
    DESKTOP_PROCESSES.contains(&app_name)
}

struct ActiveWatch {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Polls the focus provider and reports foreground-application changes.
pub struct FocusWatcher {
    provider: Arc<dyn FocusProvider>,
    interval: Duration,
    runtime: Handle,
    active: Mutex<Option<ActiveWatch>>,
}

impl FocusWatcher {
    pub fn new(provider: Arc<dyn FocusProvider>, interval: Duration, runtime: Handle) -> Self {
        Self {
            provider,
            interval,
            runtime,
            active: Mutex::new(None),
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveWatch>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.active().is_some()
    }

    /// Starts polling. Returns false when already running or when the
    /// platform cannot report the foreground application.
    pub fn start<F>(&self, on_change: F) -> bool
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let mut active = self.active();
        if active.is_some() {
            return false;
        }
        if !self.provider.is_supported() {
            info!("Focus watching not available on this platform");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = self.runtime.spawn(watch_loop(
            Arc::clone(&self.provider),
            self.interval,
            cancel.clone(),
            on_change,
        ));
        *active = Some(ActiveWatch { cancel, handle });
        info!("Focus watcher started ({}ms interval)", self.interval.as_millis());
        true
    }

    pub fn stop(&self) {
        if let Some(watch) = self.active().take() {
            watch.cancel.cancel();
            watch.handle.abort();
            info!("Focus watcher stopped");
        }
    }
}

impl Drop for FocusWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn watch_loop<F>(
    provider: Arc<dyn FocusProvider>,
    interval: Duration,
    cancel: CancellationToken,
    on_change: F,
) where
    F: Fn(String) + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_seen: Option<String> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(name) = provider.frontmost_app().await else {
                    continue;
                };
                if name.is_empty() || last_seen.as_deref() == Some(name.as_str()) {
                    continue;
                }
                last_seen = Some(name.clone());
                on_change(name);
            }
            _ = cancel.cancelled() => {
                break;
            }
        }
    }
}
