use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use serde::Serialize;

use crate::events::PetEvent;
use crate::windows::WindowRegistry;

/// The independently owned pause triggers. Popup visibility is read from the
/// registry at recompute time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseSignals {
    pub manual_pause: bool,
    pub menu_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseSnapshot {
    pub manual_pause: bool,
    pub menu_open: bool,
    pub any_window_open: bool,
    pub paused: bool,
}

/// Folds manual pause, menu-open and popup visibility into the single
/// `update-pause-state` flag the pet window reacts to.
///
/// Mutation and broadcast happen under one lock, so broadcasts leave in the
/// same order as the changes that caused them.
pub struct PauseAggregator {
    registry: Arc<WindowRegistry>,
    signals: Mutex<PauseSignals>,
}

impl PauseAggregator {
    pub fn new(registry: Arc<WindowRegistry>) -> Self {
        Self {
            registry,
            signals: Mutex::new(PauseSignals::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PauseSignals> {
        self.signals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_manual_pause(&self, paused: bool) -> bool {
        let mut signals = self.lock();
        signals.manual_pause = paused;
        self.broadcast(&signals)
    }

    pub fn set_menu_open(&self, open: bool) -> bool {
        let mut signals = self.lock();
        signals.menu_open = open;
        self.broadcast(&signals)
    }

    /// Re-reads every signal and sends the derived flag, changed or not.
    pub fn recompute_and_broadcast(&self) -> bool {
        let signals = self.lock();
        self.broadcast(&signals)
    }

    pub fn manual_pause(&self) -> bool {
        self.lock().manual_pause
    }

    pub fn menu_open(&self) -> bool {
        self.lock().menu_open
    }

    pub fn snapshot(&self) -> PauseSnapshot {
        let signals = *self.lock();
        let any_window_open = self.registry.is_any_window_open();
        PauseSnapshot {
            manual_pause: signals.manual_pause,
            menu_open: signals.menu_open,
            any_window_open,
            paused: signals.manual_pause || signals.menu_open || any_window_open,
        }
    }

    fn broadcast(&self, signals: &PauseSignals) -> bool {
        let paused =
            signals.manual_pause || signals.menu_open || self.registry.is_any_window_open();
        debug!(
            "pause state: manual={} menu={} popups={} -> {paused}",
            signals.manual_pause,
            signals.menu_open,
            self.registry.is_any_window_open()
        );
        self.registry.emit_to_pet(&PetEvent::UpdatePauseState(paused));
        paused
    }
}
