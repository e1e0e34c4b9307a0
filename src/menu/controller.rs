use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use tokio::runtime::Handle;

use crate::events::PetEvent;
use crate::pause::PauseAggregator;
use crate::windows::WindowRegistry;

use super::model::{ContextMenuModel, MenuAction};

/// Delay before the follow-up pause broadcast that trails every menu action.
pub const REBROADCAST_DELAY: Duration = Duration::from_millis(50);

/// Native context menu over the pet window.
///
/// Each popup is a numbered session. The session is released exactly once,
/// by whichever comes first: an item click, the popup returning, a popup
/// error, or an unwind through `show`.
pub struct ContextMenu {
    registry: Arc<WindowRegistry>,
    pause: Arc<PauseAggregator>,
    runtime: Handle,
    open_session: Mutex<Option<u64>>,
    next_session: AtomicU64,
}

struct MenuSession<'a> {
    menu: &'a ContextMenu,
    id: u64,
}

impl Drop for MenuSession<'_> {
    fn drop(&mut self) {
        if self.menu.release(Some(self.id)) {
            debug!("context menu session {} closed without a selection", self.id);
        }
    }
}

impl ContextMenu {
    pub fn new(registry: Arc<WindowRegistry>, pause: Arc<PauseAggregator>, runtime: Handle) -> Self {
        Self {
            registry,
            pause,
            runtime,
            open_session: Mutex::new(None),
            next_session: AtomicU64::new(0),
        }
    }

    fn session(&self) -> MutexGuard<'_, Option<u64>> {
        self.open_session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_open(&self) -> bool {
        self.session().is_some()
    }

    /// Builds the menu from current state and pops it over the pet.
    ///
    /// menu-open lasts until the native popup call returns. On macOS and
    /// Windows that is when the menu is dismissed. GTK returns immediately,
    /// so on Linux the session is released while the menu is still on screen
    /// and the pet is not paused for it.
    pub fn show(&self) -> Result<()> {
        let session = self.begin();
        let model =
            ContextMenuModel::build(self.pause.manual_pause() || self.registry.refresh_any_window_open());
        self.registry.popup_menu_on_pet(&model)?;
        drop(session);
        Ok(())
    }

    fn begin(&self) -> MenuSession<'_> {
        let id = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;
        let mut open = self.session();
        *open = Some(id);
        self.pause.set_menu_open(true);
        MenuSession { menu: self, id }
    }

    /// Clears menu-open for `session` (or whatever session is open when
    /// `None`). Returns false when that session was already released.
    fn release(&self, session: Option<u64>) -> bool {
        let mut open = self.session();
        let matches = match (session, *open) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(wanted), Some(current)) => wanted == current,
        };
        if !matches {
            return false;
        }
        *open = None;
        self.pause.set_menu_open(false);
        self.registry.emit_to_pet(&PetEvent::ContextMenuClosed);
        true
    }

    pub fn handle_action(&self, action: MenuAction) {
        info!("Context menu action: {}", action.id());
        self.release(None);

        match action {
            MenuAction::OpenChat => {
                self.registry.toggle_chat_window();
                self.pause.recompute_and_broadcast();
                self.registry.emit_to_pet(&PetEvent::PetBounce);
            }
            MenuAction::OpenInstachat => {
                self.registry.toggle_instachat_window();
                self.pause.recompute_and_broadcast();
                self.registry.emit_to_pet(&PetEvent::PetBounce);
            }
            MenuAction::TogglePause => self.toggle_pause(),
        }

        self.schedule_rebroadcast();
    }

    fn toggle_pause(&self) {
        if self.registry.refresh_any_window_open() {
            // Escape hatch: close every popup and drop any manual pause.
            self.registry.hide_popups();
            self.pause.set_manual_pause(false);
            self.registry.emit_to_pet(&PetEvent::ForceResumeMovement);
            return;
        }

        let paused = !self.pause.manual_pause();
        self.pause.set_manual_pause(paused);
        let cue = if paused {
            PetEvent::TogglePermanentPause(true)
        } else {
            PetEvent::ForceResumeMovement
        };
        self.registry.emit_to_pet(&cue);
    }

    fn schedule_rebroadcast(&self) {
        let pause = Arc::clone(&self.pause);
        self.runtime.spawn(async move {
            tokio::time::sleep(REBROADCAST_DELAY).await;
            pause.recompute_and_broadcast();
        });
    }
}
