use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{anyhow, Result};
use log::{debug, info, warn};

use crate::events::PetEvent;
use crate::menu::ContextMenuModel;

use super::backend::WindowBackend;
use super::geometry::{
    is_on_any_display, safe_position, to_physical, DisplaySnapshot, Position, PET_SIZE,
};
use super::kind::WindowKind;

/// What a toggle call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Shown,
    Focused,
    Hidden,
    /// The window is absent or destroyed; nothing happened.
    Unavailable,
}

/// Whether a native close request should go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    Allow,
    Prevent,
}

/// Single owner of the managed windows and their geometry.
///
/// Every mutation first checks that the target window is alive and silently
/// does nothing otherwise. Native failures are logged, never raised.
pub struct WindowRegistry {
    backend: Arc<dyn WindowBackend>,
    any_window_open: AtomicBool,
}

impl WindowRegistry {
    pub fn new(backend: Arc<dyn WindowBackend>) -> Self {
        Self {
            backend,
            any_window_open: AtomicBool::new(false),
        }
    }

    pub fn create_pet_window(&self) -> Result<()> {
        self.create(WindowKind::Pet)?;

        #[cfg(target_os = "macos")]
        {
            self.logged(
                WindowKind::Pet,
                "set_visible_on_all_workspaces",
                self.backend
                    .set_visible_on_all_workspaces(WindowKind::Pet, true),
            );
        }

        self.logged(
            WindowKind::Pet,
            "focus",
            self.backend.focus(WindowKind::Pet),
        );
        Ok(())
    }

    pub fn create_chat_window(&self) -> Result<()> {
        self.create(WindowKind::Chat)
    }

    pub fn create_instachat_window(&self) -> Result<()> {
        self.create(WindowKind::Instachat)
    }

    /// Creates the info window on first use; later calls bring the existing
    /// one forward.
    pub fn create_info_window(&self) -> Result<()> {
        if !self.backend.is_alive(WindowKind::Info) {
            self.create(WindowKind::Info)?;
        }
        self.show(WindowKind::Info);
        self.focus(WindowKind::Info);
        Ok(())
    }

    fn create(&self, kind: WindowKind) -> Result<()> {
        if self.backend.is_alive(kind) {
            debug!("{} window already exists", kind.label());
            return Ok(());
        }
        self.backend
            .create(&kind.spec())
            .map_err(|err| anyhow!("failed to create {} window: {err}", kind.label()))?;
        info!("Created {} window", kind.label());
        Ok(())
    }

    pub fn is_alive(&self, kind: WindowKind) -> bool {
        self.backend.is_alive(kind)
    }

    pub fn is_visible(&self, kind: WindowKind) -> bool {
        self.backend.is_alive(kind)
            && self
                .logged(kind, "is_visible", self.backend.is_visible(kind))
                .unwrap_or(false)
    }

    pub fn is_focused(&self, kind: WindowKind) -> bool {
        self.backend.is_alive(kind)
            && self
                .logged(kind, "is_focused", self.backend.is_focused(kind))
                .unwrap_or(false)
    }

    /// Shows `kind`, hiding its exclusive sibling first.
    pub fn show(&self, kind: WindowKind) {
        if !self.backend.is_alive(kind) {
            return;
        }
        if let Some(sibling) = kind.exclusive_sibling() {
            if self.is_visible(sibling) {
                self.logged(sibling, "hide", self.backend.hide(sibling));
            }
        }
        self.logged(kind, "show", self.backend.show(kind));
        self.refresh_any_window_open();
    }

    pub fn hide(&self, kind: WindowKind) {
        if !self.backend.is_alive(kind) {
            return;
        }
        self.logged(kind, "hide", self.backend.hide(kind));
        self.refresh_any_window_open();
    }

    pub fn focus(&self, kind: WindowKind) {
        if !self.backend.is_alive(kind) {
            return;
        }
        self.logged(kind, "focus", self.backend.focus(kind));
    }

    pub fn hide_popups(&self) {
        for kind in [WindowKind::Chat, WindowKind::Instachat] {
            if self.is_visible(kind) {
                self.hide(kind);
            }
        }
        self.refresh_any_window_open();
    }

    /// hidden → shown, visible but unfocused → focused, focused → hidden.
    pub fn toggle(&self, kind: WindowKind) -> ToggleOutcome {
        if !self.backend.is_alive(kind) {
            return ToggleOutcome::Unavailable;
        }

        if self.is_visible(kind) {
            if self.is_focused(kind) {
                self.hide(kind);
                ToggleOutcome::Hidden
            } else {
                self.focus(kind);
                ToggleOutcome::Focused
            }
        } else {
            self.place_before_show(kind);
            self.show(kind);
            ToggleOutcome::Shown
        }
    }

    pub fn toggle_chat_window(&self) -> ToggleOutcome {
        self.toggle(WindowKind::Chat)
    }

    pub fn toggle_instachat_window(&self) -> ToggleOutcome {
        self.toggle(WindowKind::Instachat)
    }

    /// Same state machine as the popups, but a closed info window is
    /// recreated instead of being treated as unavailable.
    pub fn toggle_info_window(&self) -> ToggleOutcome {
        if !self.backend.is_alive(WindowKind::Info) {
            return match self.create_info_window() {
                Ok(()) => ToggleOutcome::Shown,
                Err(err) => {
                    warn!("Info window unavailable: {err:#}");
                    ToggleOutcome::Unavailable
                }
            };
        }
        if !self.is_visible(WindowKind::Info) {
            let outcome = self.toggle(WindowKind::Info);
            self.focus(WindowKind::Info);
            return outcome;
        }
        self.toggle(WindowKind::Info)
    }

    /// Anchors instachat to the pet and brings it up, hiding chat.
    pub fn show_instachat_at_pet(&self) {
        if !self.backend.is_alive(WindowKind::Pet) || !self.backend.is_alive(WindowKind::Instachat)
        {
            return;
        }
        self.anchor_instachat();
        if self.is_visible(WindowKind::Instachat) {
            if self.is_visible(WindowKind::Chat) {
                self.hide(WindowKind::Chat);
            }
            self.focus(WindowKind::Instachat);
        } else {
            self.show(WindowKind::Instachat);
        }
    }

    fn place_before_show(&self, kind: WindowKind) {
        match kind {
            WindowKind::Chat => self.center_chat(),
            WindowKind::Instachat => self.anchor_instachat(),
            WindowKind::Pet | WindowKind::Info => {}
        }
    }

    fn center_chat(&self) {
        let Some(snapshot) = self.displays() else {
            return;
        };
        let Some(primary) = snapshot.primary_display() else {
            return;
        };
        let spec = WindowKind::Chat.spec();
        let target = primary.work_area.centered(
            to_physical(spec.width, primary.scale_factor),
            to_physical(spec.height, primary.scale_factor),
        );
        self.logged(
            WindowKind::Chat,
            "set_position",
            self.backend.set_position(WindowKind::Chat, target),
        );
    }

    fn anchor_instachat(&self) {
        let Some(pet) = self.pet_position() else {
            return;
        };
        let scale = self
            .logged(
                WindowKind::Pet,
                "scale_factor",
                self.backend.scale_factor(WindowKind::Pet),
            )
            .unwrap_or(1.0);
        self.logged(
            WindowKind::Instachat,
            "set_position",
            self.backend.set_position(
                WindowKind::Instachat,
                pet.offset(to_physical(PET_SIZE, scale), 0),
            ),
        );
    }

    /// Keeps a visible instachat glued to the pet.
    pub fn update_instachat_position(&self) {
        if !self.backend.is_alive(WindowKind::Instachat) || !self.is_visible(WindowKind::Instachat)
        {
            return;
        }
        self.anchor_instachat();
    }

    pub fn pet_position(&self) -> Option<Position> {
        if !self.backend.is_alive(WindowKind::Pet) {
            return None;
        }
        self.logged(
            WindowKind::Pet,
            "position",
            self.backend.position(WindowKind::Pet),
        )
    }

    pub fn move_pet(&self, target: Position) {
        if !self.backend.is_alive(WindowKind::Pet) {
            return;
        }
        self.logged(
            WindowKind::Pet,
            "set_position",
            self.backend.set_position(WindowKind::Pet, target),
        );
        self.update_instachat_position();
    }

    /// Position observer for the pet window. Pulls the pet back onto the
    /// primary display when it has drifted off every display, and returns the
    /// corrective position when one was applied.
    pub fn on_pet_moved(&self) -> Option<Position> {
        let current = self.pet_position()?;
        let mut corrected = None;

        if let Some(snapshot) = self.displays() {
            if !snapshot.displays.is_empty() && !is_on_any_display(current, &snapshot.displays) {
                if let Some(primary) = snapshot.primary_display() {
                    let safe = safe_position(current, primary);
                    if safe != current {
                        self.logged(
                            WindowKind::Pet,
                            "set_position",
                            self.backend.set_position(WindowKind::Pet, safe),
                        );
                        info!(
                            "Pet moved back on screen: ({}, {}) -> ({}, {})",
                            current.x, current.y, safe.x, safe.y
                        );
                        corrected = Some(safe);
                    }
                }
            }
        }

        self.update_instachat_position();
        corrected
    }

    pub fn on_close_requested(&self, kind: WindowKind) -> CloseAction {
        if kind.hides_on_close() {
            self.hide(kind);
            CloseAction::Prevent
        } else {
            CloseAction::Allow
        }
    }

    pub fn on_focused(&self, kind: WindowKind) {
        if kind == WindowKind::Chat && self.is_visible(WindowKind::Instachat) {
            self.hide(WindowKind::Instachat);
        }
    }

    pub fn on_destroyed(&self, kind: WindowKind) {
        info!("{} window destroyed", kind.label());
        self.refresh_any_window_open();
    }

    /// Recomputes whether chat or instachat is visible and stores the result.
    pub fn refresh_any_window_open(&self) -> bool {
        let open = self.is_visible(WindowKind::Chat) || self.is_visible(WindowKind::Instachat);
        self.any_window_open.store(open, Ordering::SeqCst);
        open
    }

    pub fn is_any_window_open(&self) -> bool {
        self.any_window_open.load(Ordering::SeqCst)
    }

    pub fn displays(&self) -> Option<DisplaySnapshot> {
        match self.backend.displays() {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!("Failed to query displays: {err:#}");
                None
            }
        }
    }

    pub fn set_pet_click_through(&self, enabled: bool) -> bool {
        if !self.backend.is_alive(WindowKind::Pet) {
            return false;
        }
        self.logged(
            WindowKind::Pet,
            "set_click_through",
            self.backend.set_click_through(WindowKind::Pet, enabled),
        )
        .is_some()
    }

    /// Focuses and shows the pet; false when it no longer exists.
    pub fn refocus_pet(&self) -> bool {
        if !self.backend.is_alive(WindowKind::Pet) {
            return false;
        }
        self.focus(WindowKind::Pet);
        self.logged(WindowKind::Pet, "show", self.backend.show(WindowKind::Pet));
        true
    }

    pub fn reset_pet_window_flags(&self) {
        if !self.backend.is_alive(WindowKind::Pet) {
            return;
        }
        self.logged(
            WindowKind::Pet,
            "set_always_on_top",
            self.backend.set_always_on_top(WindowKind::Pet, false),
        );
        self.logged(
            WindowKind::Pet,
            "set_visible_on_all_workspaces",
            self.backend
                .set_visible_on_all_workspaces(WindowKind::Pet, true),
        );
    }

    pub fn emit_to_pet(&self, event: &PetEvent) {
        if !self.backend.is_alive(WindowKind::Pet) {
            return;
        }
        self.logged(
            WindowKind::Pet,
            event.name(),
            self.backend.emit(WindowKind::Pet, event),
        );
    }

    pub fn popup_menu_on_pet(&self, menu: &ContextMenuModel) -> Result<()> {
        if !self.backend.is_alive(WindowKind::Pet) {
            return Err(anyhow!("pet window is not available"));
        }
        self.backend.popup_menu(WindowKind::Pet, menu)
    }

    fn logged<T>(&self, kind: WindowKind, op: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("{op} on {} window failed: {err:#}", kind.label());
                None
            }
        }
    }
}
