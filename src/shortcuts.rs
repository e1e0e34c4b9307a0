use std::sync::Arc;

use log::{info, warn};
use tauri::{AppHandle, Runtime};
use tokio::task::JoinHandle;
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutState};

use crate::coordinator::Coordinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    /// Escape: make the pet clickable again and cancel any drag.
    ResetInteractivity,
    ToggleChat,
    ToggleInfo,
}

impl HotkeyAction {
    pub const ALL: [HotkeyAction; 3] = [
        HotkeyAction::ResetInteractivity,
        HotkeyAction::ToggleChat,
        HotkeyAction::ToggleInfo,
    ];

    pub fn accelerator(self) -> &'static str {
        match self {
            HotkeyAction::ResetInteractivity => "Escape",
            HotkeyAction::ToggleChat => "CommandOrControl+Shift+C",
            HotkeyAction::ToggleInfo => "CommandOrControl+Shift+I",
        }
    }

    pub fn shortcut(self) -> Shortcut {
        match self {
            HotkeyAction::ResetInteractivity => Shortcut::new(None, Code::Escape),
            HotkeyAction::ToggleChat => {
                Shortcut::new(Some(command_or_control() | Modifiers::SHIFT), Code::KeyC)
            }
            HotkeyAction::ToggleInfo => {
                Shortcut::new(Some(command_or_control() | Modifiers::SHIFT), Code::KeyI)
            }
        }
    }

    pub fn from_shortcut(shortcut: &Shortcut) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.shortcut() == *shortcut)
    }

    pub fn apply(self, coordinator: &Coordinator) {
        match self {
            HotkeyAction::ResetInteractivity => coordinator.reset_interactivity(),
            HotkeyAction::ToggleChat => {
                coordinator.toggle_chat();
            }
            HotkeyAction::ToggleInfo => {
                coordinator.toggle_info();
            }
        }
    }
}

fn command_or_control() -> Modifiers {
    if cfg!(target_os = "macos") {
        Modifiers::SUPER
    } else {
        Modifiers::CONTROL
    }
}

/// Dispatches a pressed global shortcut onto the coordinator's runtime.
///
/// The action never runs on the plugin's handler thread: toggling info may
/// build a window, which must not happen inside a synchronous handler on
/// Windows.
pub fn handle_shortcut(
    coordinator: &Arc<Coordinator>,
    shortcut: &Shortcut,
    state: ShortcutState,
) -> Option<JoinHandle<()>> {
    if state != ShortcutState::Pressed {
        return None;
    }
    let action = HotkeyAction::from_shortcut(shortcut)?;
    info!("Hotkey {}", action.accelerator());
    let runtime = coordinator.runtime().clone();
    let coordinator = Arc::clone(coordinator);
    Some(runtime.spawn(async move { action.apply(&coordinator) }))
}

/// Registers every hotkey; one that is taken by another app is skipped.
pub fn register_all<R: Runtime>(app: &AppHandle<R>) {
    for action in HotkeyAction::ALL {
        if let Err(err) = app.global_shortcut().register(action.shortcut()) {
            warn!("Failed to register {}: {err}", action.accelerator());
        }
    }
}

pub fn unregister_all<R: Runtime>(app: &AppHandle<R>) {
    match app.global_shortcut().unregister_all() {
        Ok(()) => info!("Global shortcuts released"),
        Err(err) => warn!("Failed to release global shortcuts: {err}"),
    }
}
