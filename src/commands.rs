use log::warn;
use tauri::State;

use crate::notify::NotificationPayload;
use crate::settings::PetSettings;
use crate::windows::{DisplaySnapshot, Position};
use crate::AppState;

#[tauri::command]
pub fn get_displays(state: State<AppState>) -> Result<DisplaySnapshot, String> {
    state
        .coordinator
        .get_displays()
        .ok_or_else(|| "display information unavailable".to_string())
}

#[tauri::command]
pub fn move_window(x: f64, y: f64, state: State<AppState>) {
    state.coordinator.move_window(x, y);
}

#[tauri::command]
pub fn get_current_position(state: State<AppState>) -> Position {
    state.coordinator.current_position()
}

#[tauri::command]
pub fn toggle_mouse_through(ignore: bool, state: State<AppState>) {
    state.coordinator.toggle_mouse_through(ignore);
}

#[tauri::command]
pub fn force_reset_mouse_state(state: State<AppState>) {
    state.coordinator.force_reset_mouse_state();
}

#[tauri::command]
pub fn refocus_window(state: State<AppState>) -> bool {
    state.coordinator.refocus_window()
}

#[tauri::command]
pub fn reset_window_state(state: State<AppState>) {
    state.coordinator.reset_window_state();
}

#[tauri::command]
pub fn toggle_chat(state: State<AppState>) {
    state.coordinator.toggle_chat();
}

/// Async so a first-time info window is built off the main thread.
#[tauri::command]
pub async fn toggle_info(state: State<'_, AppState>) -> Result<(), String> {
    state.coordinator.toggle_info();
    Ok(())
}

#[tauri::command]
pub fn show_instachat_at_pet(state: State<AppState>) {
    state.coordinator.show_instachat_at_pet();
}

#[tauri::command]
pub fn show_context_menu(state: State<AppState>) -> Result<(), String> {
    state.coordinator.show_context_menu().map_err(|e| {
        warn!("Context menu failed: {e:#}");
        e.to_string()
    })
}

#[tauri::command]
pub fn notify(payload: Option<NotificationPayload>, state: State<AppState>) -> bool {
    state.notifications.send(payload.unwrap_or_default())
}

#[tauri::command]
pub async fn message_to_ai(message: String, state: State<'_, AppState>) -> Result<String, String> {
    Ok(state.chat.message_to_ai(&message).await)
}

#[tauri::command]
pub fn get_settings(state: State<AppState>) -> PetSettings {
    state.settings.get()
}

/// Persists new settings; they take effect on the next launch.
#[tauri::command]
pub fn update_settings(settings: PetSettings, state: State<AppState>) -> Result<(), String> {
    state.settings.update(settings).map_err(|e| e.to_string())
}
