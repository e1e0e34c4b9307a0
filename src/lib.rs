mod chat;
mod commands;
mod coordinator;
mod db;
mod events;
mod focus;
mod menu;
mod notify;
mod pause;
mod settings;
mod shortcuts;
#[cfg(test)]
mod test_support;
mod utils;
mod windows;

use std::sync::{Arc, Mutex, PoisonError};

use chat::{ChatClient, ChatService, API_KEY_ENV};
use coordinator::Coordinator;
use db::Database;
use log::{info, warn};
use menu::MenuAction;
use notify::{
    register_reminders, DesktopNotifier, NotificationCenter, OpenMeteoClient, Reminders,
    SystemClock, WeatherCache, OPEN_METEO_URL,
};
use settings::SettingsStore;
use tauri::{Manager, RunEvent, WindowEvent};
use windows::{CloseAction, TauriBackend, WindowKind};

const APP_NAME: &str = "Flabba";

pub(crate) struct AppState {
    pub(crate) coordinator: Arc<Coordinator>,
    pub(crate) notifications: Arc<NotificationCenter>,
    pub(crate) chat: ChatService,
    pub(crate) settings: SettingsStore,
    reminders: Mutex<Reminders>,
}

impl AppState {
    fn shutdown(&self) {
        self.coordinator.shutdown();
        self.reminders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shutdown();
    }
}

fn handle_window_event(state: &AppState, kind: WindowKind, event: &WindowEvent) {
    let coordinator = &state.coordinator;
    match event {
        WindowEvent::Moved(_) if kind == WindowKind::Pet => {
            coordinator.on_pet_moved();
        }
        WindowEvent::CloseRequested { api, .. } => {
            if coordinator.on_close_requested(kind) == CloseAction::Prevent {
                api.prevent_close();
            }
        }
        WindowEvent::Focused(true) => coordinator.on_focused(kind),
        WindowEvent::Destroyed => coordinator.on_destroyed(kind),
        _ => {}
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    utils::init_logging();
    utils::install_panic_hook();

    info!("Flabba starting up...");

    tauri::Builder::default()
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(|app, shortcut, event| {
                    if let Some(state) = app.try_state::<AppState>() {
                        shortcuts::handle_shortcut(&state.coordinator, shortcut, event.state());
                    }
                })
                .build(),
        )
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let settings_store = SettingsStore::new(app_data_dir.join("settings.json"))?;
                let settings = settings_store.get();

                let database = Database::new(app_data_dir.join("company.sqlite3"))?;
                let runtime = tauri::async_runtime::handle().inner().clone();

                let coordinator = Arc::new(Coordinator::with_focus_interval(
                    Arc::new(TauriBackend::new(app.handle().clone())),
                    focus::native_provider(),
                    settings.focus.poll_interval(),
                    runtime.clone(),
                    app.package_info().name.clone(),
                ));
                coordinator.create_startup_windows()?;
                if settings.focus.enabled {
                    coordinator.start_focus_watching();
                }

                let notifications = Arc::new(NotificationCenter::new(
                    Arc::new(DesktopNotifier::new(APP_NAME)),
                    APP_NAME,
                    app.path().resource_dir().ok(),
                ));
                let weather = Arc::new(WeatherCache::new(Arc::new(OpenMeteoClient::new(
                    OPEN_METEO_URL,
                    settings.weather.clone(),
                )?)));
                let reminders = register_reminders(
                    &runtime,
                    Arc::new(SystemClock),
                    Arc::clone(&notifications),
                    weather,
                    &settings.reminders,
                    settings.weather.refresh_interval(),
                );

                let api_key = std::env::var(API_KEY_ENV)
                    .ok()
                    .filter(|key| !key.trim().is_empty());
                if api_key.is_none() {
                    warn!("{API_KEY_ENV} is not set; AI chat requests will be unauthenticated");
                }
                let chat = ChatService::new(
                    ChatClient::new(
                        settings.chat.endpoint.clone(),
                        api_key,
                        settings.chat.user.clone(),
                    )?,
                    Arc::new(database),
                    settings.chat.staff_id.clone(),
                );

                shortcuts::register_all(app.handle());

                app.manage(AppState {
                    coordinator,
                    notifications,
                    chat,
                    settings: settings_store,
                    reminders: Mutex::new(reminders),
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .on_window_event(|window, event| {
            let Some(kind) = WindowKind::from_label(window.label()) else {
                return;
            };
            if let Some(state) = window.try_state::<AppState>() {
                handle_window_event(&state, kind, event);
            }
        })
        .on_menu_event(|app, event| {
            let Some(action) = MenuAction::from_id(event.id().as_ref()) else {
                return;
            };
            if let Some(state) = app.try_state::<AppState>() {
                state.coordinator.handle_menu_action(action);
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_displays,
            commands::move_window,
            commands::get_current_position,
            commands::toggle_mouse_through,
            commands::force_reset_mouse_state,
            commands::refocus_window,
            commands::reset_window_state,
            commands::toggle_chat,
            commands::toggle_info,
            commands::show_instachat_at_pet,
            commands::show_context_menu,
            commands::notify,
            commands::message_to_ai,
            commands::get_settings,
            commands::update_settings,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app, event| {
            if let RunEvent::Exit = event {
                if let Some(state) = app.try_state::<AppState>() {
                    state.shutdown();
                }
                shortcuts::unregister_all(app);
            }
        });
}
