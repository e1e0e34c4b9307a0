use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use tokio::runtime::Handle;

use crate::events::PetEvent;
use crate::focus::{is_desktop_process, FocusProvider, FocusWatcher, DEFAULT_POLL_INTERVAL};
use crate::menu::{ContextMenu, MenuAction};
use crate::pause::{PauseAggregator, PauseSnapshot};
use crate::windows::{
    CloseAction, DisplaySnapshot, Position, ToggleOutcome, WindowBackend, WindowKind,
    WindowRegistry,
};

#[cfg(target_os = "windows")]
const FOCUS_AFTER_CLICK_THROUGH_DELAY: Duration = Duration::from_millis(10);
#[cfg(target_os = "macos")]
const CLICK_THROUGH_RESTORE_DELAY: Duration = Duration::from_millis(100);

/// Owns every window handle and pause signal and is the only entry point
/// used by IPC commands, native window events, hotkeys and the focus watcher.
///
/// Any call that can change popup visibility refreshes the registry's
/// any-window-open flag and rebroadcasts the pause state before returning.
pub struct Coordinator {
    registry: Arc<WindowRegistry>,
    pause: Arc<PauseAggregator>,
    menu: Arc<ContextMenu>,
    focus: FocusWatcher,
    runtime: Handle,
    own_app_name: String,
}

impl Coordinator {
    pub fn new(
        backend: Arc<dyn WindowBackend>,
        focus_provider: Arc<dyn FocusProvider>,
        runtime: Handle,
        own_app_name: String,
    ) -> Self {
        Self::with_focus_interval(
            backend,
            focus_provider,
            DEFAULT_POLL_INTERVAL,
            runtime,
            own_app_name,
        )
    }

    pub fn with_focus_interval(
        backend: Arc<dyn WindowBackend>,
        focus_provider: Arc<dyn FocusProvider>,
        focus_interval: Duration,
        runtime: Handle,
        own_app_name: String,
    ) -> Self {
        let registry = Arc::new(WindowRegistry::new(backend));
        let pause = Arc::new(PauseAggregator::new(Arc::clone(&registry)));
        let menu = Arc::new(ContextMenu::new(
            Arc::clone(&registry),
            Arc::clone(&pause),
            runtime.clone(),
        ));
        let focus = FocusWatcher::new(focus_provider, focus_interval, runtime.clone());

        Self {
            registry,
            pause,
            menu,
            focus,
            runtime,
            own_app_name,
        }
    }

    pub fn registry(&self) -> &Arc<WindowRegistry> {
        &self.registry
    }

    /// Runtime the coordinator schedules its deferred work on.
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn pause_state(&self) -> PauseSnapshot {
        self.pause.snapshot()
    }

    /// Pet, chat and instachat exist for the life of the app; info is lazy.
    pub fn create_startup_windows(&self) -> Result<()> {
        self.registry.create_pet_window()?;
        self.registry.create_chat_window()?;
        self.registry.create_instachat_window()?;
        self.settle();
        Ok(())
    }

    fn settle(&self) {
        self.registry.refresh_any_window_open();
        self.pause.recompute_and_broadcast();
    }

    pub fn get_displays(&self) -> Option<DisplaySnapshot> {
        self.registry.displays()
    }

    pub fn move_window(&self, x: f64, y: f64) {
        self.registry
            .move_pet(Position::new(x.round() as i32, y.round() as i32));
    }

    /// Pet position, or the origin when the pet is gone.
    pub fn current_position(&self) -> Position {
        self.registry.pet_position().unwrap_or_default()
    }

    pub fn toggle_mouse_through(&self, ignore: bool) {
        if !self.registry.set_pet_click_through(ignore) || ignore {
            return;
        }

        #[cfg(target_os = "windows")]
        {
            let registry = Arc::clone(&self.registry);
            self.runtime.spawn(async move {
                tokio::time::sleep(FOCUS_AFTER_CLICK_THROUGH_DELAY).await;
                registry.focus(WindowKind::Pet);
            });
        }

        #[cfg(not(target_os = "windows"))]
        self.registry.focus(WindowKind::Pet);
    }

    pub fn force_reset_mouse_state(&self) {
        debug!("Forcing pet to receive mouse events");
        self.registry.set_pet_click_through(false);
    }

    pub fn refocus_window(&self) -> bool {
        self.registry.refocus_pet()
    }

    /// Restores the pet's window flags after another app went full screen.
    /// Only macOS needs this.
    pub fn reset_window_state(&self) {
        #[cfg(target_os = "macos")]
        {
            if !self.registry.is_alive(WindowKind::Pet) {
                return;
            }
            self.registry.reset_pet_window_flags();
            let registry = Arc::clone(&self.registry);
            self.runtime.spawn(async move {
                tokio::time::sleep(CLICK_THROUGH_RESTORE_DELAY).await;
                registry.set_pet_click_through(true);
            });
        }
    }

    pub fn toggle_chat(&self) -> ToggleOutcome {
        let outcome = self.registry.toggle_chat_window();
        self.settle();
        outcome
    }

    pub fn toggle_instachat(&self) -> ToggleOutcome {
        let outcome = self.registry.toggle_instachat_window();
        self.settle();
        outcome
    }

    pub fn toggle_info(&self) -> ToggleOutcome {
        let outcome = self.registry.toggle_info_window();
        self.settle();
        outcome
    }

    pub fn show_instachat_at_pet(&self) {
        self.registry.show_instachat_at_pet();
        self.settle();
    }

    pub fn show_context_menu(&self) -> Result<()> {
        self.menu.show()
    }

    pub fn handle_menu_action(&self, action: MenuAction) {
        self.menu.handle_action(action);
    }

    pub fn on_pet_moved(&self) -> Option<Position> {
        self.registry.on_pet_moved()
    }

    pub fn on_close_requested(&self, kind: WindowKind) -> CloseAction {
        let action = self.registry.on_close_requested(kind);
        self.settle();
        action
    }

    pub fn on_focused(&self, kind: WindowKind) {
        self.registry.on_focused(kind);
        self.settle();
    }

    pub fn on_destroyed(&self, kind: WindowKind) {
        self.registry.on_destroyed(kind);
        self.settle();
    }

    /// Escape hotkey: make the pet clickable again and cancel any drag.
    pub fn reset_interactivity(&self) {
        self.registry.set_pet_click_through(false);
        self.registry.emit_to_pet(&PetEvent::ResetDragState);
    }

    pub fn start_focus_watching(&self) -> bool {
        let registry = Arc::clone(&self.registry);
        let own_app_name = self.own_app_name.clone();
        self.focus.start(move |app_name| {
            if app_name.eq_ignore_ascii_case(&own_app_name) {
                return;
            }
            debug!("Frontmost application: {app_name}");
            let desktop = is_desktop_process(&app_name);
            registry.emit_to_pet(&PetEvent::FocusChanged(app_name));
            if desktop {
                registry.emit_to_pet(&PetEvent::DesktopFocused);
            }
        })
    }

    pub fn stop_focus_watching(&self) {
        self.focus.stop();
    }

    pub fn shutdown(&self) {
        info!("Coordinator shutting down");
        self.stop_focus_watching();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fake_coordinator, FakeBackend, ScriptedFocusProvider};
    use crate::windows::PET_SIZE;

    #[tokio::test]
    async fn startup_creates_the_three_resident_windows() {
        let (backend, coordinator) = fake_coordinator();

        for kind in [WindowKind::Pet, WindowKind::Chat, WindowKind::Instachat] {
            assert_eq!(backend.created_count(kind), 1);
        }
        assert_eq!(backend.created_count(WindowKind::Info), 0);
        assert_eq!(coordinator.current_position(), Position::new(100, 100));
        assert!(!coordinator.pause_state().paused);
    }

    #[tokio::test]
    async fn pet_dragged_off_screen_is_pulled_back_once() {
        let (backend, coordinator) = fake_coordinator();
        backend.reset_position_calls();

        coordinator.move_window(5000.0, 5000.0);
        let corrected = coordinator.on_pet_moved().expect("corrective move");
        assert_eq!(coordinator.on_pet_moved(), None);

        assert!((50..=1742).contains(&corrected.x));
        assert!((50..=902).contains(&corrected.y));
        assert_eq!(coordinator.current_position(), corrected);
        assert_eq!(backend.position_calls(WindowKind::Pet), 2);
    }

    #[tokio::test]
    async fn move_rounds_and_drags_instachat_along() {
        let (backend, coordinator) = fake_coordinator();
        coordinator.show_instachat_at_pet();

        coordinator.move_window(300.4, 420.6);

        assert_eq!(coordinator.current_position(), Position::new(300, 421));
        assert_eq!(
            backend.window_position(WindowKind::Instachat),
            Some(Position::new(300 + PET_SIZE, 421))
        );
    }

    #[tokio::test]
    async fn missing_pet_reports_origin() {
        let (backend, coordinator) = fake_coordinator();
        backend.destroy(WindowKind::Pet);

        assert_eq!(coordinator.current_position(), Position::default());
        assert!(!coordinator.refocus_window());
        coordinator.move_window(10.0, 10.0);
        coordinator.toggle_mouse_through(true);
    }

    #[tokio::test]
    async fn popup_visibility_drives_the_pause_broadcast() {
        let (backend, coordinator) = fake_coordinator();

        assert_eq!(coordinator.toggle_chat(), ToggleOutcome::Shown);
        assert_eq!(backend.pause_broadcasts().last(), Some(&true));

        backend.set_focused(WindowKind::Chat);
        assert_eq!(coordinator.toggle_chat(), ToggleOutcome::Hidden);
        assert_eq!(backend.pause_broadcasts().last(), Some(&false));
    }

    #[tokio::test]
    async fn closing_a_popup_hides_it_and_resumes() {
        let (backend, coordinator) = fake_coordinator();
        coordinator.show_instachat_at_pet();
        assert!(coordinator.pause_state().any_window_open);

        assert_eq!(
            coordinator.on_close_requested(WindowKind::Instachat),
            CloseAction::Prevent
        );
        assert!(backend.is_alive(WindowKind::Instachat));
        assert!(!coordinator.pause_state().paused);
        assert_eq!(backend.pause_broadcasts().last(), Some(&false));
    }

    #[tokio::test]
    async fn focusing_chat_keeps_instachat_hidden() {
        let (backend, coordinator) = fake_coordinator();
        coordinator.show_instachat_at_pet();
        coordinator.registry().show(WindowKind::Chat);

        coordinator.on_focused(WindowKind::Chat);

        assert!(backend.visible(WindowKind::Chat));
        assert!(!backend.visible(WindowKind::Instachat));
        assert_eq!(backend.pause_broadcasts().last(), Some(&true));
    }

    #[tokio::test]
    async fn info_window_is_lazy_and_recreated_after_close() {
        let (backend, coordinator) = fake_coordinator();

        assert_eq!(coordinator.toggle_info(), ToggleOutcome::Shown);
        assert_eq!(
            coordinator.on_close_requested(WindowKind::Info),
            CloseAction::Allow
        );
        backend.destroy(WindowKind::Info);
        coordinator.on_destroyed(WindowKind::Info);

        assert_eq!(coordinator.toggle_info(), ToggleOutcome::Shown);
        assert_eq!(backend.created_count(WindowKind::Info), 2);
    }

    #[tokio::test]
    async fn menu_then_popup_then_close_ends_unpaused() {
        let (backend, coordinator) = fake_coordinator();
        let observer = Arc::clone(&coordinator);
        backend.on_next_popup(move || {
            observer.show_instachat_at_pet();
            observer.registry().hide(WindowKind::Instachat);
            observer.on_focused(WindowKind::Pet);
        });

        coordinator.show_context_menu().expect("menu shown");

        let broadcasts = backend.pause_broadcasts();
        assert_eq!(broadcasts.first(), Some(&true));
        assert_eq!(broadcasts.last(), Some(&false));
        assert!(!coordinator.pause_state().paused);
    }

    #[tokio::test]
    async fn escape_restores_interactivity() {
        let (backend, coordinator) = fake_coordinator();
        coordinator.toggle_mouse_through(true);
        assert_eq!(backend.click_through(WindowKind::Pet), Some(true));

        coordinator.reset_interactivity();

        assert_eq!(backend.click_through(WindowKind::Pet), Some(false));
        assert_eq!(backend.count_events(&PetEvent::ResetDragState), 1);
    }

    #[cfg(not(target_os = "windows"))]
    #[tokio::test]
    async fn disabling_click_through_focuses_the_pet() {
        let (backend, coordinator) = fake_coordinator();
        coordinator.toggle_mouse_through(false);

        assert_eq!(backend.click_through(WindowKind::Pet), Some(false));
        assert!(backend.focused(WindowKind::Pet));
    }

    #[cfg(not(target_os = "macos"))]
    #[tokio::test]
    async fn reset_window_state_is_a_no_op_off_macos() {
        let (backend, coordinator) = fake_coordinator();
        coordinator.reset_window_state();
        assert_eq!(backend.click_through(WindowKind::Pet), None);
    }

    #[tokio::test(start_paused = true)]
    async fn focus_changes_reach_the_pet() {
        let backend = Arc::new(FakeBackend::with_primary_display(1920, 1080));
        let provider = Arc::new(ScriptedFocusProvider::new(&[
            Some("Safari"),
            Some("flabba"),
            Some("Finder"),
        ]));
        let coordinator = Coordinator::new(
            backend.clone(),
            provider,
            Handle::current(),
            "flabba".into(),
        );
        coordinator.create_startup_windows().expect("startup windows");

        assert!(coordinator.start_focus_watching());
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 4).await;
        coordinator.shutdown();

        assert_eq!(
            backend.count_events(&PetEvent::FocusChanged("Safari".into())),
            1
        );
        assert_eq!(
            backend.count_events(&PetEvent::FocusChanged("flabba".into())),
            0
        );
        assert_eq!(
            backend.count_events(&PetEvent::FocusChanged("Finder".into())),
            1
        );
        assert_eq!(backend.count_events(&PetEvent::DesktopFocused), 1);
    }

    #[tokio::test]
    async fn focus_watching_is_skipped_when_unsupported() {
        let (_backend, coordinator) = fake_coordinator();
        assert!(!coordinator.start_focus_watching());
        coordinator.stop_focus_watching();
    }
}
