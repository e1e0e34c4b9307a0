//! In-memory stand-ins shared by the unit tests.

#![cfg(test)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::coordinator::Coordinator;
use crate::events::PetEvent;
use crate::focus::{FocusProvider, UnsupportedFocusProvider};
use crate::menu::ContextMenuModel;
use crate::windows::geometry::to_physical;
use crate::windows::{
    DisplayInfo, DisplaySnapshot, Position, Rect, WindowBackend, WindowKind, WindowSpec,
};

#[derive(Debug, Default, Clone)]
struct FakeWindow {
    visible: bool,
    focused: bool,
    position: Option<Position>,
    click_through: Option<bool>,
    always_on_top: bool,
}

type PopupHook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct FakeState {
    windows: HashMap<WindowKind, FakeWindow>,
    created: HashMap<WindowKind, usize>,
    position_calls: HashMap<WindowKind, usize>,
    emitted: Vec<(WindowKind, PetEvent)>,
    menus: Vec<ContextMenuModel>,
    displays: Vec<DisplayInfo>,
    fail_next_show: bool,
    fail_popup: bool,
    popup_hook: Option<PopupHook>,
}

/// Window backend that keeps window state in memory and records everything
/// sent to the renderer.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn with_primary_display(width: i32, height: i32) -> Self {
        Self::with_scaled_primary_display(width, height, 1.0)
    }

    /// Primary display of `width`×`height` physical pixels whose menu bar is
    /// 25 logical pixels tall. Every window reports `scale_factor`.
    pub fn with_scaled_primary_display(width: i32, height: i32, scale_factor: f64) -> Self {
        let backend = Self::default();
        let menu_bar = to_physical(25, scale_factor);
        backend.lock().displays.push(DisplayInfo {
            id: "primary".into(),
            bounds: Rect::new(0, 0, width, height),
            work_area: Rect::new(0, menu_bar, width, height - menu_bar),
            scale_factor,
        });
        backend
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn window<T>(&self, kind: WindowKind, read: impl FnOnce(&FakeWindow) -> T) -> Option<T> {
        self.lock().windows.get(&kind).map(read)
    }

    pub fn visible(&self, kind: WindowKind) -> bool {
        self.window(kind, |w| w.visible).unwrap_or(false)
    }

    pub fn focused(&self, kind: WindowKind) -> bool {
        self.window(kind, |w| w.focused).unwrap_or(false)
    }

    pub fn window_position(&self, kind: WindowKind) -> Option<Position> {
        self.window(kind, |w| w.position).flatten()
    }

    pub fn click_through(&self, kind: WindowKind) -> Option<bool> {
        self.window(kind, |w| w.click_through).flatten()
    }

    pub fn always_on_top(&self, kind: WindowKind) -> bool {
        self.window(kind, |w| w.always_on_top).unwrap_or(false)
    }

    pub fn set_focused(&self, kind: WindowKind) {
        let mut state = self.lock();
        for (other, window) in state.windows.iter_mut() {
            window.focused = *other == kind;
        }
    }

    pub fn destroy(&self, kind: WindowKind) {
        self.lock().windows.remove(&kind);
    }

    pub fn created_count(&self, kind: WindowKind) -> usize {
        self.lock().created.get(&kind).copied().unwrap_or(0)
    }

    pub fn position_calls(&self, kind: WindowKind) -> usize {
        self.lock().position_calls.get(&kind).copied().unwrap_or(0)
    }

    pub fn reset_position_calls(&self) {
        self.lock().position_calls.clear();
    }

    pub fn fail_next_show(&self) {
        self.lock().fail_next_show = true;
    }

    pub fn fail_popups(&self) {
        self.lock().fail_popup = true;
    }

    /// Runs `hook` from inside the next `popup_menu` call, as a blocking
    /// native menu would when the user clicks an item.
    pub fn on_next_popup(&self, hook: impl FnOnce() + Send + 'static) {
        self.lock().popup_hook = Some(Box::new(hook));
    }

    pub fn menus(&self) -> Vec<ContextMenuModel> {
        self.lock().menus.clone()
    }

    /// Events delivered to the pet window, oldest first.
    pub fn pet_events(&self) -> Vec<PetEvent> {
        self.lock()
            .emitted
            .iter()
            .filter(|(kind, _)| *kind == WindowKind::Pet)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn pause_broadcasts(&self) -> Vec<bool> {
        self.pet_events()
            .into_iter()
            .filter_map(|event| match event {
                PetEvent::UpdatePauseState(paused) => Some(paused),
                _ => None,
            })
            .collect()
    }

    pub fn count_events(&self, wanted: &PetEvent) -> usize {
        self.pet_events()
            .iter()
            .filter(|event| *event == wanted)
            .count()
    }

    pub fn clear_events(&self) {
        self.lock().emitted.clear();
    }

    fn with_window<T>(
        &self,
        kind: WindowKind,
        apply: impl FnOnce(&mut FakeWindow) -> T,
    ) -> Result<T> {
        let mut state = self.lock();
        let window = state
            .windows
            .get_mut(&kind)
            .ok_or_else(|| anyhow!("{} window does not exist", kind.label()))?;
        Ok(apply(window))
    }
}

impl WindowBackend for FakeBackend {
    fn create(&self, spec: &WindowSpec) -> Result<()> {
        let mut state = self.lock();
        state.windows.insert(
            spec.kind,
            FakeWindow {
                visible: spec.visible,
                focused: false,
                position: spec.position,
                click_through: None,
                always_on_top: spec.always_on_top,
            },
        );
        *state.created.entry(spec.kind).or_insert(0) += 1;
        Ok(())
    }

    fn is_alive(&self, kind: WindowKind) -> bool {
        self.lock().windows.contains_key(&kind)
    }

    fn is_visible(&self, kind: WindowKind) -> Result<bool> {
        self.with_window(kind, |w| w.visible)
    }

    fn is_focused(&self, kind: WindowKind) -> Result<bool> {
        self.with_window(kind, |w| w.focused)
    }

    fn show(&self, kind: WindowKind) -> Result<()> {
        {
            let mut state = self.lock();
            if state.fail_next_show {
                state.fail_next_show = false;
                bail!("show refused");
            }
        }
        self.with_window(kind, |w| w.visible = true)
    }

    fn hide(&self, kind: WindowKind) -> Result<()> {
        self.with_window(kind, |w| {
            w.visible = false;
            w.focused = false;
        })
    }

    fn focus(&self, kind: WindowKind) -> Result<()> {
        if !self.is_alive(kind) {
            bail!("{} window does not exist", kind.label());
        }
        self.set_focused(kind);
        Ok(())
    }

    fn position(&self, kind: WindowKind) -> Result<Position> {
        self.with_window(kind, |w| w.position)?
            .ok_or_else(|| anyhow!("{} window has no position yet", kind.label()))
    }

    fn set_position(&self, kind: WindowKind, position: Position) -> Result<()> {
        self.with_window(kind, |w| w.position = Some(position))?;
        *self.lock().position_calls.entry(kind).or_insert(0) += 1;
        Ok(())
    }

    fn scale_factor(&self, kind: WindowKind) -> Result<f64> {
        if !self.is_alive(kind) {
            bail!("{} window does not exist", kind.label());
        }
        Ok(self
            .lock()
            .displays
            .first()
            .map_or(1.0, |display| display.scale_factor))
    }

    fn set_click_through(&self, kind: WindowKind, enabled: bool) -> Result<()> {
        self.with_window(kind, |w| w.click_through = Some(enabled))
    }

    fn set_always_on_top(&self, kind: WindowKind, enabled: bool) -> Result<()> {
        self.with_window(kind, |w| w.always_on_top = enabled)
    }

    fn set_visible_on_all_workspaces(&self, kind: WindowKind, _enabled: bool) -> Result<()> {
        self.with_window(kind, |_| ())
    }

    fn displays(&self) -> Result<DisplaySnapshot> {
        let state = self.lock();
        Ok(DisplaySnapshot {
            primary: "primary".into(),
            displays: state.displays.clone(),
        })
    }

    fn emit(&self, kind: WindowKind, event: &PetEvent) -> Result<()> {
        self.lock().emitted.push((kind, event.clone()));
        Ok(())
    }

    fn popup_menu(&self, _kind: WindowKind, menu: &ContextMenuModel) -> Result<()> {
        let hook = {
            let mut state = self.lock();
            if state.fail_popup {
                bail!("native menu unavailable");
            }
            state.menus.push(menu.clone());
            state.popup_hook.take()
        };
        if let Some(hook) = hook {
            hook();
        }
        Ok(())
    }
}

/// Coordinator over a fake 1920×1080 desktop with pet, chat and instachat
/// already created.
pub fn fake_coordinator() -> (Arc<FakeBackend>, Arc<Coordinator>) {
    let backend = Arc::new(FakeBackend::with_primary_display(1920, 1080));
    let coordinator = Arc::new(Coordinator::new(
        backend.clone(),
        Arc::new(UnsupportedFocusProvider),
        tokio::runtime::Handle::current(),
        "flabba".into(),
    ));
    coordinator
        .create_startup_windows()
        .expect("startup windows");
    backend.clear_events();
    (backend, coordinator)
}

/// Focus provider that replays a fixed list of samples, then reports nothing.
pub struct ScriptedFocusProvider {
    samples: Mutex<VecDeque<Option<String>>>,
}

impl ScriptedFocusProvider {
    pub fn new(samples: &[Option<&str>]) -> Self {
        Self {
            samples: Mutex::new(
                samples
                    .iter()
                    .map(|sample| sample.map(str::to_string))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl FocusProvider for ScriptedFocusProvider {
    fn is_supported(&self) -> bool {
        true
    }

    async fn frontmost_app(&self) -> Option<String> {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .flatten()
    }
}
