use anyhow::{anyhow, Context, Result};
use tauri::menu::{Menu, MenuItem, PredefinedMenuItem};
use tauri::{
    AppHandle, Emitter, Manager, Monitor, PhysicalPosition, WebviewUrl, WebviewWindow,
    WebviewWindowBuilder, Wry,
};

use crate::events::PetEvent;
use crate::menu::{ContextMenuModel, MenuEntry};

use super::backend::WindowBackend;
use super::geometry::{DisplayInfo, DisplaySnapshot, Position, Rect};
use super::kind::{WindowKind, WindowSpec};

const WINDOW_TITLE: &str = "Flabba";

/// `WindowBackend` over Tauri webview windows, addressed by label.
pub struct TauriBackend {
    app: AppHandle<Wry>,
}

impl TauriBackend {
    pub fn new(app: AppHandle<Wry>) -> Self {
        Self { app }
    }

    fn window(&self, kind: WindowKind) -> Result<WebviewWindow<Wry>> {
        self.app
            .get_webview_window(kind.label())
            .ok_or_else(|| anyhow!("{} window does not exist", kind.label()))
    }

    fn build_menu(&self, model: &ContextMenuModel) -> Result<Menu<Wry>> {
        let menu = Menu::new(&self.app)?;
        for entry in &model.entries {
            match entry {
                MenuEntry::Item { action, label } => {
                    let item =
                        MenuItem::with_id(&self.app, action.id(), label, true, None::<&str>)?;
                    menu.append(&item)?;
                }
                MenuEntry::Separator => {
                    menu.append(&PredefinedMenuItem::separator(&self.app)?)?;
                }
            }
        }
        Ok(menu)
    }
}

fn display_id(monitor: &Monitor) -> String {
    monitor.name().cloned().unwrap_or_else(|| {
        let origin = monitor.position();
        format!("display@{},{}", origin.x, origin.y)
    })
}

fn to_rect(x: i32, y: i32, width: u32, height: u32) -> Rect {
    Rect::new(
        x,
        y,
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
    )
}

fn to_display(monitor: &Monitor) -> DisplayInfo {
    let origin = monitor.position();
    let size = monitor.size();
    let work_area = monitor.work_area();
    DisplayInfo {
        id: display_id(monitor),
        bounds: to_rect(origin.x, origin.y, size.width, size.height),
        work_area: to_rect(
            work_area.position.x,
            work_area.position.y,
            work_area.size.width,
            work_area.size.height,
        ),
        scale_factor: monitor.scale_factor(),
    }
}

impl WindowBackend for TauriBackend {
    fn create(&self, spec: &WindowSpec) -> Result<()> {
        let mut builder =
            WebviewWindowBuilder::new(&self.app, spec.kind.label(), WebviewUrl::App(spec.url.into()))
                .title(WINDOW_TITLE)
                .inner_size(f64::from(spec.width), f64::from(spec.height))
                .resizable(false)
                .transparent(spec.transparent)
                .decorations(spec.decorations)
                .visible(spec.visible)
                .skip_taskbar(spec.skip_taskbar)
                .always_on_top(spec.always_on_top);

        if spec.transparent {
            builder = builder.shadow(false);
        }
        if let Some(position) = spec.position {
            builder = builder.position(f64::from(position.x), f64::from(position.y));
        }

        builder
            .build()
            .with_context(|| format!("failed to build {} window", spec.kind.label()))?;
        Ok(())
    }

    fn is_alive(&self, kind: WindowKind) -> bool {
        self.app.get_webview_window(kind.label()).is_some()
    }

    fn is_visible(&self, kind: WindowKind) -> Result<bool> {
        Ok(self.window(kind)?.is_visible()?)
    }

    fn is_focused(&self, kind: WindowKind) -> Result<bool> {
        Ok(self.window(kind)?.is_focused()?)
    }

    fn show(&self, kind: WindowKind) -> Result<()> {
        Ok(self.window(kind)?.show()?)
    }

    fn hide(&self, kind: WindowKind) -> Result<()> {
        Ok(self.window(kind)?.hide()?)
    }

    fn focus(&self, kind: WindowKind) -> Result<()> {
        Ok(self.window(kind)?.set_focus()?)
    }

    fn position(&self, kind: WindowKind) -> Result<Position> {
        let outer = self.window(kind)?.outer_position()?;
        Ok(Position::new(outer.x, outer.y))
    }

    fn set_position(&self, kind: WindowKind, position: Position) -> Result<()> {
        Ok(self
            .window(kind)?
            .set_position(PhysicalPosition::new(position.x, position.y))?)
    }

    fn scale_factor(&self, kind: WindowKind) -> Result<f64> {
        Ok(self.window(kind)?.scale_factor()?)
    }

    fn set_click_through(&self, kind: WindowKind, enabled: bool) -> Result<()> {
        Ok(self.window(kind)?.set_ignore_cursor_events(enabled)?)
    }

    fn set_always_on_top(&self, kind: WindowKind, enabled: bool) -> Result<()> {
        Ok(self.window(kind)?.set_always_on_top(enabled)?)
    }

    fn set_visible_on_all_workspaces(&self, kind: WindowKind, enabled: bool) -> Result<()> {
        Ok(self.window(kind)?.set_visible_on_all_workspaces(enabled)?)
    }

    fn displays(&self) -> Result<DisplaySnapshot> {
        let monitors = self
            .app
            .available_monitors()
            .context("failed to list monitors")?;
        let displays: Vec<DisplayInfo> = monitors.iter().map(to_display).collect();
        let primary = self
            .app
            .primary_monitor()
            .context("failed to query primary monitor")?
            .map(|monitor| display_id(&monitor))
            .or_else(|| displays.first().map(|display| display.id.clone()))
            .unwrap_or_default();
        Ok(DisplaySnapshot { primary, displays })
    }

    fn emit(&self, kind: WindowKind, event: &PetEvent) -> Result<()> {
        self.app
            .emit_to(kind.label(), event.name(), event.payload())
            .with_context(|| format!("failed to emit {}", event.name()))
    }

    fn popup_menu(&self, kind: WindowKind, model: &ContextMenuModel) -> Result<()> {
        let menu = self.build_menu(model)?;
        self.window(kind)?
            .popup_menu(&menu)
            .context("failed to pop up context menu")
    }
}
