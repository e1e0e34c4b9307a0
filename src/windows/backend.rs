use anyhow::Result;

use crate::events::PetEvent;
use crate::menu::ContextMenuModel;

use super::geometry::{DisplaySnapshot, Position};
use super::kind::{WindowKind, WindowSpec};

/// Native window operations the registry relies on.
///
/// Every call addresses a window by kind; implementations report a missing or
/// destroyed window through `is_alive` and return errors for failed native
/// calls. The registry checks liveness before each mutation and logs errors
/// instead of propagating them.
///
/// Positions and display rects are physical pixels. `WindowSpec` sizes are
/// logical; callers scale them with `scale_factor` before mixing the two.
pub trait WindowBackend: Send + Sync {
    fn create(&self, spec: &WindowSpec) -> Result<()>;
    fn is_alive(&self, kind: WindowKind) -> bool;
    fn is_visible(&self, kind: WindowKind) -> Result<bool>;
    fn is_focused(&self, kind: WindowKind) -> Result<bool>;
    fn show(&self, kind: WindowKind) -> Result<()>;
    fn hide(&self, kind: WindowKind) -> Result<()>;
    fn focus(&self, kind: WindowKind) -> Result<()>;
    fn position(&self, kind: WindowKind) -> Result<Position>;
    fn set_position(&self, kind: WindowKind, position: Position) -> Result<()>;
    /// Physical pixels per logical pixel on the monitor the window is on.
    fn scale_factor(&self, kind: WindowKind) -> Result<f64>;
    fn set_click_through(&self, kind: WindowKind, enabled: bool) -> Result<()>;
    fn set_always_on_top(&self, kind: WindowKind, enabled: bool) -> Result<()>;
    fn set_visible_on_all_workspaces(&self, kind: WindowKind, enabled: bool) -> Result<()>;
    fn displays(&self) -> Result<DisplaySnapshot>;
    fn emit(&self, kind: WindowKind, event: &PetEvent) -> Result<()>;
    /// Pops `menu` over the window. May block until the menu is dismissed.
    fn popup_menu(&self, kind: WindowKind, menu: &ContextMenuModel) -> Result<()>;
}
