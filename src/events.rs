use serde_json::Value;

/// Messages pushed from the coordinator to the pet window's renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PetEvent {
    ResetDragState,
    PetBounce,
    TogglePermanentPause(bool),
    UpdatePauseState(bool),
    ForceResumeMovement,
    FocusChanged(String),
    DesktopFocused,
    ContextMenuClosed,
}

impl PetEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PetEvent::ResetDragState => "reset-drag-state",
            PetEvent::PetBounce => "pet-bounce",
            PetEvent::TogglePermanentPause(_) => "toggle-permanent-pause",
            PetEvent::UpdatePauseState(_) => "update-pause-state",
            PetEvent::ForceResumeMovement => "force-resume-movement",
            PetEvent::FocusChanged(_) => "focus-changed",
            PetEvent::DesktopFocused => "desktop-focused",
            PetEvent::ContextMenuClosed => "context-menu-closed",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            PetEvent::TogglePermanentPause(paused) | PetEvent::UpdatePauseState(paused) => {
                Value::Bool(*paused)
            }
            PetEvent::FocusChanged(app_name) => Value::String(app_name.clone()),
            PetEvent::ResetDragState
            | PetEvent::PetBounce
            | PetEvent::ForceResumeMovement
            | PetEvent::DesktopFocused
            | PetEvent::ContextMenuClosed => Value::Null,
        }
    }
}
