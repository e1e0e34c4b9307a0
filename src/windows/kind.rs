use serde::{Deserialize, Serialize};

use super::geometry::{Position, PET_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowKind {
    Pet,
    Chat,
    Instachat,
    Info,
}

impl WindowKind {
    pub const ALL: [WindowKind; 4] = [
        WindowKind::Pet,
        WindowKind::Chat,
        WindowKind::Instachat,
        WindowKind::Info,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WindowKind::Pet => "pet",
            WindowKind::Chat => "chat",
            WindowKind::Instachat => "instachat",
            WindowKind::Info => "info",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }

    /// The popup that may never be visible at the same time as this one.
    pub fn exclusive_sibling(self) -> Option<Self> {
        match self {
            WindowKind::Chat => Some(WindowKind::Instachat),
            WindowKind::Instachat => Some(WindowKind::Chat),
            WindowKind::Pet | WindowKind::Info => None,
        }
    }

    /// Chat and instachat survive a close request by hiding instead.
    pub fn hides_on_close(self) -> bool {
        matches!(self, WindowKind::Chat | WindowKind::Instachat)
    }

    pub fn spec(self) -> WindowSpec {
        match self {
            WindowKind::Pet => WindowSpec {
                kind: self,
                url: "pet.html",
                width: PET_SIZE,
                height: PET_SIZE,
                position: Some(Position::new(100, 100)),
                transparent: true,
                decorations: false,
                visible: true,
                skip_taskbar: true,
                always_on_top: false,
            },
            WindowKind::Chat => WindowSpec {
                kind: self,
                url: "chat.html",
                width: 650,
                height: 700,
                position: None,
                transparent: false,
                decorations: false,
                visible: false,
                skip_taskbar: true,
                always_on_top: false,
            },
            WindowKind::Instachat => WindowSpec {
                kind: self,
                url: "instachat.html",
                width: 300,
                height: 200,
                position: None,
                transparent: true,
                decorations: false,
                visible: false,
                skip_taskbar: true,
                always_on_top: false,
            },
            WindowKind::Info => WindowSpec {
                kind: self,
                url: "info.html",
                width: 460,
                height: 800,
                position: None,
                transparent: false,
                decorations: true,
                visible: false,
                skip_taskbar: false,
                always_on_top: false,
            },
        }
    }
}

/// Creation parameters for one managed window, in logical pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub kind: WindowKind,
    pub url: &'static str,
    pub width: i32,
    pub height: i32,
    pub position: Option<Position>,
    pub transparent: bool,
    pub decorations: bool,
    pub visible: bool,
    pub skip_taskbar: bool,
    pub always_on_top: bool,
}
