use serde::Serialize;

/// Actions reachable from the pet's context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuAction {
    OpenChat,
    OpenInstachat,
    TogglePause,
}

impl MenuAction {
    pub fn id(self) -> &'static str {
        match self {
            MenuAction::OpenChat => "open-chat",
            MenuAction::OpenInstachat => "open-instachat",
            MenuAction::TogglePause => "toggle-pause",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        [
            MenuAction::OpenChat,
            MenuAction::OpenInstachat,
            MenuAction::TogglePause,
        ]
        .into_iter()
        .find(|action| action.id() == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MenuEntry {
    Item { action: MenuAction, label: String },
    Separator,
}

/// Platform-neutral description of the context menu, rebuilt on every open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextMenuModel {
    pub entries: Vec<MenuEntry>,
}

impl ContextMenuModel {
    /// `movement_paused` is true when the pet is held by a manual pause or an
    /// open popup.
    pub fn build(movement_paused: bool) -> Self {
        let pause_label = if movement_paused {
            "Resume Movement"
        } else {
            "Pause Movement"
        };

        Self {
            entries: vec![
                MenuEntry::Item {
                    action: MenuAction::OpenChat,
                    label: "Open Chat".into(),
                },
                MenuEntry::Item {
                    action: MenuAction::OpenInstachat,
                    label: "Open Instant Chat".into(),
                },
                MenuEntry::Separator,
                MenuEntry::Item {
                    action: MenuAction::TogglePause,
                    label: pause_label.into(),
                },
            ],
        }
    }

    pub fn label_for(&self, wanted: MenuAction) -> Option<&str> {
        self.entries.iter().find_map(|entry| match entry {
            MenuEntry::Item { action, label } if *action == wanted => Some(label.as_str()),
            MenuEntry::Item { .. } | MenuEntry::Separator => None,
        })
    }
}
