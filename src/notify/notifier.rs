use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;

/// Request body of the `notify` command.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotificationPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub silent: bool,
    pub icon: Option<String>,
}

/// Fully resolved notification handed to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub silent: bool,
    pub icon: Option<PathBuf>,
}

pub trait Notifier: Send + Sync {
    fn is_supported(&self) -> bool;
    fn show(&self, notification: &Notification) -> Result<()>;
}

/// Native notifications through `notify-rust`.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn is_supported(&self) -> bool {
        cfg!(any(
            target_os = "macos",
            target_os = "windows",
            target_os = "linux",
            target_os = "freebsd"
        ))
    }

    fn show(&self, notification: &Notification) -> Result<()> {
        let mut native = notify_rust::Notification::new();
        native
            .appname(&self.app_name)
            .summary(&notification.title)
            .body(&notification.body);
        if let Some(icon) = &notification.icon {
            native.icon(&icon.to_string_lossy());
        }
        if !notification.silent {
            native.sound_name("default");
        }
        native
            .show()
            .map(|_| ())
            .context("failed to show desktop notification")
    }
}

/// Fills in defaults and delivers notifications for IPC callers and the
/// daily reminders.
pub struct NotificationCenter {
    notifier: Arc<dyn Notifier>,
    app_name: String,
    resource_dir: Option<PathBuf>,
}

impl NotificationCenter {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        app_name: impl Into<String>,
        resource_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            notifier,
            app_name: app_name.into(),
            resource_dir,
        }
    }

    pub fn resolve(&self, payload: NotificationPayload) -> Notification {
        Notification {
            title: payload
                .title
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| self.app_name.clone()),
            body: payload.body.unwrap_or_default(),
            silent: payload.silent,
            icon: payload
                .icon
                .and_then(|icon| resolve_icon(&icon, self.resource_dir.as_deref())),
        }
    }

    /// Shows a notification; false when unsupported or when the OS refused.
    pub fn send(&self, payload: NotificationPayload) -> bool {
        if !self.notifier.is_supported() {
            return false;
        }
        let notification = self.resolve(payload);
        match self.notifier.show(&notification) {
            Ok(()) => {
                info!("Notification shown: {}", notification.title);
                true
            }
            Err(err) => {
                warn!("Notification failed: {err:#}");
                false
            }
        }
    }
}

/// macOS always uses the bundle icon, so per-notification icons are dropped
/// there. Relative paths resolve against the resource directory and must
/// point at an existing file.
fn resolve_icon(icon: &str, resource_dir: Option<&Path>) -> Option<PathBuf> {
    if cfg!(target_os = "macos") || icon.is_empty() {
        return None;
    }
    let path = Path::new(icon);
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        resource_dir?.join(path)
    };
    resolved.is_file().then_some(resolved)
}
