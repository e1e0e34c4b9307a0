use async_trait::async_trait;

/// Source of the OS-level frontmost application name.
#[async_trait]
pub trait FocusProvider: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Name of the application currently receiving keyboard focus, or `None`
    /// when the query failed.
    async fn frontmost_app(&self) -> Option<String>;
}

/// Provider for platforms without a foreground-application query.
pub struct UnsupportedFocusProvider;

#[async_trait]
impl FocusProvider for UnsupportedFocusProvider {
    fn is_supported(&self) -> bool {
        false
    }

    async fn frontmost_app(&self) -> Option<String> {
        None
    }
}

/// Asks System Events for the frontmost process through `osascript`.
#[cfg(target_os = "macos")]
pub struct AppleScriptFocusProvider;

#[cfg(target_os = "macos")]
#[async_trait]
impl FocusProvider for AppleScriptFocusProvider {
    fn is_supported(&self) -> bool {
        true
    }

    async fn frontmost_app(&self) -> Option<String> {
        const SCRIPT: &str = "tell application \"System Events\" to get name of first application process whose frontmost is true";

        let output = tokio::process::Command::new("osascript")
            .args(["-e", SCRIPT])
            .output()
            .await
            .map_err(|err| log::debug!("osascript failed to start: {err}"))
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Some(name)
    }
}

/// The best provider available on this platform.
pub fn native_provider() -> std::sync::Arc<dyn FocusProvider> {
    #[cfg(target_os = "macos")]
    {
        std::sync::Arc::new(AppleScriptFocusProvider)
    }

    #[cfg(not(target_os = "macos"))]
    {
        std::sync::Arc::new(UnsupportedFocusProvider)
    }
}
