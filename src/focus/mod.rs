pub mod provider;
pub mod watcher;

pub use provider::{native_provider, FocusProvider, UnsupportedFocusProvider};
pub use watcher::{is_desktop_process, FocusWatcher, DEFAULT_POLL_INTERVAL};
