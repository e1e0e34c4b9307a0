pub mod backend;
pub mod geometry;
pub mod kind;
pub mod registry;
pub mod tauri_backend;

pub use backend::WindowBackend;
pub use geometry::{DisplayInfo, DisplaySnapshot, Position, Rect, PET_SIZE};
pub use kind::{WindowKind, WindowSpec};
pub use registry::{CloseAction, ToggleOutcome, WindowRegistry};
pub use tauri_backend::TauriBackend;
