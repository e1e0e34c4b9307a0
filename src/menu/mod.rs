pub mod controller;
pub mod model;

pub use controller::ContextMenu;
pub use model::{ContextMenuModel, MenuAction, MenuEntry};
