use serde::{Deserialize, Serialize};

/// Pet window edge length in logical pixels.
pub const PET_SIZE: i32 = 128;

/// Minimum distance (logical) kept from the primary display's edges when the
/// pet is pulled back on screen.
pub const SAFE_MARGIN: i32 = 50;

/// How far the pet may hang past a display's top/left edge before it counts
/// as off screen.
const OFFSCREEN_LEAD: i32 = 100;

/// How much of the pet must remain visible at a display's bottom/right edge.
const OFFSCREEN_TAIL: i32 = 28;

/// Converts a logical length to physical pixels on a display with
/// `scale_factor`.
pub fn to_physical(logical: i32, scale_factor: f64) -> i32 {
    (f64::from(logical) * scale_factor).round() as i32
}

/// Screen coordinates in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner that centers a `width`×`height` box inside this rect.
    pub fn centered(&self, width: i32, height: i32) -> Position {
        Position {
            x: self.x + (self.width - width) / 2,
            y: self.y + (self.height - height) / 2,
        }
    }
}

/// One monitor. `bounds` and `work_area` are physical pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfo {
    pub id: String,
    pub bounds: Rect,
    pub work_area: Rect,
    pub scale_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub primary: String,
    pub displays: Vec<DisplayInfo>,
}

impl DisplaySnapshot {
    pub fn primary_display(&self) -> Option<&DisplayInfo> {
        self.displays
            .iter()
            .find(|display| display.id == self.primary)
            .or_else(|| self.displays.first())
    }
}

/// Whether a pet whose top-left corner sits at `pos` is still reachable on
/// at least one of `displays`.
pub fn is_on_any_display(pos: Position, displays: &[DisplayInfo]) -> bool {
    displays.iter().any(|display| {
        let b = display.bounds;
        let lead = to_physical(OFFSCREEN_LEAD, display.scale_factor);
        let tail = to_physical(OFFSCREEN_TAIL, display.scale_factor);
        pos.x >= b.x - lead
            && pos.x <= b.x + b.width - tail
            && pos.y >= b.y - lead
            && pos.y <= b.y + b.height - tail
    })
}

/// Nearest point to `pos` that keeps the whole pet inside the primary
/// display, `SAFE_MARGIN` away from its edges.
pub fn safe_position(pos: Position, primary: &DisplayInfo) -> Position {
    let margin = to_physical(SAFE_MARGIN, primary.scale_factor);
    let reserve = to_physical(PET_SIZE + SAFE_MARGIN, primary.scale_factor);
    let max_x = (primary.bounds.width - reserve).max(margin);
    let max_y = (primary.bounds.height - reserve).max(margin);
    Position {
        x: pos.x.min(max_x).max(margin),
        y: pos.y.min(max_y).max(margin),
    }
}
