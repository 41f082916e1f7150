//! MoveResize Module
//!
//! Interactive window moving and resizing driven by pointer drags on a frame.
//! At most one drag is live; a new press replaces it, a release ends it.

use x11rb::protocol::xproto::{KeyButMask, Window};

use crate::shared::Geometry;
use crate::wm::decorations::{Edge, HitZone};

/// Kind of drag operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    /// Dragging the drag bar
    Move,
    /// Dragging a left or right edge
    ResizeHorizontal,
    /// Dragging a top or bottom edge
    ResizeVertical,
    /// Dragging any corner
    ResizeAll,
}

impl DragKind {
    /// Drag started by a press in `zone`, if any
    pub fn from_zone(zone: HitZone) -> Option<Self> {
        match zone {
            HitZone::None => None,
            HitZone::DragBar => Some(DragKind::Move),
            HitZone::Corner(_) => Some(DragKind::ResizeAll),
            HitZone::Edge(Edge::Left | Edge::Right) => Some(DragKind::ResizeHorizontal),
            HitZone::Edge(Edge::Top | Edge::Bottom) => Some(DragKind::ResizeVertical),
        }
    }
}

/// A live drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragOperation {
    /// Client whose frame is being dragged
    pub client: Window,
    /// Pointer button that started the drag
    pub button: u8,
    /// Pointer position at the press (root coordinates)
    pub cursor_start_x: i32,
    pub cursor_start_y: i32,
    /// Window geometry at the press
    pub start_geometry: Geometry,
    pub min_width: u32,
    pub min_height: u32,
    pub kind: DragKind,
}

/// What a motion event asks of the dragged window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragStep {
    MoveTo { x: i32, y: i32 },
    ResizeTo { width: u32, height: u32 },
    Nothing,
}

impl DragOperation {
    /// Target for the pointer now being at (`root_x`, `root_y`)
    pub fn step(&self, root_x: i32, root_y: i32) -> DragStep {
        let dx = root_x - self.cursor_start_x;
        let dy = root_y - self.cursor_start_y;

        match self.kind {
            DragKind::Move => DragStep::MoveTo {
                x: self.start_geometry.x + dx,
                y: self.start_geometry.y + dy,
            },
            DragKind::ResizeAll => DragStep::ResizeTo {
                width: clamped(self.start_geometry.width, dx, self.min_width),
                height: clamped(self.start_geometry.height, dy, self.min_height),
            },
            // Edge drags are recognised but do not resize yet.
            DragKind::ResizeHorizontal | DragKind::ResizeVertical => DragStep::Nothing,
        }
    }

    /// True if the pointer state still holds the button that started the drag
    pub fn button_held(&self, state: KeyButMask) -> bool {
        let mask = match self.button {
            1 => KeyButMask::BUTTON1,
            2 => KeyButMask::BUTTON2,
            3 => KeyButMask::BUTTON3,
            4 => KeyButMask::BUTTON4,
            5 => KeyButMask::BUTTON5,
            _ => return false,
        };
        u16::from(state) & u16::from(mask) != 0
    }
}

fn clamped(start: u32, delta: i32, min: u32) -> u32 {
    let size = i64::from(start) + i64::from(delta);
    size.max(i64::from(min)).min(i64::from(u32::MAX)) as u32
}

/// Drag state machine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragOperation),
}

impl DragState {
    /// Start a drag, replacing any live one
    pub fn begin(&mut self, operation: DragOperation) {
        *self = DragState::Dragging(operation);
    }

    /// End the live drag, if any
    pub fn end(&mut self) -> Option<DragOperation> {
        match std::mem::take(self) {
            DragState::Dragging(operation) => Some(operation),
            DragState::Idle => None,
        }
    }

    /// The live drag, if any
    pub fn current(&self) -> Option<&DragOperation> {
        match self {
            DragState::Dragging(operation) => Some(operation),
            DragState::Idle => None,
        }
    }

    /// Drop the live drag if it targets `client`
    pub fn forget_client(&mut self, client: Window) {
        if self.current().is_some_and(|op| op.client == client) {
            *self = DragState::Idle;
        }
    }
}
