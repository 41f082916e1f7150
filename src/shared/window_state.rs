//! Window geometry shared by the registry, the drag machine and the display session.

/// Window geometry
///
/// For a managed window `x`/`y` is the root-relative position of the frame and
/// `width`/`height` is the size of the client content, not of the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Position component only
    pub fn location(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Size component only
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
