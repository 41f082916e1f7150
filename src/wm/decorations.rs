//! Window decorations for lintel
//!
//! A frame is a single plain window. The client sits inside it at
//! `(inset, drag_bar_offset)`; the strip above the client is the drag bar and
//! the remaining margin is split into resize edges and corners.

use crate::config::DecorationConfig;

/// Frame margins, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetrics {
    /// Left, right and bottom margin
    pub inset: u16,
    /// Top margin including the drag bar
    pub drag_bar_offset: u16,
    /// Side of the square corner hot-zones
    pub corner_size: u16,
}

impl FrameMetrics {
    /// Frame width for a given content width
    pub fn frame_width(&self, content_width: u32) -> u32 {
        content_width + 2 * u32::from(self.inset)
    }

    /// Frame height for a given content height
    pub fn frame_height(&self, content_height: u32) -> u32 {
        content_height + u32::from(self.drag_bar_offset) + u32::from(self.inset)
    }

    /// Classify a frame-relative point of a frame holding `width` x `height` content.
    ///
    /// Checks run in order: content, drag bar, corners, edges. Corners overlap
    /// the edges and must win over them.
    pub fn hit_zone(&self, width: u32, height: u32, x: i32, y: i32) -> HitZone {
        let inset = i64::from(self.inset);
        let offset = i64::from(self.drag_bar_offset);
        let corner = i64::from(self.corner_size);
        let frame_w = i64::from(self.frame_width(width));
        let frame_h = i64::from(self.frame_height(height));
        let (x, y) = (i64::from(x), i64::from(y));

        if x < 0 || y < 0 || x >= frame_w || y >= frame_h {
            return HitZone::None;
        }

        let in_content_span = x >= inset && x < inset + i64::from(width);
        if in_content_span && y >= offset && y < offset + i64::from(height) {
            return HitZone::None;
        }
        if in_content_span && y >= inset && y < offset {
            return HitZone::DragBar;
        }

        let left = x < corner;
        let right = x >= frame_w - corner;
        let top = y < corner;
        let bottom = y >= frame_h - corner;
        match (left, right, top, bottom) {
            (true, _, true, _) => return HitZone::Corner(Corner::TopLeft),
            (_, true, true, _) => return HitZone::Corner(Corner::TopRight),
            (true, _, _, true) => return HitZone::Corner(Corner::BottomLeft),
            (_, true, _, true) => return HitZone::Corner(Corner::BottomRight),
            _ => {}
        }

        if x < inset {
            HitZone::Edge(Edge::Left)
        } else if x >= frame_w - inset {
            HitZone::Edge(Edge::Right)
        } else if y < inset {
            HitZone::Edge(Edge::Top)
        } else if y >= frame_h - inset {
            HitZone::Edge(Edge::Bottom)
        } else {
            HitZone::None
        }
    }
}

/// Frame window appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStyle {
    pub border_width: u16,
    pub background: u32,
    pub border: u32,
}

/// Everything needed to build a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decor {
    pub metrics: FrameMetrics,
    pub style: FrameStyle,
}

impl From<&DecorationConfig> for Decor {
    fn from(config: &DecorationConfig) -> Self {
        Self {
            metrics: FrameMetrics {
                inset: config.inset,
                // the drag bar must at least cover the top margin
                drag_bar_offset: config.drag_bar_offset.max(config.inset),
                corner_size: config.corner_size,
            },
            style: FrameStyle {
                border_width: config.border_width,
                background: config.background,
                border: config.border,
            },
        }
    }
}

impl Default for Decor {
    fn default() -> Self {
        Self::from(&DecorationConfig::default())
    }
}

/// Part of a frame under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitZone {
    /// Client content or outside the frame; the press is not ours
    None,
    DragBar,
    Corner(Corner),
    Edge(Edge),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}
