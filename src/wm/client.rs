//! Managed client windows
//!
//! A [`ManagedWindow`] is one top-level client plus, while it is mapped, the
//! frame it has been reparented into.

use anyhow::Result;
use tracing::{debug, warn};
use x11rb::protocol::xproto::{ConfigureWindowAux, SetMode, Window};

use crate::shared::Geometry;
use crate::wm::decorations::{Decor, HitZone};
use crate::wm::display::DisplaySession;
use crate::wm::keyboard::Bindings;
use crate::wm::registry::DecorationSet;

/// Whether the client currently sits inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Unmapped,
    Mapped { frame: Window },
}

/// A client window under management
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedWindow {
    client: Window,
    state: FrameState,
    /// Frame position (root-relative) and client content size
    geometry: Geometry,
    decor: Decor,
}

impl ManagedWindow {
    pub fn new(client: Window, geometry: Geometry, decor: Decor) -> Self {
        Self {
            client,
            state: FrameState::Unmapped,
            geometry,
            decor,
        }
    }

    pub fn client(&self) -> Window {
        self.client
    }

    /// Frame handle, present exactly while mapped
    pub fn frame(&self) -> Option<Window> {
        match self.state {
            FrameState::Mapped { frame } => Some(frame),
            FrameState::Unmapped => None,
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.state, FrameState::Mapped { .. })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Offset of the client inside its frame
    fn client_offset(&self) -> (i32, i32) {
        let metrics = &self.decor.metrics;
        (i32::from(metrics.inset), i32::from(metrics.drag_bar_offset))
    }

    fn frame_geometry(&self) -> Geometry {
        let metrics = &self.decor.metrics;
        Geometry::new(
            self.geometry.x,
            self.geometry.y,
            metrics.frame_width(self.geometry.width),
            metrics.frame_height(self.geometry.height),
        )
    }

    /// Apply a client's configure request.
    ///
    /// While framed, position and stacking go to the frame and the client keeps
    /// its place inside it.
    pub fn configure<S: DisplaySession>(&mut self, conn: &S, changes: &ConfigureWindowAux) -> Result<()> {
        if let Some(x) = changes.x {
            self.geometry.x = x;
        }
        if let Some(y) = changes.y {
            self.geometry.y = y;
        }
        if let Some(width) = changes.width {
            self.geometry.width = width;
        }
        if let Some(height) = changes.height {
            self.geometry.height = height;
        }

        let FrameState::Mapped { frame } = self.state else {
            return conn.configure_window(self.client, changes);
        };

        let metrics = self.decor.metrics;
        let mut frame_changes = ConfigureWindowAux::new();
        frame_changes.x = changes.x;
        frame_changes.y = changes.y;
        frame_changes.width = changes.width.map(|w| metrics.frame_width(w));
        frame_changes.height = changes.height.map(|h| metrics.frame_height(h));
        frame_changes.sibling = changes.sibling;
        frame_changes.stack_mode = changes.stack_mode;
        conn.configure_window(frame, &frame_changes)?;

        let (inset_x, inset_y) = self.client_offset();
        let mut client_changes = ConfigureWindowAux::new();
        client_changes.x = changes.x.map(|_| inset_x);
        client_changes.y = changes.y.map(|_| inset_y);
        client_changes.width = changes.width;
        client_changes.height = changes.height;
        client_changes.border_width = changes.border_width;
        conn.configure_window(self.client, &client_changes)
    }

    /// Wrap the client in a new frame and show both.
    ///
    /// Does nothing if already mapped. If the client is already gone no frame
    /// is created.
    pub fn map<S: DisplaySession>(
        &mut self,
        conn: &S,
        decorations: &mut DecorationSet,
        bindings: &Bindings,
    ) -> Result<()> {
        if self.is_mapped() {
            return Ok(());
        }

        let Some(geometry) = conn.geometry(self.client)? else {
            warn!("Window 0x{:x} vanished before it could be framed", self.client);
            return Ok(());
        };
        self.geometry = geometry;

        let frame = conn.create_frame(self.frame_geometry(), &self.decor.style)?;
        decorations.insert(frame);
        self.state = FrameState::Mapped { frame };

        conn.select_frame_events(frame)?;
        conn.change_save_set(SetMode::INSERT, self.client)?;
        let (inset_x, inset_y) = self.client_offset();
        conn.reparent_window(self.client, frame, inset_x, inset_y)?;
        conn.map_window(frame)?;
        bindings.grab(conn, self.client)?;
        conn.map_window(self.client)?;

        debug!("Framed window 0x{:x} in 0x{:x} at {:?}", self.client, frame, self.geometry);
        Ok(())
    }

    /// Take the client out of its frame and destroy the frame.
    ///
    /// Does nothing if not mapped.
    pub fn unmap<S: DisplaySession>(&mut self, conn: &S, decorations: &mut DecorationSet) -> Result<()> {
        let FrameState::Mapped { frame } = self.state else {
            return Ok(());
        };

        conn.unmap_window(frame)?;
        conn.reparent_window(self.client, conn.root(), 0, 0)?;
        conn.change_save_set(SetMode::DELETE, self.client)?;
        conn.destroy_window(frame)?;
        decorations.remove(frame);
        self.state = FrameState::Unmapped;

        debug!("Unframed window 0x{:x} [0x{:x}]", self.client, frame);
        Ok(())
    }

    pub fn location(&self) -> (i32, i32) {
        self.geometry.location()
    }

    /// Move the frame to a root-relative position
    pub fn set_location<S: DisplaySession>(&mut self, conn: &S, x: i32, y: i32) -> Result<()> {
        self.geometry.x = x;
        self.geometry.y = y;

        if let FrameState::Mapped { frame } = self.state {
            conn.configure_window(frame, &ConfigureWindowAux::new().x(x).y(y))?;
        }
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        self.geometry.size()
    }

    /// Resize the client content. Callers clamp to a sane minimum.
    pub fn set_size<S: DisplaySession>(&mut self, conn: &S, width: u32, height: u32) -> Result<()> {
        self.geometry.width = width;
        self.geometry.height = height;

        if let FrameState::Mapped { frame } = self.state {
            let metrics = &self.decor.metrics;
            conn.configure_window(
                frame,
                &ConfigureWindowAux::new()
                    .width(metrics.frame_width(width))
                    .height(metrics.frame_height(height)),
            )?;
            conn.configure_window(self.client, &ConfigureWindowAux::new().width(width).height(height))?;
        }
        Ok(())
    }

    pub fn raise<S: DisplaySession>(&self, conn: &S) -> Result<()> {
        if let FrameState::Mapped { frame } = self.state {
            conn.raise_window(frame)?;
        }
        Ok(())
    }

    pub fn raise_and_focus<S: DisplaySession>(&self, conn: &S) -> Result<()> {
        if self.is_mapped() {
            self.raise(conn)?;
            conn.set_input_focus(self.client)?;
        }
        Ok(())
    }

    /// Classify a frame-relative point
    pub fn position_in_frame(&self, x: i32, y: i32) -> HitZone {
        self.decor
            .metrics
            .hit_zone(self.geometry.width, self.geometry.height, x, y)
    }
}
