//! Window registry
//!
//! Owns every [`ManagedWindow`] together with the two lookup tables that let
//! the dispatcher tell frames apart from clients: the set of frames we created
//! and the index from frame back to client. Map, unmap and removal go through
//! here so the three structures are always updated together.

use anyhow::Result;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use tracing::debug;
use x11rb::protocol::xproto::Window;

use crate::shared::Geometry;
use crate::wm::client::ManagedWindow;
use crate::wm::decorations::Decor;
use crate::wm::display::DisplaySession;
use crate::wm::keyboard::Bindings;

/// Frames created by the window manager
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
    frames: HashSet<Window>,
}

impl DecorationSet {
    pub fn insert(&mut self, frame: Window) {
        self.frames.insert(frame);
    }

    pub fn remove(&mut self, frame: Window) {
        self.frames.remove(&frame);
    }

    pub fn contains(&self, window: Window) -> bool {
        self.frames.contains(&window)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Frame handle to client handle, for mapped windows only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameIndex {
    clients: HashMap<Window, Window>,
}

impl FrameIndex {
    fn insert(&mut self, frame: Window, client: Window) {
        self.clients.insert(frame, client);
    }

    fn remove(&mut self, frame: Window) {
        self.clients.remove(&frame);
    }

    pub fn client_for(&self, frame: Window) -> Option<Window> {
        self.clients.get(&frame).copied()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.clients.len()
    }
}

/// All managed windows, in ascending handle order
#[derive(Debug, Default)]
pub struct Registry {
    windows: BTreeMap<Window, ManagedWindow>,
    decorations: DecorationSet,
    frames: FrameIndex,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `client` unmapped.
    ///
    /// Returns false for a handle that is already registered or is one of our frames.
    pub fn insert(&mut self, client: Window, geometry: Geometry, decor: Decor) -> bool {
        if self.windows.contains_key(&client) || self.decorations.contains(client) {
            return false;
        }
        self.windows.insert(client, ManagedWindow::new(client, geometry, decor));
        debug!("Registered window 0x{:x} ({} managed)", client, self.windows.len());
        true
    }

    pub fn get(&self, client: Window) -> Option<&ManagedWindow> {
        self.windows.get(&client)
    }

    pub fn get_mut(&mut self, client: Window) -> Option<&mut ManagedWindow> {
        self.windows.get_mut(&client)
    }

    pub fn contains(&self, client: Window) -> bool {
        self.windows.contains_key(&client)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Frame `client` and index its frame. Unknown handles are ignored.
    pub fn map_window<S: DisplaySession>(&mut self, conn: &S, client: Window, bindings: &Bindings) -> Result<()> {
        let Some(window) = self.windows.get_mut(&client) else {
            return Ok(());
        };

        window.map(conn, &mut self.decorations, bindings)?;
        if let Some(frame) = window.frame() {
            self.frames.insert(frame, client);
        }
        Ok(())
    }

    /// Drop the index entry and unframe `client`. Unknown handles are ignored.
    pub fn unmap_window<S: DisplaySession>(&mut self, conn: &S, client: Window) -> Result<()> {
        let Some(window) = self.windows.get_mut(&client) else {
            return Ok(());
        };

        if let Some(frame) = window.frame() {
            self.frames.remove(frame);
        }
        window.unmap(conn, &mut self.decorations)
    }

    /// Unframe if needed, then forget `client`
    pub fn remove<S: DisplaySession>(&mut self, conn: &S, client: Window) -> Result<Option<ManagedWindow>> {
        self.unmap_window(conn, client)?;
        let removed = self.windows.remove(&client);
        if removed.is_some() {
            debug!("Forgot window 0x{:x} ({} managed)", client, self.windows.len());
        }
        Ok(removed)
    }

    /// Client framed by `frame`
    pub fn client_for_frame(&self, frame: Window) -> Option<Window> {
        self.frames.client_for(frame)
    }

    /// Whether `window` is a frame we created
    pub fn is_decoration(&self, window: Window) -> bool {
        self.decorations.contains(window)
    }

    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    #[cfg(test)]
    pub fn frame_index(&self) -> &FrameIndex {
        &self.frames
    }

    /// Next handle after `client` in ascending order, wrapping to the first
    pub fn next_after(&self, client: Window) -> Option<Window> {
        self.windows
            .range((Bound::Excluded(client), Bound::Unbounded))
            .next()
            .or_else(|| self.windows.iter().next())
            .map(|(&handle, _)| handle)
    }
}
