//! Display Module
//!
//! The seam between the window manager and the X server. Everything the
//! manager asks of the server goes through [`DisplaySession`]; the production
//! implementation lives in [`crate::wm::x11`].
//!
//! Requests are fire-and-forget: a request that the server rejects comes back
//! later as an `Event::Error`. Only a broken connection is an `Err` here.

use anyhow::Result;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    ConfigureWindowAux, Keycode, ModMask, MotionNotifyEvent, SetMode, Window,
};

use crate::error::WmError;
use crate::shared::Geometry;
use crate::wm::decorations::FrameStyle;

/// Attributes read for a window found at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAttributes {
    pub geometry: Geometry,
    pub override_redirect: bool,
    /// Mapped and visible on screen
    pub viewable: bool,
}

/// Connection to a display server, as seen by the window manager
pub trait DisplaySession {
    /// Root window of the managed screen
    fn root(&self) -> Window;

    /// Name of the display, for log messages
    fn display_name(&self) -> &str;

    /// Claim substructure redirect on the root.
    ///
    /// Returns [`WmError::AnotherWindowManager`] if someone else holds it.
    fn become_window_manager(&self) -> Result<(), WmError>;

    fn grab_server(&self) -> Result<()>;
    fn ungrab_server(&self) -> Result<()>;

    /// Direct children of the root, bottom to top
    fn top_level_windows(&self) -> Result<Vec<Window>>;

    /// Attributes and geometry of `window`, or `None` if it is gone
    fn attributes(&self, window: Window) -> Result<Option<ClientAttributes>>;

    /// Current geometry of `window`, or `None` if it is gone
    fn geometry(&self, window: Window) -> Result<Option<Geometry>>;

    /// First keycode producing `keysym`
    fn keycode_for_keysym(&self, keysym: u32) -> Result<Option<Keycode>>;

    /// Whether `window` lists WM_DELETE_WINDOW in its WM_PROTOCOLS
    fn supports_delete_protocol(&self, window: Window) -> Result<bool>;

    /// Create an unmapped frame window on the root
    fn create_frame(&self, geometry: Geometry, style: &FrameStyle) -> Result<Window>;

    fn destroy_window(&self, window: Window) -> Result<()>;
    fn map_window(&self, window: Window) -> Result<()>;
    fn unmap_window(&self, window: Window) -> Result<()>;
    fn configure_window(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()>;
    fn raise_window(&self, window: Window) -> Result<()>;
    fn reparent_window(&self, window: Window, parent: Window, x: i32, y: i32) -> Result<()>;
    fn set_input_focus(&self, window: Window) -> Result<()>;
    fn grab_button(&self, window: Window, button: u8, modifiers: ModMask) -> Result<()>;
    fn grab_key(&self, window: Window, keycode: Keycode, modifiers: ModMask) -> Result<()>;

    /// Subscribe a frame to substructure and drag events
    fn select_frame_events(&self, frame: Window) -> Result<()>;

    fn change_save_set(&self, mode: SetMode, window: Window) -> Result<()>;

    /// Ask `window` to close itself via WM_PROTOCOLS
    fn send_delete_window(&self, window: Window) -> Result<()>;

    fn kill_client(&self, window: Window) -> Result<()>;

    fn flush(&self) -> Result<()>;

    /// Block until the next event arrives
    fn next_event(&mut self) -> Result<Event>;

    /// Replace `motion` with the newest queued motion for the same window.
    ///
    /// Never blocks. Other queued events keep their order.
    fn coalesce_motion(&mut self, motion: MotionNotifyEvent) -> Result<MotionNotifyEvent>;
}
