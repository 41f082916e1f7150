//! X11 display session
//!
//! [`DisplaySession`] over an x11rb [`RustConnection`]. Events that arrive
//! while motion is being coalesced are parked in a queue and handed out
//! before anything new is read from the socket.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::*;
use x11rb::protocol::{ErrorKind, Event};
use x11rb::rust_connection::RustConnection;

use crate::error::WmError;
use crate::shared::Geometry;
use crate::wm::decorations::FrameStyle;
use crate::wm::display::{ClientAttributes, DisplaySession};
use crate::wm::events::take_latest_motion;

/// Upper bound on events read per coalescing pass
const MAX_COALESCE: usize = 256;

pub struct X11Session {
    conn: RustConnection,
    root: Window,
    display_name: String,
    pending: VecDeque<Event>,
    wm_protocols: Atom,
    wm_delete_window: Atom,
}

impl X11Session {
    /// Open the display named `display`, or `$DISPLAY` when `None`
    pub fn connect(display: Option<&str>) -> Result<Self, WmError> {
        let (conn, screen_num) = x11rb::connect(display)?;
        let root = conn.setup().roots[screen_num].root;
        let display_name = display
            .map(str::to_string)
            .or_else(|| std::env::var("DISPLAY").ok())
            .unwrap_or_default();

        let wm_protocols = intern(&conn, "WM_PROTOCOLS")?;
        let wm_delete_window = intern(&conn, "WM_DELETE_WINDOW")?;

        info!("Connected to display {:?} (screen {}, root 0x{:x})", display_name, screen_num, root);

        Ok(Self {
            conn,
            root,
            display_name,
            pending: VecDeque::new(),
            wm_protocols,
            wm_delete_window,
        })
    }
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())?
        .reply()
        .with_context(|| format!("Failed to intern atom {}", name))?
        .atom)
}

/// A reply that failed because the window no longer exists becomes `None`
fn gone_is_none<T>(reply: Result<T, ReplyError>) -> Result<Option<T>> {
    match reply {
        Ok(value) => Ok(Some(value)),
        Err(ReplyError::X11Error(e)) => {
            debug!("Request {:?} failed: {:?}", e.request_name, e.error_kind);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn to_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Window sizes must be at least 1
fn to_u16(value: u32) -> u16 {
    value.clamp(1, u32::from(u16::MAX)) as u16
}

impl DisplaySession for X11Session {
    fn root(&self) -> Window {
        self.root
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn become_window_manager(&self) -> Result<(), WmError> {
        let mask = EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY;
        let cookie = self
            .conn
            .change_window_attributes(self.root, &ChangeWindowAttributesAux::new().event_mask(mask))
            .map_err(anyhow::Error::from)?;

        match cookie.check() {
            Ok(()) => {
                info!("Selected substructure redirect on root 0x{:x}", self.root);
                Ok(())
            }
            Err(ReplyError::X11Error(e)) if e.error_kind == ErrorKind::Access => {
                Err(WmError::AnotherWindowManager {
                    display: self.display_name.clone(),
                })
            }
            Err(e) => Err(anyhow::Error::from(e)
                .context("Failed to select events on root window")
                .into()),
        }
    }

    fn grab_server(&self) -> Result<()> {
        self.conn.grab_server()?;
        Ok(())
    }

    fn ungrab_server(&self) -> Result<()> {
        self.conn.ungrab_server()?;
        Ok(())
    }

    fn top_level_windows(&self) -> Result<Vec<Window>> {
        let tree = self
            .conn
            .query_tree(self.root)?
            .reply()
            .context("Failed to query root window tree")?;
        Ok(tree.children)
    }

    fn attributes(&self, window: Window) -> Result<Option<ClientAttributes>> {
        let Some(attrs) = gone_is_none(self.conn.get_window_attributes(window)?.reply())? else {
            return Ok(None);
        };
        let Some(geometry) = self.geometry(window)? else {
            return Ok(None);
        };

        Ok(Some(ClientAttributes {
            geometry,
            override_redirect: attrs.override_redirect,
            viewable: attrs.map_state == MapState::VIEWABLE,
        }))
    }

    fn geometry(&self, window: Window) -> Result<Option<Geometry>> {
        let reply = gone_is_none(self.conn.get_geometry(window)?.reply())?;
        Ok(reply.map(|geom| {
            Geometry::new(
                i32::from(geom.x),
                i32::from(geom.y),
                u32::from(geom.width),
                u32::from(geom.height),
            )
        }))
    }

    fn keycode_for_keysym(&self, keysym: u32) -> Result<Option<Keycode>> {
        let setup = self.conn.setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;

        let mapping = self
            .conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()
            .context("Failed to read keyboard mapping")?;

        let per_keycode = usize::from(mapping.keysyms_per_keycode);
        if per_keycode == 0 {
            return Ok(None);
        }

        let position = mapping
            .keysyms
            .chunks(per_keycode)
            .position(|syms| syms.contains(&keysym));

        Ok(position.and_then(|index| u8::try_from(index).ok().map(|i| min_keycode + i)))
    }

    fn supports_delete_protocol(&self, window: Window) -> Result<bool> {
        let reply = self
            .conn
            .get_property(false, window, self.wm_protocols, AtomEnum::ATOM, 0, 1024)?
            .reply();

        let Some(reply) = gone_is_none(reply)? else {
            return Ok(false);
        };
        Ok(reply
            .value32()
            .is_some_and(|mut protocols| protocols.any(|atom| atom == self.wm_delete_window)))
    }

    fn create_frame(&self, geometry: Geometry, style: &FrameStyle) -> Result<Window> {
        let frame = self.conn.generate_id()?;
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            frame,
            self.root,
            to_i16(geometry.x),
            to_i16(geometry.y),
            to_u16(geometry.width),
            to_u16(geometry.height),
            style.border_width,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .background_pixel(style.background)
                .border_pixel(style.border),
        )?;
        Ok(frame)
    }

    fn destroy_window(&self, window: Window) -> Result<()> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn configure_window(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()> {
        self.conn.configure_window(window, changes)?;
        Ok(())
    }

    fn raise_window(&self, window: Window) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
        Ok(())
    }

    fn reparent_window(&self, window: Window, parent: Window, x: i32, y: i32) -> Result<()> {
        self.conn.reparent_window(window, parent, to_i16(x), to_i16(y))?;
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn grab_button(&self, window: Window, button: u8, modifiers: ModMask) -> Result<()> {
        self.conn.grab_button(
            false,
            window,
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::BUTTON_MOTION,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            ButtonIndex::from(button),
            modifiers,
        )?;
        Ok(())
    }

    fn grab_key(&self, window: Window, keycode: Keycode, modifiers: ModMask) -> Result<()> {
        self.conn
            .grab_key(false, window, modifiers, keycode, GrabMode::ASYNC, GrabMode::ASYNC)?;
        Ok(())
    }

    fn select_frame_events(&self, frame: Window) -> Result<()> {
        let mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::BUTTON_PRESS
            | EventMask::BUTTON_RELEASE
            | EventMask::BUTTON_MOTION;
        self.conn
            .change_window_attributes(frame, &ChangeWindowAttributesAux::new().event_mask(mask))?;
        Ok(())
    }

    fn change_save_set(&self, mode: SetMode, window: Window) -> Result<()> {
        self.conn.change_save_set(mode, window)?;
        Ok(())
    }

    fn send_delete_window(&self, window: Window) -> Result<()> {
        let event = ClientMessageEvent::new(
            32,
            window,
            self.wm_protocols,
            [self.wm_delete_window, x11rb::CURRENT_TIME, 0, 0, 0],
        );
        self.conn
            .send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    fn kill_client(&self, window: Window) -> Result<()> {
        self.conn.kill_client(window)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }

    fn next_event(&mut self) -> Result<Event> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(event);
        }
        Ok(self.conn.wait_for_event()?)
    }

    fn coalesce_motion(&mut self, motion: MotionNotifyEvent) -> Result<MotionNotifyEvent> {
        for _ in 0..MAX_COALESCE {
            match self.conn.poll_for_event()? {
                Some(event) => self.pending.push_back(event),
                None => break,
            }
        }
        Ok(take_latest_motion(&mut self.pending, motion))
    }
}
