//! Window Manager Module
//!
//! The control loop. [`WindowManager`] owns the registry and the drag state
//! and routes one event at a time to a handler, flushing after each.

pub mod client;
pub mod decorations;
pub mod display;
pub mod events;
pub mod keyboard;
pub mod moveresize;
pub mod registry;
pub mod x11;

#[cfg(test)]
pub mod testing;

use anyhow::Result;
use tracing::{debug, info, trace, warn};
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;
use x11rb::x11_utils::X11Error;

use crate::config::{Config, DragConfig};
use crate::error::{ProtocolError, WmError};
use crate::shared::Geometry;
use crate::wm::decorations::Decor;
use crate::wm::display::DisplaySession;
use crate::wm::keyboard::{Bindings, KeyAction};
use crate::wm::moveresize::{DragKind, DragOperation, DragState, DragStep};
use crate::wm::registry::Registry;

/// Where a press delivered straight to a client started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientPress {
    pub client: Window,
    pub cursor_x: i32,
    pub cursor_y: i32,
    pub geometry: Geometry,
}

pub struct WindowManager<S: DisplaySession> {
    conn: S,
    registry: Registry,
    drag: DragState,
    last_client_press: Option<ClientPress>,
    bindings: Bindings,
    decor: Decor,
    drag_limits: DragConfig,
}

impl<S: DisplaySession> WindowManager<S> {
    /// Become the window manager and frame the windows already on screen
    pub fn start(conn: S, config: &Config) -> Result<Self, WmError> {
        info!("Initializing window manager on display {:?}", conn.display_name());

        conn.become_window_manager()?;
        let bindings = Bindings::resolve(&conn, &config.keybindings)?;

        let mut wm = Self {
            conn,
            registry: Registry::new(),
            drag: DragState::default(),
            last_client_press: None,
            bindings,
            decor: Decor::from(&config.decorations),
            drag_limits: config.drag.clone(),
        };

        wm.adopt_existing_windows()?;
        wm.conn.flush()?;

        info!(
            "Managing {} existing windows ({} framed)",
            wm.registry.len(),
            wm.registry.decorations().len()
        );
        Ok(wm)
    }

    fn adopt_existing_windows(&mut self) -> Result<()> {
        self.conn.grab_server()?;
        let adopted = self.frame_existing_windows();
        self.conn.ungrab_server()?;
        adopted
    }

    fn frame_existing_windows(&mut self) -> Result<()> {
        for window in self.conn.top_level_windows()? {
            let Some(attrs) = self.conn.attributes(window)? else {
                debug!("Top-level window 0x{:x} vanished during startup", window);
                continue;
            };

            self.registry.insert(window, attrs.geometry, self.decor);
            if !attrs.override_redirect && attrs.viewable {
                self.registry.map_window(&self.conn, window, &self.bindings)?;
            }
        }
        Ok(())
    }

    /// Dispatch events until the connection breaks
    pub fn run(&mut self) -> Result<(), WmError> {
        info!("Entering event loop");
        loop {
            let event = self.conn.next_event().map_err(WmError::ConnectionLost)?;
            if let Err(e) = self.handle_event(event) {
                warn!("Event handler failed: {:#}", e);
            }
            self.conn.flush().map_err(WmError::ConnectionLost)?;
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::CreateNotify(e) => self.on_create_notify(e),
            Event::ConfigureRequest(e) => self.on_configure_request(e),
            Event::MapRequest(e) => self.on_map_request(e),
            Event::UnmapNotify(e) => self.on_unmap_notify(e),
            Event::DestroyNotify(e) => self.on_destroy_notify(e),
            Event::ButtonPress(e) => self.on_button_press(e),
            Event::ButtonRelease(e) => self.on_button_release(e),
            Event::MotionNotify(e) => self.on_motion_notify(e),
            Event::KeyPress(e) => self.on_key_press(e),
            Event::Error(e) => {
                self.on_protocol_error(&e);
                Ok(())
            }
            other => {
                trace!("Ignoring {} event", events::event_name(&other));
                Ok(())
            }
        }
    }

    fn on_create_notify(&mut self, e: CreateNotifyEvent) -> Result<()> {
        let geometry = Geometry::new(
            i32::from(e.x),
            i32::from(e.y),
            u32::from(e.width),
            u32::from(e.height),
        );
        if self.registry.is_decoration(e.window) {
            trace!("CreateNotify: skipping our own frame 0x{:x}", e.window);
        } else if self.registry.insert(e.window, geometry, self.decor) {
            debug!("CreateNotify: tracking window 0x{:x}", e.window);
        }
        Ok(())
    }

    fn on_configure_request(&mut self, e: ConfigureRequestEvent) -> Result<()> {
        let changes = ConfigureWindowAux::from_configure_request(&e);
        debug!("ConfigureRequest: window 0x{:x} {:?}", e.window, changes);

        match self.registry.get_mut(e.window) {
            Some(window) => window.configure(&self.conn, &changes),
            None => self.conn.configure_window(e.window, &changes),
        }
    }

    fn on_map_request(&mut self, e: MapRequestEvent) -> Result<()> {
        debug!("MapRequest: window 0x{:x}", e.window);
        if self.registry.contains(e.window) {
            self.registry.map_window(&self.conn, e.window, &self.bindings)?;
        }
        self.conn.map_window(e.window)
    }

    fn on_unmap_notify(&mut self, e: UnmapNotifyEvent) -> Result<()> {
        if !self.registry.contains(e.window) {
            trace!("UnmapNotify: ignoring unmanaged window 0x{:x}", e.window);
            return Ok(());
        }
        if e.event == self.conn.root() {
            debug!("UnmapNotify: ignoring reparent of pre-existing window 0x{:x}", e.window);
            return Ok(());
        }

        debug!("UnmapNotify: unframing window 0x{:x}", e.window);
        self.registry.unmap_window(&self.conn, e.window)
    }

    fn on_destroy_notify(&mut self, e: DestroyNotifyEvent) -> Result<()> {
        if !self.registry.contains(e.window) {
            return Ok(());
        }

        debug!("DestroyNotify: forgetting window 0x{:x}", e.window);
        self.drag.forget_client(e.window);
        if self.last_client_press.is_some_and(|press| press.client == e.window) {
            self.last_client_press = None;
        }
        self.registry.remove(&self.conn, e.window)?;
        Ok(())
    }

    fn on_button_press(&mut self, e: ButtonPressEvent) -> Result<()> {
        let (root_x, root_y) = (i32::from(e.root_x), i32::from(e.root_y));

        if let Some(window) = self.registry.get(e.event) {
            let press = ClientPress {
                client: e.event,
                cursor_x: root_x,
                cursor_y: root_y,
                geometry: window.geometry(),
            };
            debug!("ButtonPress {} on client: {:?}", e.detail, press);
            self.last_client_press = Some(press);
            return window.raise_and_focus(&self.conn);
        }

        let Some(window) = self
            .registry
            .client_for_frame(e.event)
            .and_then(|client| self.registry.get(client))
        else {
            trace!("ButtonPress on unmanaged window 0x{:x}", e.event);
            return Ok(());
        };

        let zone = window.position_in_frame(i32::from(e.event_x), i32::from(e.event_y));
        let Some(kind) = DragKind::from_zone(zone) else {
            return Ok(());
        };

        let operation = DragOperation {
            client: window.client(),
            button: e.detail,
            cursor_start_x: root_x,
            cursor_start_y: root_y,
            start_geometry: window.geometry(),
            min_width: self.drag_limits.min_width,
            min_height: self.drag_limits.min_height,
            kind,
        };
        debug!("Starting {:?} drag on window 0x{:x} ({:?})", kind, operation.client, zone);
        self.drag.begin(operation);

        window.raise_and_focus(&self.conn)
    }

    fn on_button_release(&mut self, e: ButtonReleaseEvent) -> Result<()> {
        let Some(client) = self.registry.client_for_frame(e.event) else {
            return Ok(());
        };

        let operation = self.drag.end();
        let Some(window) = self.registry.get(client) else {
            return Ok(());
        };
        if let Some(operation) = operation {
            debug!(
                "Finished {:?} drag on window 0x{:x} at {:?} size {:?}",
                operation.kind,
                operation.client,
                window.location(),
                window.size()
            );
        }
        window.raise_and_focus(&self.conn)
    }

    fn on_motion_notify(&mut self, e: MotionNotifyEvent) -> Result<()> {
        let e = self.conn.coalesce_motion(e)?;

        let Some(client) = self.registry.client_for_frame(e.event) else {
            return Ok(());
        };
        let Some(operation) = self.drag.current() else {
            return Ok(());
        };
        if operation.client != client || !operation.button_held(e.state) {
            trace!("Motion on frame 0x{:x} outside a drag", e.event);
            return Ok(());
        }

        let step = operation.step(i32::from(e.root_x), i32::from(e.root_y));
        let Some(window) = self.registry.get_mut(client) else {
            return Ok(());
        };

        match step {
            DragStep::MoveTo { x, y } => window.set_location(&self.conn, x, y),
            DragStep::ResizeTo { width, height } => window.set_size(&self.conn, width, height),
            DragStep::Nothing => Ok(()),
        }
    }

    fn on_key_press(&mut self, e: KeyPressEvent) -> Result<()> {
        let Some(action) = self.bindings.action_for(e.state, e.detail) else {
            return Ok(());
        };
        debug!("KeyPress: {:?} on window 0x{:x}", action, e.event);

        match action {
            KeyAction::Close => {
                if self.conn.supports_delete_protocol(e.event)? {
                    self.conn.send_delete_window(e.event)
                } else {
                    info!("Window 0x{:x} does not support WM_DELETE_WINDOW, killing it", e.event);
                    self.conn.kill_client(e.event)
                }
            }
            KeyAction::Cycle => {
                let next = self.registry.next_after(e.event);
                match next.and_then(|client| self.registry.get(client)) {
                    Some(window) => window.raise_and_focus(&self.conn),
                    None => Ok(()),
                }
            }
        }
    }

    /// Log an error the server reported for one of our requests
    pub fn on_protocol_error(&self, error: &X11Error) {
        warn!("X error: {}", ProtocolError::from(error));
    }

    /// Baseline of the most recent press delivered straight to a client
    #[cfg(test)]
    pub fn last_client_press(&self) -> Option<ClientPress> {
        self.last_client_press
    }
}
