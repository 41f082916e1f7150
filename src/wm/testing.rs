//! Recording display session for tests
//!
//! Every request is stored as a [`Request`]; replies and events are scripted.

use anyhow::{anyhow, Result};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;

use crate::error::WmError;
use crate::shared::Geometry;
use crate::wm::decorations::FrameStyle;
use crate::wm::display::{ClientAttributes, DisplaySession};
use crate::wm::events::take_latest_motion;
use crate::wm::keyboard::{lock_variants, Bindings};

pub const ROOT: Window = 0x100;
/// Handle of the first frame a fresh session hands out
pub const FIRST_FRAME: Window = 0xf000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    GrabServer,
    UngrabServer,
    CreateFrame(Window, Geometry),
    DestroyWindow(Window),
    MapWindow(Window),
    UnmapWindow(Window),
    Configure(Window, ConfigureWindowAux),
    Raise(Window),
    Reparent(Window, Window, i32, i32),
    Focus(Window),
    GrabButton(Window, u8, ModMask),
    GrabKey(Window, Keycode, ModMask),
    SelectFrameEvents(Window),
    ChangeSaveSet(SetMode, Window),
    SendDeleteWindow(Window),
    KillClient(Window),
}

pub struct FakeSession {
    requests: RefCell<Vec<Request>>,
    geometries: RefCell<HashMap<Window, Geometry>>,
    attributes: RefCell<HashMap<Window, ClientAttributes>>,
    top_level: RefCell<Vec<Window>>,
    delete_protocol: RefCell<HashSet<Window>>,
    keycodes: RefCell<HashMap<u32, Keycode>>,
    events: VecDeque<Event>,
    conflict: Cell<bool>,
    next_frame: Cell<Window>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
            geometries: RefCell::new(HashMap::new()),
            attributes: RefCell::new(HashMap::new()),
            top_level: RefCell::new(Vec::new()),
            delete_protocol: RefCell::new(HashSet::new()),
            keycodes: RefCell::new(HashMap::new()),
            events: VecDeque::new(),
            conflict: Cell::new(false),
            next_frame: Cell::new(FIRST_FRAME),
        }
    }

    /// Drain the requests recorded so far
    pub fn take_requests(&self) -> Vec<Request> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }

    pub fn set_geometry(&self, window: Window, geometry: Geometry) {
        self.geometries.borrow_mut().insert(window, geometry);
    }

    /// Script a window that existed before the manager started
    pub fn add_top_level(&self, window: Window, geometry: Geometry, override_redirect: bool, viewable: bool) {
        self.top_level.borrow_mut().push(window);
        self.set_geometry(window, geometry);
        self.attributes.borrow_mut().insert(
            window,
            ClientAttributes {
                geometry,
                override_redirect,
                viewable,
            },
        );
    }

    pub fn set_delete_protocol(&self, window: Window) {
        self.delete_protocol.borrow_mut().insert(window);
    }

    pub fn set_keycode(&self, keysym: u32, keycode: Keycode) {
        self.keycodes.borrow_mut().insert(keysym, keycode);
    }

    /// Make the ownership claim fail as if another manager were running
    pub fn set_conflict(&self) {
        self.conflict.set(true);
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    fn record(&self, request: Request) -> Result<()> {
        self.requests.borrow_mut().push(request);
        Ok(())
    }
}

impl DisplaySession for FakeSession {
    fn root(&self) -> Window {
        ROOT
    }

    fn display_name(&self) -> &str {
        ":99"
    }

    fn become_window_manager(&self) -> Result<(), WmError> {
        if self.conflict.get() {
            return Err(WmError::AnotherWindowManager {
                display: self.display_name().to_string(),
            });
        }
        Ok(())
    }

    fn grab_server(&self) -> Result<()> {
        self.record(Request::GrabServer)
    }

    fn ungrab_server(&self) -> Result<()> {
        self.record(Request::UngrabServer)
    }

    fn top_level_windows(&self) -> Result<Vec<Window>> {
        Ok(self.top_level.borrow().clone())
    }

    fn attributes(&self, window: Window) -> Result<Option<ClientAttributes>> {
        Ok(self.attributes.borrow().get(&window).copied())
    }

    fn geometry(&self, window: Window) -> Result<Option<Geometry>> {
        Ok(self.geometries.borrow().get(&window).copied())
    }

    fn keycode_for_keysym(&self, keysym: u32) -> Result<Option<Keycode>> {
        Ok(self.keycodes.borrow().get(&keysym).copied())
    }

    fn supports_delete_protocol(&self, window: Window) -> Result<bool> {
        Ok(self.delete_protocol.borrow().contains(&window))
    }

    fn create_frame(&self, geometry: Geometry, _style: &FrameStyle) -> Result<Window> {
        let frame = self.next_frame.get();
        self.next_frame.set(frame + 1);
        self.record(Request::CreateFrame(frame, geometry))?;
        Ok(frame)
    }

    fn destroy_window(&self, window: Window) -> Result<()> {
        self.record(Request::DestroyWindow(window))
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.record(Request::MapWindow(window))
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.record(Request::UnmapWindow(window))
    }

    fn configure_window(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()> {
        self.record(Request::Configure(window, *changes))
    }

    fn raise_window(&self, window: Window) -> Result<()> {
        self.record(Request::Raise(window))
    }

    fn reparent_window(&self, window: Window, parent: Window, x: i32, y: i32) -> Result<()> {
        self.record(Request::Reparent(window, parent, x, y))
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.record(Request::Focus(window))
    }

    fn grab_button(&self, window: Window, button: u8, modifiers: ModMask) -> Result<()> {
        self.record(Request::GrabButton(window, button, modifiers))
    }

    fn grab_key(&self, window: Window, keycode: Keycode, modifiers: ModMask) -> Result<()> {
        self.record(Request::GrabKey(window, keycode, modifiers))
    }

    fn select_frame_events(&self, frame: Window) -> Result<()> {
        self.record(Request::SelectFrameEvents(frame))
    }

    fn change_save_set(&self, mode: SetMode, window: Window) -> Result<()> {
        self.record(Request::ChangeSaveSet(mode, window))
    }

    fn send_delete_window(&self, window: Window) -> Result<()> {
        self.record(Request::SendDeleteWindow(window))
    }

    fn kill_client(&self, window: Window) -> Result<()> {
        self.record(Request::KillClient(window))
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn next_event(&mut self) -> Result<Event> {
        self.events
            .pop_front()
            .ok_or_else(|| anyhow!("connection closed by test"))
    }

    fn coalesce_motion(&mut self, motion: MotionNotifyEvent) -> Result<MotionNotifyEvent> {
        Ok(take_latest_motion(&mut self.events, motion))
    }
}

/// Default shortcuts with close on keycode 70 and cycle on keycode 23
pub fn test_bindings() -> Bindings {
    Bindings {
        modifier: ModMask::M1,
        close: Some(70),
        cycle: Some(23),
        move_button: 1,
        resize_button: 3,
    }
}

/// Grabs [`test_bindings`] installs on `window`, in request order
pub fn client_grabs(window: Window) -> Vec<Request> {
    let variants = lock_variants(ModMask::M1);
    let buttons = [1, 3]
        .into_iter()
        .flat_map(|button| variants.map(|mods| Request::GrabButton(window, button, mods)));
    let keys = [70, 23]
        .into_iter()
        .flat_map(|keycode| variants.map(|mods| Request::GrabKey(window, keycode, mods)));
    buttons.chain(keys).collect()
}

pub fn create_notify(window: Window, geometry: Geometry, override_redirect: bool) -> CreateNotifyEvent {
    CreateNotifyEvent {
        response_type: CREATE_NOTIFY_EVENT,
        sequence: 0,
        parent: ROOT,
        window,
        x: geometry.x as i16,
        y: geometry.y as i16,
        width: geometry.width as u16,
        height: geometry.height as u16,
        border_width: 0,
        override_redirect,
    }
}

pub fn map_request(window: Window) -> MapRequestEvent {
    MapRequestEvent {
        response_type: MAP_REQUEST_EVENT,
        sequence: 0,
        parent: ROOT,
        window,
    }
}

/// Unmap of `window` as reported to `event`
pub fn unmap_notify(event: Window, window: Window) -> UnmapNotifyEvent {
    UnmapNotifyEvent {
        response_type: UNMAP_NOTIFY_EVENT,
        sequence: 0,
        event,
        window,
        from_configure: false,
    }
}

pub fn destroy_notify(window: Window) -> DestroyNotifyEvent {
    DestroyNotifyEvent {
        response_type: DESTROY_NOTIFY_EVENT,
        sequence: 0,
        event: ROOT,
        window,
    }
}

pub fn configure_request(window: Window, x: i16, y: i16, width: u16, height: u16) -> ConfigureRequestEvent {
    ConfigureRequestEvent {
        response_type: CONFIGURE_REQUEST_EVENT,
        stack_mode: StackMode::ABOVE,
        sequence: 0,
        parent: ROOT,
        window,
        sibling: x11rb::NONE,
        x,
        y,
        width,
        height,
        border_width: 0,
        value_mask: ConfigWindow::X | ConfigWindow::Y | ConfigWindow::WIDTH | ConfigWindow::HEIGHT,
    }
}

/// Button press on `event` at frame-relative (`x`, `y`) and root position (`root_x`, `root_y`)
pub fn button_press(event: Window, button: u8, x: i16, y: i16, root_x: i16, root_y: i16) -> ButtonPressEvent {
    ButtonPressEvent {
        response_type: BUTTON_PRESS_EVENT,
        detail: button,
        sequence: 0,
        time: 0,
        root: ROOT,
        event,
        child: x11rb::NONE,
        root_x,
        root_y,
        event_x: x,
        event_y: y,
        state: KeyButMask::from(0u16),
        same_screen: true,
    }
}

pub fn button_release(event: Window, button: u8, root_x: i16, root_y: i16) -> ButtonReleaseEvent {
    ButtonReleaseEvent {
        response_type: BUTTON_RELEASE_EVENT,
        ..button_press(event, button, 0, 0, root_x, root_y)
    }
}

/// Pointer motion over `event` with button 1 held
pub fn motion_notify(event: Window, root_x: i16, root_y: i16) -> MotionNotifyEvent {
    MotionNotifyEvent {
        response_type: MOTION_NOTIFY_EVENT,
        detail: Motion::NORMAL,
        sequence: 0,
        time: 0,
        root: ROOT,
        event,
        child: x11rb::NONE,
        root_x,
        root_y,
        event_x: 0,
        event_y: 0,
        state: KeyButMask::BUTTON1,
        same_screen: true,
    }
}

pub fn key_press(event: Window, keycode: Keycode, state: KeyButMask) -> KeyPressEvent {
    KeyPressEvent {
        response_type: KEY_PRESS_EVENT,
        detail: keycode,
        sequence: 0,
        time: 0,
        root: ROOT,
        event,
        child: x11rb::NONE,
        root_x: 0,
        root_y: 0,
        event_x: 0,
        event_y: 0,
        state,
        same_screen: true,
    }
}
