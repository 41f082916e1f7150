//! Events Module
//!
//! Event classification helpers for the dispatcher: motion coalescing and
//! short names for log lines.

use std::collections::VecDeque;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::MotionNotifyEvent;

/// Newest motion for the window `first` was reported on.
///
/// Removes queued motions for that window from `pending` up to the first
/// queued button press or release; motion after a button event belongs to
/// the next gesture and stays queued. All other events keep their order.
pub fn take_latest_motion(
    pending: &mut VecDeque<Event>,
    first: MotionNotifyEvent,
) -> MotionNotifyEvent {
    let mut latest = first;
    let mut index = 0;
    while index < pending.len() {
        match &pending[index] {
            Event::MotionNotify(motion) if motion.event == latest.event => {
                latest = *motion;
                pending.remove(index);
            }
            Event::ButtonPress(_) | Event::ButtonRelease(_) => break,
            _ => index += 1,
        }
    }
    latest
}

/// Short event name for log lines
pub fn event_name(event: &Event) -> &'static str {
    match event {
        Event::CreateNotify(_) => "CreateNotify",
        Event::ConfigureRequest(_) => "ConfigureRequest",
        Event::MapRequest(_) => "MapRequest",
        Event::UnmapNotify(_) => "UnmapNotify",
        Event::DestroyNotify(_) => "DestroyNotify",
        Event::ButtonPress(_) => "ButtonPress",
        Event::ButtonRelease(_) => "ButtonRelease",
        Event::MotionNotify(_) => "MotionNotify",
        Event::KeyPress(_) => "KeyPress",
        Event::KeyRelease(_) => "KeyRelease",
        Event::MapNotify(_) => "MapNotify",
        Event::ConfigureNotify(_) => "ConfigureNotify",
        Event::ReparentNotify(_) => "ReparentNotify",
        Event::Expose(_) => "Expose",
        Event::Error(_) => "Error",
        _ => "other",
    }
}
