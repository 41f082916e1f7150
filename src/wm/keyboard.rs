//! Keyboard Module
//!
//! Resolves the configured shortcuts to keycodes, installs the key and button
//! grabs on each framed client and classifies key presses.

use anyhow::Result;
use tracing::{debug, warn};
use x11rb::protocol::xproto::{KeyButMask, Keycode, ModMask, Window};

use crate::config::KeybindingsConfig;
use crate::wm::display::DisplaySession;

const XK_SPACE: u32 = 0x0020;
const XK_TAB: u32 = 0xFF09;
const XK_RETURN: u32 = 0xFF0D;
const XK_ESCAPE: u32 = 0xFF1B;
const XK_F1: u32 = 0xFFBE;

/// Shift through Mod5; the higher bits of a key state are pointer buttons
const MODIFIER_BITS: u16 = 0x00ff;

/// `modifier` alone and with every combination of Lock and Mod2 (NumLock)
pub fn lock_variants(modifier: ModMask) -> [ModMask; 4] {
    [
        modifier,
        modifier | ModMask::LOCK,
        modifier | ModMask::M2,
        modifier | ModMask::LOCK | ModMask::M2,
    ]
}

/// Keyboard shortcut action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Close the window that has the keyboard
    Close,
    /// Raise and focus the next managed window
    Cycle,
}

/// Keysym for a symbolic key name
pub fn keysym_from_name(name: &str) -> Option<u32> {
    match name {
        "Tab" => return Some(XK_TAB),
        "Return" => return Some(XK_RETURN),
        "Escape" => return Some(XK_ESCAPE),
        "space" => return Some(XK_SPACE),
        _ => {}
    }

    if let Some(number) = name.strip_prefix('F').and_then(|n| n.parse::<u32>().ok()) {
        return (1..=12).contains(&number).then(|| XK_F1 + number - 1);
    }

    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        // keymaps list the lowercase keysym first
        (Some(c), None) if c.is_ascii_alphabetic() => Some(u32::from(c.to_ascii_lowercase())),
        (Some(c), None) if c.is_ascii_digit() => Some(u32::from(c)),
        _ => None,
    }
}

/// Modifier mask for a modifier name
pub fn modifier_from_name(name: &str) -> Option<ModMask> {
    match name {
        "Mod1" | "Alt" => Some(ModMask::M1),
        "Mod2" => Some(ModMask::M2),
        "Mod3" => Some(ModMask::M3),
        "Mod4" | "Super" => Some(ModMask::M4),
        "Mod5" => Some(ModMask::M5),
        "Control" => Some(ModMask::CONTROL),
        "Shift" => Some(ModMask::SHIFT),
        _ => None,
    }
}

/// Resolved shortcuts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    pub modifier: ModMask,
    pub close: Option<Keycode>,
    pub cycle: Option<Keycode>,
    pub move_button: u8,
    pub resize_button: u8,
}

impl Bindings {
    /// Resolve configured names against the server keyboard mapping.
    ///
    /// A name that cannot be resolved disables its shortcut.
    pub fn resolve<S: DisplaySession>(conn: &S, config: &KeybindingsConfig) -> Result<Self> {
        let modifier = modifier_from_name(&config.modifier).unwrap_or_else(|| {
            warn!("Unknown modifier {:?}, using Mod1", config.modifier);
            ModMask::M1
        });

        let close = Self::resolve_key(conn, "close", &config.close_key)?;
        let cycle = Self::resolve_key(conn, "cycle", &config.cycle_key)?;

        debug!(
            "Bindings: modifier={:?} close={:?} cycle={:?} buttons={}/{}",
            modifier, close, cycle, config.move_button, config.resize_button
        );

        Ok(Self {
            modifier,
            close,
            cycle,
            move_button: config.move_button,
            resize_button: config.resize_button,
        })
    }

    fn resolve_key<S: DisplaySession>(conn: &S, action: &str, name: &str) -> Result<Option<Keycode>> {
        let Some(keysym) = keysym_from_name(name) else {
            warn!("Unknown key name {:?}, {} shortcut disabled", name, action);
            return Ok(None);
        };

        let keycode = conn.keycode_for_keysym(keysym)?;
        if keycode.is_none() {
            warn!("No keycode produces {:?}, {} shortcut disabled", name, action);
        }
        Ok(keycode)
    }

    /// Install the button and key grabs on a client, once per combination
    /// of Lock and NumLock so the shortcuts work with either engaged
    pub fn grab<S: DisplaySession>(&self, conn: &S, window: Window) -> Result<()> {
        let variants = lock_variants(self.modifier);
        for button in [self.move_button, self.resize_button] {
            for modifiers in variants {
                conn.grab_button(window, button, modifiers)?;
            }
        }
        for keycode in [self.close, self.cycle].into_iter().flatten() {
            for modifiers in variants {
                conn.grab_key(window, keycode, modifiers)?;
            }
        }
        Ok(())
    }

    /// Shortcut triggered by pressing `keycode` with `state` held
    pub fn action_for(&self, state: KeyButMask, keycode: Keycode) -> Option<KeyAction> {
        let ignored = u16::from(ModMask::LOCK) | u16::from(ModMask::M2);
        let held = u16::from(state) & MODIFIER_BITS & !ignored;

        if held != u16::from(self.modifier) {
            return None;
        }

        if Some(keycode) == self.close {
            Some(KeyAction::Close)
        } else if Some(keycode) == self.cycle {
            Some(KeyAction::Cycle)
        } else {
            None
        }
    }
}
