//! Configuration for lintel
//!
//! Loaded from TOML at `$LINTEL_CONFIG` or `~/.config/lintel/config.toml`.
//! Every field has a default, so a missing file or a partial file is fine.
//! The file is only ever read, never written.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "LINTEL_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Display to connect to; falls back to `$DISPLAY` when unset
    pub display: Option<String>,
    pub decorations: DecorationConfig,
    pub drag: DragConfig,
    pub keybindings: KeybindingsConfig,
}

impl Config {
    /// Load configuration, falling back to defaults on any problem
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Some(path) => path,
            None => {
                warn!("No config directory available, using defaults");
                return Self::default();
            }
        };

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {:?}: {:#}", path, e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        info!("Configuration loaded from {:?}", path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        dirs::config_dir().map(|dir| dir.join("lintel").join("config.toml"))
    }
}

/// Frame geometry and colours
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    /// Width of the frame margin on the left, right and bottom of the client
    pub inset: u16,
    /// Vertical offset of the client inside its frame (top margin plus drag bar)
    pub drag_bar_offset: u16,
    /// Side length of the square resize hot-zone in each frame corner
    pub corner_size: u16,
    /// X border drawn around the frame
    pub border_width: u16,
    /// Frame background colour (0xRRGGBB)
    pub background: u32,
    /// Frame border colour (0xRRGGBB)
    pub border: u32,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            inset: 4,
            drag_bar_offset: 24,
            corner_size: 12,
            border_width: 1,
            background: 0x3b4252,
            border: 0x5e81ac,
        }
    }
}

/// Interactive resize limits
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Smallest content width a resize drag may produce
    pub min_width: u32,
    /// Smallest content height a resize drag may produce
    pub min_height: u32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            min_width: 10,
            min_height: 10,
        }
    }
}

/// Keyboard and pointer shortcuts
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    /// Modifier that must be held: Mod1..Mod5, Alt, Super, Control, Shift
    pub modifier: String,
    /// Key that closes the focused client
    pub close_key: String,
    /// Key that cycles focus to the next client
    pub cycle_key: String,
    /// Pointer button grabbed on clients for moving
    pub move_button: u8,
    /// Pointer button grabbed on clients for resizing
    pub resize_button: u8,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            modifier: "Mod1".to_string(),
            close_key: "F4".to_string(),
            cycle_key: "Tab".to_string(),
            move_button: 1,
            resize_button: 3,
        }
    }
}
