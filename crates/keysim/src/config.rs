//! Configuration file support for keysim
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/keysim/config.toml`
//! - macOS: `~/Library/Application Support/keysim/config.toml`
//! - Windows: `%APPDATA%\keysim\config.toml`

use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::legend::{KeyCode, LegendMap};
use crate::presets::{case_preset, layout_preset, CASE_PRESETS, LAYOUT_PRESETS};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hold time after which a terminal key is treated as released
/// Must be longer than the OS key repeat delay (typically 300-500ms)
pub const DEFAULT_HOLD_RELEASE_MS: u64 = 400;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layout selection
    pub layout: LayoutSettings,
    /// Case color selection
    pub case: CaseSettings,
    /// Rendering and input options
    pub ui: UiSettings,
    /// Legend overrides for key codes
    pub legends: LegendSettings,
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Err(Error::Config(format!("Config file not found at {:?}", path)))
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the default config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "keysim") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(Error::Config("Could not determine config directory".to_string()))
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::write_default_config_file(&path)?;
        Ok(path)
    }

    /// Write the commented default config to `path`
    pub fn write_default_config_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = r##"# keysim configuration file

[layout]
# Bundled layout: "ansi60", "iso60", "tkl" or "numpad"
preset = "ansi60"

# Load a keyboard-layout-editor file instead of the preset (optional)
# file = "/path/to/layout.json"

[case]
# Bundled case color: "carbon", "silver", "navy", "olivia", "lime" or "white"
preset = "carbon"

# Custom case color, overrides the preset (optional)
# color = "#2b2b2b"

[ui]
# Show the secondary legend line on keys
show_sublegends = true

# List the held key codes under the keyboard
show_pressed_codes = true

# Terminal cells per key unit
unit_width = 7
unit_height = 3

# Color of held keys
pressed_color = "#00bcd4"

# Release timeout in milliseconds when only terminal key events are available
# Keys are released after this time if no repeat arrives
hold_release_ms = 400

[legends]
# Legend drawn for a browser key code, replacing the standard one (optional)
# overrides = { "13" = "Return", "161" = "Shift" }
"##;

        fs::write(path, content)?;
        Ok(())
    }

    /// Layout text to load at startup: the configured file, else the preset
    pub fn layout_text(&self) -> Result<String> {
        match &self.layout.file {
            Some(path) => Ok(fs::read_to_string(path)?),
            None => Ok(layout_preset(&self.layout.preset)?.data.to_string()),
        }
    }

    /// Case color: explicit color, else the preset's
    pub fn case_color(&self) -> Result<Rgb> {
        match self.case.color {
            Some(color) => Ok(color),
            None => Ok(case_preset(&self.case.preset)?.color),
        }
    }

    /// Standard legend table with the configured overrides applied
    pub fn legend_table(&self) -> Result<LegendMap> {
        let mut table = LegendMap::standard();
        for (code, legend) in &self.legends.overrides {
            let code: u32 = code
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("legend override key {:?} is not a key code", code)))?;
            table.insert(KeyCode(code), legend.clone());
        }
        Ok(table)
    }

    /// Hold-release timeout for terminal input
    pub fn hold_release(&self) -> Duration {
        Duration::from_millis(self.ui.hold_release_ms)
    }
}

/// Layout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Bundled layout key
    pub preset: String,
    /// Layout file, takes precedence over `preset`
    pub file: Option<PathBuf>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            preset: LAYOUT_PRESETS[0].key.to_string(),
            file: None,
        }
    }
}

/// Case color settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseSettings {
    /// Bundled case color key
    pub preset: String,
    /// Custom color, takes precedence over `preset`
    pub color: Option<Rgb>,
}

impl Default for CaseSettings {
    fn default() -> Self {
        Self {
            preset: CASE_PRESETS[0].key.to_string(),
            color: None,
        }
    }
}

/// Rendering and input settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Show the secondary legend line on keys
    pub show_sublegends: bool,
    /// List held key codes under the keyboard
    pub show_pressed_codes: bool,
    /// Terminal columns per key unit
    pub unit_width: u16,
    /// Terminal rows per key unit
    pub unit_height: u16,
    /// Color of held keys
    pub pressed_color: Rgb,
    /// Release timeout for terminal-only input
    pub hold_release_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            show_sublegends: true,
            show_pressed_codes: true,
            unit_width: 7,
            unit_height: 3,
            pressed_color: Rgb::new(0x00, 0xbc, 0xd4),
            hold_release_ms: DEFAULT_HOLD_RELEASE_MS,
        }
    }
}

/// Legend table settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendSettings {
    /// Browser key code (decimal, as TOML keys are strings) -> legend,
    /// replacing that code's standard legend
    pub overrides: BTreeMap<String, String>,
}
