//! Bundled layouts and case colors
//!
//! The first entry of each list is the startup default.

use crate::color::Rgb;
use crate::error::{Error, Result};

/// A bundled layout in keyboard-layout-editor raw data form
#[derive(Debug, Clone, Copy)]
pub struct LayoutPreset {
    pub key: &'static str,
    pub caption: &'static str,
    pub data: &'static str,
}

/// A selectable case (keyboard body) color
#[derive(Debug, Clone, Copy)]
pub struct CasePreset {
    pub key: &'static str,
    pub caption: &'static str,
    pub color: Rgb,
}

pub const LAYOUT_PRESETS: &[LayoutPreset] = &[
    LayoutPreset {
        key: "ansi60",
        caption: "ANSI 60%",
        data: include_str!("../layouts/ansi60.json"),
    },
    LayoutPreset {
        key: "iso60",
        caption: "ISO 60%",
        data: include_str!("../layouts/iso60.json"),
    },
    LayoutPreset {
        key: "tkl",
        caption: "ANSI TKL",
        data: include_str!("../layouts/tkl.json"),
    },
    LayoutPreset {
        key: "numpad",
        caption: "Numpad",
        data: include_str!("../layouts/numpad.json"),
    },
];

pub const CASE_PRESETS: &[CasePreset] = &[
    CasePreset { key: "carbon", caption: "Carbon", color: Rgb::new(0x21, 0x21, 0x21) },
    CasePreset { key: "silver", caption: "Silver", color: Rgb::new(0xc0, 0xc0, 0xc0) },
    CasePreset { key: "navy", caption: "Navy", color: Rgb::new(0x1f, 0x2a, 0x44) },
    CasePreset { key: "olivia", caption: "Olivia", color: Rgb::new(0xe8, 0xc4, 0xb8) },
    CasePreset { key: "lime", caption: "Lime", color: Rgb::new(0xa4, 0xc6, 0x39) },
    CasePreset { key: "white", caption: "White", color: Rgb::new(0xf5, 0xf5, 0xf5) },
];

/// Look up a layout preset by key
pub fn layout_preset(key: &str) -> Result<&'static LayoutPreset> {
    LAYOUT_PRESETS
        .iter()
        .find(|p| p.key == key)
        .ok_or_else(|| Error::UnknownPreset(format!("layout '{}'", key)))
}

/// Look up a case color preset by key
pub fn case_preset(key: &str) -> Result<&'static CasePreset> {
    CASE_PRESETS
        .iter()
        .find(|p| p.key == key)
        .ok_or_else(|| Error::UnknownPreset(format!("case color '{}'", key)))
}

/// Position of a layout preset, for cycling through the list
pub fn layout_position(key: &str) -> Option<usize> {
    LAYOUT_PRESETS.iter().position(|p| p.key == key)
}

/// Position of a case preset, for cycling through the list
pub fn case_position(key: &str) -> Option<usize> {
    CASE_PRESETS.iter().position(|p| p.key == key)
}
