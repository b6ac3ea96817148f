//! Layout data model: keys, rows and the grid they form.

use crate::color::Rgb;
use serde::Serialize;
use std::collections::BTreeMap;

/// Stable key identity, allocated in parse order and never reused across re-parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct KeyId(pub u64);

/// Position of a key inside the [`Grid`] (row index, index within the row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridCoord {
    pub row: usize,
    pub col: usize,
}

impl GridCoord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Rotation angle in degrees around an origin in key units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rotation {
    pub angle: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

/// Secondary rectangle of a non-rectangular key (ISO Enter, big-ass Enter).
///
/// Carried through from the layout data verbatim; nothing interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SecondaryShape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Colors given explicitly in the layout data (`c` and `t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ColorOverrides {
    pub keytop: Option<Rgb>,
    pub text: Option<Rgb>,
}

/// Final render colors after merging overrides with the case palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyColors {
    pub keytop: Rgb,
    pub border: Rgb,
    pub text: Rgb,
}

impl Default for KeyColors {
    fn default() -> Self {
        Self {
            keytop: Rgb::new(0xcc, 0xcc, 0xcc),
            border: Rgb::new(0x99, 0x99, 0x99),
            text: Rgb::BLACK,
        }
    }
}

/// One physical key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Key {
    pub id: KeyId,
    /// Left edge in key units
    pub x: f64,
    /// Top edge in key units
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: Rotation,
    /// Primary label, used for input lookups
    pub legend: String,
    /// Secondary label (text after the first newline), may be empty
    pub sublegend: String,
    pub overrides: ColorOverrides,
    /// Decorative entry, never highlighted
    pub decal: bool,
    pub secondary: Option<SecondaryShape>,
    /// Alignment, font and profile fields, passed through untouched
    pub meta: BTreeMap<String, serde_json::Value>,
    pub(crate) colors: KeyColors,
    pub(crate) pressed: bool,
}

impl Key {
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn colors(&self) -> KeyColors {
        self.colors
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// Rows of keys in parse order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<Key>>,
}

impl Grid {
    pub(crate) fn from_rows(rows: Vec<Vec<Key>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Key>] {
        &self.rows
    }

    pub fn get(&self, coord: GridCoord) -> Option<&Key> {
        self.rows.get(coord.row)?.get(coord.col)
    }

    pub(crate) fn get_mut(&mut self, coord: GridCoord) -> Option<&mut Key> {
        self.rows.get_mut(coord.row)?.get_mut(coord.col)
    }

    /// Every key with its coordinate, row by row
    pub fn keys(&self) -> impl Iterator<Item = (GridCoord, &Key)> {
        self.rows.iter().enumerate().flat_map(|(row, keys)| {
            keys.iter()
                .enumerate()
                .map(move |(col, key)| (GridCoord::new(row, col), key))
        })
    }

    pub(crate) fn keys_mut(&mut self) -> impl Iterator<Item = &mut Key> {
        self.rows.iter_mut().flatten()
    }

    /// Number of keys (not rows)
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounding box of all keys in key units (width, height)
    pub fn extent(&self) -> (f64, f64) {
        self.keys().fold((0.0, 0.0), |(w, h), (_, k)| {
            (f64::max(w, k.x + k.width), f64::max(h, k.y + k.height))
        })
    }

    /// Coordinates of every key currently marked pressed
    pub fn pressed_coords(&self) -> Vec<GridCoord> {
        self.keys()
            .filter(|(_, k)| k.pressed)
            .map(|(coord, _)| coord)
            .collect()
    }
}

/// Keyboard-level metadata from a leading object in the layout data
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LayoutMeta {
    pub name: Option<String>,
    pub author: Option<String>,
    pub background: Option<Rgb>,
    pub notes: Option<String>,
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Result of a successful parse
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    pub meta: LayoutMeta,
    pub grid: Grid,
}
