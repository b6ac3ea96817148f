//! keysim - Terminal keyboard simulator
//!
//! Drives a keyboard-layout-editor layout with real key presses and
//! highlights the matching keys. Features include:
//!
//! - Parser for the keyboard-layout-editor serialization (raw data or JSON)
//! - Legend index mapping one key code to every key bearing its legend
//! - Idempotent press/release tracking that survives layout changes
//! - Case color theming with per-key color overrides
//! - OS-level key detection for reliable key release handling
//! - Configurable via TOML file
//!
//! # Usage as a Library
//!
//! ```no_run
//! use keysim::{KeyCode, KeySimulator};
//!
//! let mut sim = KeySimulator::default();
//! sim.load_layout(r#"["Esc","F1"],["Tab","Q","W"]"#)?;
//!
//! // Browser-style key codes: 'Q' is 81
//! sim.key_down(KeyCode(81));
//! for coord in sim.locate("Q") {
//!     assert!(sim.grid().get(*coord).unwrap().is_pressed());
//! }
//! sim.key_up(KeyCode(81));
//! # Ok::<(), keysim::Error>(())
//! ```

pub mod color;
pub mod config;
pub mod error;
pub mod index;
pub mod input;
pub mod keyboard;
pub mod layout;
pub mod legend;
pub mod presets;
pub mod style;
pub mod ui;

// Re-export main types
pub use color::Rgb;
pub use config::Config;
pub use error::{Error, Result};
pub use index::LocationIndex;
pub use input::{is_available as os_keyboard_available, HoldTimer, OsKeyEvent, OsKeyboardListener};
pub use keyboard::{Change, KeySimulator};
pub use layout::{parse, Grid, GridCoord, Key, KeyId, Layout, LayoutMeta, LayoutParser};
pub use legend::{KeyCode, LegendMap, LegendTable};
pub use ui::{render_keyboard, KeyboardWidget};
