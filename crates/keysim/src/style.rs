//! Render colors for keys
//!
//! Colors given in the layout data win; the selected case color fills in the
//! rest. Borders are the key-top shaded darker, text is black or white
//! depending on the key-top unless the layout names a text color.

use crate::color::Rgb;
use crate::layout::{ColorOverrides, Grid, KeyColors};

/// How much darker a key border is than its key-top
pub const BORDER_SHADE: f32 = 0.3;

/// Merge one key's overrides with the case color
pub fn resolve(overrides: &ColorOverrides, case: Rgb) -> KeyColors {
    let keytop = overrides.keytop.unwrap_or(case);
    KeyColors {
        keytop,
        border: keytop.darken(BORDER_SHADE),
        text: overrides.text.unwrap_or_else(|| keytop.contrast_text()),
    }
}

/// Recompute every key's colors in place
pub fn apply(grid: &mut Grid, case: Rgb) {
    for key in grid.keys_mut() {
        key.colors = resolve(&key.overrides, case);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::parse;

    const CASE: Rgb = Rgb::new(0x21, 0x21, 0x21);

    #[test]
    fn test_case_color_is_default() {
        let colors = resolve(&ColorOverrides::default(), CASE);
        assert_eq!(colors.keytop, CASE);
        assert_eq!(colors.border, CASE.darken(BORDER_SHADE));
        assert_eq!(colors.text, Rgb::WHITE);
    }

    #[test]
    fn test_overrides_win() {
        let overrides = ColorOverrides {
            keytop: Some(Rgb::new(0xee, 0xee, 0xee)),
            text: Some(Rgb::new(0xff, 0, 0)),
        };
        let colors = resolve(&overrides, CASE);
        assert_eq!(colors.keytop, Rgb::new(0xee, 0xee, 0xee));
        assert_eq!(colors.border, Rgb::new(0xee, 0xee, 0xee).darken(BORDER_SHADE));
        assert_eq!(colors.text, Rgb::new(0xff, 0, 0));
    }

    #[test]
    fn test_text_contrasts_with_overridden_keytop() {
        let overrides = ColorOverrides {
            keytop: Some(Rgb::new(0xf0, 0xf0, 0xf0)),
            text: None,
        };
        assert_eq!(resolve(&overrides, CASE).text, Rgb::BLACK);
    }

    #[test]
    fn test_apply_recolors_whole_grid() {
        let mut grid = parse(r##"["A",{c:"#0000ff"},"B"]"##).unwrap().grid;
        apply(&mut grid, Rgb::WHITE);
        let colors: Vec<_> = grid.keys().map(|(_, k)| k.colors().keytop).collect();
        assert_eq!(colors, vec![Rgb::WHITE, Rgb::new(0, 0, 0xff)]);

        apply(&mut grid, CASE);
        assert_eq!(grid.rows()[0][0].colors().keytop, CASE);
        assert_eq!(grid.rows()[0][1].colors().keytop, Rgb::new(0, 0, 0xff));
    }
}
