//! Keyboard simulator state
//!
//! [`KeySimulator`] owns the active layout, its location index, the set of
//! key codes currently held down and the case color. It is the only writer:
//! every input goes through one of its methods, and each method returns a
//! [`Change`] telling the host what to redraw.
//!
//! Pressed flags on the grid always equal the union of indexed coordinates
//! of the codes in the pressed set.

use std::collections::BTreeSet;

use crate::color::Rgb;
use crate::error::Result;
use crate::index::LocationIndex;
use crate::layout::{Grid, GridCoord, Layout, LayoutMeta, LayoutParser};
use crate::legend::{KeyCode, LegendMap, LegendTable};
use crate::style;

/// Case color used until one is selected
pub const DEFAULT_CASE_COLOR: Rgb = Rgb::new(0x21, 0x21, 0x21);

/// What a transition changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Nothing observable changed (repeat key-down, unmatched key-up)
    Unchanged,
    /// `code` went down; `coords` are the keys now highlighted for it
    Pressed { code: KeyCode, coords: Vec<GridCoord> },
    /// `code` went up; `coords` are the keys no longer highlighted
    Released { code: KeyCode, coords: Vec<GridCoord> },
    /// A new grid and index replaced the old ones
    LayoutReplaced,
    /// Key colors were recomputed
    Recolored,
}

/// Layout, index and pressed-key state behind one writer
#[derive(Debug, Clone)]
pub struct KeySimulator<T: LegendTable = LegendMap> {
    legends: T,
    layout: Layout,
    index: LocationIndex,
    pressed_keys: BTreeSet<KeyCode>,
    case_color: Rgb,
    next_key_id: u64,
}

impl Default for KeySimulator<LegendMap> {
    fn default() -> Self {
        Self::new(LegendMap::standard())
    }
}

impl<T: LegendTable> KeySimulator<T> {
    /// Create a simulator with an empty layout
    pub fn new(legends: T) -> Self {
        Self {
            legends,
            layout: Layout::default(),
            index: LocationIndex::default(),
            pressed_keys: BTreeSet::new(),
            case_color: DEFAULT_CASE_COLOR,
            next_key_id: 0,
        }
    }

    /// Parse `text` and make it the active layout.
    ///
    /// On error the previous layout stays active untouched. Keys still held
    /// down stay held and are highlighted on the new grid.
    pub fn load_layout(&mut self, text: &str) -> Result<Change> {
        let mut layout = match LayoutParser::new().first_id(self.next_key_id).parse_str(text) {
            Ok(layout) => layout,
            Err(e) => {
                log::warn!("Rejected layout: {}", e);
                return Err(e);
            }
        };

        style::apply(&mut layout.grid, self.case_color);
        let index = LocationIndex::build(&layout.grid);

        self.next_key_id += layout.grid.len() as u64;
        self.layout = layout;
        self.index = index;

        let held: Vec<KeyCode> = self.pressed_keys.iter().copied().collect();
        for code in held {
            for coord in self.coords_for(code) {
                self.set_pressed(coord, true);
            }
        }

        log::debug!(
            "Loaded layout {:?}: {} keys, {} legends",
            self.layout.meta.name,
            self.layout.grid.len(),
            self.index.len()
        );
        Ok(Change::LayoutReplaced)
    }

    /// Handle a key press. Repeats of a held code are no-ops.
    pub fn key_down(&mut self, code: KeyCode) -> Change {
        if !self.pressed_keys.insert(code) {
            return Change::Unchanged;
        }

        let coords = self.coords_for(code);
        for &coord in &coords {
            self.set_pressed(coord, true);
        }
        log::debug!("Key down {} -> {:?}", code, coords);
        Change::Pressed { code, coords }
    }

    /// Handle a key release. Releasing a code that is not down is a no-op.
    pub fn key_up(&mut self, code: KeyCode) -> Change {
        if !self.pressed_keys.remove(&code) {
            return Change::Unchanged;
        }

        let mut released = Vec::new();
        for coord in self.coords_for(code) {
            // Another held code can light the same key (two codes, one legend).
            if !self.is_covered(coord) {
                self.set_pressed(coord, false);
                released.push(coord);
            }
        }
        log::debug!("Key up {} -> {:?}", code, released);
        Change::Released { code, coords: released }
    }

    /// Pointer press on a drawn key, translated through the legend table
    pub fn press_legend(&mut self, legend: &str) -> Change {
        match self.legends.code_for(legend) {
            Some(code) => self.key_down(code),
            None => Change::Unchanged,
        }
    }

    /// Pointer release on a drawn key
    pub fn release_legend(&mut self, legend: &str) -> Change {
        match self.legends.code_for(legend) {
            Some(code) => self.key_up(code),
            None => Change::Unchanged,
        }
    }

    /// Release every held code (focus loss). Returns the released codes.
    pub fn release_all(&mut self) -> Vec<KeyCode> {
        let released: Vec<KeyCode> = std::mem::take(&mut self.pressed_keys).into_iter().collect();
        for key in self.layout.grid.keys_mut() {
            key.pressed = false;
        }
        released
    }

    /// Select a new case color and recolor every key
    pub fn set_case_color(&mut self, color: Rgb) -> Change {
        self.case_color = color;
        style::apply(&mut self.layout.grid, color);
        Change::Recolored
    }

    /// Coordinates drawn for `legend` (for "where is Enter?" highlights)
    pub fn locate(&self, legend: &str) -> &[GridCoord] {
        self.index.locate(legend)
    }

    pub fn grid(&self) -> &Grid {
        &self.layout.grid
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn meta(&self) -> &LayoutMeta {
        &self.layout.meta
    }

    pub fn index(&self) -> &LocationIndex {
        &self.index
    }

    pub fn pressed_keys(&self) -> &BTreeSet<KeyCode> {
        &self.pressed_keys
    }

    pub fn is_down(&self, code: KeyCode) -> bool {
        self.pressed_keys.contains(&code)
    }

    pub fn any_key_down(&self) -> bool {
        !self.pressed_keys.is_empty()
    }

    pub fn case_color(&self) -> Rgb {
        self.case_color
    }

    pub fn legends(&self) -> &T {
        &self.legends
    }

    fn coords_for(&self, code: KeyCode) -> Vec<GridCoord> {
        self.legends
            .legend_for(code)
            .map(|legend| self.index.locate(legend).to_vec())
            .unwrap_or_default()
    }

    /// Whether any held code maps onto `coord`
    fn is_covered(&self, coord: GridCoord) -> bool {
        self.pressed_keys
            .iter()
            .any(|&code| self.coords_for(code).contains(&coord))
    }

    fn set_pressed(&mut self, coord: GridCoord, pressed: bool) {
        if let Some(key) = self.layout.grid.get_mut(coord) {
            key.pressed = pressed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QWE: &str = r#"[[{x:1},"Q","W","E"],["A","S","D"]]"#;
    const SHIFTS: &str = r#"[{w:2.25},"Shift","Z",{w:2.75},"Shift"]"#;

    fn fixture() -> LegendMap {
        [
            (KeyCode(81), "Q".to_string()),
            (KeyCode(65), "A".to_string()),
            (KeyCode(16), "Shift".to_string()),
            (KeyCode(161), "Shift".to_string()),
            (KeyCode(90), "Z".to_string()),
            (KeyCode(7), "Nowhere".to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn simulator(layout: &str) -> KeySimulator {
        let mut sim = KeySimulator::new(fixture());
        sim.load_layout(layout).unwrap();
        sim
    }

    fn pressed_legends(sim: &KeySimulator) -> Vec<String> {
        sim.grid()
            .keys()
            .filter(|(_, k)| k.is_pressed())
            .map(|(_, k)| k.legend.clone())
            .collect()
    }

    /// Pressed flags must equal the union of coordinates of held codes
    fn assert_consistent(sim: &KeySimulator) {
        let expected: BTreeSet<GridCoord> = sim
            .pressed_keys()
            .iter()
            .flat_map(|&code| sim.coords_for(code))
            .collect();
        let actual: BTreeSet<GridCoord> = sim.grid().pressed_coords().into_iter().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_end_to_end_press_release() {
        let mut sim = simulator(QWE);

        let change = sim.key_down(KeyCode(81));
        assert_eq!(
            change,
            Change::Pressed { code: KeyCode(81), coords: vec![GridCoord::new(0, 0)] }
        );
        assert_eq!(sim.pressed_keys().iter().copied().collect::<Vec<_>>(), vec![KeyCode(81)]);
        assert_eq!(pressed_legends(&sim), vec!["Q"]);

        sim.key_up(KeyCode(81));
        assert!(sim.pressed_keys().is_empty());
        assert!(pressed_legends(&sim).is_empty());
    }

    #[test]
    fn test_repeat_key_down_is_idempotent() {
        let mut once = simulator(QWE);
        once.key_down(KeyCode(81));

        let mut twice = simulator(QWE);
        twice.key_down(KeyCode(81));
        assert_eq!(twice.key_down(KeyCode(81)), Change::Unchanged);

        assert_eq!(once.pressed_keys(), twice.pressed_keys());
        assert_eq!(pressed_legends(&once), pressed_legends(&twice));
    }

    #[test]
    fn test_round_trip_restores_state() {
        let mut sim = simulator(QWE);
        sim.key_down(KeyCode(65));
        let before_keys = sim.pressed_keys().clone();
        let before_flags = sim.grid().pressed_coords();

        sim.key_down(KeyCode(81));
        sim.key_up(KeyCode(81));

        assert_eq!(sim.pressed_keys(), &before_keys);
        assert_eq!(sim.grid().pressed_coords(), before_flags);
    }

    #[test]
    fn test_key_up_without_key_down() {
        let mut sim = simulator(QWE);
        assert_eq!(sim.key_up(KeyCode(81)), Change::Unchanged);
        assert!(sim.pressed_keys().is_empty());
    }

    #[test]
    fn test_unknown_code_and_unindexed_legend() {
        let mut sim = simulator(QWE);

        // Not in the legend table
        let change = sim.key_down(KeyCode(200));
        assert_eq!(change, Change::Pressed { code: KeyCode(200), coords: vec![] });
        // In the table, but no drawn key
        sim.key_down(KeyCode(7));

        assert!(sim.any_key_down());
        assert!(pressed_legends(&sim).is_empty());
        assert_consistent(&sim);
    }

    #[test]
    fn test_shared_legend_lights_every_key() {
        let mut sim = simulator(SHIFTS);
        let change = sim.key_down(KeyCode(16));
        assert_eq!(
            change,
            Change::Pressed {
                code: KeyCode(16),
                coords: vec![GridCoord::new(0, 0), GridCoord::new(0, 2)]
            }
        );
        assert_eq!(pressed_legends(&sim), vec!["Shift", "Shift"]);

        sim.key_up(KeyCode(16));
        assert!(pressed_legends(&sim).is_empty());
    }

    #[test]
    fn test_two_codes_same_legend_stay_lit_until_both_up() {
        let mut sim = simulator(SHIFTS);
        sim.key_down(KeyCode(16));
        sim.key_down(KeyCode(161));

        let change = sim.key_up(KeyCode(16));
        assert_eq!(change, Change::Released { code: KeyCode(16), coords: vec![] });
        assert_eq!(pressed_legends(&sim), vec!["Shift", "Shift"]);
        assert_consistent(&sim);

        sim.key_up(KeyCode(161));
        assert!(pressed_legends(&sim).is_empty());
        assert_consistent(&sim);
    }

    #[test]
    fn test_pointer_press_uses_legend_table() {
        let mut sim = simulator(QWE);
        sim.press_legend("A");
        assert!(sim.is_down(KeyCode(65)));
        assert_eq!(pressed_legends(&sim), vec!["A"]);

        assert_eq!(sim.press_legend("W"), Change::Unchanged);

        sim.release_legend("A");
        assert!(!sim.any_key_down());
    }

    #[test]
    fn test_release_all() {
        let mut sim = simulator(SHIFTS);
        sim.key_down(KeyCode(16));
        sim.key_down(KeyCode(90));
        let released = sim.release_all();
        assert_eq!(released, vec![KeyCode(16), KeyCode(90)]);
        assert!(pressed_legends(&sim).is_empty());
    }

    #[test]
    fn test_layout_change_keeps_held_keys() {
        let mut sim = simulator(QWE);
        sim.key_down(KeyCode(16));
        sim.key_down(KeyCode(81));

        assert_eq!(sim.load_layout(SHIFTS).unwrap(), Change::LayoutReplaced);
        assert_eq!(sim.pressed_keys().len(), 2);
        assert_eq!(pressed_legends(&sim), vec!["Shift", "Shift"]);
        assert_consistent(&sim);

        sim.load_layout(QWE).unwrap();
        assert_eq!(pressed_legends(&sim), vec!["Q"]);
        assert_consistent(&sim);
    }

    #[test]
    fn test_malformed_layout_keeps_previous_grid() {
        let mut sim = simulator(QWE);
        sim.key_down(KeyCode(81));
        let before = sim.grid().clone();

        let err = sim.load_layout(r#"["Q",{r:10},"W"]"#).unwrap_err();
        assert!(err.is_malformed_layout());
        assert_eq!(sim.grid(), &before);
        assert_eq!(sim.locate("Q"), &[GridCoord::new(0, 0)]);
    }

    #[test]
    fn test_key_ids_never_reused() {
        let mut sim = simulator(QWE);
        let first: BTreeSet<_> = sim.grid().keys().map(|(_, k)| k.id).collect();
        sim.load_layout(QWE).unwrap();
        let second: BTreeSet<_> = sim.grid().keys().map(|(_, k)| k.id).collect();
        assert_eq!(first.len(), 6);
        assert!(first.is_disjoint(&second));
    }

    #[test]
    fn test_case_color_recolors_and_survives_reparse() {
        let mut sim = simulator(QWE);
        let teal = Rgb::new(0, 0x80, 0x80);
        assert_eq!(sim.set_case_color(teal), Change::Recolored);
        assert!(sim.grid().keys().all(|(_, k)| k.colors().keytop == teal));

        sim.load_layout(SHIFTS).unwrap();
        assert!(sim.grid().keys().all(|(_, k)| k.colors().keytop == teal));
    }
}
