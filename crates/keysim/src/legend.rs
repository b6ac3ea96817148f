//! Key code <-> legend lookups
//!
//! Input arrives as platform key codes; drawn keys are found by legend. The
//! [`LegendTable`] trait is the seam between the two so tests (and unusual
//! layouts) can swap the table out.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform key code (browser-style virtual key code: 'Q' = 81, Enter = 13)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Two-way lookup between key codes and legend names
pub trait LegendTable {
    /// Canonical legend for a key code
    fn legend_for(&self, code: KeyCode) -> Option<&str>;

    /// Key code that produces a legend
    fn code_for(&self, legend: &str) -> Option<KeyCode>;
}

/// Browser virtual key codes and the legends bundled layouts use for them.
///
/// Both Shift keys share one code, as do both Ctrl and both Alt keys.
const STANDARD: &[(u32, &str)] = &[
    (8, "Backspace"),
    (9, "Tab"),
    (12, "Clear"),
    (13, "Enter"),
    (16, "Shift"),
    (17, "Ctrl"),
    (18, "Alt"),
    (19, "Pause"),
    (20, "Caps Lock"),
    (27, "Esc"),
    (32, "Space"),
    (33, "PgUp"),
    (34, "PgDn"),
    (35, "End"),
    (36, "Home"),
    (37, "←"),
    (38, "↑"),
    (39, "→"),
    (40, "↓"),
    (44, "PrtSc"),
    (45, "Insert"),
    (46, "Delete"),
    (48, "0"),
    (49, "1"),
    (50, "2"),
    (51, "3"),
    (52, "4"),
    (53, "5"),
    (54, "6"),
    (55, "7"),
    (56, "8"),
    (57, "9"),
    (65, "A"),
    (66, "B"),
    (67, "C"),
    (68, "D"),
    (69, "E"),
    (70, "F"),
    (71, "G"),
    (72, "H"),
    (73, "I"),
    (74, "J"),
    (75, "K"),
    (76, "L"),
    (77, "M"),
    (78, "N"),
    (79, "O"),
    (80, "P"),
    (81, "Q"),
    (82, "R"),
    (83, "S"),
    (84, "T"),
    (85, "U"),
    (86, "V"),
    (87, "W"),
    (88, "X"),
    (89, "Y"),
    (90, "Z"),
    (91, "Win"),
    (93, "Menu"),
    (96, "Num 0"),
    (97, "Num 1"),
    (98, "Num 2"),
    (99, "Num 3"),
    (100, "Num 4"),
    (101, "Num 5"),
    (102, "Num 6"),
    (103, "Num 7"),
    (104, "Num 8"),
    (105, "Num 9"),
    (106, "Num *"),
    (107, "Num +"),
    (109, "Num -"),
    (110, "Num ."),
    (111, "Num /"),
    (112, "F1"),
    (113, "F2"),
    (114, "F3"),
    (115, "F4"),
    (116, "F5"),
    (117, "F6"),
    (118, "F7"),
    (119, "F8"),
    (120, "F9"),
    (121, "F10"),
    (122, "F11"),
    (123, "F12"),
    (144, "Num Lock"),
    (145, "Scroll Lock"),
    (186, ";"),
    (187, "="),
    (188, ","),
    (189, "-"),
    (190, "."),
    (191, "/"),
    (192, "`"),
    (219, "["),
    (220, "\\"),
    (221, "]"),
    (222, "'"),
];

/// Hash-map backed [`LegendTable`]
#[derive(Debug, Clone, Default)]
pub struct LegendMap {
    by_code: HashMap<KeyCode, String>,
    by_legend: HashMap<String, KeyCode>,
}

impl LegendMap {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the standard browser key codes
    pub fn standard() -> Self {
        let mut map = Self::new();
        for &(code, legend) in STANDARD {
            map.insert(KeyCode(code), legend);
        }
        // Right Windows key reports its own code but draws the same legend.
        map.by_code.insert(KeyCode(92), "Win".to_string());
        map
    }

    /// Add or replace a mapping in both directions
    pub fn insert(&mut self, code: KeyCode, legend: impl Into<String>) {
        let legend = legend.into();
        if let Some(old) = self.by_code.insert(code, legend.clone()) {
            if self.by_legend.get(&old) == Some(&code) {
                self.by_legend.remove(&old);
            }
        }
        self.by_legend.insert(legend, code);
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl FromIterator<(KeyCode, String)> for LegendMap {
    fn from_iter<I: IntoIterator<Item = (KeyCode, String)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (code, legend) in iter {
            map.insert(code, legend);
        }
        map
    }
}

impl LegendTable for LegendMap {
    fn legend_for(&self, code: KeyCode) -> Option<&str> {
        self.by_code.get(&code).map(String::as_str)
    }

    fn code_for(&self, legend: &str) -> Option<KeyCode> {
        self.by_legend.get(legend).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_lookups() {
        let table = LegendMap::standard();
        assert_eq!(table.legend_for(KeyCode(81)), Some("Q"));
        assert_eq!(table.legend_for(KeyCode(13)), Some("Enter"));
        assert_eq!(table.code_for("Shift"), Some(KeyCode(16)));
        assert_eq!(table.code_for("Caps Lock"), Some(KeyCode(20)));
    }

    #[test]
    fn test_misses() {
        let table = LegendMap::standard();
        assert_eq!(table.legend_for(KeyCode(255)), None);
        assert_eq!(table.code_for("q"), None);
    }

    #[test]
    fn test_both_windows_keys_draw_win() {
        let table = LegendMap::standard();
        assert_eq!(table.legend_for(KeyCode(91)), Some("Win"));
        assert_eq!(table.legend_for(KeyCode(92)), Some("Win"));
        assert_eq!(table.code_for("Win"), Some(KeyCode(91)));
    }

    #[test]
    fn test_insert_replaces_both_directions() {
        let mut table = LegendMap::standard();
        table.insert(KeyCode(13), "Return");
        assert_eq!(table.legend_for(KeyCode(13)), Some("Return"));
        assert_eq!(table.code_for("Return"), Some(KeyCode(13)));
        assert_eq!(table.code_for("Enter"), None);
    }

    #[test]
    fn test_from_iterator() {
        let table: LegendMap = [(KeyCode(1), "One".to_string())].into_iter().collect();
        assert_eq!(table.len(), 1);
        assert_eq!(table.code_for("One"), Some(KeyCode(1)));
    }
}
