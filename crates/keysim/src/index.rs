//! Legend -> grid coordinate index
//!
//! Built once per parsed grid. One legend can sit on several keys (both
//! Shifts, both Ctrls), so every entry is an ordered list of coordinates.

use std::collections::{BTreeMap, HashMap};

use crate::layout::{Grid, GridCoord};

/// Mapping from primary legend to every coordinate bearing it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationIndex {
    entries: HashMap<String, Vec<GridCoord>>,
}

impl LocationIndex {
    /// Index every non-decal key of `grid` under its primary legend.
    ///
    /// Legends are matched verbatim, the same way the legend table spells them.
    pub fn build(grid: &Grid) -> Self {
        let mut entries: HashMap<String, Vec<GridCoord>> = HashMap::new();
        for (coord, key) in grid.keys() {
            if key.decal {
                continue;
            }
            entries.entry(key.legend.clone()).or_default().push(coord);
        }
        Self { entries }
    }

    /// Coordinates for `legend`; empty when no drawn key carries it
    pub fn locate(&self, legend: &str) -> &[GridCoord] {
        self.entries.get(legend).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, legend: &str) -> bool {
        self.entries.contains_key(legend)
    }

    /// Number of distinct legends
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[GridCoord])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Entries sorted by legend, for stable output
    pub fn sorted(&self) -> BTreeMap<&str, &[GridCoord]> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::parse;

    #[test]
    fn test_shared_legend_keeps_every_coordinate() {
        let grid = parse(r#"[{w:2.25},"Shift","Z","X",{w:2.75},"Shift"]"#).unwrap().grid;
        let index = LocationIndex::build(&grid);
        assert_eq!(index.locate("Shift"), &[GridCoord::new(0, 0), GridCoord::new(0, 3)]);
        assert_eq!(index.locate("Z"), &[GridCoord::new(0, 1)]);
    }

    #[test]
    fn test_decals_excluded() {
        let grid = parse(r#"["Q",{d:true},"Q","logo"],["A"]"#).unwrap().grid;
        let index = LocationIndex::build(&grid);
        assert_eq!(index.locate("Q"), &[GridCoord::new(0, 0)]);
        assert!(!index.contains("logo"));
        for (coord, key) in grid.keys() {
            if key.decal {
                assert!(index.iter().all(|(_, coords)| !coords.contains(&coord)));
            }
        }
    }

    #[test]
    fn test_miss_is_empty() {
        let index = LocationIndex::build(&parse(r#"["Q"]"#).unwrap().grid);
        assert!(index.locate("Enter").is_empty());
    }

    #[test]
    fn test_case_sensitive() {
        let index = LocationIndex::build(&parse(r#"["q"]"#).unwrap().grid);
        assert!(index.locate("Q").is_empty());
        assert_eq!(index.len(), 1);
    }
}
