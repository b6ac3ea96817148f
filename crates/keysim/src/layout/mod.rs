//! Keyboard layout descriptions
//!
//! Layouts use the keyboard-layout-editor serialization. See [`parser`] for
//! the field rules and [`raw`] for the relaxed JSON dialect it arrives in.

pub mod parser;
pub mod raw;
mod types;

pub use parser::{parse, LayoutParser};
pub use types::{
    ColorOverrides, Grid, GridCoord, Key, KeyColors, KeyId, Layout, LayoutMeta, Rotation,
    SecondaryShape,
};

use crate::error::Result;
use std::path::Path;

/// Read and parse a layout file
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Layout> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["Esc","F1"],["Tab","Q"]"#).unwrap();
        let layout = load_file(file.path()).unwrap();
        assert_eq!(layout.grid.len(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_file("/nonexistent/keysim/layout.json").is_err());
    }
}
