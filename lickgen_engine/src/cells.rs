// Melodic cells: short scale-degree patterns played by the melodic-cell device.
//
// A cell is a list of 0-based scale-degree indices counted up from the chord
// root (0 = root, 2 = the scale's third step, 7 on a seven-note scale = the
// root an octave up). The device resolves each index to its pitch class in
// the measure's scale and plays it in the octave nearest the previous note,
// so the line never leaps more than a major seventh inside a cell.
//
// The library can be loaded from JSON (`{"cells": [{"name": ..., "degrees":
// [...]}]}`); `default_library` supplies the stock shapes used when no file is
// given.

use crate::config::{LickError, load_json};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Notes per cell when the device has room for the whole pattern.
pub const CELL_LENGTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub name: String,
    pub degrees: Vec<usize>,
}

impl Cell {
    fn new(name: &str, degrees: &[usize]) -> Self {
        Cell {
            name: name.to_string(),
            degrees: degrees.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellLibrary {
    pub cells: Vec<Cell>,
}

impl CellLibrary {
    /// Load from JSON. Cells with no degrees are dropped with a warning.
    pub fn load(path: &Path) -> Result<Self, LickError> {
        let mut lib: CellLibrary = load_json(path)?;
        lib.cells.retain(|cell| {
            if cell.degrees.is_empty() {
                log::warn!("dropping empty cell '{}' from {}", cell.name, path.display());
            }
            !cell.degrees.is_empty()
        });
        log::debug!("loaded {} cells from {}", lib.cells.len(), path.display());
        Ok(lib)
    }

    /// Stock bebop shapes.
    pub fn default_library() -> Self {
        CellLibrary {
            cells: vec![
                Cell::new("ascending", &[0, 1, 2, 3]),
                Cell::new("descending", &[3, 2, 1, 0]),
                Cell::new("arch", &[0, 2, 4, 2]),
                Cell::new("valley", &[4, 2, 0, 2]),
                // Upper structures: 3-5-7-9 and 5-7-9-11.
                Cell::new("upper-structure", &[2, 4, 6, 8]),
                Cell::new("upper-structure-high", &[4, 6, 8, 10]),
            ],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl Default for CellLibrary {
    fn default() -> Self {
        Self::default_library()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cells_are_four_notes() {
        let lib = CellLibrary::default_library();
        assert_eq!(lib.len(), 6);
        assert!(lib.cells.iter().all(|c| c.degrees.len() == CELL_LENGTH));
    }

    #[test]
    fn load_from_json_drops_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.json");
        std::fs::write(
            &path,
            r#"{"cells": [
                {"name": "zigzag", "degrees": [0, 2, 1, 3]},
                {"name": "nothing", "degrees": []}
            ]}"#,
        )
        .unwrap();
        let lib = CellLibrary::load(&path).unwrap();
        assert_eq!(lib.cells, vec![Cell::new("zigzag", &[0, 2, 1, 3])]);
    }

    #[test]
    fn load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(CellLibrary::load(&path), Err(LickError::Parse { .. })));
    }
}
