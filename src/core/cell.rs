//! Mesh cells: closed polygonal compartments bounded by walls.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::tissue::WallKey;

/// Inline capacity for a cell's wall loop; tissue cells are small polygons
/// and rarely exceed this.
pub const WALLS_INLINE: usize = 8;

/// Ordered cyclic wall loop of a cell.
pub type WallLoop = SmallVec<[WallKey; WALLS_INLINE]>;

/// A cell of the tissue mesh.
///
/// The boundary is an ordered cyclic sequence of wall handles forming a
/// closed simple polygon: each consecutive pair of walls (including the
/// last/first pair) shares exactly one vertex. The attribute vector mixes
/// extensive quantities (volume, molecular counts; divided between daughters
/// at division) and intensive ones (concentrations, rates; copied to both
/// daughters); which slots are extensive is per-rule configuration, not a
/// property of the cell itself.
///
/// On division the mother keeps its handle and becomes daughter A; daughter
/// B is allocated fresh. Cells are never removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    walls: WallLoop,
    /// Per-cell scalar state advanced by the external integrator.
    pub attrs: Vec<f64>,
}

impl Cell {
    /// Creates a cell from its ordered wall loop.
    #[must_use]
    pub fn new(walls: WallLoop) -> Self {
        Self {
            walls,
            attrs: Vec::new(),
        }
    }

    /// Creates a cell from its ordered wall loop and attribute vector.
    #[must_use]
    pub fn with_attrs(walls: WallLoop, attrs: Vec<f64>) -> Self {
        Self { walls, attrs }
    }

    /// The ordered cyclic wall loop.
    #[inline]
    #[must_use]
    pub fn walls(&self) -> &[WallKey] {
        &self.walls
    }

    /// Number of boundary walls (equals the number of boundary vertices).
    #[inline]
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    /// Position of `wall` within the loop, if present.
    #[must_use]
    pub fn wall_position(&self, wall: WallKey) -> Option<usize> {
        self.walls.iter().position(|&w| w == wall)
    }

    /// Replaces the wall at `index` with a run of walls, preserving cyclic
    /// order. Used when a wall split substitutes two sub-walls for one wall.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds; callers locate the index through
    /// [`Cell::wall_position`] first.
    pub fn splice_walls(&mut self, index: usize, replacement: &[WallKey]) {
        self.walls.remove(index);
        self.walls.insert_from_slice(index, replacement);
    }

    /// Replaces the entire wall loop. Used by the topology mutator when the
    /// mother's boundary is partitioned between the daughters.
    pub fn set_walls(&mut self, walls: WallLoop) {
        self.walls = walls;
    }
}
