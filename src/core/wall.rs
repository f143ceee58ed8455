//! Mesh walls: the mechanically meaningful edges of the cell mesh.
//!
//! A wall is an unordered pair of two *distinct* vertices, carries the
//! resting length the external force law relaxes toward, and records its at
//! most two incident cells so a wall split can patch both boundary loops.
//! Walls are the only mesh entities ever removed: a division cut lands on a
//! wall and replaces it with two sub-walls.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::tissue::{CellKey, VertexKey};

/// Errors from wall construction and incidence bookkeeping.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WallError {
    /// Both endpoints refer to the same vertex.
    #[error("wall endpoints must be distinct, got {vertex:?} twice")]
    IdenticalEndpoints {
        /// The repeated vertex handle.
        vertex: VertexKey,
    },
    /// A third cell tried to attach to a wall that already has two.
    #[error("wall already has two incident cells, cannot attach {cell:?}")]
    TooManyCells {
        /// The cell that could not be attached.
        cell: CellKey,
    },
    /// An incidence update named a cell the wall does not border.
    #[error("cell {cell:?} is not incident to this wall")]
    NotIncident {
        /// The cell that was named.
        cell: CellKey,
    },
}

/// An edge of the cell mesh connecting two distinct vertices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    v0: VertexKey,
    v1: VertexKey,
    /// Target unstressed length used by the external mechanical force law.
    pub resting_length: f64,
    /// Additional per-wall scalar data (spring constants, fluxes, ...).
    /// Opaque to the division engine except for being carried through splits.
    pub attrs: Vec<f64>,
    cells: [Option<CellKey>; 2],
}

impl Wall {
    /// Creates a wall between two distinct vertices.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::IdenticalEndpoints`] when `v0 == v1`.
    pub fn new(v0: VertexKey, v1: VertexKey, resting_length: f64) -> Result<Self, WallError> {
        if v0 == v1 {
            return Err(WallError::IdenticalEndpoints { vertex: v0 });
        }
        Ok(Self {
            v0,
            v1,
            resting_length,
            attrs: Vec::new(),
            cells: [None, None],
        })
    }

    /// The two endpoint vertex handles, in storage order.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> (VertexKey, VertexKey) {
        (self.v0, self.v1)
    }

    /// Whether `vertex` is one of this wall's endpoints.
    #[inline]
    #[must_use]
    pub fn has_vertex(&self, vertex: VertexKey) -> bool {
        self.v0 == vertex || self.v1 == vertex
    }

    /// The endpoint opposite `vertex`, or `None` when `vertex` is not an
    /// endpoint.
    #[must_use]
    pub fn other_vertex(&self, vertex: VertexKey) -> Option<VertexKey> {
        if vertex == self.v0 {
            Some(self.v1)
        } else if vertex == self.v1 {
            Some(self.v0)
        } else {
            None
        }
    }

    /// The vertex shared with another wall, if exactly one endpoint matches.
    ///
    /// Walls sharing *both* endpoints (a two-wall polygon) are invalid; this
    /// returns `None` for that case so the caller's validation can flag it.
    #[must_use]
    pub fn shared_vertex(&self, other: &Self) -> Option<VertexKey> {
        let m0 = other.has_vertex(self.v0);
        let m1 = other.has_vertex(self.v1);
        match (m0, m1) {
            (true, false) => Some(self.v0),
            (false, true) => Some(self.v1),
            _ => None,
        }
    }

    /// The incident cells, at most two. One empty side means the wall lies
    /// on the outer tissue boundary.
    #[inline]
    #[must_use]
    pub const fn cells(&self) -> [Option<CellKey>; 2] {
        self.cells
    }

    /// Whether `cell` borders this wall.
    #[inline]
    #[must_use]
    pub fn has_cell(&self, cell: CellKey) -> bool {
        self.cells.contains(&Some(cell))
    }

    /// Records `cell` as incident to this wall.
    ///
    /// Attaching an already-incident cell is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::TooManyCells`] when both sides are taken.
    pub fn attach_cell(&mut self, cell: CellKey) -> Result<(), WallError> {
        if self.has_cell(cell) {
            return Ok(());
        }
        for slot in &mut self.cells {
            if slot.is_none() {
                *slot = Some(cell);
                return Ok(());
            }
        }
        Err(WallError::TooManyCells { cell })
    }

    /// Replaces one incident cell handle with another, preserving the side.
    ///
    /// Used when a daughter cell takes over part of the mother's boundary.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::NotIncident`] when `old` does not border this
    /// wall.
    pub fn replace_cell(&mut self, old: CellKey, new: CellKey) -> Result<(), WallError> {
        for slot in &mut self.cells {
            if *slot == Some(old) {
                *slot = Some(new);
                return Ok(());
            }
        }
        Err(WallError::NotIncident { cell: old })
    }
}
