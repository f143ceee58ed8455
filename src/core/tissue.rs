//! The mutable tissue mesh: arenas, derivative buffers, and validation.
//!
//! `Tissue` owns every vertex, wall, and cell of the mesh in [`slotmap`]
//! arenas addressed by stable, generational keys. Generational keys matter
//! here because walls are *removed* when a division cut splits them: a stale
//! `WallKey` held across a split can never silently alias the slot's next
//! occupant.
//!
//! Alongside each arena sits a [`SecondaryMap`] of derivative buffers. The
//! division engine never consumes derivatives, but the external integrator
//! does, so every mutation keeps the buffers sized consistently and zeroes
//! the rows of newly created entities.
//!
//! # Ordering
//!
//! Arena iteration order is an implementation detail of slot allocation, so
//! `Tissue` additionally records `cell_order`: the ascending creation order
//! of cells. The division pass iterates this list, which is what makes whole
//! simulation runs replayable (see [`crate::core::stepper`]).
//!
//! # Validation
//!
//! [`Tissue::validate`] checks the structural invariants the division engine
//! must restore after every mutation: walls have two distinct live
//! endpoints, cell boundaries close into simple polygons, wall/cell
//! incidence is mutual, no vertex is orphaned, and derivative buffers match
//! their entities. A failure is a logic bug in a mutation, never bad input.

use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap, new_key_type};
use thiserror::Error;

use crate::core::cell::{Cell, WallLoop};
use crate::core::vertex::Vertex;
use crate::core::wall::{Wall, WallError};
use crate::geometry::point::Point2;
use crate::geometry::polygon::{self, PolygonError};

new_key_type! {
    /// Stable generational handle to a vertex in the tissue arena.
    pub struct VertexKey;
}

new_key_type! {
    /// Stable generational handle to a wall in the tissue arena.
    ///
    /// Walls are the only entities ever removed (when split in two), so
    /// this is the key type whose generation counter actually earns its
    /// keep: a key retained across a split goes stale instead of aliasing.
    pub struct WallKey;
}

new_key_type! {
    /// Stable generational handle to a cell in the tissue arena.
    pub struct CellKey;
}

/// Result of splitting one wall in two at an interior point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallSplit {
    /// The vertex inserted at the split point.
    pub vertex: VertexKey,
    /// Sub-wall from the original first endpoint to the new vertex.
    pub first: WallKey,
    /// Sub-wall from the new vertex to the original second endpoint.
    pub second: WallKey,
}

/// Errors from assembling a tissue out of raw geometry.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TissueBuildError {
    /// The input polygon was unusable.
    #[error(transparent)]
    Polygon(#[from] PolygonError),
    /// A wall could not be constructed.
    #[error(transparent)]
    Wall(#[from] WallError),
}

/// Structural invariant violations detected by tissue validation.
///
/// Any of these after a completed mutation indicates a bug in the mutation
/// logic, not bad input data; callers treat them as fatal.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TissueValidationError {
    /// A wall handle did not resolve to a live wall.
    #[error("unknown wall handle {wall:?}")]
    UnknownWall {
        /// The stale handle.
        wall: WallKey,
    },
    /// A cell handle did not resolve to a live cell.
    #[error("unknown cell handle {cell:?}")]
    UnknownCell {
        /// The stale handle.
        cell: CellKey,
    },
    /// A wall references a vertex that is not in the arena.
    #[error("wall {wall:?} references missing vertex {vertex:?}")]
    DanglingVertexRef {
        /// The referencing wall.
        wall: WallKey,
        /// The missing vertex handle.
        vertex: VertexKey,
    },
    /// A wall's endpoints are not two distinct vertices.
    #[error("wall {wall:?} does not have two distinct endpoints")]
    DegenerateWall {
        /// The offending wall.
        wall: WallKey,
    },
    /// A cell has fewer than three boundary walls.
    #[error("cell {cell:?} boundary has {walls} walls, need at least 3")]
    OpenBoundary {
        /// The offending cell.
        cell: CellKey,
        /// Number of walls found.
        walls: usize,
    },
    /// Two consecutive boundary walls of a cell share no (unique) vertex.
    #[error("cell {cell:?} boundary does not close at wall position {position}")]
    BoundaryNotClosed {
        /// The offending cell.
        cell: CellKey,
        /// Index into the cell's wall loop where closure fails.
        position: usize,
    },
    /// A cell's boundary visits the same vertex twice (non-simple polygon).
    #[error("cell {cell:?} boundary repeats vertex {vertex:?}")]
    RepeatedVertex {
        /// The offending cell.
        cell: CellKey,
        /// The repeated vertex.
        vertex: VertexKey,
    },
    /// Wall/cell incidence is not mutual.
    #[error("wall {wall:?} and cell {cell:?} disagree about their incidence")]
    InconsistentIncidence {
        /// The wall side of the disagreement.
        wall: WallKey,
        /// The cell side of the disagreement.
        cell: CellKey,
    },
    /// A vertex is referenced by no wall.
    #[error("vertex {vertex:?} is not referenced by any wall")]
    OrphanVertex {
        /// The orphaned vertex.
        vertex: VertexKey,
    },
    /// A cell's polygon has numerically zero area where a positive one is
    /// required (centroid, area-weighted splits).
    #[error("cell {cell:?} has a degenerate (zero-area) polygon")]
    DegenerateCell {
        /// The offending cell.
        cell: CellKey,
    },
    /// A derivative buffer is missing or mis-sized for its entity.
    #[error("derivative buffer inconsistency: {message}")]
    DerivativeMismatch {
        /// Description of the mismatch.
        message: String,
    },
    /// The deterministic cell ordering disagrees with the cell arena.
    #[error("cell ordering inconsistency: {message}")]
    OrderInconsistency {
        /// Description of the inconsistency.
        message: String,
    },
}

/// The mutable tissue mesh.
///
/// See the [module documentation](self) for the ownership and ordering
/// model.
///
/// # Examples
///
/// ```rust
/// use cytokinesis::core::tissue::Tissue;
/// use cytokinesis::geometry::point::Point2;
///
/// let square = [
///     Point2::new(0.0, 0.0),
///     Point2::new(1.0, 0.0),
///     Point2::new(1.0, 1.0),
///     Point2::new(0.0, 1.0),
/// ];
/// let (tissue, cell) = Tissue::from_polygon(&square).unwrap();
///
/// assert_eq!(tissue.number_of_vertices(), 4);
/// assert_eq!(tissue.number_of_walls(), 4);
/// assert_eq!(tissue.number_of_cells(), 1);
/// assert!((tissue.cell_area(cell).unwrap() - 1.0).abs() < 1e-12);
/// assert!(tissue.validate().is_ok());
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Tissue {
    vertices: SlotMap<VertexKey, Vertex>,
    walls: SlotMap<WallKey, Wall>,
    cells: SlotMap<CellKey, Cell>,
    /// Ascending creation order of cells; the only sanctioned iteration
    /// order for the division pass.
    cell_order: Vec<CellKey>,
    vertex_derivs: SecondaryMap<VertexKey, [f64; 2]>,
    wall_derivs: SecondaryMap<WallKey, Vec<f64>>,
    cell_derivs: SecondaryMap<CellKey, Vec<f64>>,
}

impl Tissue {
    /// Creates an empty tissue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tissue holding a single cell from an ordered polygon loop.
    ///
    /// Each wall's resting length is initialized to its actual length; the
    /// cell starts with an empty attribute vector (see
    /// [`Tissue::set_cell_attrs`]).
    ///
    /// # Errors
    ///
    /// Returns [`TissueBuildError`] when fewer than three points are given
    /// or two consecutive points coincide.
    pub fn from_polygon(points: &[Point2]) -> Result<(Self, CellKey), TissueBuildError> {
        if points.len() < 3 {
            return Err(PolygonError::TooFewVertices {
                found: points.len(),
            }
            .into());
        }
        let mut tissue = Self::new();
        let vertex_keys: Vec<VertexKey> = points
            .iter()
            .map(|&p| tissue.insert_vertex(Vertex::new(p)))
            .collect();

        let n = points.len();
        let mut loop_walls = WallLoop::new();
        for i in 0..n {
            let (a, b) = (vertex_keys[i], vertex_keys[(i + 1) % n]);
            let length = points[i].distance(points[(i + 1) % n]);
            if length < f64::EPSILON {
                return Err(PolygonError::Degenerate.into());
            }
            let wall = Wall::new(a, b, length)?;
            loop_walls.push(tissue.insert_wall(wall));
        }

        let cell = tissue.insert_cell(Cell::new(loop_walls.clone()));
        for wall_key in &loop_walls {
            if let Some(wall) = tissue.walls.get_mut(*wall_key) {
                wall.attach_cell(cell)?;
            }
        }
        Ok((tissue, cell))
    }

    // =========================================================================
    // INSERTION AND REMOVAL
    // =========================================================================

    /// Inserts a vertex and its zeroed derivative row.
    pub fn insert_vertex(&mut self, vertex: Vertex) -> VertexKey {
        let key = self.vertices.insert(vertex);
        self.vertex_derivs.insert(key, [0.0, 0.0]);
        key
    }

    /// Inserts a wall and its zeroed derivative row.
    ///
    /// The derivative row has one slot for the resting length plus one per
    /// extra attribute, mirroring how the integrator lays out wall state.
    pub fn insert_wall(&mut self, wall: Wall) -> WallKey {
        let deriv_len = wall.attrs.len() + 1;
        let key = self.walls.insert(wall);
        self.wall_derivs.insert(key, vec![0.0; deriv_len]);
        key
    }

    /// Inserts a cell, appends it to the deterministic ordering, and adds
    /// its zeroed derivative row.
    pub fn insert_cell(&mut self, cell: Cell) -> CellKey {
        let deriv_len = cell.attrs.len();
        let key = self.cells.insert(cell);
        self.cell_derivs.insert(key, vec![0.0; deriv_len]);
        self.cell_order.push(key);
        key
    }

    /// Removes a wall (and its derivative row), returning it if it existed.
    ///
    /// Only used while substituting sub-walls for a split wall; removing a
    /// wall still referenced by a cell leaves the tissue invalid.
    pub fn remove_wall(&mut self, wall: WallKey) -> Option<Wall> {
        self.wall_derivs.remove(wall);
        self.walls.remove(wall)
    }

    // =========================================================================
    // ACCESS
    // =========================================================================

    /// The vertex behind `key`, if live.
    #[inline]
    #[must_use]
    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex> {
        self.vertices.get(key)
    }

    /// Mutable access to a vertex.
    #[inline]
    pub fn vertex_mut(&mut self, key: VertexKey) -> Option<&mut Vertex> {
        self.vertices.get_mut(key)
    }

    /// The wall behind `key`, if live.
    #[inline]
    #[must_use]
    pub fn wall(&self, key: WallKey) -> Option<&Wall> {
        self.walls.get(key)
    }

    /// Mutable access to a wall.
    #[inline]
    pub fn wall_mut(&mut self, key: WallKey) -> Option<&mut Wall> {
        self.walls.get_mut(key)
    }

    /// The cell behind `key`, if live.
    #[inline]
    #[must_use]
    pub fn cell(&self, key: CellKey) -> Option<&Cell> {
        self.cells.get(key)
    }

    /// Mutable access to a cell.
    #[inline]
    pub fn cell_mut(&mut self, key: CellKey) -> Option<&mut Cell> {
        self.cells.get_mut(key)
    }

    /// Iterates all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex)> {
        self.vertices.iter()
    }

    /// Iterates all walls.
    pub fn walls(&self) -> impl Iterator<Item = (WallKey, &Wall)> {
        self.walls.iter()
    }

    /// Iterates all cells in arena order (use [`Tissue::cell_order`] for the
    /// deterministic order).
    pub fn cells(&self) -> impl Iterator<Item = (CellKey, &Cell)> {
        self.cells.iter()
    }

    /// Number of vertices.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of walls.
    #[must_use]
    pub fn number_of_walls(&self) -> usize {
        self.walls.len()
    }

    /// Number of cells.
    #[must_use]
    pub fn number_of_cells(&self) -> usize {
        self.cells.len()
    }

    /// Cells in ascending creation order. Daughters created by division are
    /// appended, never reordered.
    #[inline]
    #[must_use]
    pub fn cell_order(&self) -> &[CellKey] {
        &self.cell_order
    }

    /// Replaces a cell's attribute vector, resizing its derivative row to
    /// match (new slots zeroed).
    ///
    /// # Errors
    ///
    /// Returns [`TissueValidationError::UnknownCell`] for a stale handle.
    pub fn set_cell_attrs(
        &mut self,
        cell: CellKey,
        attrs: Vec<f64>,
    ) -> Result<(), TissueValidationError> {
        let len = attrs.len();
        let target = self
            .cells
            .get_mut(cell)
            .ok_or(TissueValidationError::UnknownCell { cell })?;
        target.attrs = attrs;
        if let Some(row) = self.cell_derivs.get_mut(cell) {
            row.resize(len, 0.0);
        } else {
            self.cell_derivs.insert(cell, vec![0.0; len]);
        }
        Ok(())
    }

    /// Replaces a wall's attribute vector, resizing its derivative row to
    /// match (resting length plus the new slots, new slots zeroed).
    ///
    /// # Errors
    ///
    /// Returns [`TissueValidationError::UnknownWall`] for a stale handle.
    pub fn set_wall_attrs(
        &mut self,
        wall: WallKey,
        attrs: Vec<f64>,
    ) -> Result<(), TissueValidationError> {
        let len = attrs.len() + 1;
        let target = self
            .walls
            .get_mut(wall)
            .ok_or(TissueValidationError::UnknownWall { wall })?;
        target.attrs = attrs;
        if let Some(row) = self.wall_derivs.get_mut(wall) {
            row.resize(len, 0.0);
        } else {
            self.wall_derivs.insert(wall, vec![0.0; len]);
        }
        Ok(())
    }

    /// Derivative row of a cell.
    #[must_use]
    pub fn cell_derivs(&self, cell: CellKey) -> Option<&[f64]> {
        self.cell_derivs.get(cell).map(Vec::as_slice)
    }

    /// Mutable derivative row of a cell (for the external integrator).
    pub fn cell_derivs_mut(&mut self, cell: CellKey) -> Option<&mut Vec<f64>> {
        self.cell_derivs.get_mut(cell)
    }

    /// Derivative row of a wall.
    #[must_use]
    pub fn wall_derivs(&self, wall: WallKey) -> Option<&[f64]> {
        self.wall_derivs.get(wall).map(Vec::as_slice)
    }

    /// Mutable derivative row of a wall (for the external integrator).
    pub fn wall_derivs_mut(&mut self, wall: WallKey) -> Option<&mut Vec<f64>> {
        self.wall_derivs.get_mut(wall)
    }

    /// Positional derivative of a vertex.
    #[must_use]
    pub fn vertex_derivs(&self, vertex: VertexKey) -> Option<[f64; 2]> {
        self.vertex_derivs.get(vertex).copied()
    }

    /// Mutable positional derivative of a vertex (for the external
    /// integrator).
    pub fn vertex_derivs_mut(&mut self, vertex: VertexKey) -> Option<&mut [f64; 2]> {
        self.vertex_derivs.get_mut(vertex)
    }

    // =========================================================================
    // BOUNDARY TRAVERSAL AND MEASURES
    // =========================================================================

    /// The ordered vertex loop of a cell.
    ///
    /// Element `i` is the vertex shared by boundary walls `i-1` and `i`
    /// (cyclically), so wall `i` runs from loop vertex `i` to loop vertex
    /// `i+1`.
    ///
    /// # Errors
    ///
    /// Returns a [`TissueValidationError`] when the boundary is too short,
    /// fails to close, repeats a vertex, or references a dead wall.
    pub fn cell_vertex_loop(&self, cell: CellKey) -> Result<Vec<VertexKey>, TissueValidationError> {
        let c = self
            .cells
            .get(cell)
            .ok_or(TissueValidationError::UnknownCell { cell })?;
        let wall_keys = c.walls();
        let n = wall_keys.len();
        if n < 3 {
            return Err(TissueValidationError::OpenBoundary { cell, walls: n });
        }

        let mut loop_vertices = Vec::with_capacity(n);
        for i in 0..n {
            let prev_key = wall_keys[(i + n - 1) % n];
            let cur_key = wall_keys[i];
            let prev = self
                .walls
                .get(prev_key)
                .ok_or(TissueValidationError::UnknownWall { wall: prev_key })?;
            let cur = self
                .walls
                .get(cur_key)
                .ok_or(TissueValidationError::UnknownWall { wall: cur_key })?;
            let shared = prev
                .shared_vertex(cur)
                .ok_or(TissueValidationError::BoundaryNotClosed { cell, position: i })?;
            loop_vertices.push(shared);
        }

        // Simplicity: no vertex may appear twice.
        for (i, &v) in loop_vertices.iter().enumerate() {
            if loop_vertices[i + 1..].contains(&v) {
                return Err(TissueValidationError::RepeatedVertex { cell, vertex: v });
            }
        }
        Ok(loop_vertices)
    }

    /// The cell boundary as an ordered position loop.
    ///
    /// # Errors
    ///
    /// Propagates [`Tissue::cell_vertex_loop`] failures, plus
    /// [`TissueValidationError::DanglingVertexRef`] for dead vertices.
    pub fn cell_polygon(&self, cell: CellKey) -> Result<Vec<Point2>, TissueValidationError> {
        let c = self
            .cells
            .get(cell)
            .ok_or(TissueValidationError::UnknownCell { cell })?;
        let loop_vertices = self.cell_vertex_loop(cell)?;
        loop_vertices
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                self.vertices.get(v).map(|vx| vx.position).ok_or(
                    TissueValidationError::DanglingVertexRef {
                        wall: c.walls()[i],
                        vertex: v,
                    },
                )
            })
            .collect()
    }

    /// The area ("volume" in tissue-simulation vocabulary) of a cell.
    ///
    /// # Errors
    ///
    /// Propagates boundary-traversal failures.
    pub fn cell_area(&self, cell: CellKey) -> Result<f64, TissueValidationError> {
        Ok(polygon::area(&self.cell_polygon(cell)?))
    }

    /// The center of mass of a cell.
    ///
    /// # Errors
    ///
    /// Propagates boundary-traversal failures; a zero-area polygon yields
    /// [`TissueValidationError::DegenerateCell`].
    pub fn cell_centroid(&self, cell: CellKey) -> Result<Point2, TissueValidationError> {
        polygon::centroid(&self.cell_polygon(cell)?)
            .map_err(|_| TissueValidationError::DegenerateCell { cell })
    }

    // =========================================================================
    // MUTATION PRIMITIVES
    // =========================================================================

    /// Splits `wall` at the interior point `at`, replacing it with two
    /// sub-walls and patching the wall loop of every incident cell.
    ///
    /// `resting` gives the resting lengths of the two sub-walls (first:
    /// original first endpoint to new vertex; second: new vertex to original
    /// second endpoint); the caller chooses the proportioning policy.
    /// Attributes are cloned onto both sub-walls, incidence is copied, and
    /// the new entities get zeroed derivative rows.
    ///
    /// # Errors
    ///
    /// Returns [`TissueValidationError`] for a stale wall handle or when an
    /// incident cell does not actually contain the wall in its loop.
    pub fn split_wall(
        &mut self,
        wall: WallKey,
        at: Point2,
        resting: (f64, f64),
    ) -> Result<WallSplit, TissueValidationError> {
        let old = self
            .walls
            .get(wall)
            .ok_or(TissueValidationError::UnknownWall { wall })?
            .clone();
        let (v0, v1) = old.vertices();

        // Work out, per incident cell, where the wall sits and in which
        // direction that cell traverses it, before any mutation.
        let mut patches: Vec<(CellKey, usize, bool)> = Vec::with_capacity(2);
        for cell in old.cells().into_iter().flatten() {
            let loop_vertices = self.cell_vertex_loop(cell)?;
            let c = self
                .cells
                .get(cell)
                .ok_or(TissueValidationError::UnknownCell { cell })?;
            let position = c
                .wall_position(wall)
                .ok_or(TissueValidationError::InconsistentIncidence { wall, cell })?;
            let starts_at_v0 = loop_vertices[position] == v0;
            patches.push((cell, position, starts_at_v0));
        }

        let vertex = self.insert_vertex(Vertex::new(at));
        let mut first = Wall::new(v0, vertex, resting.0)
            .map_err(|_| TissueValidationError::DegenerateWall { wall })?;
        let mut second = Wall::new(vertex, v1, resting.1)
            .map_err(|_| TissueValidationError::DegenerateWall { wall })?;
        first.attrs.clone_from(&old.attrs);
        second.attrs.clone_from(&old.attrs);
        for cell in old.cells().into_iter().flatten() {
            first
                .attach_cell(cell)
                .map_err(|_| TissueValidationError::InconsistentIncidence { wall, cell })?;
            second
                .attach_cell(cell)
                .map_err(|_| TissueValidationError::InconsistentIncidence { wall, cell })?;
        }

        let first_key = self.insert_wall(first);
        let second_key = self.insert_wall(second);

        for (cell, position, starts_at_v0) in patches {
            let c = self
                .cells
                .get_mut(cell)
                .ok_or(TissueValidationError::UnknownCell { cell })?;
            if starts_at_v0 {
                c.splice_walls(position, &[first_key, second_key]);
            } else {
                c.splice_walls(position, &[second_key, first_key]);
            }
        }

        self.remove_wall(wall);
        Ok(WallSplit {
            vertex,
            first: first_key,
            second: second_key,
        })
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Checks one cell's boundary invariants: at least three walls, closed
    /// simple polygon, mutual wall/cell incidence.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate_cell(&self, cell: CellKey) -> Result<(), TissueValidationError> {
        let c = self
            .cells
            .get(cell)
            .ok_or(TissueValidationError::UnknownCell { cell })?;
        self.cell_vertex_loop(cell)?;
        for &wall_key in c.walls() {
            let wall = self
                .walls
                .get(wall_key)
                .ok_or(TissueValidationError::UnknownWall { wall: wall_key })?;
            if !wall.has_cell(cell) {
                return Err(TissueValidationError::InconsistentIncidence {
                    wall: wall_key,
                    cell,
                });
            }
        }
        Ok(())
    }

    /// Checks every structural invariant of the mesh.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant; see [`TissueValidationError`].
    pub fn validate(&self) -> Result<(), TissueValidationError> {
        // Walls: live distinct endpoints, mutual incidence, derivative rows.
        for (wall_key, wall) in &self.walls {
            let (v0, v1) = wall.vertices();
            if v0 == v1 {
                return Err(TissueValidationError::DegenerateWall { wall: wall_key });
            }
            for v in [v0, v1] {
                if !self.vertices.contains_key(v) {
                    return Err(TissueValidationError::DanglingVertexRef {
                        wall: wall_key,
                        vertex: v,
                    });
                }
            }
            for cell in wall.cells().into_iter().flatten() {
                let Some(c) = self.cells.get(cell) else {
                    return Err(TissueValidationError::InconsistentIncidence {
                        wall: wall_key,
                        cell,
                    });
                };
                if c.wall_position(wall_key).is_none() {
                    return Err(TissueValidationError::InconsistentIncidence {
                        wall: wall_key,
                        cell,
                    });
                }
            }
            match self.wall_derivs.get(wall_key) {
                Some(row) if row.len() == wall.attrs.len() + 1 => {}
                _ => {
                    return Err(TissueValidationError::DerivativeMismatch {
                        message: format!("wall {wall_key:?} derivative row missing or mis-sized"),
                    });
                }
            }
        }

        // Cells: closed simple boundaries, incidence, derivative rows.
        for (cell_key, cell) in &self.cells {
            self.validate_cell(cell_key)?;
            match self.cell_derivs.get(cell_key) {
                Some(row) if row.len() == cell.attrs.len() => {}
                _ => {
                    return Err(TissueValidationError::DerivativeMismatch {
                        message: format!("cell {cell_key:?} derivative row missing or mis-sized"),
                    });
                }
            }
        }

        // Vertices: no orphans, derivative rows present.
        for (vertex_key, _) in &self.vertices {
            let referenced = self.walls.values().any(|w| w.has_vertex(vertex_key));
            if !referenced {
                return Err(TissueValidationError::OrphanVertex { vertex: vertex_key });
            }
            if !self.vertex_derivs.contains_key(vertex_key) {
                return Err(TissueValidationError::DerivativeMismatch {
                    message: format!("vertex {vertex_key:?} derivative row missing"),
                });
            }
        }

        // Ordering covers every cell exactly once.
        if self.cell_order.len() != self.cells.len() {
            return Err(TissueValidationError::OrderInconsistency {
                message: format!(
                    "ordering has {} entries for {} cells",
                    self.cell_order.len(),
                    self.cells.len()
                ),
            });
        }
        for &cell in &self.cell_order {
            if !self.cells.contains_key(cell) {
                return Err(TissueValidationError::OrderInconsistency {
                    message: format!("ordering references dead cell {cell:?}"),
                });
            }
        }
        Ok(())
    }
}
