//! Mesh vertices.

use serde::{Deserialize, Serialize};

use crate::geometry::point::Point2;

/// A mesh vertex: a position in the plane, owned by the [`Tissue`] arena and
/// referenced by walls.
///
/// Vertices are created at initialization or by a division mutation and are
/// never deleted; the tissue validator enforces that every vertex keeps at
/// least one referencing wall after any completed mutation.
///
/// [`Tissue`]: crate::core::tissue::Tissue
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Current position, advanced by the external integrator.
    pub position: Point2,
}

impl Vertex {
    /// Creates a vertex at the given position.
    #[inline]
    #[must_use]
    pub const fn new(position: Point2) -> Self {
        Self { position }
    }
}

impl From<Point2> for Vertex {
    #[inline]
    fn from(position: Point2) -> Self {
        Self::new(position)
    }
}
